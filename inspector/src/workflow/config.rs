use anyhow::Context;
use patterncore::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub decoder: DecoderConfig,
    /// Samples printed by `--lazy` when `--limit` is not given.
    pub lazy_limit: Option<usize>,
}

impl InspectorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading inspector config {}", path_ref.display()))?;
        let config: InspectorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing inspector config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn lazy_limit_or(&self, limit: Option<usize>) -> usize {
        limit.or(self.lazy_limit).unwrap_or(10)
    }
}
