use crate::report::model::Summary;
use crate::workflow::config::InspectorConfig;
use anyhow::Context;
use clap::ValueEnum;
use log::info;
use patterncore::{SampleIter, SectionedDecoder, TabularDecoder};
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Tabular,
    Sectioned,
}

impl Format {
    /// `.ffs` files are sectioned; everything else is read as tabular.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ffs") => Format::Sectioned,
            _ => Format::Tabular,
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: InspectorConfig,
}

impl Runner {
    pub fn new(config: InspectorConfig) -> Self {
        Self { config }
    }

    /// Decodes the whole file and summarises it.
    pub async fn execute(
        &self,
        path: &Path,
        format: Format,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Summary> {
        info!("decoding {} as {:?}", path.display(), format);
        let summary = match format {
            Format::Tabular => {
                let dataset = TabularDecoder::new(self.config.decoder.clone())
                    .load_path(path, Some(cancel))
                    .await
                    .with_context(|| format!("decoding tabular pattern {}", path.display()))?;
                Summary::from_tabular(&dataset)
            }
            Format::Sectioned => {
                let dataset = SectionedDecoder::new(self.config.decoder.clone())
                    .load_path(path, Some(cancel))
                    .await
                    .with_context(|| format!("decoding farfield source {}", path.display()))?;
                Summary::from_sectioned(&dataset)
            }
        };
        Ok(summary)
    }

    /// Pulls the first `limit` samples of a sectioned file without reading
    /// the rest of it.
    pub fn stream(
        &self,
        path: &Path,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Summary> {
        let limit = self.config.lazy_limit_or(limit);
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening farfield source {}", path.display()))?;
        let mut iter =
            SampleIter::with_config(std::io::BufReader::new(file), &self.config.decoder)
                .with_cancellation(cancel.clone());
        let samples = iter
            .by_ref()
            .take(limit)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("streaming farfield source {}", path.display()))?;
        Ok(Summary::Streamed {
            samples,
            stats: iter.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const FFS: &str = "// CST Farfield Source File
// Version:
3.0

// Data Type
Farfield

// #Frequencies
1

// Position
0 0 0

// zAxis
0 0 1

// xAxis
1 0 0

// yAxis
0 1 0

// Radiated/Accepted/Stimulated Power , Frequency
0.4
0.45
0.5
3e9


// >> Total #phi samples, total #theta samples
1 3

// >> Phi, Theta, Re(E_Theta), Im(E_Theta), Re(E_Phi), Im(E_Phi):
0 0 1 0 0 0
0 45 2 0 0 0
0 90 3 0 0 0
";

    fn ffs_file() -> tempfile::TempPath {
        let mut temp = Builder::new().suffix(".ffs").tempfile().unwrap();
        temp.write_all(FFS.as_bytes()).unwrap();
        temp.into_temp_path()
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(Format::infer(Path::new("horn.ffs")), Format::Sectioned);
        assert_eq!(Format::infer(Path::new("HORN.FFS")), Format::Sectioned);
        assert_eq!(Format::infer(Path::new("reflector.txt")), Format::Tabular);
        assert_eq!(Format::infer(Path::new("pattern")), Format::Tabular);
    }

    #[tokio::test]
    async fn runner_summarises_sectioned_file() {
        let path = ffs_file();
        let runner = Runner::new(InspectorConfig::default());
        let summary = runner
            .execute(&path, Format::infer(&path), &CancellationToken::new())
            .await
            .unwrap();
        match summary {
            Summary::Sectioned { patterns, .. } => {
                assert_eq!(patterns.len(), 1);
                assert_eq!(patterns[0].samples, 3);
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_format_reports_context() {
        let path = ffs_file();
        let runner = Runner::new(InspectorConfig::default());
        let err = runner
            .execute(&path, Format::Tabular, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("decoding tabular pattern"));
    }

    #[test]
    fn stream_observes_cancellation() {
        let path = ffs_file();
        let runner = Runner::new(InspectorConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = runner.stream(&path, Some(2), &cancel).unwrap_err();
        let cause = err.downcast_ref::<patterncore::PatternError>().unwrap();
        assert_eq!(cause.kind(), patterncore::ErrorKind::Cancelled);
    }

    #[test]
    fn stream_respects_limit() {
        let path = ffs_file();
        let runner = Runner::new(InspectorConfig::default());
        let summary = runner
            .stream(&path, Some(2), &CancellationToken::new())
            .unwrap();
        match summary {
            Summary::Streamed { samples, stats } => {
                assert_eq!(samples.len(), 2);
                assert_eq!(samples[1].1.angle.theta, 45.0);
                assert_eq!(stats.samples, 2);
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }
}
