use patterncore::math::Interval;
use patterncore::telemetry::DecodeStats;
use patterncore::{FrequencyDescriptor, SectionedDataset, SectionedSample, TabularDataset};
use serde::Serialize;
use std::fmt;

/// Per-frequency digest of a sectioned file.
#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub frequency: FrequencyDescriptor,
    pub samples: usize,
    pub peak_abs_db: Option<f64>,
}

/// What the inspector prints for one decoded file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Summary {
    Tabular {
        samples: usize,
        theta_range: Option<Interval>,
        phi_range: Option<Interval>,
        peak_directivity_db: Option<f64>,
        stats: DecodeStats,
    },
    Sectioned {
        version: String,
        data_type: String,
        patterns: Vec<PatternSummary>,
        stats: DecodeStats,
    },
    Streamed {
        samples: Vec<(FrequencyDescriptor, SectionedSample)>,
        stats: DecodeStats,
    },
}

fn peak(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |best, v| match best {
        Some(b) if b >= v => Some(b),
        _ => Some(v),
    })
}

impl Summary {
    pub fn from_tabular(dataset: &TabularDataset) -> Self {
        Self::Tabular {
            samples: dataset.len(),
            theta_range: dataset.theta_range,
            phi_range: dataset.phi_range,
            peak_directivity_db: peak(dataset.samples.iter().map(|s| s.directivity_db())),
            stats: dataset.stats,
        }
    }

    pub fn from_sectioned(dataset: &SectionedDataset) -> Self {
        Self::Sectioned {
            version: dataset.version.clone(),
            data_type: dataset.data_type.clone(),
            patterns: dataset
                .patterns
                .iter()
                .map(|p| PatternSummary {
                    frequency: p.frequency,
                    samples: p.samples.len(),
                    peak_abs_db: peak(p.samples.iter().map(|s| s.abs_db())),
                })
                .collect(),
            stats: dataset.stats,
        }
    }
}

fn range(interval: &Option<Interval>) -> String {
    match interval {
        Some(i) => format!("{:.2}..{:.2} deg", i.min, i.max),
        None => "empty".to_string(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Tabular {
                samples,
                theta_range,
                phi_range,
                peak_directivity_db,
                stats,
            } => {
                writeln!(f, "tabular pattern: {} samples ({} lines)", samples, stats.lines)?;
                writeln!(f, "  theta {}", range(theta_range))?;
                writeln!(f, "  phi   {}", range(phi_range))?;
                if let Some(db) = peak_directivity_db {
                    writeln!(f, "  peak directivity {:.3} dBi", db)?;
                }
                Ok(())
            }
            Summary::Sectioned {
                version,
                data_type,
                patterns,
                stats,
            } => {
                writeln!(
                    f,
                    "farfield source v{} ({}): {} patterns ({} lines)",
                    version,
                    data_type,
                    patterns.len(),
                    stats.lines
                )?;
                for p in patterns {
                    write!(
                        f,
                        "  {:.6e} Hz: {} samples, radiated {:.4e} W",
                        p.frequency.frequency, p.samples, p.frequency.radiated
                    )?;
                    match p.peak_abs_db {
                        Some(db) => writeln!(f, ", peak {:.3} dB", db)?,
                        None => writeln!(f)?,
                    }
                }
                Ok(())
            }
            Summary::Streamed { samples, stats } => {
                writeln!(
                    f,
                    "first {} samples ({} lines read)",
                    samples.len(),
                    stats.lines
                )?;
                for (frequency, sample) in samples {
                    writeln!(
                        f,
                        "  {:.6e} Hz  theta {:8.3}  phi {:8.3}  |E| {:.4e}",
                        frequency.frequency,
                        sample.angle.theta,
                        sample.angle.phi,
                        sample.abs()
                    )?;
                }
                Ok(())
            }
        }
    }
}
