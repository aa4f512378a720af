use std::io::BufRead;
use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;

use crate::math::Vector3;
use crate::pattern::{drive, drive_async, LineConsumer};
use crate::prelude::{DecoderConfig, PatternError, PatternResult};
use crate::telemetry::{DecodeStats, LogManager, MetricsRecorder};

use super::machine::{Machine, Step};
use super::{FrequencyDescriptor, Pattern, SectionedSample};

/// Fully materialised Farfield Source file.
#[derive(Debug, Clone, Serialize)]
pub struct SectionedDataset {
    pub version: String,
    pub data_type: String,
    /// Phase centre position.
    pub position: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
    pub z_axis: Vector3,
    /// One pattern per frequency descriptor, in declaration order.
    pub patterns: Vec<Pattern>,
    pub stats: DecodeStats,
}

impl SectionedDataset {
    pub fn read<R: BufRead>(reader: R) -> PatternResult<Self> {
        SectionedDecoder::default().read(reader)
    }

    pub async fn load_reader<R: AsyncBufRead + Unpin>(
        reader: R,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        SectionedDecoder::default().load_reader(reader, cancel).await
    }

    pub async fn load_stream<S: AsyncRead + Unpin>(
        stream: S,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        SectionedDecoder::default().load_stream(stream, cancel).await
    }

    pub async fn load_path(
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        SectionedDecoder::default().load_path(path, cancel).await
    }

    pub fn frequencies(&self) -> impl Iterator<Item = &FrequencyDescriptor> {
        self.patterns.iter().map(|p| &p.frequency)
    }

    /// Pattern whose descriptor frequency equals `hz` exactly.
    pub fn pattern_for_frequency(&self, hz: f64) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.frequency.frequency == hz)
    }

    pub fn sample_count(&self) -> usize {
        self.patterns.iter().map(|p| p.samples.len()).sum()
    }
}

/// Sectioned decoder entry points carrying a [`DecoderConfig`].
#[derive(Debug, Clone, Default)]
pub struct SectionedDecoder {
    config: DecoderConfig,
}

impl SectionedDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn read<R: BufRead>(&self, reader: R) -> PatternResult<SectionedDataset> {
        drive(reader, Collector::new(&self.config))
    }

    pub async fn load_reader<R: AsyncBufRead + Unpin>(
        &self,
        reader: R,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<SectionedDataset> {
        drive_async(reader, cancel, Collector::new(&self.config)).await
    }

    pub async fn load_stream<S: AsyncRead + Unpin>(
        &self,
        stream: S,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<SectionedDataset> {
        self.load_reader(BufReader::new(stream), cancel).await
    }

    pub async fn load_path(
        &self,
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<SectionedDataset> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        self.load_stream(file, cancel).await
    }
}

/// Accumulates machine output into patterns.
struct Collector {
    machine: Machine,
    patterns: Vec<Pattern>,
    values: Vec<SectionedSample>,
    metrics: MetricsRecorder,
}

impl Collector {
    fn new(config: &DecoderConfig) -> Self {
        let logger = LogManager::new("ffs").with_progress(config.log_progress_every);
        Self {
            machine: Machine::new(config, logger),
            patterns: Vec::new(),
            values: Vec::new(),
            metrics: MetricsRecorder::new(),
        }
    }

    fn apply(&mut self, step: Step) -> PatternResult<()> {
        match step {
            Step::Continue => {}
            Step::BlockStart => {
                self.values = Vec::with_capacity(self.machine.sample_hint);
            }
            Step::Sample(sample) => {
                self.values.push(sample);
                self.metrics.record_sample();
            }
            Step::BlockEnd => {
                // Blocks pair with descriptors strictly by position.
                let index = self.patterns.len();
                let frequency = *self.machine.descriptors.get(index).ok_or_else(|| {
                    PatternError::missing(format!(
                        "sample block {} has no matching frequency descriptor",
                        index + 1
                    ))
                })?;
                let samples = std::mem::take(&mut self.values);
                self.machine.logger().section(
                    self.metrics.snapshot().lines,
                    &format!("end of block {} ({} samples)", index + 1, samples.len()),
                );
                self.patterns.push(Pattern { frequency, samples });
                self.metrics.record_block();
            }
        }
        Ok(())
    }
}

impl LineConsumer for Collector {
    type Output = SectionedDataset;

    fn push_line(&mut self, line_no: usize, line: &str) -> PatternResult<()> {
        self.metrics.record_line(line_no);
        self.machine.logger().progress(line_no);
        let step = self.machine.step(line_no, Some(line))?;
        self.apply(step)
    }

    fn finish(mut self, lines_read: usize) -> PatternResult<SectionedDataset> {
        let step = self.machine.step(lines_read, None)?;
        self.apply(step)?;

        let mut machine = self.machine;
        let declared = machine.descriptors.len();
        if self.patterns.len() != declared {
            return Err(PatternError::missing(format!(
                "{declared} frequency descriptors declared but {} sample blocks found",
                self.patterns.len()
            )));
        }

        let dataset = SectionedDataset {
            version: machine
                .version
                .take()
                .ok_or_else(|| PatternError::missing("missing version"))?,
            data_type: machine
                .data_type
                .take()
                .ok_or_else(|| PatternError::missing("missing data type"))?,
            position: machine
                .position
                .ok_or_else(|| PatternError::missing("missing position"))?,
            x_axis: machine
                .x_axis
                .ok_or_else(|| PatternError::missing("missing xAxis"))?,
            y_axis: machine
                .y_axis
                .ok_or_else(|| PatternError::missing("missing yAxis"))?,
            z_axis: machine
                .z_axis
                .ok_or_else(|| PatternError::missing("missing zAxis"))?,
            patterns: self.patterns,
            stats: self.metrics.snapshot(),
        };
        machine.logger().record(&format!(
            "decoded {} patterns, {} samples from {} lines",
            dataset.patterns.len(),
            dataset.sample_count(),
            lines_read
        ));
        Ok(dataset)
    }
}
