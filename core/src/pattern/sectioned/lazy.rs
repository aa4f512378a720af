use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::prelude::{DecoderConfig, PatternResult};
use crate::telemetry::{DecodeStats, LogManager, MetricsRecorder};
use crate::text::lines::LineReader;

use super::machine::{Machine, Step};
use super::{FrequencyDescriptor, SectionedSample};

/// Lazy sequence of samples, each tagged with the descriptor of its block.
///
/// Each call to `next` reads only the lines up to the next sample. Version,
/// data type, position, axes and sample counts are walked over but neither
/// parsed nor required.
///
/// The sequence ends after the block belonging to the last declared
/// descriptor, without reading the rest of the input, or at end of stream.
/// The first error ends it as well.
pub struct SampleIter<R> {
    lines: LineReader<R>,
    machine: Machine,
    metrics: MetricsRecorder,
    done: bool,
}

impl SampleIter<BufReader<File>> {
    /// Opens `path`; the file is closed when the iterator is dropped.
    pub fn open(path: impl AsRef<Path>) -> PatternResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<S: Read> SampleIter<BufReader<S>> {
    pub fn from_stream(stream: S) -> Self {
        Self::new(BufReader::new(stream))
    }
}

impl<R: BufRead> SampleIter<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: &DecoderConfig) -> Self {
        let logger = LogManager::new("ffs-lazy").with_progress(config.log_progress_every);
        Self {
            lines: LineReader::new(reader),
            machine: Machine::new(config, logger).skip_auxiliary(),
            metrics: MetricsRecorder::new(),
            done: false,
        }
    }

    /// Checks `cancel` before every line read.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.lines.set_cancellation(Some(cancel));
        self
    }

    pub fn stats(&self) -> DecodeStats {
        self.metrics.snapshot()
    }

    /// Descriptors declared so far.
    pub fn frequencies(&self) -> &[FrequencyDescriptor] {
        &self.machine.descriptors
    }

    fn advance(&mut self) -> PatternResult<Option<(FrequencyDescriptor, SectionedSample)>> {
        loop {
            let (line_no, step) = match self.lines.next_line()? {
                Some((line_no, line)) => {
                    self.metrics.record_line(line_no);
                    self.machine.logger().progress(line_no);
                    (line_no, self.machine.step(line_no, Some(line))?)
                }
                None => {
                    let line_no = self.lines.line_no();
                    self.machine.step(line_no, None)?;
                    return Ok(None);
                }
            };
            match step {
                Step::Continue | Step::BlockStart => {}
                Step::Sample(sample) => {
                    // A block only starts when its descriptor exists.
                    if let Some(descriptor) = self.machine.active_descriptor() {
                        self.metrics.record_sample();
                        return Ok(Some((*descriptor, sample)));
                    }
                }
                Step::BlockEnd => {
                    self.metrics.record_block();
                    if self.machine.blocks_exhausted() {
                        self.machine.logger().record(&format!(
                            "all {} blocks produced by line {}",
                            self.machine.block_index, line_no
                        ));
                        return Ok(None);
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for SampleIter<R> {
    type Item = PatternResult<(FrequencyDescriptor, SectionedSample)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.metrics.record_error();
                Some(Err(err))
            }
        }
    }
}
