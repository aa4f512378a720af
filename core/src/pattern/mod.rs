pub mod angle;
pub mod field;
pub mod sectioned;
pub mod tabular;

use std::io::BufRead;

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

use crate::prelude::PatternResult;
use crate::text::lines::{AsyncLineReader, LineReader};

pub use angle::AngleCoordinate;
pub use field::ComplexField;
pub use sectioned::{
    FrequencyDescriptor, Pattern, SampleIter, SectionedDataset, SectionedDecoder, SectionedSample,
};
pub use tabular::{HeaderUnits, TabularDataset, TabularDecoder, TabularSample};

/// A decoder state machine consuming one physical line at a time.
pub(crate) trait LineConsumer {
    type Output;

    fn push_line(&mut self, line_no: usize, line: &str) -> PatternResult<()>;

    /// Called once at end of stream.
    fn finish(self, lines_read: usize) -> PatternResult<Self::Output>;
}

pub(crate) fn drive<R: BufRead, C: LineConsumer>(
    reader: R,
    mut consumer: C,
) -> PatternResult<C::Output> {
    let mut lines = LineReader::new(reader);
    while let Some((line_no, line)) = lines.next_line()? {
        consumer.push_line(line_no, line)?;
    }
    consumer.finish(lines.line_no())
}

pub(crate) async fn drive_async<R, C>(
    reader: R,
    cancel: Option<&CancellationToken>,
    mut consumer: C,
) -> PatternResult<C::Output>
where
    R: AsyncBufRead + Unpin,
    C: LineConsumer,
{
    let mut lines = AsyncLineReader::new(reader, cancel);
    while let Some((line_no, line)) = lines.next_line().await? {
        consumer.push_line(line_no, line)?;
    }
    consumer.finish(lines.line_no())
}
