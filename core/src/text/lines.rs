use std::io::BufRead;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::prelude::{PatternError, PatternResult};

fn strip_terminator(buf: &mut String) {
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
}

fn remap(err: std::io::Error, cancel: Option<&CancellationToken>) -> PatternError {
    match cancel {
        Some(token) if token.is_cancelled() => PatternError::Cancelled,
        _ => PatternError::Io(err),
    }
}

/// Blocking line source over any [`BufRead`].
///
/// Exactly one `read_line` call is made per returned line, so the underlying
/// reader is never asked for more than the caller consumes.
pub struct LineReader<R> {
    reader: R,
    buf: String,
    line_no: usize,
    cancel: Option<CancellationToken>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            cancel: None,
        }
    }

    pub fn set_cancellation(&mut self, cancel: Option<CancellationToken>) {
        self.cancel = cancel;
    }

    /// Number of the line most recently returned (1-based).
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next line with its 1-based number, `None` at end of stream.
    pub fn next_line(&mut self) -> PatternResult<Option<(usize, &str)>> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(PatternError::Cancelled);
        }
        self.buf.clear();
        let read = self
            .reader
            .read_line(&mut self.buf)
            .map_err(|e| remap(e, self.cancel.as_ref()))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        strip_terminator(&mut self.buf);
        Ok(Some((self.line_no, self.buf.as_str())))
    }
}

/// Cancellable asynchronous line source over any [`AsyncBufRead`].
pub struct AsyncLineReader<'c, R> {
    reader: R,
    buf: String,
    line_no: usize,
    cancel: Option<&'c CancellationToken>,
}

impl<'c, R: AsyncBufRead + Unpin> AsyncLineReader<'c, R> {
    pub fn new(reader: R, cancel: Option<&'c CancellationToken>) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            cancel,
        }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub async fn next_line(&mut self) -> PatternResult<Option<(usize, &str)>> {
        self.buf.clear();
        let read = match self.cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(PatternError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(PatternError::Cancelled),
                    read = self.reader.read_line(&mut self.buf) => read,
                }
            }
            None => self.reader.read_line(&mut self.buf).await,
        }
        .map_err(|e| remap(e, self.cancel))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        strip_terminator(&mut self.buf);
        Ok(Some((self.line_no, self.buf.as_str())))
    }
}
