use serde::Serialize;

/// Counters collected over one decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub lines: usize,
    pub samples: usize,
    pub blocks: usize,
    pub errors: usize,
}

/// Per-decode recorder; owned by the active decode and never shared.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: DecodeStats,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&mut self, line: usize) {
        self.inner.lines = self.inner.lines.max(line);
    }

    pub fn record_sample(&mut self) {
        self.inner.samples += 1;
    }

    pub fn record_block(&mut self) {
        self.inner.blocks += 1;
    }

    pub fn record_error(&mut self) {
        self.inner.errors += 1;
    }

    pub fn snapshot(&self) -> DecodeStats {
        self.inner
    }
}
