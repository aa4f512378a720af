use log::{debug, info, warn};

/// Progress logger shared by the decoders; every message is prefixed with
/// the name of the format being decoded.
pub struct LogManager {
    source: &'static str,
    progress_every: usize,
}

impl LogManager {
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            progress_every: 0,
        }
    }

    pub fn with_progress(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.source, message);
    }

    pub fn section(&self, line: usize, name: &str) {
        debug!("{}: line {} enters {}", self.source, line, name);
    }

    pub fn ignored(&self, line: usize, text: &str) {
        warn!("{}: line {} ignored: {:?}", self.source, line, text);
    }

    pub fn clamped(&self, what: &str, declared: usize, used: usize) {
        warn!(
            "{}: declared {} {} exceeds limit, reserving {}",
            self.source, what, declared, used
        );
    }

    pub fn progress(&self, line: usize) {
        if self.progress_every > 0 && line % self.progress_every == 0 {
            debug!("{}: {} lines read", self.source, line);
        }
    }
}
