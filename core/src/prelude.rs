use serde::{Deserialize, Serialize};

/// Shared configuration for both pattern decoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Initial sample reservation for tabular exports.
    pub tabular_capacity_hint: usize,
    /// Upper bound applied to capacity hints declared inside a file.
    pub max_capacity_hint: usize,
    /// Emit a progress line every N data lines; zero disables it.
    pub log_progress_every: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            tabular_capacity_hint: 100_000,
            max_capacity_hint: 4 * 1024 * 1024,
            log_progress_every: 0,
        }
    }
}

impl DecoderConfig {
    /// Clamps a capacity declared by the file to the configured ceiling.
    pub fn clamp_hint(&self, declared: usize) -> usize {
        declared.min(self.max_capacity_hint)
    }
}

/// Coarse category of a [`PatternError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Data,
    Cancelled,
    Io,
}

/// Common error type for both decoders.
#[derive(thiserror::Error, Debug)]
pub enum PatternError {
    /// Structural violation: wrong banner, missing separator, missing header
    /// field, truncated section.
    #[error("format error{}: {message}", at_line(.line))]
    Format {
        line: Option<usize>,
        message: String,
    },
    /// A field is present but is not the expected numeric literal.
    #[error("data error{}: cannot parse {text:?} as {expected}", at_line(.line))]
    Data {
        line: Option<usize>,
        text: String,
        expected: &'static str,
    },
    #[error("read cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line}"),
        None => String::new(),
    }
}

impl PatternError {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::Format {
            line: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } => ErrorKind::Format,
            Self::Data { .. } => ErrorKind::Data,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Format and data errors are both reported as a bad-content failure.
    pub fn is_content_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format | ErrorKind::Data)
    }

    /// Attaches a line number to content errors raised by line-agnostic helpers.
    pub(crate) fn at(self, line: usize) -> Self {
        match self {
            Self::Format { line: None, message } => Self::Format {
                line: Some(line),
                message,
            },
            Self::Data {
                line: None,
                text,
                expected,
            } => Self::Data {
                line: Some(line),
                text,
                expected,
            },
            other => other,
        }
    }
}

pub type PatternResult<T> = Result<T, PatternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_line() {
        let e = PatternError::format(3, "missing separator line");
        assert_eq!(e.to_string(), "format error at line 3: missing separator line");
        assert_eq!(e.kind(), ErrorKind::Format);
        assert!(e.is_content_error());
    }

    #[test]
    fn data_error_line_is_attached_once() {
        let e = PatternError::Data {
            line: None,
            text: "1,5".into(),
            expected: "number",
        }
        .at(7)
        .at(9);
        assert_eq!(e.to_string(), "data error at line 7: cannot parse \"1,5\" as number");
    }

    #[test]
    fn cancellation_is_not_a_content_error() {
        assert!(!PatternError::Cancelled.is_content_error());
        assert_eq!(PatternError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn config_clamps_declared_hints() {
        let config = DecoderConfig {
            max_capacity_hint: 10,
            ..Default::default()
        };
        assert_eq!(config.clamp_hint(4), 4);
        assert_eq!(config.clamp_hint(1_000_000), 10);
    }
}
