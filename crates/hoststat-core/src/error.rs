//! Error types shared by the collector, the differencing engine and the session.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for parsing failures in `/proc` content.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Underlying cause of a failed counter read.
#[derive(Debug, Error)]
pub enum ReadFailure {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors returned by a sampling [`Session`](crate::Session) and its counter reader.
#[derive(Debug, Error)]
pub enum StatError {
    /// The counter subsystem could not be initialized. The session never opened.
    #[error("failed to initialize counter subsystem: {0}")]
    Init(String),

    /// `Session::open()` was called while another host session is active.
    #[error("a host sampling session is already open in this process")]
    AlreadyOpen,

    /// A sampling operation was attempted on a closed session.
    #[error("sampling session is not open")]
    NotOpen,

    /// A single counter read failed. The session stays usable.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ReadFailure,
    },

    /// A defined rate was demanded but the sample had no baseline
    /// or covered a zero-length interval.
    #[error("rate is undefined: no baseline sample or zero-length interval")]
    UndefinedRate,
}

impl StatError {
    /// Builds a [`StatError::Read`] for `path`.
    pub fn read(path: impl AsRef<Path>, source: impl Into<ReadFailure>) -> Self {
        StatError::Read {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Returns `true` if the error leaves the session usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StatError::Read { .. } | StatError::UndefinedRate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_message_names_path() {
        let err = StatError::read(
            "/proc/loadavg",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/proc/loadavg"));
        assert!(msg.contains("denied"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_parse_error_converts_to_read() {
        let err = StatError::read("/proc/stat", ParseError::new("missing aggregate cpu line"));
        match err {
            StatError::Read {
                source: ReadFailure::Parse(p),
                ..
            } => assert_eq!(p.message, "missing aggregate cpu line"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_terminal_errors() {
        assert!(!StatError::Init("no /proc".into()).is_recoverable());
        assert!(!StatError::NotOpen.is_recoverable());
        assert!(!StatError::AlreadyOpen.is_recoverable());
    }
}
