use std::path::PathBuf;

use thiserror::Error;

use crate::envelope::EnvelopeError;

/// Errors raised while loading messages or writing results.
///
/// Threading itself cannot fail; these only come from the I/O around it.
#[derive(Debug, Error)]
pub enum ThreadingError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid message list in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to parse message {}: {source}", path.display())]
    Envelope {
        path: PathBuf,
        source: EnvelopeError,
    },
    #[error("failed to serialize threads: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ThreadingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ThreadingError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ThreadingError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn envelope(path: impl Into<PathBuf>, source: EnvelopeError) -> Self {
        ThreadingError::Envelope {
            path: path.into(),
            source,
        }
    }
}
