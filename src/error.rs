use std::path::PathBuf;

/// Errors produced while building or loading a document array profile index.
///
/// All errors are fatal: construction and loading never retry or partially
/// recover.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A named file could not be opened.
    #[error("could not open {path}: {source}")]
    InputMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file's size, magic, or header disagreed with expectations.
    #[error("{path}: {reason}")]
    InputShape { path: PathBuf, reason: String },

    /// An internal assertion failed; the input that produced it is corrupt.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A read or write returned a short count.
    #[error("I/O failure on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn input_missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::InputMissing {
            path: path.into(),
            source,
        }
    }

    pub fn input_shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InputShape {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Error::InvariantViolation(reason.into())
    }

    pub fn io_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
