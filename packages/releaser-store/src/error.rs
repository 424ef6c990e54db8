use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used at the HTTP and CLI boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed caller input.
    Validation,
    /// No record under the requested key.
    NotFound,
    /// Unexpected I/O or parse failure in the backing store.
    Storage,
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("{0}")]
    Validation(String),

    #[error("Release not found: {key}")]
    NotFound { key: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed release record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode release record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReleaseError {
    pub fn not_found(key: &str) -> Self {
        ReleaseError::NotFound {
            key: key.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReleaseError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::Validation(_) => ErrorKind::Validation,
            ReleaseError::NotFound { .. } => ErrorKind::NotFound,
            ReleaseError::Io { .. } | ReleaseError::Malformed { .. } | ReleaseError::Encode(_) => {
                ErrorKind::Storage
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, ReleaseError>;
