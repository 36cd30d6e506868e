//! Recoverable errors for configuration and result output.
//!
//! Device failures are not represented here: they are fatal and go through
//! [`device_check!`](crate::device_check).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("invalid {name}={value}: {reason}")]
    InvalidDimension {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },
    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },
    #[error("unknown profile '{0}'. Valid: quick, standard, thorough")]
    UnknownProfile(String),
    #[error("unknown kernel '{0}'. Valid: naive, online")]
    UnknownKernel(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
