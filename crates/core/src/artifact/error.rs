//! Error types for artifact generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a ticket artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The ticket code could not be encoded as a QR symbol.
    #[error("Failed to encode symbol for {code}: {reason}")]
    Encoding { code: String, reason: String },

    /// The rendered document could not be written to disk.
    #[error("Failed to write artifact {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking render task died before producing a document.
    #[error("Render task failed: {0}")]
    TaskFailed(String),
}

impl ArtifactError {
    /// Creates an encoding error.
    pub fn encoding(code: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encoding {
            code: code.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a write error.
    pub fn write(path: PathBuf, source: std::io::Error) -> Self {
        Self::Write { path, source }
    }
}
