//! Error types for message assembly and delivery.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    /// An attachment could not be opened or read; nothing was sent.
    #[error("Failed to read attachment {path}")]
    AttachmentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The relay refused or failed to accept the message.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl MailError {
    pub fn attachment_read(path: PathBuf, source: std::io::Error) -> Self {
        Self::AttachmentRead { path, source }
    }

    /// Metric label for this failure.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AttachmentRead { .. } => "attachment_read",
            Self::InvalidAddress(_) => "invalid_address",
            Self::Transport(_) => "transport",
        }
    }
}
