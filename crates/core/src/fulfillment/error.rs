//! Error types for the fulfillment pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::mail::MailError;
use crate::store::StoreError;

/// Errors that fail a whole fulfillment request.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request is well-formed JSON but not acceptable.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The transaction record could not be stored; no ticket work was started.
    #[error("Failed to record transaction")]
    Transaction(#[source] StoreError),

    /// Assembling or sending the delivery email failed.
    #[error("Failed to dispatch email")]
    Dispatch(#[from] MailError),

    /// The background job ended without reporting a result.
    #[error("Fulfillment task failed: {0}")]
    TaskFailed(String),

    /// The caller stopped waiting; the background job keeps running.
    #[error("Fulfillment did not finish within {0:?}")]
    TimedOut(Duration),
}

impl FulfillmentError {
    /// Whether the caller, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Why a single ticket was left out of the batch.
#[derive(Debug, Error)]
pub enum TicketTaskError {
    #[error("Artifact generation failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Failed to record ticket for {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl TicketTaskError {
    /// Metric label for the step that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Artifact(_) => "artifact",
            Self::Record { .. } => "record",
        }
    }
}
