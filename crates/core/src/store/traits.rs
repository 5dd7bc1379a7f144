use async_trait::async_trait;
use thiserror::Error;

use super::types::{TicketRecord, TransactionRecord};
use crate::identifiers::TransactionCode;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for transaction and ticket records.
///
/// Implementations must tolerate concurrent calls: every ticket task of a
/// batch inserts its own record in parallel.
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Persist the transaction record. Precondition for any ticket insert.
    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    /// Persist one ticket record.
    async fn insert_ticket(&self, record: &TicketRecord) -> Result<(), StoreError>;

    /// Flag the transaction as delivered.
    async fn mark_delivered(&self, code: &TransactionCode) -> Result<(), StoreError>;

    /// Fetch a transaction by code.
    async fn get_transaction(
        &self,
        code: &TransactionCode,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// List the tickets recorded for a transaction.
    async fn list_tickets(&self, code: &TransactionCode) -> Result<Vec<TicketRecord>, StoreError>;
}
