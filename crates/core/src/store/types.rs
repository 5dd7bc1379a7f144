//! Audit records persisted per transaction and per ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{TicketCode, TransactionCode};

/// One row per fulfillment request; written before any ticket work starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_code: TransactionCode,
    pub buyer_email: String,
    /// Quantity requested, regardless of how many tickets were produced.
    pub ticket_quantity: u32,
    /// Set once the delivery email was accepted by the relay.
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(
        transaction_code: TransactionCode,
        buyer_email: impl Into<String>,
        ticket_quantity: u32,
    ) -> Self {
        Self {
            transaction_code,
            buyer_email: buyer_email.into(),
            ticket_quantity,
            delivered: false,
            created_at: Utc::now(),
        }
    }
}

/// One row per successfully written ticket artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket_code: TicketCode,
    pub event_id: String,
    pub transaction_code: TransactionCode,
    /// Flipped by the entry scanner; always false at creation.
    pub scanned: bool,
    pub created_at: DateTime<Utc>,
}

impl TicketRecord {
    pub fn new(
        ticket_code: TicketCode,
        event_id: impl Into<String>,
        transaction_code: TransactionCode,
    ) -> Self {
        Self {
            ticket_code,
            event_id: event_id.into(),
            transaction_code,
            scanned: false,
            created_at: Utc::now(),
        }
    }
}
