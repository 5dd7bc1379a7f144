//! Request and outcome types for the fulfillment pipeline.

use lettre::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::FulfillmentError;
use crate::artifact::TicketMetadata;
use crate::identifiers::TransactionCode;

/// A purchase to fulfill. Immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub email: String,
    pub event_id: String,
    pub ticket_quantity: u32,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub user_name: String,
}

impl FulfillmentRequest {
    /// Checks the request against the configured ticket cap.
    ///
    /// `email` must be a bare address the mail transport will accept, and
    /// `event_id` ends up in message headers, so neither may carry line
    /// breaks or quotes.
    pub fn validate(&self, max_tickets: u32) -> Result<(), FulfillmentError> {
        if self.email.parse::<Address>().is_err() {
            return Err(FulfillmentError::Validation(
                "email must be a valid address".to_string(),
            ));
        }
        if self.event_id.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "event_id cannot be empty".to_string(),
            ));
        }
        if self.event_id.chars().any(|c| c.is_control() || c == '"') {
            return Err(FulfillmentError::Validation(
                "event_id cannot contain quotes or control characters".to_string(),
            ));
        }
        if self.ticket_quantity == 0 {
            return Err(FulfillmentError::Validation(
                "ticket_quantity must be at least 1".to_string(),
            ));
        }
        if self.ticket_quantity > max_tickets {
            return Err(FulfillmentError::Validation(format!(
                "ticket_quantity cannot exceed {}",
                max_tickets
            )));
        }
        Ok(())
    }

    /// Display name for the event, falling back to its id.
    pub fn display_event_name(&self) -> &str {
        if self.event_name.is_empty() {
            &self.event_id
        } else {
            &self.event_name
        }
    }

    /// Metadata for ticket `index` of transaction `code`.
    pub fn ticket_metadata(&self, code: &TransactionCode, index: u32) -> TicketMetadata {
        TicketMetadata {
            transaction_code: code.clone(),
            index,
            event_id: self.event_id.clone(),
            event_name: self.display_event_name().to_string(),
            buyer_email: self.email.clone(),
            user_name: self.user_name.clone(),
            venue: self.venue.clone(),
            date: self.date.clone(),
        }
    }
}

/// A ticket that was not produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFailure {
    /// None when the task died before reporting its index.
    pub index: Option<u32>,
    pub reason: String,
}

/// Result of the fan-out/fan-in phase.
#[derive(Debug, Clone)]
pub struct FulfillmentOutcome {
    pub transaction_code: TransactionCode,
    pub requested: u32,
    /// Written and recorded artifacts, in completion order.
    pub attachments: Vec<PathBuf>,
    pub failures: Vec<TicketFailure>,
}

/// Summary of a delivered request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub transaction_code: TransactionCode,
    pub requested: u32,
    pub delivered: u32,
}

impl DeliveryReport {
    pub fn failed(&self) -> u32 {
        self.requested.saturating_sub(self.delivered)
    }
}
