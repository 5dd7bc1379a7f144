//! Ticket fulfillment: transaction bookkeeping, concurrent ticket
//! generation and delivery.

mod error;
mod orchestrator;
mod service;
mod types;

pub use error::{FulfillmentError, TicketTaskError};
pub use orchestrator::FulfillmentOrchestrator;
pub use service::{FulfillmentService, PendingDelivery};
pub use types::{DeliveryReport, FulfillmentOutcome, FulfillmentRequest, TicketFailure};
