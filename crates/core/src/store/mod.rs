//! Persistence gateway for transaction and ticket records.

mod rest;
mod sqlite;
mod traits;
mod types;

pub use rest::RestFulfillmentStore;
pub use sqlite::SqliteFulfillmentStore;
pub use traits::{FulfillmentStore, StoreError};
pub use types::{TicketRecord, TransactionRecord};
