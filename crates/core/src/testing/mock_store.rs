//! In-memory fulfillment store for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::identifiers::TransactionCode;
use crate::store::{FulfillmentStore, StoreError, TicketRecord, TransactionRecord};

#[derive(Debug, Default)]
struct State {
    transactions: Vec<TransactionRecord>,
    tickets: Vec<TicketRecord>,
    transaction_error: Option<String>,
    failing_ticket_indices: HashSet<u32>,
}

/// Mock implementation of [`FulfillmentStore`].
///
/// Records every insert for assertions and can be told to fail the
/// transaction insert or the ticket insert for chosen ticket indices.
#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<State>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transaction insert fail with `error`'s message.
    pub fn fail_transactions(&self, error: StoreError) {
        self.lock().transaction_error = Some(error.to_string());
    }

    /// Make the ticket insert fail for ticket `index` of any transaction.
    pub fn fail_ticket_index(&self, index: u32) {
        self.lock().failing_ticket_indices.insert(index);
    }

    /// Recorded transactions, in insert order.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.lock().transactions.clone()
    }

    /// Recorded tickets, in insert order.
    pub fn tickets(&self) -> Vec<TicketRecord> {
        self.lock().tickets.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ticket_index(record: &TicketRecord) -> Option<u32> {
        record
            .ticket_code
            .as_str()
            .rsplit_once('-')
            .and_then(|(_, index)| index.parse().ok())
    }
}

#[async_trait]
impl FulfillmentStore for MockStore {
    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(message) = &state.transaction_error {
            return Err(StoreError::Database(message.clone()));
        }
        if state
            .transactions
            .iter()
            .any(|t| t.transaction_code == record.transaction_code)
        {
            return Err(StoreError::Conflict(record.transaction_code.to_string()));
        }
        state.transactions.push(record.clone());
        Ok(())
    }

    async fn insert_ticket(&self, record: &TicketRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        if Self::ticket_index(record).is_some_and(|i| state.failing_ticket_indices.contains(&i)) {
            return Err(StoreError::Database(format!(
                "injected failure for {}",
                record.ticket_code
            )));
        }
        if !state
            .transactions
            .iter()
            .any(|t| t.transaction_code == record.transaction_code)
        {
            return Err(StoreError::Database(format!(
                "unknown transaction {}",
                record.transaction_code
            )));
        }
        state.tickets.push(record.clone());
        Ok(())
    }

    async fn mark_delivered(&self, code: &TransactionCode) -> Result<(), StoreError> {
        let mut state = self.lock();
        let record = state
            .transactions
            .iter_mut()
            .find(|t| &t.transaction_code == code)
            .ok_or_else(|| StoreError::Database(format!("unknown transaction {}", code)))?;
        record.delivered = true;
        Ok(())
    }

    async fn get_transaction(
        &self,
        code: &TransactionCode,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .find(|t| &t.transaction_code == code)
            .cloned())
    }

    async fn list_tickets(&self, code: &TransactionCode) -> Result<Vec<TicketRecord>, StoreError> {
        Ok(self
            .lock()
            .tickets
            .iter()
            .filter(|t| &t.transaction_code == code)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::derive_ticket_code;

    #[tokio::test]
    async fn test_records_and_injected_failures() {
        let store = MockStore::new();
        let code = TransactionCode::from("abc".to_string());
        store
            .insert_transaction(&TransactionRecord::new(code.clone(), "a@b.com", 2))
            .await
            .unwrap();

        store.fail_ticket_index(2);
        let ok = TicketRecord::new(derive_ticket_code(&code, 1), "EVT1", code.clone());
        let bad = TicketRecord::new(derive_ticket_code(&code, 2), "EVT1", code.clone());

        assert!(store.insert_ticket(&ok).await.is_ok());
        assert!(store.insert_ticket(&bad).await.is_err());
        assert_eq!(store.list_tickets(&code).await.unwrap().len(), 1);

        store.mark_delivered(&code).await.unwrap();
        assert!(store.get_transaction(&code).await.unwrap().unwrap().delivered);
    }

    #[tokio::test]
    async fn test_transaction_failure_injection() {
        let store = MockStore::new();
        store.fail_transactions(StoreError::Database("down".to_string()));
        let record = TransactionRecord::new(TransactionCode::from("abc".to_string()), "a@b.com", 1);

        assert!(store.insert_transaction(&record).await.is_err());
        assert!(store.transactions().is_empty());
    }
}
