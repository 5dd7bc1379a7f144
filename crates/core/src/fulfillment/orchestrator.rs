//! Fan-out/fan-in of per-ticket artifact generation.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::error::{FulfillmentError, TicketTaskError};
use super::types::{FulfillmentOutcome, FulfillmentRequest, TicketFailure};
use crate::artifact::{ArtifactGenerator, TicketMetadata};
use crate::identifiers::{derive_ticket_code, derive_transaction_code};
use crate::metrics::{STORE_OPERATIONS, TICKETS_FAILED, TICKETS_GENERATED};
use crate::store::{FulfillmentStore, TicketRecord, TransactionRecord};

/// Records a transaction, then produces its tickets concurrently.
pub struct FulfillmentOrchestrator {
    store: Arc<dyn FulfillmentStore>,
    generator: Arc<dyn ArtifactGenerator>,
}

impl FulfillmentOrchestrator {
    pub fn new(store: Arc<dyn FulfillmentStore>, generator: Arc<dyn ArtifactGenerator>) -> Self {
        Self { store, generator }
    }

    /// Runs one fulfillment.
    ///
    /// Fails only if the transaction record cannot be stored. Individual
    /// tickets that fail are logged and left out of the returned
    /// attachments; the call waits for every ticket task before returning.
    pub async fn fulfill(
        &self,
        request: &FulfillmentRequest,
    ) -> Result<FulfillmentOutcome, FulfillmentError> {
        let transaction_code = derive_transaction_code(
            &request.event_id,
            request.ticket_quantity,
            &request.email,
            Utc::now(),
        );

        let record = TransactionRecord::new(
            transaction_code.clone(),
            &request.email,
            request.ticket_quantity,
        );
        let inserted = self.store.insert_transaction(&record).await;
        STORE_OPERATIONS
            .with_label_values(&["insert_transaction", result_label(&inserted)])
            .inc();
        inserted.map_err(FulfillmentError::Transaction)?;

        info!(
            transaction = %transaction_code,
            event_id = %request.event_id,
            quantity = request.ticket_quantity,
            "Transaction recorded, generating tickets"
        );

        let mut tasks = JoinSet::new();
        for index in 1..=request.ticket_quantity {
            let store = Arc::clone(&self.store);
            let generator = Arc::clone(&self.generator);
            let meta = request.ticket_metadata(&transaction_code, index);
            tasks.spawn(async move {
                let result = Self::fulfill_ticket(store.as_ref(), generator.as_ref(), &meta).await;
                (index, result)
            });
        }

        let mut attachments = Vec::with_capacity(request.ticket_quantity as usize);
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(path))) => {
                    TICKETS_GENERATED.inc();
                    attachments.push(path);
                }
                Ok((index, Err(e))) => {
                    TICKETS_FAILED.with_label_values(&[e.stage()]).inc();
                    warn!(
                        transaction = %transaction_code,
                        index = index,
                        error = %e,
                        "Ticket left out of batch"
                    );
                    failures.push(TicketFailure {
                        index: Some(index),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(transaction = %transaction_code, error = %e, "Ticket task died");
                    TICKETS_FAILED.with_label_values(&["task"]).inc();
                    failures.push(TicketFailure {
                        index: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            transaction = %transaction_code,
            generated = attachments.len(),
            failed = failures.len(),
            "Ticket generation finished"
        );

        Ok(FulfillmentOutcome {
            transaction_code,
            requested: request.ticket_quantity,
            attachments,
            failures,
        })
    }

    /// Generates one artifact and records it. The record is written only
    /// after the artifact is on disk; if recording fails the artifact is
    /// removed so it cannot be mailed.
    async fn fulfill_ticket(
        store: &dyn FulfillmentStore,
        generator: &dyn ArtifactGenerator,
        meta: &TicketMetadata,
    ) -> Result<PathBuf, TicketTaskError> {
        let code = derive_ticket_code(&meta.transaction_code, meta.index);
        let path = generator.generate(&code, meta).await?;

        let record = TicketRecord::new(code, &meta.event_id, meta.transaction_code.clone());
        let inserted = store.insert_ticket(&record).await;
        STORE_OPERATIONS
            .with_label_values(&["insert_ticket", result_label(&inserted)])
            .inc();
        if let Err(source) = inserted {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(path = %path.display(), error = %e, "Failed to remove unrecorded artifact");
            }
            return Err(TicketTaskError::Record { path, source });
        }

        Ok(path)
    }
}

fn result_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::PdfArtifactGenerator;
    use crate::store::StoreError;
    use crate::testing::{FlakyArtifactGenerator, MockStore};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn request(quantity: u32) -> FulfillmentRequest {
        FulfillmentRequest {
            email: "a@b.com".to_string(),
            event_id: "EVT1".to_string(),
            ticket_quantity: quantity,
            venue: "Hall".to_string(),
            date: "2025-01-01".to_string(),
            event_name: "Launch".to_string(),
            user_name: "Ann".to_string(),
        }
    }

    fn orchestrator(
        dir: &TempDir,
        store: Arc<MockStore>,
        failing: &[u32],
    ) -> FulfillmentOrchestrator {
        let generator = FlakyArtifactGenerator::new(PdfArtifactGenerator::with_qr(dir.path()))
            .failing_on(failing.iter().copied());
        FulfillmentOrchestrator::new(store, Arc::new(generator))
    }

    #[tokio::test]
    async fn test_all_tickets_generated_and_recorded() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let orch = orchestrator(&dir, Arc::clone(&store), &[]);

        let outcome = orch.fulfill(&request(3)).await.unwrap();

        assert_eq!(outcome.requested, 3);
        assert_eq!(outcome.attachments.len(), 3);
        assert!(outcome.failures.is_empty());
        assert!(outcome.attachments.iter().all(|p| p.exists()));

        let names: HashSet<String> = outcome
            .attachments
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        let expected: HashSet<String> = (1..=3).map(|i| format!("EVT1_ticket_{}.pdf", i)).collect();
        assert_eq!(names, expected);

        let transactions = store.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].ticket_quantity, 3);

        let tickets = store.tickets();
        assert_eq!(tickets.len(), 3);
        let codes: HashSet<&str> = tickets.iter().map(|t| t.ticket_code.as_str()).collect();
        assert_eq!(codes.len(), 3);
        assert!(tickets
            .iter()
            .all(|t| t.transaction_code == outcome.transaction_code && !t.scanned));
    }

    #[tokio::test]
    async fn test_single_ticket_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let orch = orchestrator(&dir, Arc::clone(&store), &[2]);

        let outcome = orch.fulfill(&request(3)).await.unwrap();

        assert_eq!(outcome.attachments.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, Some(2));
        assert_eq!(store.transactions()[0].ticket_quantity, 3);

        let tickets = store.tickets();
        assert_eq!(tickets.len(), 2);
        let missing = format!("{}-2", outcome.transaction_code);
        assert!(tickets.iter().all(|t| t.ticket_code.as_str() != missing));
    }

    #[tokio::test]
    async fn test_all_tickets_failing_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let orch = orchestrator(&dir, Arc::clone(&store), &[1, 2]);

        let outcome = orch.fulfill(&request(2)).await.unwrap();

        assert!(outcome.attachments.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(store.transactions().len(), 1);
        assert!(store.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_failure_aborts_before_ticket_work() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        store.fail_transactions(StoreError::Database("down".to_string()));
        let orch = orchestrator(&dir, Arc::clone(&store), &[]);

        let err = orch.fulfill(&request(3)).await.unwrap_err();

        assert!(matches!(err, FulfillmentError::Transaction(_)));
        assert!(store.tickets().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ticket_record_failure_drops_artifact() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        store.fail_ticket_index(1);
        let orch = orchestrator(&dir, Arc::clone(&store), &[]);

        let outcome = orch.fulfill(&request(2)).await.unwrap();

        assert_eq!(outcome.attachments.len(), 1);
        assert_eq!(outcome.failures[0].index, Some(1));
        let dropped = dir
            .path()
            .join(outcome.transaction_code.as_str())
            .join("EVT1_ticket_1.pdf");
        assert!(!dropped.exists());
        assert_eq!(store.tickets().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_requests_mint_distinct_transactions() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let orch = orchestrator(&dir, Arc::clone(&store), &[]);

        let first = orch.fulfill(&request(1)).await.unwrap();
        let second = orch.fulfill(&request(1)).await.unwrap();

        assert_ne!(first.transaction_code, second.transaction_code);
        assert_eq!(store.transactions().len(), 2);
    }
}
