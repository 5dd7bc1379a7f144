//! End-to-end fulfillment: generate, record, deliver.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::error::FulfillmentError;
use super::orchestrator::FulfillmentOrchestrator;
use super::types::{DeliveryReport, FulfillmentRequest};
use crate::artifact::ArtifactGenerator;
use crate::config::FulfillmentConfig;
use crate::mail::Dispatcher;
use crate::metrics::{FULFILLMENTS_TOTAL, FULFILLMENT_DURATION};
use crate::store::FulfillmentStore;

/// Wires the orchestrator to the dispatcher.
pub struct FulfillmentService {
    orchestrator: FulfillmentOrchestrator,
    dispatcher: Dispatcher,
    store: Arc<dyn FulfillmentStore>,
    config: FulfillmentConfig,
}

impl FulfillmentService {
    pub fn new(
        config: FulfillmentConfig,
        store: Arc<dyn FulfillmentStore>,
        generator: Arc<dyn ArtifactGenerator>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            orchestrator: FulfillmentOrchestrator::new(Arc::clone(&store), generator),
            dispatcher,
            store,
            config,
        }
    }

    /// Validates the request, produces its tickets and emails them.
    ///
    /// Missing tickets do not fail the call; the report shows how many
    /// were delivered. A dispatch failure leaves generated files on disk.
    pub async fn fulfill_and_dispatch(
        &self,
        request: &FulfillmentRequest,
    ) -> Result<DeliveryReport, FulfillmentError> {
        let start = Instant::now();
        let result = self.run(request).await;

        let label = match &result {
            Ok(_) => "delivered",
            Err(e) if e.is_client_error() => "rejected",
            Err(_) => "failed",
        };
        FULFILLMENTS_TOTAL.with_label_values(&[label]).inc();
        FULFILLMENT_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn run(&self, request: &FulfillmentRequest) -> Result<DeliveryReport, FulfillmentError> {
        request.validate(self.config.max_tickets_per_request)?;

        let outcome = self.orchestrator.fulfill(request).await?;
        if outcome.attachments.is_empty() {
            warn!(
                transaction = %outcome.transaction_code,
                "No tickets were generated; sending email without attachments"
            );
        }

        let subject = format!("{}{}", self.config.email_subject_prefix, request.event_id);
        self.dispatcher
            .dispatch_email(
                &request.email,
                &subject,
                &self.config.email_body,
                &outcome.attachments,
            )
            .await
            .inspect_err(|e| {
                warn!(
                    transaction = %outcome.transaction_code,
                    error = %e,
                    artifacts = outcome.attachments.len(),
                    "Dispatch failed; artifacts left on disk"
                )
            })?;

        if let Err(e) = self.store.mark_delivered(&outcome.transaction_code).await {
            warn!(transaction = %outcome.transaction_code, error = %e, "Failed to flag transaction as delivered");
        }

        let batch_dir: PathBuf = self
            .config
            .output_dir
            .join(outcome.transaction_code.as_str());
        if let Err(e) = tokio::fs::remove_dir(&batch_dir).await {
            debug!(path = %batch_dir.display(), error = %e, "Batch directory not removed");
        }

        let report = DeliveryReport {
            transaction_code: outcome.transaction_code,
            requested: outcome.requested,
            delivered: outcome.attachments.len() as u32,
        };
        info!(
            transaction = %report.transaction_code,
            requested = report.requested,
            delivered = report.delivered,
            "Fulfillment complete"
        );
        Ok(report)
    }

    /// Runs [`Self::fulfill_and_dispatch`] on a background task and returns
    /// a handle that resolves once with its result.
    pub fn spawn(self: &Arc<Self>, request: FulfillmentRequest) -> PendingDelivery {
        let (tx, rx) = oneshot::channel();
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let result = service.fulfill_and_dispatch(&request).await;
            if tx.send(result).is_err() {
                debug!("Fulfillment result dropped; caller stopped waiting");
            }
        });
        PendingDelivery { rx }
    }
}

/// Single-assignment result of a background fulfillment.
#[derive(Debug)]
pub struct PendingDelivery {
    rx: oneshot::Receiver<Result<DeliveryReport, FulfillmentError>>,
}

impl PendingDelivery {
    /// Waits for the result, optionally bounded by `timeout`.
    ///
    /// A timeout only stops the wait; the background job runs to completion.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<DeliveryReport, FulfillmentError> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| FulfillmentError::TimedOut(limit))?,
            None => self.rx.await,
        };

        received.map_err(|_| {
            FulfillmentError::TaskFailed("background task ended without a result".to_string())
        })?
    }
}
