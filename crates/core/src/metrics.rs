//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Fulfillment (transactions, per-ticket outcomes, duration)
//! - Mail dispatch (sent messages, failures, message size)
//! - Persistence backend calls

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Fulfillment Metrics
// =============================================================================

/// Fulfillment requests total by result.
pub static FULFILLMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tixmail_fulfillments_total", "Total fulfillment requests"),
        &["result"], // "delivered", "rejected", "failed"
    )
    .unwrap()
});

/// End-to-end fulfillment duration in seconds.
pub static FULFILLMENT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tixmail_fulfillment_duration_seconds",
            "Duration of generate, record and dispatch",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Tickets generated and recorded.
pub static TICKETS_GENERATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tixmail_tickets_generated_total",
        "Tickets generated and recorded",
    )
    .unwrap()
});

/// Tickets left out of their batch.
pub static TICKETS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tixmail_tickets_failed_total",
            "Tickets left out of their batch",
        ),
        &["stage"], // "artifact", "record", "task"
    )
    .unwrap()
});

// =============================================================================
// Mail Metrics
// =============================================================================

/// Emails accepted by the transport.
pub static EMAILS_SENT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tixmail_emails_sent_total", "Emails accepted by the relay").unwrap()
});

/// Dispatch failures by stage.
pub static DISPATCH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tixmail_dispatch_failures_total", "Failed email dispatches"),
        &["reason"], // "attachment_read", "transport", "invalid_address"
    )
    .unwrap()
});

/// Assembled message size in bytes.
pub static MESSAGE_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tixmail_message_bytes", "Size of assembled messages")
            .buckets(prometheus::exponential_buckets(4096.0, 4.0, 8).unwrap_or_default()),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Persistence Metrics
// =============================================================================

/// Store calls by operation and result.
pub static STORE_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tixmail_store_operations_total", "Persistence gateway calls"),
        &["operation", "result"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Fulfillment
        Box::new(FULFILLMENTS_TOTAL.clone()),
        Box::new(FULFILLMENT_DURATION.clone()),
        Box::new(TICKETS_GENERATED.clone()),
        Box::new(TICKETS_FAILED.clone()),
        // Mail
        Box::new(EMAILS_SENT.clone()),
        Box::new(DISPATCH_FAILURES.clone()),
        Box::new(MESSAGE_BYTES.clone()),
        // Persistence
        Box::new(STORE_OPERATIONS.clone()),
    ]
}
