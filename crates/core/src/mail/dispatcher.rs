//! Assemble, send, then clean up.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::MailError;
use super::message::{MessagePart, OutgoingMessage};
use super::transport::MailTransport;
use crate::metrics::{DISPATCH_FAILURES, EMAILS_SENT, MESSAGE_BYTES};

/// Delivers ticket artifacts as one multipart email.
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    sender: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, sender: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
        }
    }

    /// Sends `body` plus one PDF part per path, in the order given.
    ///
    /// On success every attachment is removed from disk (best effort).
    /// On any failure, nothing is removed.
    pub async fn dispatch_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<(), MailError> {
        let message = attachments.iter().fold(
            OutgoingMessage::new(&self.sender, to, subject).with_text(body),
            |message, path| message.with_attachment(MessagePart::pdf(path)),
        );
        self.dispatch(&message).await
    }

    /// Sends a prepared message and removes its attachment files afterwards.
    pub async fn dispatch(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        let sent = match message.assemble().await {
            Ok(raw) => self
                .transport
                .send(&message.from, &message.to, &raw)
                .await
                .map(|()| raw),
            Err(e) => Err(e),
        };
        let raw = sent.inspect_err(|e| {
            DISPATCH_FAILURES.with_label_values(&[e.reason()]).inc();
        })?;
        EMAILS_SENT.inc();
        MESSAGE_BYTES.with_label_values(&[]).observe(raw.len() as f64);

        info!(
            to = %message.to,
            transport = self.transport.name(),
            attachments = message.attachment_paths().count(),
            bytes = raw.len(),
            "Email sent"
        );

        for path in message.attachment_paths() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete attachment");
            }
        }

        Ok(())
    }
}
