//! Recording mail transport for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::mail::{MailError, MailTransport};

/// A message captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub from: String,
    pub to: String,
    pub raw: Vec<u8>,
}

/// Mock implementation of [`MailTransport`].
///
/// Captures every accepted message; can be switched to fail all sends.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    failure: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with a transport error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.into());
    }

    /// Let sends succeed again.
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    /// Messages accepted so far.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, from: &str, to: &str, raw: &[u8]) -> Result<(), MailError> {
        if let Some(message) = self.failure.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(MailError::Transport(message));
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(SentMessage {
                from: from.to_string(),
                to: to.to_string(),
                raw: raw.to_vec(),
            });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
