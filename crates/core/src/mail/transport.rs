use async_trait::async_trait;

use super::error::MailError;

/// Delivers an already-assembled RFC 5322 message to a single recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, from: &str, to: &str, raw: &[u8]) -> Result<(), MailError>;

    /// Name of this transport, for logs.
    fn name(&self) -> &'static str;
}
