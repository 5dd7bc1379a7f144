//! SMTP delivery through `lettre`.

use async_trait::async_trait;
use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

use super::error::MailError;
use super::transport::MailTransport;
use crate::config::SmtpConfig;

/// Port on which the relay expects implicit TLS instead of STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Sends raw messages through an authenticated SMTP relay.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?
        .port(config.port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn parse_address(raw: &str) -> Result<Address, MailError> {
        raw.parse::<Address>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", raw, e)))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, from: &str, to: &str, raw: &[u8]) -> Result<(), MailError> {
        let envelope = Envelope::new(
            Some(Self::parse_address(from)?),
            vec![Self::parse_address(to)?],
        )
        .map_err(|e| MailError::InvalidAddress(e.to_string()))?;

        let response = self
            .transport
            .send_raw(&envelope, raw)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!(to = to, code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
