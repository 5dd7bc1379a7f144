use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    pub smtp: SmtpConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Ticket generation and delivery settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FulfillmentConfig {
    /// Directory under which per-transaction artifact folders are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Upper bound on `ticket_quantity` for a single request.
    #[serde(default = "default_max_tickets")]
    pub max_tickets_per_request: u32,
    /// Prefix of the email subject; the event id is appended.
    #[serde(default = "default_subject_prefix")]
    pub email_subject_prefix: String,
    /// Plain-text body of the delivery email.
    #[serde(default = "default_email_body")]
    pub email_body: String,
    /// How long the HTTP handler waits for the background job (None = forever).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_tickets_per_request: default_max_tickets(),
            email_subject_prefix: default_subject_prefix(),
            email_body: default_email_body(),
            request_timeout_secs: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tickets")
}

fn default_max_tickets() -> u32 {
    100
}

fn default_subject_prefix() -> String {
    "QR Codes for Event ".to_string()
}

fn default_email_body() -> String {
    "Attached are your QR codes for the event".to_string()
}

/// Persistence gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// REST endpoint settings (required when backend = "rest")
    #[serde(default)]
    pub rest: Option<RestConfig>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            path: default_db_path(),
            rest: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tixmail.db")
}

/// Available persistence backends
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    #[default]
    Sqlite,
    Rest,
}

/// REST persistence endpoint (PostgREST-compatible)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestConfig {
    /// Base URL, e.g. "https://project.supabase.co"
    pub url: String,
    /// Access key sent as `apikey` and bearer token
    pub api_key: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    10
}

/// SMTP relay used for delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Envelope and header sender address
    pub sender: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub fulfillment: FulfillmentConfig,
    pub persistence: SanitizedPersistenceConfig,
    pub smtp: SanitizedSmtpConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPersistenceConfig {
    pub backend: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_url: Option<String>,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            fulfillment: config.fulfillment.clone(),
            persistence: SanitizedPersistenceConfig {
                backend: match config.persistence.backend {
                    PersistenceBackend::Sqlite => "sqlite".to_string(),
                    PersistenceBackend::Rest => "rest".to_string(),
                },
                path: config.persistence.path.clone(),
                rest_url: config.persistence.rest.as_ref().map(|r| r.url.clone()),
                api_key_configured: config
                    .persistence
                    .rest
                    .as_ref()
                    .is_some_and(|r| !r.api_key.is_empty()),
            },
            smtp: SanitizedSmtpConfig {
                host: config.smtp.host.clone(),
                port: config.smtp.port,
                sender: config.smtp.sender.clone(),
                credentials_configured: !config.smtp.password.is_empty(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[smtp]
host = "smtp.example.com"
sender = "tickets@example.com"
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.persistence.backend, PersistenceBackend::Sqlite);
        assert_eq!(config.persistence.path.to_str().unwrap(), "tixmail.db");
        assert_eq!(config.fulfillment.output_dir.to_str().unwrap(), "tickets");
        assert_eq!(config.fulfillment.max_tickets_per_request, 100);
        assert!(config.fulfillment.request_timeout_secs.is_none());
    }

    #[test]
    fn test_deserialize_missing_smtp_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rest_backend() {
        let toml = r#"
[smtp]
host = "smtp.example.com"
sender = "tickets@example.com"

[persistence]
backend = "rest"

[persistence.rest]
url = "https://db.example.com"
api_key = "service-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.persistence.backend, PersistenceBackend::Rest);
        let rest = config.persistence.rest.as_ref().unwrap();
        assert_eq!(rest.url, "https://db.example.com");
        assert_eq!(rest.timeout_secs, 10);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[smtp]
host = "smtp.example.com"
sender = "tickets@example.com"
username = "user"
password = "hunter2"

[persistence]
backend = "rest"

[persistence.rest]
url = "https://db.example.com"
api_key = "service-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("hunter2"));
        assert!(!json.contains("service-key"));
        assert!(sanitized.smtp.credentials_configured);
        assert!(sanitized.persistence.api_key_configured);
        assert_eq!(sanitized.persistence.backend, "rest");
    }
}
