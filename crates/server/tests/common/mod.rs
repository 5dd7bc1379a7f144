//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with fake persistence and mail transport injected, so the whole
//! generate-record-dispatch path runs without a database or SMTP relay.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tixmail_core::{
    testing::{FlakyArtifactGenerator, MockStore, MockTransport},
    Config, Dispatcher, FulfillmentConfig, FulfillmentService, PdfArtifactGenerator,
    PersistenceConfig, ServerConfig, SmtpConfig,
};

pub const SENDER: &str = "tickets@example.com";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_fulfillment() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/generate-qr", json!({
///         "email": "a@b.com", "event_id": "EVT1", "ticket_quantity": 2
///     })).await;
///
///     assert_eq!(response.status, 200);
///     assert_eq!(fixture.transport.sent_messages().len(), 1);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Records transactions and tickets
    pub store: Arc<MockStore>,
    /// Captures outgoing mail
    pub transport: Arc<MockTransport>,
    /// Holds the ticket output directory
    pub temp_dir: TempDir,
    /// Where PDFs are written
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Ticket indices whose artifact generation fails
    pub failing_tickets: Vec<u32>,
    pub max_tickets: u32,
    pub request_timeout_secs: Option<u64>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            failing_tickets: Vec::new(),
            max_tickets: 10,
            request_timeout_secs: Some(30),
        }
    }
}

impl TestConfig {
    pub fn failing_on(indices: &[u32]) -> Self {
        Self {
            failing_tickets: indices.to_vec(),
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("tickets");

        let store = Arc::new(MockStore::new());
        let transport = Arc::new(MockTransport::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            fulfillment: FulfillmentConfig {
                output_dir: output_dir.clone(),
                max_tickets_per_request: test_config.max_tickets,
                request_timeout_secs: test_config.request_timeout_secs,
                ..Default::default()
            },
            persistence: PersistenceConfig::default(),
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                username: "mailer".to_string(),
                password: "hunter2".to_string(),
                sender: SENDER.to_string(),
            },
        };

        let generator = FlakyArtifactGenerator::new(PdfArtifactGenerator::with_qr(&output_dir))
            .failing_on(test_config.failing_tickets.iter().copied());
        let service = Arc::new(FulfillmentService::new(
            config.fulfillment.clone(),
            store.clone(),
            Arc::new(generator),
            Dispatcher::new(transport.clone(), SENDER),
        ));

        let state = Arc::new(tixmail_server::state::AppState::new(config, service));
        let router = tixmail_server::api::create_router(state);

        Self {
            router,
            store,
            transport,
            temp_dir,
            output_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &body.to_string()).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .header("Origin", "https://shop.example.com")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a CORS preflight request.
    pub async fn preflight(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header("Origin", "https://shop.example.com")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }

    /// Files currently under the ticket output directory.
    pub fn artifacts_on_disk(&self) -> Vec<PathBuf> {
        walk(&self.output_dir)
    }
}

fn walk(dir: &std::path::Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(walk(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// An attachment pulled back out of a raw multipart message.
#[derive(Debug)]
pub struct DecodedAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Splits a raw message on its boundary and decodes every base64 part.
pub fn decode_attachments(raw: &[u8]) -> Vec<DecodedAttachment> {
    let raw = String::from_utf8(raw.to_vec()).expect("message is not UTF-8");
    let boundary = raw
        .lines()
        .find_map(|line| line.strip_prefix("Content-Type: multipart/mixed; boundary="))
        .expect("missing multipart boundary")
        .to_string();

    raw.split(&format!("--{}", boundary))
        .filter_map(|part| {
            let (headers, content) = part.split_once("\r\n\r\n")?;
            let filename = headers
                .lines()
                .find_map(|l| l.strip_prefix("Content-Disposition: attachment; filename=\""))?
                .trim_end_matches('"')
                .to_string();
            let bytes = STANDARD
                .decode(content.trim_end().replace("\r\n", ""))
                .expect("attachment is not valid base64");
            Some(DecodedAttachment { filename, bytes })
        })
        .collect()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
