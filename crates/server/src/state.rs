use std::sync::Arc;
use std::time::Duration;
use tixmail_core::{Config, FulfillmentService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<FulfillmentService>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<FulfillmentService>) -> Self {
        Self { config, service }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &Arc<FulfillmentService> {
        &self.service
    }

    /// How long a request handler waits for its fulfillment, if bounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.config
            .fulfillment
            .request_timeout_secs
            .map(Duration::from_secs)
    }
}
