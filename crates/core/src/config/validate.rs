use super::{
    types::{Config, PersistenceBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Ticket cap is at least 1
/// - SMTP host and sender are set
/// - REST backend has url and api_key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.fulfillment.max_tickets_per_request == 0 {
        return Err(ConfigError::ValidationError(
            "fulfillment.max_tickets_per_request must be at least 1".to_string(),
        ));
    }

    if config.smtp.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "smtp.host cannot be empty".to_string(),
        ));
    }

    if config.smtp.sender.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "smtp.sender cannot be empty".to_string(),
        ));
    }

    if config.persistence.backend == PersistenceBackend::Rest {
        match &config.persistence.rest {
            Some(rest) if !rest.url.is_empty() && !rest.api_key.is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "persistence.rest.url and persistence.rest.api_key are required for the rest backend"
                        .to_string(),
                ))
            }
        }
    }

    Ok(())
}
