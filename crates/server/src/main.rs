use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tixmail_core::{
    load_config, load_config_from_env, validate_config, Config, Dispatcher, FulfillmentService,
    FulfillmentStore, MailTransport, PdfArtifactGenerator, PersistenceBackend,
    RestFulfillmentStore, SmtpMailTransport, SqliteFulfillmentStore,
};
use tixmail_server::api::create_router;
use tixmail_server::state::AppState;

/// Default config file, used when present and `TIXMAIL_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = read_config()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Persistence backend: {:?}", config.persistence.backend);
    info!("Ticket output directory: {:?}", config.fulfillment.output_dir);

    let store = create_store(&config)?;

    let transport: Arc<dyn MailTransport> = Arc::new(
        SmtpMailTransport::new(&config.smtp).context("Failed to create SMTP transport")?,
    );
    info!(
        "Mail transport: {} via {}:{}",
        transport.name(),
        config.smtp.host,
        config.smtp.port
    );

    let generator = Arc::new(PdfArtifactGenerator::with_qr(
        config.fulfillment.output_dir.clone(),
    ));
    let dispatcher = Dispatcher::new(transport, config.smtp.sender.clone());
    let service = Arc::new(FulfillmentService::new(
        config.fulfillment.clone(),
        store,
        generator,
        dispatcher,
    ));

    let state = Arc::new(AppState::new(config.clone(), service));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// An explicit `TIXMAIL_CONFIG` must exist. Without it, `config.toml` is
/// used if present and the environment alone otherwise.
fn read_config() -> Result<Config> {
    match std::env::var("TIXMAIL_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No config file found, loading configuration from environment");
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

fn create_store(config: &Config) -> Result<Arc<dyn FulfillmentStore>> {
    match config.persistence.backend {
        PersistenceBackend::Sqlite => {
            let store = SqliteFulfillmentStore::new(&config.persistence.path)
                .context("Failed to open SQLite store")?;
            info!("SQLite store initialized at {:?}", config.persistence.path);
            Ok(Arc::new(store))
        }
        PersistenceBackend::Rest => {
            let rest = config
                .persistence
                .rest
                .clone()
                .context("REST backend selected but no [persistence.rest] section provided")?;
            info!("Using REST store at {}", rest.url);
            let store = RestFulfillmentStore::new(rest).context("Failed to create REST store")?;
            Ok(Arc::new(store))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
