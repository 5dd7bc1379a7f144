pub mod artifact;
pub mod config;
pub mod fulfillment;
pub mod identifiers;
pub mod mail;
pub mod metrics;
pub mod store;
pub mod testing;

pub use artifact::{
    ArtifactError, ArtifactGenerator, PdfArtifactGenerator, QrSymbolEncoder, Symbol,
    SymbolEncoder, TicketMetadata,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, FulfillmentConfig, PersistenceBackend, PersistenceConfig, RestConfig,
    SanitizedConfig, ServerConfig, SmtpConfig,
};
pub use fulfillment::{
    DeliveryReport, FulfillmentError, FulfillmentOrchestrator, FulfillmentOutcome,
    FulfillmentRequest, FulfillmentService, PendingDelivery,
};
pub use identifiers::{derive_ticket_code, derive_transaction_code, TicketCode, TransactionCode};
pub use mail::{Dispatcher, MailError, MailTransport, OutgoingMessage, SmtpMailTransport};
pub use store::{
    FulfillmentStore, RestFulfillmentStore, SqliteFulfillmentStore, StoreError, TicketRecord,
    TransactionRecord,
};
