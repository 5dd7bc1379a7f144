//! Testing utilities and substitutable fakes for the external collaborators.
//!
//! These let the fulfillment contracts be exercised without a database,
//! an SMTP relay, or a real renderer failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use tixmail_core::testing::{FlakyArtifactGenerator, MockStore, MockTransport};
//!
//! let store = Arc::new(MockStore::new());
//! let transport = Arc::new(MockTransport::new());
//! let generator = FlakyArtifactGenerator::new(PdfArtifactGenerator::with_qr(dir))
//!     .failing_on([2]);
//!
//! // ... run a fulfillment ...
//! assert_eq!(store.tickets().len(), 2);
//! assert_eq!(transport.sent_messages().len(), 1);
//! ```

mod flaky_generator;
mod mock_store;
mod mock_transport;

pub use flaky_generator::FlakyArtifactGenerator;
pub use mock_store::MockStore;
pub use mock_transport::{MockTransport, SentMessage};
