//! Per-ticket artifact generation: QR symbol, PDF layout, file output.

mod document;
mod encoder;
mod error;
mod generator;
mod types;

pub use document::{render_ticket, PdfPage};
pub use encoder::{QrSymbolEncoder, SymbolEncoder};
pub use error::ArtifactError;
pub use generator::{ArtifactGenerator, PdfArtifactGenerator};
pub use types::{Symbol, TicketMetadata};
