//! Multipart message assembly and delivery.

mod dispatcher;
mod error;
mod message;
mod smtp;
mod transport;

pub use dispatcher::Dispatcher;
pub use error::MailError;
pub use message::{generate_boundary, MessagePart, OutgoingMessage, BASE64_CHUNK_SIZE};
pub use smtp::SmtpMailTransport;
pub use transport::MailTransport;
