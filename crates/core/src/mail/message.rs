//! Typed multipart/mixed message and its wire encoder.
//!
//! Wire layout (CRLF line endings):
//!
//! ```text
//! From: <sender>
//! MIME-Version: 1.0
//! To: <recipient>
//! Subject: <subject>
//! Content-Type: multipart/mixed; boundary=<boundary>
//!
//! --<boundary>
//! Content-Type: text/plain; charset=utf-8
//!
//! <body>
//!
//! --<boundary>
//! Content-Type: application/pdf; name="<file>"
//! Content-Transfer-Encoding: base64
//! Content-Disposition: attachment; filename="<file>"
//!
//! <base64, 76 columns>
//! --<boundary>--
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::error::MailError;

/// Bytes read from an attachment per step. A multiple of 57 so every
/// full chunk encodes to whole 76-character lines without padding.
pub const BASE64_CHUNK_SIZE: usize = 57 * 64;

const LINE_BYTES: usize = 57;

/// One body part of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// Inline UTF-8 text.
    Text(String),
    /// A file streamed from disk and base64 encoded.
    Attachment {
        path: PathBuf,
        filename: String,
        content_type: String,
    },
}

impl MessagePart {
    /// A PDF attachment named after the file's last path component.
    pub fn pdf(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment.pdf".to_string());
        Self::Attachment {
            path,
            filename,
            content_type: "application/pdf".to_string(),
        }
    }
}

/// A multipart/mixed message addressed to one recipient.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub boundary: String,
    pub parts: Vec<MessagePart>,
}

/// Random boundary token, e.g. `----1a2b3c4d`.
pub fn generate_boundary() -> String {
    format!("----{:x}", rand::thread_rng().gen_range(0..10_000_000_000u64))
}

impl OutgoingMessage {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            boundary: generate_boundary(),
            parts: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.parts.push(MessagePart::Text(body.into()));
        self
    }

    pub fn with_attachment(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Paths of all attachment parts, in message order.
    pub fn attachment_paths(&self) -> impl Iterator<Item = &Path> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::Attachment { path, .. } => Some(path.as_path()),
            MessagePart::Text(_) => None,
        })
    }

    /// Serializes the message. Any attachment that cannot be read fails
    /// the whole assembly.
    pub async fn assemble(&self) -> Result<Vec<u8>, MailError> {
        let mut out = Vec::new();
        push_line(&mut out, &format!("From: {}", self.from));
        push_line(&mut out, "MIME-Version: 1.0");
        push_line(&mut out, &format!("To: {}", self.to));
        push_line(&mut out, &format!("Subject: {}", self.subject));
        push_line(
            &mut out,
            &format!("Content-Type: multipart/mixed; boundary={}", self.boundary),
        );

        for part in &self.parts {
            out.extend_from_slice(b"\r\n");
            push_line(&mut out, &format!("--{}", self.boundary));
            match part {
                MessagePart::Text(body) => {
                    push_line(&mut out, "Content-Type: text/plain; charset=utf-8");
                    out.extend_from_slice(b"\r\n");
                    push_line(&mut out, body);
                }
                MessagePart::Attachment {
                    path,
                    filename,
                    content_type,
                } => {
                    push_line(
                        &mut out,
                        &format!("Content-Type: {}; name=\"{}\"", content_type, filename),
                    );
                    push_line(&mut out, "Content-Transfer-Encoding: base64");
                    push_line(
                        &mut out,
                        &format!("Content-Disposition: attachment; filename=\"{}\"", filename),
                    );
                    out.extend_from_slice(b"\r\n");
                    encode_file(path, &mut out).await?;
                }
            }
        }

        out.extend_from_slice(b"\r\n");
        push_line(&mut out, &format!("--{}--", self.boundary));
        Ok(out)
    }
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Streams `path` into `out` as CRLF-separated base64 lines, one chunk at a time.
async fn encode_file(path: &Path, out: &mut Vec<u8>) -> Result<(), MailError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| MailError::attachment_read(path.to_path_buf(), e))?;

    let mut buffer = vec![0u8; BASE64_CHUNK_SIZE];
    let mut first_line = true;
    loop {
        let filled = fill_buffer(&mut file, &mut buffer)
            .await
            .map_err(|e| MailError::attachment_read(path.to_path_buf(), e))?;
        if filled == 0 {
            break;
        }

        for line in buffer[..filled].chunks(LINE_BYTES) {
            if !first_line {
                out.extend_from_slice(b"\r\n");
            }
            first_line = false;
            out.extend_from_slice(STANDARD.encode(line).as_bytes());
        }

        if filled < buffer.len() {
            break;
        }
    }
    Ok(())
}

/// Reads until `buffer` is full or EOF. Short reads would otherwise put
/// padding in the middle of the stream.
async fn fill_buffer(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
