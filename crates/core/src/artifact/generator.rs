//! File-backed artifact generation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::document::render_ticket;
use super::encoder::{QrSymbolEncoder, SymbolEncoder};
use super::error::ArtifactError;
use super::types::TicketMetadata;
use crate::identifiers::TicketCode;

/// Produces one deliverable per ticket.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    /// Renders the ticket and writes it to disk, returning the written path.
    ///
    /// Must not touch shared state beyond creating its own file.
    async fn generate(
        &self,
        code: &TicketCode,
        meta: &TicketMetadata,
    ) -> Result<PathBuf, ArtifactError>;
}

/// Renders tickets as PDF files under a fixed output directory.
pub struct PdfArtifactGenerator {
    output_dir: PathBuf,
    encoder: Arc<dyn SymbolEncoder>,
}

impl PdfArtifactGenerator {
    /// Creates a generator writing below `output_dir` with the given encoder.
    pub fn new(output_dir: impl Into<PathBuf>, encoder: Arc<dyn SymbolEncoder>) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoder,
        }
    }

    /// Creates a generator using the QR encoder.
    pub fn with_qr(output_dir: impl Into<PathBuf>) -> Self {
        Self::new(output_dir, Arc::new(QrSymbolEncoder::new()))
    }

    async fn write_durably(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ArtifactError::write(parent.to_path_buf(), e))?;
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| ArtifactError::write(path.to_path_buf(), e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| ArtifactError::write(path.to_path_buf(), e))?;
        file.sync_all()
            .await
            .map_err(|e| ArtifactError::write(path.to_path_buf(), e))?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactGenerator for PdfArtifactGenerator {
    async fn generate(
        &self,
        code: &TicketCode,
        meta: &TicketMetadata,
    ) -> Result<PathBuf, ArtifactError> {
        let path = meta.artifact_path(&self.output_dir);

        // Symbol encoding and layout are CPU-bound; keep them off the async workers.
        let encoder = Arc::clone(&self.encoder);
        let render_code = code.clone();
        let render_meta = meta.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            let symbol = encoder.encode(render_code.as_str())?;
            Ok::<_, ArtifactError>(render_ticket(&render_code, &render_meta, &symbol))
        })
        .await
        .map_err(|e| ArtifactError::TaskFailed(e.to_string()))??;

        Self::write_durably(&path, &bytes).await?;

        debug!(
            ticket = %code,
            path = %path.display(),
            bytes = bytes.len(),
            "Ticket artifact written"
        );
        Ok(path)
    }
}
