//! Artifact generator wrapper that fails chosen ticket indices.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::artifact::{ArtifactError, ArtifactGenerator, TicketMetadata};
use crate::identifiers::TicketCode;

/// Delegates to an inner generator except for the configured indices,
/// which fail with an encoding error and write nothing.
pub struct FlakyArtifactGenerator<G> {
    inner: G,
    failing: HashSet<u32>,
}

impl<G: ArtifactGenerator> FlakyArtifactGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, indices: impl IntoIterator<Item = u32>) -> Self {
        self.failing.extend(indices);
        self
    }
}

#[async_trait]
impl<G: ArtifactGenerator> ArtifactGenerator for FlakyArtifactGenerator<G> {
    async fn generate(
        &self,
        code: &TicketCode,
        meta: &TicketMetadata,
    ) -> Result<PathBuf, ArtifactError> {
        if self.failing.contains(&meta.index) {
            return Err(ArtifactError::encoding(code.as_str(), "injected failure"));
        }
        self.inner.generate(code, meta).await
    }
}
