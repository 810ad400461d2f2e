//! Embedding provider capability.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;

/// Converts text into fixed-length vectors for nearest-neighbour search.
///
/// Failures must surface as [`RagError::EmbeddingError`](crate::RagError::EmbeddingError)
/// (auth errors, rate limits, transport failures) so callers can tell them
/// apart from index failures.
///
/// # Example
///
/// ```rust,ignore
/// use cura_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("Warfarin interaction with Aspirin").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning vectors in input order.
    ///
    /// The default issues one [`embed`](EmbeddingProvider::embed) call per
    /// text concurrently and fails on the first error. Backends with a native
    /// batch endpoint should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}
