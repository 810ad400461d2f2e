//! Vector index capability.

use async_trait::async_trait;

use crate::document::{IndexRecord, IndexStats, Match};
use crate::error::Result;

/// A persistent, process-external store of vectors with similarity search.
///
/// The index is provisioned out of band, populated once, and queried many
/// times. There is no update or delete path.
///
/// # Example
///
/// ```rust,ignore
/// use cura_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new("BNF 82");
/// index.upsert(&records).await?;
/// let matches = index.query(&query_vector, 5, true).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn backend(&self) -> &str;

    /// Insert or overwrite records by id.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Return the `top_k` records most similar to `vector`, ordered by
    /// descending score.
    ///
    /// With `include_metadata == false` the returned matches carry an empty
    /// `text` and page `0`.
    async fn query(&self, vector: &[f32], top_k: usize, include_metadata: bool)
    -> Result<Vec<Match>>;

    /// Report record counts. Used to gate one-time population.
    async fn describe_stats(&self) -> Result<IndexStats>;
}
