//! One-time population of the vector index from the reference document.
//!
//! Population runs at startup: load → chunk → embed → upsert in batches. It
//! is gated on the index being empty; [`IndexPopulator::ensure_populated`]
//! performs that check exactly once. A failure aborts the run but batches
//! already upserted stay in the index, so a failed run leaves a partial index
//! that must be cleared out of band before retrying.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{DocumentChunk, IndexRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_timeout};
use crate::source::DocumentSource;
use crate::vectorstore::VectorIndex;

/// Counts from a completed population run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub chunk_count: usize,
    pub batch_count: usize,
    pub record_count: usize,
}

/// What [`IndexPopulator::ensure_populated`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationOutcome {
    /// The index already held records; nothing was written.
    AlreadyPopulated { record_count: u64 },
    /// The index was empty and has been populated.
    Populated(PopulationReport),
}

/// Loads, chunks, embeds, and upserts the reference document.
pub struct IndexPopulator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
    config: RagConfig,
}

impl IndexPopulator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        chunker: Arc<dyn Chunker>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, index, chunker, config }
    }

    /// Check the index once and populate it only if it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] if the stats call or population
    /// fails. The caller must not serve requests in that case.
    pub async fn ensure_populated(
        &self,
        source: &dyn DocumentSource,
        path: &Path,
    ) -> Result<PopulationOutcome> {
        let timeout = self.config.request_timeout;
        let stats = with_timeout("describe stats", timeout, self.index.describe_stats())
            .await
            .map_err(|e| {
                error!(backend = self.index.backend(), error = %e, "failed to read index stats");
                RagError::ingestion("failed to read index stats", e)
            })?;

        if !stats.is_empty() {
            let record_count = stats.total_record_count;
            info!(record_count, "index already populated, skipping ingestion");
            return Ok(PopulationOutcome::AlreadyPopulated { record_count });
        }

        info!(path = %path.display(), "index is empty, populating");
        self.populate(source, path).await.map(PopulationOutcome::Populated)
    }

    /// Populate the index from the document at `path`.
    ///
    /// Does not check whether the index is empty; with
    /// [`RecordIdScheme::BatchStart`](crate::RecordIdScheme::BatchStart) a
    /// second run overwrites records with colliding ids.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] on the first load, embedding, or
    /// upsert failure, or wrapping [`RagError::ChunkingError`] if the
    /// document yields no chunks. Earlier batches are not rolled back.
    pub async fn populate(
        &self,
        source: &dyn DocumentSource,
        path: &Path,
    ) -> Result<PopulationReport> {
        let blocks = source.load(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to load reference document");
            RagError::ingestion("failed to load reference document", e)
        })?;

        let chunks = self.chunker.chunk(&blocks);
        if chunks.is_empty() {
            error!(
                path = %path.display(),
                page_count = blocks.len(),
                "reference document produced no chunks"
            );
            return Err(RagError::ingestion(
                "reference document produced no chunks",
                RagError::ChunkingError(format!(
                    "{} page(s) of {} contained no text",
                    blocks.len(),
                    path.display()
                )),
            ));
        }

        let mut report = PopulationReport { chunk_count: chunks.len(), ..Default::default() };
        for (batch_index, batch) in chunks.chunks(self.config.batch_size).enumerate() {
            let batch_start = batch_index * self.config.batch_size;
            let records = self.embed_batch(batch_start, batch).await?;

            with_timeout("upsert", self.config.request_timeout, self.index.upsert(&records))
                .await
                .map_err(|e| {
                    error!(
                        batch_start,
                        backend = self.index.backend(),
                        error = %e,
                        "upsert failed during ingestion"
                    );
                    RagError::ingestion(
                        format!("upsert failed for batch starting at chunk {batch_start}"),
                        e,
                    )
                })?;

            report.batch_count += 1;
            report.record_count += records.len();
            info!(batch_start, batch_len = records.len(), "upserted batch");
        }

        info!(
            chunk_count = report.chunk_count,
            batch_count = report.batch_count,
            "populated index"
        );
        Ok(report)
    }

    async fn embed_batch(
        &self,
        batch_start: usize,
        batch: &[DocumentChunk],
    ) -> Result<Vec<IndexRecord>> {
        let texts: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();
        let failed_batch = || format!("embedding failed for batch starting at chunk {batch_start}");

        let timeout = self.config.request_timeout;
        let vectors = with_timeout("embedding", timeout, self.embedder.embed_batch(&texts))
            .await
            .map_err(|e| {
                error!(
                    batch_start,
                    provider = self.embedder.name(),
                    error = %e,
                    "embedding failed during ingestion"
                );
                RagError::ingestion(failed_batch(), e)
            })?;

        if vectors.len() != batch.len() {
            let e = RagError::EmbeddingError {
                provider: self.embedder.name().to_string(),
                message: format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
            };
            return Err(RagError::ingestion(failed_batch(), e));
        }

        let mut embedded = batch.to_vec();
        for (chunk, values) in embedded.iter_mut().zip(vectors) {
            chunk.source_vectors = values;
        }

        let scheme = self.config.record_id_scheme;
        Ok(embedded
            .into_iter()
            .enumerate()
            .map(|(offset, chunk)| {
                let id = scheme.record_id(batch_start, batch_start + offset, chunk.page);
                chunk.into_record(id)
            })
            .collect())
    }
}
