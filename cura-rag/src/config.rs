//! Configuration for ingestion, retrieval, and analysis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Label of the reference corpus attached to every piece of evidence.
pub const DEFAULT_EVIDENCE_SOURCE: &str = "BNF 82";

/// Edition label stamped on every analysis result.
pub const DEFAULT_DATA_VERSION: &str = "BNF-82";

/// How the populator derives index record ids.
///
/// Both schemes are deterministic, so a second ingestion run over the same
/// document writes the same ids under either one and the emptiness check in
/// [`IndexPopulator::ensure_populated`](crate::IndexPopulator::ensure_populated)
/// is what prevents it. They differ within a run: `BatchStart` gives every
/// chunk of a page in one batch the same id, so all but the last are
/// overwritten. `ChunkIndex` is the default because it keeps every chunk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordIdScheme {
    /// `doc_{chunk_index}_{page}`: unique within one ingestion run.
    #[default]
    ChunkIndex,
    /// `doc_{batch_start}_{page}`: chunks of the same page inside one batch
    /// share an id and overwrite each other on upsert.
    BatchStart,
}

impl RecordIdScheme {
    /// Build the record id for the chunk at `chunk_index` whose batch starts
    /// at `batch_start`.
    pub fn record_id(self, batch_start: usize, chunk_index: usize, page: u32) -> String {
        match self {
            Self::ChunkIndex => format!("doc_{chunk_index}_{page}"),
            Self::BatchStart => format!("doc_{batch_start}_{page}"),
        }
    }
}

/// Configuration parameters for the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of records per upsert call during population.
    pub batch_size: usize,
    /// Number of nearest neighbours requested per query.
    pub top_k: usize,
    /// Upper bound on per-medication queries in flight for one analysis.
    pub max_concurrent_queries: usize,
    /// Deadline for each embedding, query, or upsert call.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Record id derivation used by the populator.
    pub record_id_scheme: RecordIdScheme,
    /// Evidence source label, e.g. `BNF 82`.
    pub evidence_source: String,
    /// Data version label, e.g. `BNF-82`.
    pub data_version: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 100,
            top_k: 5,
            max_concurrent_queries: 8,
            request_timeout: Duration::from_secs(30),
            record_id_scheme: RecordIdScheme::default(),
            evidence_source: DEFAULT_EVIDENCE_SOURCE.to_string(),
            data_version: DEFAULT_DATA_VERSION.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of records per upsert call.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the number of nearest neighbours requested per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set how many per-medication queries may run at once.
    pub fn max_concurrent_queries(mut self, limit: usize) -> Self {
        self.config.max_concurrent_queries = limit;
        self
    }

    /// Set the deadline applied to each external call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the record id derivation.
    pub fn record_id_scheme(mut self, scheme: RecordIdScheme) -> Self {
        self.config.record_id_scheme = scheme;
        self
    }

    /// Set the evidence source label.
    pub fn evidence_source(mut self, source: impl Into<String>) -> Self {
        self.config.evidence_source = source.into();
        self
    }

    /// Set the data version label.
    pub fn data_version(mut self, version: impl Into<String>) -> Self {
        self.config.data_version = version.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `batch_size`, `top_k` or `max_concurrent_queries` is zero
    /// - `request_timeout` is zero
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if config.max_concurrent_queries == 0 {
            return Err(RagError::ConfigError(
                "max_concurrent_queries must be greater than zero".to_string(),
            ));
        }
        if config.request_timeout.is_zero() {
            return Err(RagError::ConfigError("request_timeout must be non-zero".to_string()));
        }
        Ok(config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
