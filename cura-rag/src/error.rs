//! Error types for the `cura-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while ingesting the reference corpus or analysing
/// interactions against it.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend.
    #[error("Vector index error ({backend}): {message}")]
    VectorIndexError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The reference document could not be read or parsed.
    #[error("Document error ({path}): {message}")]
    DocumentError {
        /// Path of the document that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A call to an external capability did not complete in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that was cut off.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// Population of the vector index failed. Batches upserted before the
    /// failure remain in the index.
    #[error("Ingestion error: {message}")]
    IngestionError {
        /// Where in the ingestion run the failure happened.
        message: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },

    /// A per-medication query failed, failing the whole analysis.
    #[error("Retrieval error for query '{query}': {source}")]
    RetrievalError {
        /// The natural-language query that failed.
        query: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },
}

impl RagError {
    pub(crate) fn ingestion(message: impl Into<String>, source: RagError) -> Self {
        Self::IngestionError { message: message.into(), source: Box::new(source) }
    }

    pub(crate) fn retrieval(query: impl Into<String>, source: RagError) -> Self {
        Self::RetrievalError { query: query.into(), source: Box::new(source) }
    }

    /// Returns `true` if this error, or the error it wraps, came from the
    /// embedding provider.
    pub fn is_embedding_failure(&self) -> bool {
        match self {
            Self::EmbeddingError { .. } => true,
            Self::IngestionError { source, .. } | Self::RetrievalError { source, .. } => {
                source.is_embedding_failure()
            }
            _ => false,
        }
    }

    /// Returns `true` if this error, or the error it wraps, is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::IngestionError { source, .. } | Self::RetrievalError { source, .. } => {
                source.is_timeout()
            }
            _ => false,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Await `future`, failing with [`RagError::Timeout`] once `after` elapses.
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    after: Duration,
    future: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, future).await {
        Ok(result) => result,
        Err(_) => Err(RagError::Timeout { operation, after }),
    }
}
