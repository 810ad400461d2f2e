//! Pinecone vector index backend.
//!
//! Provides [`PineconeVectorIndex`], a [`VectorIndex`] speaking Pinecone's
//! data-plane REST API with `reqwest`. Records are stored with metadata
//! `{text, page}`.
//!
//! This module is only available when the `pinecone` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use cura_rag::pinecone::PineconeVectorIndex;
//!
//! let index = PineconeVectorIndex::connect(api_key, "mynewindex", "BNF 82").await?;
//! let stats = index.describe_stats().await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{IndexRecord, IndexStats, Match};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Control-plane endpoint used to resolve an index name to its host.
const PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";

/// API version pinned for both control and data plane calls.
const PINECONE_API_VERSION: &str = "2024-07";

/// A [`VectorIndex`] backed by a Pinecone serverless or pod index.
pub struct PineconeVectorIndex {
    client: reqwest::Client,
    api_key: String,
    host: String,
    namespace: Option<String>,
    source_label: String,
}

impl PineconeVectorIndex {
    /// Create an index client for a known data-plane host
    /// (e.g. `mynewindex-abc123.svc.us-east-1.pinecone.io`).
    pub fn new(
        api_key: impl Into<String>,
        host: impl Into<String>,
        source_label: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Self::error("API key must not be empty"));
        }
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            host,
            namespace: None,
            source_label: source_label.into(),
        })
    }

    /// Resolve `index_name` through the control plane and connect to its host.
    pub async fn connect(
        api_key: impl Into<String>,
        index_name: &str,
        source_label: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{PINECONE_CONTROL_URL}/indexes/{index_name}"))
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .send()
            .await
            .map_err(|e| Self::error(format!("describe index request failed: {e}")))?;
        let description: IndexDescription = Self::parse(response).await?;
        debug!(index = index_name, host = %description.host, "resolved pinecone index host");

        Ok(Self { client, ..Self::new(api_key, description.host, source_label)? })
    }

    /// Scope every call to a namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn error(message: impl Into<String>) -> RagError {
        RagError::VectorIndexError { backend: "pinecone".to_string(), message: message.into() }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "pinecone", path, error = %e, "request failed");
                Self::error(format!("request to {path} failed: {e}"))
            })?;
        Self::parse(response).await
    }

    async fn parse<R: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(backend = "pinecone", %status, "API error");
            return Err(Self::error(format!("API returned {status}: {body}")));
        }
        response.json().await.map_err(|e| Self::error(format!("failed to parse response: {e}")))
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

/// Pinecone returns numeric metadata as JSON numbers with a fraction.
#[derive(Deserialize)]
struct WireMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    page: f64,
}

#[derive(Serialize)]
struct StatsRequest {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default, alias = "totalRecordCount")]
    total_vector_count: u64,
}

// ── VectorIndex implementation ─────────────────────────────────────

#[async_trait]
impl VectorIndex for PineconeVectorIndex {
    fn backend(&self) -> &str {
        "pinecone"
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let request = UpsertRequest { vectors: records, namespace: self.namespace.as_deref() };
        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        debug!(backend = "pinecone", upserted = response.upserted_count, "upserted records");
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<Match>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| {
                let (text, page) =
                    m.metadata.map_or((String::new(), 0), |md| (md.text, md.page as u32));
                Match {
                    id: m.id,
                    text,
                    page,
                    score: m.score,
                    source_label: self.source_label.clone(),
                }
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self.post("/describe_index_stats", &StatsRequest {}).await?;
        Ok(IndexStats { total_record_count: response.total_vector_count })
    }
}
