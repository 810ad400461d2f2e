//! Data types for page blocks, chunks, index records, and query matches.

use serde::{Deserialize, Serialize};

/// A block of text extracted from one page of the reference document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageBlock {
    /// The page text.
    pub text: String,
    /// The 1-based page number the text came from.
    pub page: u32,
}

impl PageBlock {
    /// Create a page block.
    pub fn new(text: impl Into<String>, page: u32) -> Self {
        Self { text: text.into(), page }
    }
}

/// A segment of a [`PageBlock`], optionally with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Identifier unique within one ingestion run.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The page the chunk was cut from.
    pub page: u32,
    /// The embedding of `text`. Empty until the populator embeds the chunk.
    pub source_vectors: Vec<f32>,
}

impl DocumentChunk {
    /// Convert an embedded chunk into the record stored in the index.
    pub fn into_record(self, id: String) -> IndexRecord {
        IndexRecord {
            id,
            values: self.source_vectors,
            metadata: RecordMetadata { text: self.text, page: self.page },
        }
    }
}

/// Metadata stored alongside every vector in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    /// The chunk text.
    pub text: String,
    /// The page of the reference document the text came from.
    pub page: u32,
}

/// A record as stored in the external vector index:
/// `{id, values, metadata: {text, page}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    /// Record identifier.
    pub id: String,
    /// The embedding vector.
    pub values: Vec<f32>,
    /// Text and page of the chunk.
    pub metadata: RecordMetadata,
}

/// A single nearest-neighbour result for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// The id of the matched record.
    pub id: String,
    /// The matched passage text. Empty when metadata was not requested.
    pub text: String,
    /// The page of the matched passage.
    pub page: u32,
    /// The similarity score reported by the index (higher is more similar).
    pub score: f64,
    /// Label of the corpus the passage came from.
    pub source_label: String,
}

/// Summary statistics reported by a vector index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Total number of records stored.
    pub total_record_count: u64,
}

impl IndexStats {
    /// Returns `true` if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.total_record_count == 0
    }
}
