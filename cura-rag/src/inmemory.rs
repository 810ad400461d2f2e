//! In-memory vector index using cosine similarity.
//!
//! Scores are cosine similarity rescaled from `[-1, 1]` to `[0, 1]` as
//! `(1 + cos) / 2`, so opposite vectors score 0 and identical ones score 1.
//!
//! [`InMemoryVectorIndex`] keeps records in a `HashMap` behind a
//! `tokio::sync::RwLock`. It backs tests and local development runs where no
//! hosted index is available.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexRecord, IndexStats, Match};
use crate::error::Result;
use crate::vectorstore::VectorIndex;

/// An in-memory [`VectorIndex`] keyed by record id.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    source_label: String,
    records: RwLock<HashMap<String, IndexRecord>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index whose matches are labelled `source_label`.
    pub fn new(source_label: impl Into<String>) -> Self {
        Self { source_label: source_label.into(), records: RwLock::default() }
    }

    /// Return a copy of the stored record with the given id.
    pub async fn get(&self, id: &str) -> Option<IndexRecord> {
        self.records.read().await.get(id).cloned()
    }
}

/// Cosine similarity rescaled to `[0, 1]`.
///
/// Returns 0.0 if either vector has zero magnitude.
fn similarity_score(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = dot / (norm_a * norm_b);
    ((1.0 + cosine) / 2.0).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn backend(&self) -> &str {
        "InMemory"
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<Match>> {
        let store = self.records.read().await;

        let mut scored: Vec<(f32, &IndexRecord)> = store
            .values()
            .map(|record| (similarity_score(&record.values, vector), record))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| {
                let (text, page) = if include_metadata {
                    (record.metadata.text.clone(), record.metadata.page)
                } else {
                    (String::new(), 0)
                };
                Match {
                    id: record.id.clone(),
                    text,
                    page,
                    score: f64::from(score),
                    source_label: self.source_label.clone(),
                }
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let total_record_count = self.records.read().await.len() as u64;
        Ok(IndexStats { total_record_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RecordMetadata;

    fn record(id: &str, values: Vec<f32>, page: u32) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata { text: format!("text of {id}"), page },
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id_and_counts_records() {
        let index = InMemoryVectorIndex::new("BNF 82");
        assert!(index.describe_stats().await.unwrap().is_empty());

        index
            .upsert(&[record("a", vec![1.0, 0.0], 1), record("b", vec![0.0, 1.0], 2)])
            .await
            .unwrap();
        index.upsert(&[record("a", vec![1.0, 1.0], 3)]).await.unwrap();

        assert_eq!(index.describe_stats().await.unwrap().total_record_count, 2);
        assert_eq!(index.get("a").await.unwrap().metadata.page, 3);
    }

    #[tokio::test]
    async fn query_returns_metadata_only_when_requested() {
        let index = InMemoryVectorIndex::new("BNF 82");
        index.upsert(&[record("a", vec![1.0, 0.0], 7)]).await.unwrap();

        let with = index.query(&[1.0, 0.0], 5, true).await.unwrap();
        assert_eq!(with[0].page, 7);
        assert_eq!(with[0].text, "text of a");
        assert_eq!(with[0].source_label, "BNF 82");

        let without = index.query(&[1.0, 0.0], 5, false).await.unwrap();
        assert!(without[0].text.is_empty());
        assert_eq!(without[0].page, 0);
    }

    #[test]
    fn similarity_is_rescaled_cosine() {
        assert_eq!(similarity_score(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((similarity_score(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((similarity_score(&[0.0, 1.0], &[1.0, 0.0]) - 0.5).abs() < 1e-6);
        assert!(similarity_score(&[-1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
    }

    #[tokio::test]
    async fn opposite_vectors_score_zero_not_negative() {
        let index = InMemoryVectorIndex::new("BNF 82");
        index.upsert(&[record("a", vec![1.0, 0.0], 1)]).await.unwrap();

        let matches = index.query(&[-1.0, 0.0], 5, true).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].score >= 0.0);
        assert!(matches[0].score < 1e-6);
    }
}
