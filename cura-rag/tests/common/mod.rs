//! Test doubles for the embedding and vector index capabilities.
//!
//! `TextEmbedder` encodes each text's bytes as the vector so that
//! `ScriptedIndex` can recover the query text and answer from a script.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cura_rag::{
    DocumentSource, EmbeddingProvider, IndexRecord, IndexStats, Match, PageBlock, RagError,
    Result, VectorIndex,
};

pub fn encode(text: &str) -> Vec<f32> {
    text.bytes().map(f32::from).collect()
}

pub fn decode(vector: &[f32]) -> String {
    vector.iter().map(|v| *v as u8 as char).collect()
}

pub fn bnf_match(text: &str, page: u32, score: f64) -> Match {
    Match {
        id: format!("doc_0_{page}"),
        text: text.to_string(),
        page,
        score,
        source_label: "BNF 82".to_string(),
    }
}

#[derive(Default)]
pub struct TextEmbedder {
    pub calls: Mutex<Vec<String>>,
    pub delays: HashMap<String, Duration>,
    pub fail_on: Option<String>,
}

impl TextEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for TextEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_on.as_deref() == Some(text) {
            return Err(RagError::EmbeddingError {
                provider: "fake".into(),
                message: "rate limited".into(),
            });
        }
        Ok(encode(text))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

#[derive(Default)]
pub struct ScriptedIndex {
    pub responses: HashMap<String, Vec<Match>>,
    pub record_count: u64,
    pub stats_calls: AtomicUsize,
    pub upserts: Mutex<Vec<Vec<IndexRecord>>>,
    pub fail_upsert_at: Option<usize>,
    pub fail_query_on: Option<String>,
    pub queries: Mutex<Vec<(String, usize, bool)>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: &str, matches: Vec<Match>) -> Self {
        self.responses.insert(query.to_string(), matches);
        self
    }

    pub fn with_record_count(mut self, count: u64) -> Self {
        self.record_count = count;
        self
    }

    pub fn failing_upsert_at(mut self, call: usize) -> Self {
        self.fail_upsert_at = Some(call);
        self
    }

    pub fn failing_query_on(mut self, query: &str) -> Self {
        self.fail_query_on = Some(query.to_string());
        self
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    fn backend(&self) -> &str {
        "scripted"
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let mut upserts = self.upserts.lock().unwrap();
        if self.fail_upsert_at == Some(upserts.len()) {
            return Err(RagError::VectorIndexError {
                backend: "scripted".into(),
                message: "quota exceeded".into(),
            });
        }
        upserts.push(records.to_vec());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<Match>> {
        let query = decode(vector);
        self.queries.lock().unwrap().push((query.clone(), top_k, include_metadata));
        if self.fail_query_on.as_deref() == Some(query.as_str()) {
            return Err(RagError::VectorIndexError {
                backend: "scripted".into(),
                message: "unavailable".into(),
            });
        }
        let mut matches = self.responses.get(&query).cloned().unwrap_or_default();
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(IndexStats { total_record_count: self.record_count })
    }
}

/// A document source serving fixed page blocks, or failing.
pub struct StaticSource(pub Option<Vec<PageBlock>>);

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load(&self, path: &Path) -> Result<Vec<PageBlock>> {
        self.0.clone().ok_or_else(|| RagError::DocumentError {
            path: path.display().to_string(),
            message: "no such file".into(),
        })
    }
}
