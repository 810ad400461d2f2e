use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cura_rag::{
    Analyzer, DocumentSource, EmbeddingProvider, FixedSizeChunker, IndexRecord, IndexStats, Match,
    PageBlock, RagConfig, RagError, Result, VectorIndex,
};
use cura_server::{AppState, Startup, app_router};
use serde_json::{Value, json};

struct FixedEmbedder;

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Returns the same matches for every query and remembers upserts.
#[derive(Default)]
struct CannedIndex {
    matches: Vec<Match>,
    record_count: u64,
    fail_queries: bool,
    upserted: Mutex<Vec<IndexRecord>>,
}

#[async_trait]
impl VectorIndex for CannedIndex {
    fn backend(&self) -> &str {
        "canned"
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        self.upserted.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<Match>> {
        if self.fail_queries {
            return Err(RagError::VectorIndexError {
                backend: "canned".into(),
                message: "unavailable".into(),
            });
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        Ok(IndexStats { total_record_count: self.record_count })
    }
}

struct StaticSource(Vec<PageBlock>);

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load(&self, _path: &Path) -> Result<Vec<PageBlock>> {
        Ok(self.0.clone())
    }
}

fn warfarin_match() -> Match {
    Match {
        id: "doc_7_42".to_string(),
        text: "Warfarin: increased risk of bleeding when given with aspirin.".to_string(),
        page: 42,
        score: 0.9,
        source_label: "BNF 82".to_string(),
    }
}

async fn spawn_server(index: CannedIndex) -> (String, tokio::task::JoinHandle<()>) {
    let analyzer = Analyzer::builder()
        .embedding_provider(Arc::new(FixedEmbedder))
        .vector_index(Arc::new(index))
        .build()
        .expect("analyzer");
    let app = app_router(AppState::new(analyzer), Duration::from_secs(10));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

fn interaction_body() -> Value {
    json!({
        "currentMedications": [{"name": "Warfarin", "dosage": "5mg", "frequency": "daily"}],
        "newItem": {"type": "medication", "name": "Aspirin"}
    })
}

#[tokio::test]
async fn health_reports_healthy() {
    let (base, handle) = spawn_server(CannedIndex::default()).await;

    let response = reqwest::get(format!("{}/health", base)).await.expect("health response");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("health json");
    assert_eq!(body, json!({"status": "healthy"}));

    handle.abort();
}

#[tokio::test]
async fn interactions_returns_finding_from_top_match() {
    let index = CannedIndex { matches: vec![warfarin_match()], ..Default::default() };
    let (base, handle) = spawn_server(index).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/interactions", base))
        .json(&interaction_body())
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("analysis json");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["safetyScore"], 0.5);
    assert_eq!(body["data"]["alternatives"], json!([]));
    assert_eq!(body["metadata"]["dataVersion"], "BNF-82");
    assert!(body["metadata"]["analysisTimestamp"].as_str().is_some_and(|t| t.ends_with('Z')));

    let interactions = body["data"]["interactions"].as_array().expect("interactions array");
    assert_eq!(interactions.len(), 1);
    let finding = &interactions[0];
    assert_eq!(finding["severity"], "moderate");
    assert_eq!(finding["recommendation"], "Consult healthcare provider before use");
    assert_eq!(finding["evidence"]["source"], "BNF 82");
    assert_eq!(finding["evidence"]["page"], 42);
    assert_eq!(finding["evidence"]["confidence"], 0.9);

    handle.abort();
}

#[tokio::test]
async fn no_matches_yields_empty_interactions() {
    let (base, handle) = spawn_server(CannedIndex::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/interactions", base))
        .json(&interaction_body())
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("analysis json");
    assert_eq!(body["data"]["interactions"], json!([]));

    handle.abort();
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (base, handle) = spawn_server(CannedIndex::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/interactions", base))
        .json(&json!({"currentMedications": "Warfarin"}))
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body["error"], "Invalid request data");
    assert!(body["details"].is_string());

    handle.abort();
}

#[tokio::test]
async fn blank_medication_name_is_rejected() {
    let (base, handle) = spawn_server(CannedIndex::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/interactions", base))
        .json(&json!({
            "currentMedications": [{"name": ""}],
            "newItem": {"type": "medication", "name": "Aspirin"}
        }))
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 400);

    handle.abort();
}

#[tokio::test]
async fn food_route_rejects_medication_items() {
    let (base, handle) = spawn_server(CannedIndex::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/food-compatibility", base))
        .json(&json!({
            "currentMedications": [{"name": "Warfarin"}],
            "newItem": {"type": "medication", "name": "Aspirin"}
        }))
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body["error"], "Invalid request data");

    handle.abort();
}

#[tokio::test]
async fn food_route_accepts_food_items() {
    let index = CannedIndex { matches: vec![warfarin_match()], ..Default::default() };
    let (base, handle) = spawn_server(index).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/food-compatibility", base))
        .json(&json!({
            "currentMedications": [{"name": "Warfarin"}],
            "newItem": {
                "type": "food",
                "name": "Grapefruit",
                "quantity": "1 cup",
                "timing": "with_medication"
            }
        }))
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("analysis json");
    assert_eq!(body["data"]["interactions"].as_array().map(Vec::len), Some(1));

    handle.abort();
}

#[tokio::test]
async fn index_failure_is_an_opaque_server_error() {
    let index = CannedIndex { fail_queries: true, ..Default::default() };
    let (base, handle) = spawn_server(index).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/interactions", base))
        .json(&interaction_body())
        .send()
        .await
        .expect("analysis response");
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body, json!({"error": "Internal server error"}));

    handle.abort();
}

#[tokio::test]
async fn startup_populates_an_empty_index() {
    let index = Arc::new(CannedIndex::default());
    let source =
        StaticSource(vec![PageBlock::new("a".repeat(30), 1), PageBlock::new("b".repeat(10), 2)]);
    let config = RagConfig::builder().chunk_size(20).chunk_overlap(0).build().expect("config");

    let startup = Startup {
        embedder: Arc::new(FixedEmbedder),
        index: index.clone(),
        chunker: Arc::new(FixedSizeChunker::new(20, 0)),
        config,
    };
    startup.initialize(&source, Path::new("bnf.txt")).await.expect("startup");

    let ids: Vec<String> = index.upserted.lock().unwrap().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["doc_0_1", "doc_1_1", "doc_2_2"]);
}

#[tokio::test]
async fn startup_skips_a_populated_index() {
    let index = Arc::new(CannedIndex { record_count: 12, ..Default::default() });
    let startup = Startup {
        embedder: Arc::new(FixedEmbedder),
        index: index.clone(),
        chunker: Arc::new(FixedSizeChunker::new(20, 0)),
        config: RagConfig::default(),
    };
    startup
        .initialize(&StaticSource(vec![PageBlock::new("unused", 1)]), Path::new("bnf.txt"))
        .await
        .expect("startup");

    assert!(index.upserted.lock().unwrap().is_empty());
}
