use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use cura_rag::{
    AnalysisResult, Analyzer, CandidateItem, Chunker, DocumentSource, EmbeddingProvider,
    IndexPopulator, RagConfig, VectorIndex,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::protocol::{ApiError, ApiJson, FoodCompatibilityRequest, InteractionsRequest, Validate};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer: Arc::new(analyzer) }
    }
}

/// Everything the service needs before it may accept traffic.
pub struct Startup {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub chunker: Arc<dyn Chunker>,
    pub config: RagConfig,
}

impl Startup {
    /// Populate the index if it is empty, then build the request state.
    ///
    /// Must complete before the listener binds. No state is returned if
    /// population fails.
    pub async fn initialize(
        self,
        source: &dyn DocumentSource,
        document_path: &Path,
    ) -> anyhow::Result<AppState> {
        let populator = IndexPopulator::new(
            self.embedder.clone(),
            self.index.clone(),
            self.chunker,
            self.config.clone(),
        );
        let outcome = populator
            .ensure_populated(source, document_path)
            .await
            .context("failed to initialise vector index")?;
        debug!(?outcome, "vector index ready");

        let analyzer = Analyzer::builder()
            .config(self.config)
            .embedding_provider(self.embedder)
            .vector_index(self.index)
            .build()
            .context("failed to build analyzer")?;
        Ok(AppState::new(analyzer))
    }
}

pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/analyze/interactions", post(analyze_interactions))
        .route("/api/v1/analyze/food-compatibility", post(analyze_food_compatibility))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let app = app_router(state, request_timeout);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("CuraAlert API running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

async fn analyze_interactions(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InteractionsRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    request.validate()?;
    let candidate = CandidateItem::from(request.new_item);
    let result = state.analyzer.analyze(&request.current_medications, &candidate).await?;
    Ok(Json(result))
}

async fn analyze_food_compatibility(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FoodCompatibilityRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    request.validate()?;
    let food = CandidateItem::from(request.new_item);
    let result =
        state.analyzer.analyze_food_compatibility(&request.current_medications, &food).await?;
    Ok(Json(result))
}
