use std::sync::Arc;

use anyhow::Context;
use cura_rag::openai::OpenAIEmbeddingProvider;
use cura_rag::pinecone::PineconeVectorIndex;
use cura_rag::{
    Chunker, EmbeddingProvider, FixedSizeChunker, RecursiveChunker, VectorIndex, source_for_path,
};
use cura_server::{ChunkerKind, ServerConfig, Startup, run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    telemetry::init_tracing(config.log_json);

    let rag_config = config.rag_config()?;

    let mut openai = OpenAIEmbeddingProvider::new(config.openai_api_key.clone())?;
    if let Some(model) = &config.openai_model {
        openai = openai.with_model(model.clone());
    }
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(openai);

    let pinecone = match &config.pinecone_host {
        Some(host) => PineconeVectorIndex::new(
            config.pinecone_api_key.clone(),
            host.clone(),
            rag_config.evidence_source.clone(),
        )?,
        None => PineconeVectorIndex::connect(
            config.pinecone_api_key.clone(),
            &config.pinecone_index,
            rag_config.evidence_source.clone(),
        )
        .await
        .context("failed to connect to Pinecone index")?,
    };
    let index: Arc<dyn VectorIndex> = Arc::new(pinecone);

    let (size, overlap) = (rag_config.chunk_size, rag_config.chunk_overlap);
    let chunker: Arc<dyn Chunker> = match config.chunker {
        ChunkerKind::Fixed => Arc::new(FixedSizeChunker::new(size, overlap)),
        ChunkerKind::Recursive => Arc::new(RecursiveChunker::new(size, overlap)),
    };

    let source = source_for_path(&config.document_path)?;
    let state = Startup { embedder, index, chunker, config: rag_config }
        .initialize(source.as_ref(), &config.document_path)
        .await?;

    run_server(config.addr()?, state, config.request_timeout * 2).await
}
