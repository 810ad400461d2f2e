//! # cura-rag
//!
//! Retrieval-augmented interaction analysis over a reference pharmacology
//! corpus.
//!
//! The crate covers three stages:
//!
//! - **Ingestion**: a [`DocumentSource`] loads page blocks, a [`Chunker`]
//!   cuts them into overlapping windows, and the [`IndexPopulator`] embeds
//!   and upserts them in batches, once, when the index is empty.
//! - **Retrieval**: the [`Retriever`] phrases one query per current
//!   medication and asks the [`VectorIndex`] for the nearest passages.
//! - **Synthesis**: the [`Analyzer`] turns top matches into
//!   [`InteractionFinding`]s and applies the pluggable [`AnalysisPolicy`].
//!
//! Embedding and index backends are capability traits. In-process
//! implementations ship by default; hosted ones sit behind features:
//!
//! | Feature | Provides |
//! |---|---|
//! | `openai` | [`openai::OpenAIEmbeddingProvider`] |
//! | `pinecone` | [`pinecone::PineconeVectorIndex`] |
//! | `pdf` | [`source::PdfDocumentSource`] |

pub mod analyzer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod model;
pub mod policy;
pub mod populator;
pub mod retriever;
pub mod source;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pinecone")]
pub mod pinecone;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder, RecordIdScheme};
pub use document::{DocumentChunk, IndexRecord, IndexStats, Match, PageBlock, RecordMetadata};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorIndex;
pub use model::{
    Alternative, AnalysisData, AnalysisMetadata, AnalysisResult, AnalysisStatus, CandidateItem,
    CandidateKind, Evidence, FoodTiming, InteractionFinding, MedicationRef, Severity,
};
pub use policy::{
    AlternativeFinder, AnalysisPolicy, ConstantRecommendation, ConstantSafetyScore,
    ConstantSeverity, NoAlternatives, Recommender, SafetyScorer, SeverityClassifier, Summarizer,
    TruncatingSummarizer,
};
pub use populator::{IndexPopulator, PopulationOutcome, PopulationReport};
pub use retriever::{QueryTemplate, Retriever};
pub use source::{DocumentSource, TextDocumentSource, source_for_path};
pub use vectorstore::VectorIndex;
