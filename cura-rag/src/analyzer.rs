//! Interaction analysis over retrieved passages.
//!
//! The [`Analyzer`] runs one retrieval per current medication, turns the top
//! match of each non-empty result into an [`InteractionFinding`], and
//! aggregates the findings through the configured [`AnalysisPolicy`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cura_rag::{Analyzer, CandidateItem, MedicationRef};
//!
//! let analyzer = Analyzer::builder()
//!     .embedding_provider(embedder)
//!     .vector_index(index)
//!     .build()?;
//!
//! let result = analyzer
//!     .analyze(&[MedicationRef::new("Warfarin")], &CandidateItem::medication("Aspirin"))
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::RagConfig;
use crate::document::Match;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::model::{
    AnalysisData, AnalysisMetadata, AnalysisResult, AnalysisStatus, CandidateItem, CandidateKind,
    Evidence, InteractionFinding, MedicationRef,
};
use crate::policy::AnalysisPolicy;
use crate::retriever::{QueryTemplate, Retriever};
use crate::vectorstore::VectorIndex;

/// Builds [`AnalysisResult`]s for medication and food candidates.
pub struct Analyzer {
    retriever: Retriever,
    policy: AnalysisPolicy,
    data_version: String,
}

impl Analyzer {
    /// Create a new [`AnalyzerBuilder`].
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Return the retriever used for per-medication queries.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Analyse a candidate against every current medication.
    ///
    /// Medications whose query returns no matches contribute no finding.
    /// The safety score is clamped to `[0, 1]`; a non-finite score from the
    /// policy's scorer is reported as `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] if any per-medication query fails;
    /// no partial result is produced.
    #[instrument(
        skip_all,
        fields(
            candidate = %candidate.name,
            kind = ?candidate.kind,
            medication_count = medications.len()
        )
    )]
    pub async fn analyze(
        &self,
        medications: &[MedicationRef],
        candidate: &CandidateItem,
    ) -> Result<AnalysisResult> {
        let results = self.retriever.retrieve(medications, candidate).await?;

        let interactions: Vec<InteractionFinding> = results
            .iter()
            .filter_map(|matches| matches.first())
            .map(|top| self.finding(top))
            .collect();

        let raw_score = self.policy.scorer.score(&interactions);
        let safety_score = if raw_score.is_finite() {
            raw_score.clamp(0.0, 1.0)
        } else {
            warn!(score = raw_score, "safety scorer returned a non-finite score, reporting 0.0");
            0.0
        };

        let finder = match candidate.kind {
            CandidateKind::Medication => &self.policy.medication_alternatives,
            CandidateKind::Food => &self.policy.food_alternatives,
        };
        let alternatives = finder.find(&candidate.name, &interactions).await?;

        info!(interaction_count = interactions.len(), safety_score, "analysis completed");

        Ok(AnalysisResult {
            status: AnalysisStatus::Success,
            data: AnalysisData { safety_score, interactions, alternatives },
            metadata: AnalysisMetadata::stamped(Utc::now(), self.data_version.clone()),
        })
    }

    /// Analyse a food against every current medication.
    ///
    /// The candidate is treated as a food whatever its declared kind.
    pub async fn analyze_food_compatibility(
        &self,
        medications: &[MedicationRef],
        food: &CandidateItem,
    ) -> Result<AnalysisResult> {
        let food = CandidateItem { kind: CandidateKind::Food, ..food.clone() };
        self.analyze(medications, &food).await
    }

    fn finding(&self, top: &Match) -> InteractionFinding {
        InteractionFinding {
            severity: self.policy.severity.classify(&top.text),
            description: self.policy.summarizer.summarize(&top.text),
            recommendation: self.policy.recommender.recommend(&top.text),
            evidence: Evidence {
                source: top.source_label.clone(),
                page: top.page,
                confidence: top.score,
            },
        }
    }
}

/// Builder for constructing an [`Analyzer`].
///
/// The embedding provider and vector index are required; configuration,
/// policy, and query template fall back to defaults.
#[derive(Default)]
pub struct AnalyzerBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    policy: Option<AnalysisPolicy>,
    template: Option<QueryTemplate>,
}

impl AnalyzerBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector index.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Set the analysis policies.
    pub fn policy(mut self, policy: AnalysisPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the query template.
    pub fn query_template(mut self, template: QueryTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Build the [`Analyzer`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider or vector
    /// index is missing.
    pub fn build(self) -> Result<Analyzer> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_index = self
            .vector_index
            .ok_or_else(|| RagError::ConfigError("vector_index is required".to_string()))?;

        let data_version = config.data_version.clone();
        let retriever = Retriever::new(embedding_provider, vector_index, config)
            .with_template(self.template.unwrap_or_default());

        Ok(Analyzer { retriever, policy: self.policy.unwrap_or_default(), data_version })
    }
}
