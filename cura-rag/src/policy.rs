//! Replaceable policies that turn retrieved passages into findings.
//!
//! Every default here is a placeholder: a constant severity, a truncated
//! passage as description, a generic recommendation, a constant safety score,
//! and no alternatives. None of it is clinical logic. Substitute real
//! implementations through [`AnalysisPolicy`] without touching the pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Alternative, InteractionFinding, Severity};

/// Classifies the severity described by a passage.
pub trait SeverityClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Severity;
}

/// Produces a finding description from a passage.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> String;
}

/// Produces a patient-facing recommendation from a passage.
pub trait Recommender: Send + Sync {
    fn recommend(&self, text: &str) -> String;
}

/// Aggregates findings into a safety score in `[0, 1]`.
///
/// The analyzer clamps finite scores into range and reports a non-finite
/// score (NaN or infinity) as `0.0`, the least safe value.
pub trait SafetyScorer: Send + Sync {
    fn score(&self, findings: &[InteractionFinding]) -> f64;
}

/// Looks up substitutes for a candidate item.
#[async_trait]
pub trait AlternativeFinder: Send + Sync {
    async fn find(
        &self,
        candidate: &str,
        findings: &[InteractionFinding],
    ) -> Result<Vec<Alternative>>;
}

/// Placeholder: every passage is `moderate`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSeverity(pub Severity);

impl Default for ConstantSeverity {
    fn default() -> Self {
        Self(Severity::Moderate)
    }
}

impl SeverityClassifier for ConstantSeverity {
    fn classify(&self, _text: &str) -> Severity {
        self.0
    }
}

/// Placeholder: the first `max_chars` characters of the passage.
#[derive(Debug, Clone, Copy)]
pub struct TruncatingSummarizer {
    pub max_chars: usize,
}

impl Default for TruncatingSummarizer {
    fn default() -> Self {
        Self { max_chars: 200 }
    }
}

impl Summarizer for TruncatingSummarizer {
    fn summarize(&self, text: &str) -> String {
        text.chars().take(self.max_chars).collect()
    }
}

/// Placeholder: the same advice for every passage.
#[derive(Debug, Clone)]
pub struct ConstantRecommendation(pub String);

impl Default for ConstantRecommendation {
    fn default() -> Self {
        Self("Consult healthcare provider before use".to_string())
    }
}

impl Recommender for ConstantRecommendation {
    fn recommend(&self, _text: &str) -> String {
        self.0.clone()
    }
}

/// Placeholder: `0.5` regardless of findings, including none.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSafetyScore(pub f64);

impl Default for ConstantSafetyScore {
    fn default() -> Self {
        Self(0.5)
    }
}

impl SafetyScorer for ConstantSafetyScore {
    fn score(&self, _findings: &[InteractionFinding]) -> f64 {
        self.0
    }
}

/// Placeholder: never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlternatives;

#[async_trait]
impl AlternativeFinder for NoAlternatives {
    async fn find(
        &self,
        _candidate: &str,
        _findings: &[InteractionFinding],
    ) -> Result<Vec<Alternative>> {
        Ok(Vec::new())
    }
}

/// The set of policies an [`Analyzer`](crate::Analyzer) applies.
///
/// # Example
///
/// ```rust,ignore
/// let policy = AnalysisPolicy::default()
///     .with_severity(Arc::new(MyClassifier::new()))
///     .with_scorer(Arc::new(WeightedScorer::default()));
/// ```
#[derive(Clone)]
pub struct AnalysisPolicy {
    pub severity: Arc<dyn SeverityClassifier>,
    pub summarizer: Arc<dyn Summarizer>,
    pub recommender: Arc<dyn Recommender>,
    pub scorer: Arc<dyn SafetyScorer>,
    pub medication_alternatives: Arc<dyn AlternativeFinder>,
    pub food_alternatives: Arc<dyn AlternativeFinder>,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            severity: Arc::new(ConstantSeverity::default()),
            summarizer: Arc::new(TruncatingSummarizer::default()),
            recommender: Arc::new(ConstantRecommendation::default()),
            scorer: Arc::new(ConstantSafetyScore::default()),
            medication_alternatives: Arc::new(NoAlternatives),
            food_alternatives: Arc::new(NoAlternatives),
        }
    }
}

impl AnalysisPolicy {
    pub fn with_severity(mut self, severity: Arc<dyn SeverityClassifier>) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn SafetyScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_medication_alternatives(mut self, finder: Arc<dyn AlternativeFinder>) -> Self {
        self.medication_alternatives = finder;
        self
    }

    pub fn with_food_alternatives(mut self, finder: Arc<dyn AlternativeFinder>) -> Self {
        self.food_alternatives = finder;
        self
    }
}

impl std::fmt::Debug for AnalysisPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPolicy").finish_non_exhaustive()
    }
}
