//! Per-medication retrieval against the reference index.
//!
//! For every current medication the [`Retriever`] builds one natural-language
//! query, embeds it, and asks the [`VectorIndex`] for the nearest passages.
//! Queries run concurrently up to `max_concurrent_queries`; results come back
//! in input order regardless of which query finishes first.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::document::Match;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_timeout};
use crate::model::{CandidateItem, CandidateKind, MedicationRef};
use crate::vectorstore::VectorIndex;

/// Natural-language templates used to phrase retrieval queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    /// Suffix appended for food candidates.
    pub food_qualifier: String,
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self { food_qualifier: "food".to_string() }
    }
}

impl QueryTemplate {
    /// Phrase the query for one medication/candidate pair.
    pub fn render(&self, medication: &MedicationRef, candidate: &CandidateItem) -> String {
        match candidate.kind {
            CandidateKind::Medication => {
                format!("{} interaction with {}", medication.name, candidate.name)
            }
            CandidateKind::Food => format!(
                "{} interaction with {} {}",
                medication.name, candidate.name, self.food_qualifier
            ),
        }
    }
}

/// Fans one query per medication out to the embedding provider and index.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    template: QueryTemplate,
    config: RagConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, index, template: QueryTemplate::default(), config }
    }

    /// Replace the query template.
    pub fn with_template(mut self, template: QueryTemplate) -> Self {
        self.template = template;
        self
    }

    /// The query text issued for one medication/candidate pair.
    pub fn query_text(&self, medication: &MedicationRef, candidate: &CandidateItem) -> String {
        self.template.render(medication, candidate)
    }

    /// Retrieve the top matches for every medication, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] for the first query that fails to
    /// embed, query, or finish within `request_timeout`. Queries still in
    /// flight are dropped.
    pub async fn retrieve(
        &self,
        medications: &[MedicationRef],
        candidate: &CandidateItem,
    ) -> Result<Vec<Vec<Match>>> {
        let queries: Vec<String> =
            medications.iter().map(|medication| self.query_text(medication, candidate)).collect();

        stream::iter(queries)
            .map(|query| self.retrieve_one(query))
            .buffered(self.config.max_concurrent_queries)
            .try_collect()
            .await
    }

    async fn retrieve_one(&self, query: String) -> Result<Vec<Match>> {
        let timeout = self.config.request_timeout;

        let vector = with_timeout("embedding", timeout, self.embedder.embed(&query))
            .await
            .map_err(|e| {
                let provider = self.embedder.name();
                error!(query = %query, provider, error = %e, "query embedding failed");
                RagError::retrieval(&query, e)
            })?;

        let matches = with_timeout(
            "vector query",
            timeout,
            self.index.query(&vector, self.config.top_k, true),
        )
        .await
        .map_err(|e| {
            let backend = self.index.backend();
            error!(query = %query, backend, error = %e, "vector query failed");
            RagError::retrieval(&query, e)
        })?;

        debug!(query = %query, match_count = matches.len(), "retrieved matches");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medication_and_food_templates() {
        let template = QueryTemplate::default();
        let warfarin = MedicationRef::new("Warfarin");
        assert_eq!(
            template.render(&warfarin, &CandidateItem::medication("Aspirin")),
            "Warfarin interaction with Aspirin"
        );
        assert_eq!(
            template.render(&warfarin, &CandidateItem::food("Grapefruit")),
            "Warfarin interaction with Grapefruit food"
        );
    }
}
