//! Clause to regulation mapping by embedding similarity.
//!
//! For every clause: embed its text, store the embedding, ask the regulation
//! index for hits above the threshold and persist one mapping per hit. The
//! mapper does no ranking of its own.

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Clause, ClauseEmbedding, EmbeddingConfig, RegulationMapping};
use crate::domain::ports::{EmbeddingProvider, MappingRepository, RegulationIndex};

#[derive(Debug, Clone)]
pub struct SemanticMapperConfig {
    /// Minimum cosine similarity for a mapping.
    pub similarity_threshold: f64,
    /// Most regulations mapped per clause.
    pub max_results: usize,
    /// Clauses embedded concurrently.
    pub concurrency: usize,
}

impl Default for SemanticMapperConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            max_results: 10,
            concurrency: 8,
        }
    }
}

impl SemanticMapperConfig {
    pub fn from_config(embedding: &EmbeddingConfig, concurrency: usize) -> Self {
        Self {
            similarity_threshold: embedding.similarity_threshold,
            max_results: embedding.max_results,
            concurrency,
        }
    }
}

/// Outcome of mapping one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSummary {
    pub clauses_processed: usize,
    pub mappings_created: usize,
    pub clauses_without_match: usize,
    /// Mappings in clause order, best match first within a clause.
    pub mappings: Vec<RegulationMapping>,
}

pub struct SemanticMapper {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn RegulationIndex>,
    repository: Arc<dyn MappingRepository>,
    config: SemanticMapperConfig,
}

impl SemanticMapper {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn RegulationIndex>,
        repository: Arc<dyn MappingRepository>,
        config: SemanticMapperConfig,
    ) -> Self {
        Self {
            provider,
            index,
            repository,
            config,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Maps every clause of a document. Any clause failure fails the whole call.
    pub async fn map_document(&self, document_id: &str, clauses: &[Clause]) -> DomainResult<MappingSummary> {
        let lookups: Vec<_> = clauses
            .iter()
            .cloned()
            .map(|clause| {
                let document_id = document_id.to_owned();
                async move { self.map_clause(&document_id, &clause).await }
            })
            .collect();

        let per_clause: Vec<Vec<RegulationMapping>> = stream::iter(lookups)
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let clauses_without_match = per_clause.iter().filter(|m| m.is_empty()).count();
        let mappings: Vec<RegulationMapping> = per_clause.into_iter().flatten().collect();

        self.repository.upsert_mappings(&mappings).await?;

        info!(
            document_id,
            clauses = clauses.len(),
            mappings = mappings.len(),
            unmatched = clauses_without_match,
            "Semantic mapping complete"
        );

        Ok(MappingSummary {
            clauses_processed: clauses.len(),
            mappings_created: mappings.len(),
            clauses_without_match,
            mappings,
        })
    }

    async fn map_clause(&self, document_id: &str, clause: &Clause) -> DomainResult<Vec<RegulationMapping>> {
        let vector = self.provider.embed(&clause.text).await?;

        self.repository
            .upsert_embedding(&ClauseEmbedding {
                clause_id: clause.id.clone(),
                model: self.provider.model().to_string(),
                vector: vector.clone(),
            })
            .await?;

        let hits = self
            .index
            .similar(&vector, self.config.similarity_threshold, self.config.max_results)
            .await?;
        debug!(clause_id = %clause.id, hits = hits.len(), "Regulation lookup");

        Ok(hits
            .iter()
            .map(|hit| RegulationMapping::from_match(document_id, &clause.id, hit))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{ClassificationResult, ClauseCandidate, ComplianceCategory, Regulation, RegulationMatch};
    use crate::domain::ports::{PageRequest, Paginated};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &'static str {
            "length"
        }
        fn model(&self) -> &str {
            "length-v1"
        }
        fn dimension(&self) -> usize {
            1
        }
        async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
            if text.contains("explode") {
                return Err(DomainError::TransientInfra("embedding service unavailable".into()));
            }
            Ok(vec![text.len() as f32])
        }
    }

    /// Returns the fixed hits that clear the threshold, up to the limit.
    struct FixedIndex {
        hits: Vec<RegulationMatch>,
    }

    #[async_trait]
    impl RegulationIndex for FixedIndex {
        async fn similar(&self, _vector: &[f32], threshold: f64, limit: usize) -> DomainResult<Vec<RegulationMatch>> {
            Ok(self.hits.iter().filter(|h| h.score >= threshold).take(limit).cloned().collect())
        }
        async fn upsert(&self, _regulation: &Regulation, _vector: &[f32]) -> DomainResult<()> {
            Ok(())
        }
        async fn count(&self) -> DomainResult<u64> {
            Ok(self.hits.len() as u64)
        }
    }

    #[derive(Default)]
    struct RecordingRepository {
        embeddings: Mutex<Vec<ClauseEmbedding>>,
        mappings: Mutex<Vec<RegulationMapping>>,
    }

    #[async_trait]
    impl MappingRepository for RecordingRepository {
        async fn upsert_embedding(&self, embedding: &ClauseEmbedding) -> DomainResult<()> {
            self.embeddings.lock().unwrap().push(embedding.clone());
            Ok(())
        }
        async fn get_embedding(&self, clause_id: &str) -> DomainResult<Option<ClauseEmbedding>> {
            Ok(self.embeddings.lock().unwrap().iter().find(|e| e.clause_id == clause_id).cloned())
        }
        async fn upsert_mappings(&self, mappings: &[RegulationMapping]) -> DomainResult<()> {
            self.mappings.lock().unwrap().extend_from_slice(mappings);
            Ok(())
        }
        async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<RegulationMapping>> {
            Ok(self
                .mappings
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.document_id == document_id)
                .cloned()
                .collect())
        }
        async fn page_by_document(&self, document_id: &str, page: PageRequest) -> DomainResult<Paginated<RegulationMapping>> {
            let all = self.list_by_document(document_id).await?;
            Ok(Paginated::new(all.clone(), all.len() as u64, page))
        }
    }

    fn hit(id: &str, score: f64) -> RegulationMatch {
        RegulationMatch {
            id: id.to_string(),
            text: format!("{id} text"),
            category: ComplianceCategory::SafetyCompliance,
            score,
        }
    }

    fn clause(document_id: &str, index: usize, text: &str) -> Clause {
        let candidate = ClauseCandidate {
            label: (index + 1).to_string(),
            section_reference: format!("Clause {}", index + 1),
            text: text.to_string(),
            strategy: "numbered_clauses".to_string(),
        };
        Clause::from_parts(document_id, index, &candidate, ClassificationResult::unknown("test"), Vec::new(), vec![1])
    }

    fn mapper(repository: Arc<RecordingRepository>, hits: Vec<RegulationMatch>, config: SemanticMapperConfig) -> SemanticMapper {
        SemanticMapper::new(Arc::new(LengthEmbedder), Arc::new(FixedIndex { hits }), repository, config)
    }

    #[tokio::test]
    async fn test_maps_every_clause_in_order() {
        let repository = Arc::new(RecordingRepository::default());
        let mapper = mapper(
            Arc::clone(&repository),
            vec![hit("whs-19", 0.91), hit("whs-27", 0.8), hit("env-3", 0.5)],
            SemanticMapperConfig { concurrency: 4, ..Default::default() },
        );
        let clauses: Vec<Clause> = (0..5)
            .map(|i| clause("doc_1", i, &format!("clause number {i} about safety")))
            .collect();

        let summary = mapper.map_document("doc_1", &clauses).await.unwrap();

        assert_eq!(summary.clauses_processed, 5);
        assert_eq!(summary.mappings_created, 10);
        assert_eq!(summary.clauses_without_match, 0);

        let clause_order: Vec<&str> = summary.mappings.iter().map(|m| m.clause_id.as_str()).collect();
        let mut sorted = clause_order.clone();
        sorted.sort_unstable();
        assert_eq!(clause_order, sorted);

        assert_eq!(summary.mappings[0].id, "map_doc_1_clause_000_whs-19");
        assert_eq!(summary.mappings[0].mapping_type, RegulationMapping::SEMANTIC_SIMILARITY);
        assert_eq!(repository.embeddings.lock().unwrap().len(), 5);
        assert_eq!(repository.mappings.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_threshold_and_limit_are_passed_through() {
        let repository = Arc::new(RecordingRepository::default());
        let mapper = mapper(
            Arc::clone(&repository),
            vec![hit("a", 0.99), hit("b", 0.95), hit("c", 0.9)],
            SemanticMapperConfig {
                similarity_threshold: 0.92,
                max_results: 1,
                concurrency: 1,
            },
        );

        let summary = mapper
            .map_document("doc_2", &[clause("doc_2", 0, "single clause")])
            .await
            .unwrap();

        assert_eq!(summary.mappings.len(), 1);
        assert_eq!(summary.mappings[0].regulation_id, "a");
    }

    #[tokio::test]
    async fn test_clause_without_hits_is_counted() {
        let repository = Arc::new(RecordingRepository::default());
        let mapper = mapper(Arc::clone(&repository), vec![hit("low", 0.2)], SemanticMapperConfig::default());

        let summary = mapper
            .map_document("doc_3", &[clause("doc_3", 0, "nothing relevant")])
            .await
            .unwrap();

        assert_eq!(summary.mappings_created, 0);
        assert_eq!(summary.clauses_without_match, 1);
        assert_eq!(repository.embeddings.lock().unwrap()[0].model, "length-v1");
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_document() {
        let repository = Arc::new(RecordingRepository::default());
        let mapper = mapper(Arc::clone(&repository), vec![hit("a", 0.9)], SemanticMapperConfig::default());

        let result = mapper
            .map_document("doc_4", &[clause("doc_4", 0, "fine"), clause("doc_4", 1, "this will explode")])
            .await;

        assert!(matches!(result, Err(DomainError::TransientInfra(_))));
        assert!(repository.mappings.lock().unwrap().is_empty());
    }
}
