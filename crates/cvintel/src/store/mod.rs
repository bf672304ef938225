//! In-memory reference implementation of the persisted state (§6.2): the
//! six-table contract (`candidate_embeddings`, `job_embeddings`,
//! `scoring_criteria`, `semantic_match_results`, plus the candidate
//! scoring-data view the Match Orchestrator reads through
//! [`CandidateDataSource`]), used by tests and as the default store when
//! no external database is wired in.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::matching::{CandidateDataSource, CriteriaSource, EmbeddingStore, MatchResultStore};
use crate::types::{CandidateEmbeddingRecord, CandidateScoringData, CriteriaType, EmbeddingVector, JobEmbeddingRecord, MatchResult, ScoringCriterion};

#[derive(Default)]
struct Tables {
    candidate_embeddings: HashMap<String, CandidateEmbeddingRecord>,
    job_embeddings: HashMap<String, JobEmbeddingRecord>,
    scoring_criteria: HashMap<String, Vec<ScoringCriterion>>,
    match_results: HashMap<(String, String), MatchResult>,
    candidate_scoring_data: HashMap<String, CandidateScoringData>,
}

/// The default `CandidateStore`: every table lives behind one lock,
/// matching the reference store's role as a test double and fallback,
/// not a production database.
pub struct InMemoryCandidateStore {
    tables: RwLock<Tables>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::default()) }
    }

    pub fn upsert_candidate_embedding(&self, record: CandidateEmbeddingRecord) {
        self.tables.write().unwrap().candidate_embeddings.insert(record.candidate_id.clone(), record);
    }

    pub fn upsert_job_embedding(&self, record: JobEmbeddingRecord) {
        self.tables.write().unwrap().job_embeddings.insert(record.job_id.clone(), record);
    }

    pub fn candidate_embedding_record(&self, candidate_id: &str) -> Option<CandidateEmbeddingRecord> {
        self.tables.read().unwrap().candidate_embeddings.get(candidate_id).cloned()
    }

    pub fn remove_candidate_embedding(&self, candidate_id: &str) -> bool {
        self.tables.write().unwrap().candidate_embeddings.remove(candidate_id).is_some()
    }

    pub fn set_candidate_scoring_data(&self, candidate_id: impl Into<String>, data: CandidateScoringData) {
        self.tables.write().unwrap().candidate_scoring_data.insert(candidate_id.into(), data);
    }

    pub fn list_criteria(&self, job_id: &str) -> Vec<ScoringCriterion> {
        self.tables.read().unwrap().scoring_criteria.get(job_id).cloned().unwrap_or_default()
    }

    pub fn add_criterion(&self, job_id: impl Into<String>, criterion: ScoringCriterion) {
        self.tables.write().unwrap().scoring_criteria.entry(job_id.into()).or_default().push(criterion);
    }

    /// Deletes criteria matching the `(type, value)` unique key (§6.2),
    /// returning the number of rows removed.
    pub fn delete_criterion(&self, job_id: &str, criteria_type: CriteriaType, value: &str) -> usize {
        let mut tables = self.tables.write().unwrap();
        let Some(criteria) = tables.scoring_criteria.get_mut(job_id) else {
            return 0;
        };
        let before = criteria.len();
        criteria.retain(|c| !(c.criteria_type == criteria_type && c.value == value));
        before - criteria.len()
    }

    pub fn delete_all_criteria(&self, job_id: &str) -> usize {
        self.tables.write().unwrap().scoring_criteria.remove(job_id).map(|c| c.len()).unwrap_or(0)
    }

    pub fn match_results_for_job(&self, job_id: &str) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self.tables.read().unwrap().match_results.values().filter(|m| m.job_id == job_id).cloned().collect();
        results.sort_by_key(|m| m.rank);
        results
    }
}

impl Default for InMemoryCandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryCandidateStore {
    async fn job_embedding(&self, job_id: &str) -> Result<Option<EmbeddingVector>> {
        Ok(self.tables.read().unwrap().job_embeddings.get(job_id).map(|r| r.combined.clone()))
    }

    async fn candidate_embedding(&self, candidate_id: &str) -> Result<Option<EmbeddingVector>> {
        Ok(self.tables.read().unwrap().candidate_embeddings.get(candidate_id).map(|r| r.combined.clone()))
    }

    async fn nearest_candidates(&self, query: &EmbeddingVector, limit: usize) -> Result<Vec<(String, f32)>> {
        let tables = self.tables.read().unwrap();
        let mut scored: Vec<(String, f32)> = tables.candidate_embeddings.values().map(|r| (r.candidate_id.clone(), query.cosine_similarity(&r.combined))).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[async_trait]
impl CandidateDataSource for InMemoryCandidateStore {
    async fn candidate_scoring_data(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>> {
        Ok(self.tables.read().unwrap().candidate_scoring_data.get(candidate_id).cloned())
    }
}

#[async_trait]
impl CriteriaSource for InMemoryCandidateStore {
    async fn job_criteria(&self, job_id: &str) -> Result<Vec<ScoringCriterion>> {
        Ok(self.list_criteria(job_id))
    }
}

#[async_trait]
impl MatchResultStore for InMemoryCandidateStore {
    async fn upsert(&self, result: &MatchResult) -> Result<()> {
        self.tables.write().unwrap().match_results.insert((result.candidate_id.clone(), result.job_id.clone()), result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding_record(id: &str, value: f32) -> CandidateEmbeddingRecord {
        CandidateEmbeddingRecord {
            candidate_id: id.to_string(),
            combined: EmbeddingVector::new(vec![value, 0.0]),
            parts: Default::default(),
            model_name: "test".to_string(),
            content_hash: "hash".to_string(),
            created_at: "now".to_string(),
            updated_at: "now".to_string(),
        }
    }

    #[tokio::test]
    async fn nearest_candidates_orders_by_descending_cosine() {
        let store = InMemoryCandidateStore::new();
        store.upsert_candidate_embedding(embedding_record("a", 1.0));
        store.upsert_candidate_embedding(embedding_record("b", -1.0));

        let query = EmbeddingVector::new(vec![1.0, 0.0]);
        let results = store.nearest_candidates(&query, 10).await.unwrap();
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
    }

    #[test]
    fn delete_criterion_matches_type_and_value_key() {
        let store = InMemoryCandidateStore::new();
        store.add_criterion("job-1", ScoringCriterion { criteria_type: CriteriaType::Skill, value: "Rust".into(), points: 10, required: false, weight: 1.0, min_value: None, per_unit_points: None, max_points: None, sort_order: 0 });
        store.add_criterion("job-1", ScoringCriterion { criteria_type: CriteriaType::Skill, value: "Go".into(), points: 10, required: false, weight: 1.0, min_value: None, per_unit_points: None, max_points: None, sort_order: 1 });

        let removed = store.delete_criterion("job-1", CriteriaType::Skill, "Rust");
        assert_eq!(removed, 1);
        assert_eq!(store.list_criteria("job-1").len(), 1);
    }

    #[test]
    fn remove_candidate_embedding_reports_whether_it_existed() {
        let store = InMemoryCandidateStore::new();
        assert!(!store.remove_candidate_embedding("missing"));
        store.upsert_candidate_embedding(embedding_record("present", 1.0));
        assert!(store.remove_candidate_embedding("present"));
        assert!(!store.remove_candidate_embedding("present"));
    }
}
