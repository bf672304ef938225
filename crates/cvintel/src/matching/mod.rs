//! Match Orchestrator (C11, §4.11): combines semantic similarity with
//! criteria scoring, ranks candidates, and persists results.

use std::sync::Arc;

use async_trait::async_trait;

use crate::embeddings::{embed_query, Embedder};
use crate::error::Result;
use crate::scoring::calculate_score;
use crate::types::{CandidateScoringData, EmbeddingVector, MatchResult, ScoreBreakdown, ScoringCriterion};

/// Source of stored embeddings and the nearest-neighbour search over
/// them. Backed by a vector store (e.g. pgvector) in a full deployment.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn job_embedding(&self, job_id: &str) -> Result<Option<EmbeddingVector>>;
    async fn candidate_embedding(&self, candidate_id: &str) -> Result<Option<EmbeddingVector>>;
    /// Nearest candidates to `query`, ordered by descending cosine similarity.
    async fn nearest_candidates(&self, query: &EmbeddingVector, limit: usize) -> Result<Vec<(String, f32)>>;
}

/// Source of a candidate's normalised scoring fields (skills,
/// languages, certifications, experience, education).
#[async_trait]
pub trait CandidateDataSource: Send + Sync {
    async fn candidate_scoring_data(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>>;
}

/// Source of a job posting's configured scoring criteria.
#[async_trait]
pub trait CriteriaSource: Send + Sync {
    async fn job_criteria(&self, job_id: &str) -> Result<Vec<ScoringCriterion>>;
}

/// Persists a computed match result, e.g. to an upsert-on-conflict table.
#[async_trait]
pub trait MatchResultStore: Send + Sync {
    async fn upsert(&self, result: &MatchResult) -> Result<()>;
}

#[async_trait]
impl<T: EmbeddingStore + ?Sized> EmbeddingStore for Arc<T> {
    async fn job_embedding(&self, job_id: &str) -> Result<Option<EmbeddingVector>> {
        (**self).job_embedding(job_id).await
    }

    async fn candidate_embedding(&self, candidate_id: &str) -> Result<Option<EmbeddingVector>> {
        (**self).candidate_embedding(candidate_id).await
    }

    async fn nearest_candidates(&self, query: &EmbeddingVector, limit: usize) -> Result<Vec<(String, f32)>> {
        (**self).nearest_candidates(query, limit).await
    }
}

#[async_trait]
impl<T: CandidateDataSource + ?Sized> CandidateDataSource for Arc<T> {
    async fn candidate_scoring_data(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>> {
        (**self).candidate_scoring_data(candidate_id).await
    }
}

#[async_trait]
impl<T: CriteriaSource + ?Sized> CriteriaSource for Arc<T> {
    async fn job_criteria(&self, job_id: &str) -> Result<Vec<ScoringCriterion>> {
        (**self).job_criteria(job_id).await
    }
}

#[async_trait]
impl<T: MatchResultStore + ?Sized> MatchResultStore for Arc<T> {
    async fn upsert(&self, result: &MatchResult) -> Result<()> {
        (**self).upsert(result).await
    }
}

/// Default weighting if neither the caller nor configuration overrides it.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.4;
pub const DEFAULT_CRITERIA_WEIGHT: f32 = 0.6;
pub const DEFAULT_MIN_SCORE: f32 = 50.0;
pub const DEFAULT_MATCH_LIMIT: usize = 50;

pub struct MatchOrchestrator<E, C, J> {
    embeddings: E,
    candidates: C,
    criteria: J,
    semantic_weight: f32,
    criteria_weight: f32,
}

/// Parameters for [`MatchOrchestrator::find_matches`], mirroring
/// `find_matches`'s keyword arguments (§4.11).
#[derive(Debug, Clone)]
pub struct FindMatchesOptions {
    pub min_score: f32,
    pub limit: usize,
    pub include_breakdown: bool,
    pub exclude_disqualified: bool,
}

impl Default for FindMatchesOptions {
    fn default() -> Self {
        Self { min_score: DEFAULT_MIN_SCORE, limit: DEFAULT_MATCH_LIMIT, include_breakdown: true, exclude_disqualified: false }
    }
}

impl<E, C, J> MatchOrchestrator<E, C, J>
where
    E: EmbeddingStore,
    C: CandidateDataSource,
    J: CriteriaSource,
{
    pub fn new(embeddings: E, candidates: C, criteria: J, semantic_weight: f32, criteria_weight: f32) -> Self {
        Self { embeddings, candidates, criteria, semantic_weight, criteria_weight }
    }

    fn combined_score(&self, cosine: f32, criteria_percentage: f32) -> ScoreBreakdown {
        let semantic_score = cosine * 100.0;
        ScoreBreakdown {
            semantic_raw: cosine,
            semantic_weighted: semantic_score * self.semantic_weight,
            criteria_percentage,
            criteria_weighted: criteria_percentage * self.criteria_weight,
            semantic_weight: self.semantic_weight,
            criteria_weight: self.criteria_weight,
        }
    }

    fn build_match(
        &self,
        candidate_id: String,
        job_id: String,
        cosine: f32,
        criteria: &[ScoringCriterion],
        candidate_data: &CandidateScoringData,
        include_breakdown: bool,
    ) -> MatchResult {
        let scoring = calculate_score(candidate_data, criteria);
        let breakdown = self.combined_score(cosine, scoring.percentage);
        let combined_score = breakdown.semantic_weighted + breakdown.criteria_weighted;

        MatchResult {
            candidate_id,
            job_id,
            cosine,
            criteria_points: scoring.total_points,
            criteria_max: scoring.max_points,
            combined_score,
            rank: 0,
            breakdown,
            matched: if include_breakdown { scoring.matched } else { Vec::new() },
            missing: if include_breakdown { scoring.missing } else { Vec::new() },
            disqualified: scoring.disqualified,
        }
    }

    /// Rank candidates for a job by combined semantic + criteria score
    /// (§4.11 `find_matches`). Empty if the job has no stored embedding.
    pub async fn find_matches(&self, job_id: &str, options: &FindMatchesOptions) -> Result<Vec<MatchResult>> {
        let job_embedding = match self.embeddings.job_embedding(job_id).await? {
            Some(e) => e,
            None => return Ok(Vec::new()),
        };

        let criteria = self.criteria.job_criteria(job_id).await?;
        let candidates = self.embeddings.nearest_candidates(&job_embedding, options.limit * 2).await?;

        let mut results = Vec::new();
        for (candidate_id, cosine) in candidates {
            let Some(candidate_data) = self.candidates.candidate_scoring_data(&candidate_id).await? else {
                continue;
            };

            let result = self.build_match(candidate_id, job_id.to_string(), cosine, &criteria, &candidate_data, options.include_breakdown);

            if options.exclude_disqualified && result.disqualified {
                continue;
            }
            if result.combined_score < options.min_score {
                continue;
            }
            results.push(result);
        }

        results.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(options.limit);
        for (i, result) in results.iter_mut().enumerate() {
            result.rank = (i + 1) as u32;
        }

        Ok(results)
    }

    /// Score exactly one candidate-job pair (§4.11 `calculate_single_match`).
    /// `None` if either side lacks a stored embedding.
    pub async fn calculate_single_match(&self, candidate_id: &str, job_id: &str) -> Result<Option<MatchResult>> {
        let (candidate_embedding, job_embedding) =
            tokio::try_join!(self.embeddings.candidate_embedding(candidate_id), self.embeddings.job_embedding(job_id))?;

        let (Some(candidate_embedding), Some(job_embedding)) = (candidate_embedding, job_embedding) else {
            return Ok(None);
        };

        let cosine = candidate_embedding.cosine_similarity(&job_embedding);
        let candidate_data = self.candidates.candidate_scoring_data(candidate_id).await?.unwrap_or_default();
        let criteria = self.criteria.job_criteria(job_id).await?;

        Ok(Some(self.build_match(candidate_id.to_string(), job_id.to_string(), cosine, &criteria, &candidate_data, true)))
    }

    /// Free-text semantic search over candidates (§4.11
    /// `semantic_search_query`), filtered to a minimum similarity.
    pub async fn semantic_search_query(&self, embedder: &dyn Embedder, query_text: &str, limit: usize, min_similarity: f32) -> Result<Vec<(String, f32)>> {
        let query_embedding = embed_query(embedder, query_text)?;
        let hits = self.embeddings.nearest_candidates(&query_embedding, limit).await?;
        Ok(hits.into_iter().filter(|(_, similarity)| *similarity >= min_similarity).collect())
    }
}

/// Recomputes `criteria_percentage` from the stored points before
/// persisting, so stale percentages never survive an upsert (§4.11
/// `store_match_result`).
pub async fn persist_match_result(store: &dyn MatchResultStore, result: &MatchResult) -> Result<()> {
    let mut to_store = result.clone();
    to_store.breakdown.criteria_percentage =
        if to_store.criteria_max > 0 { (to_store.criteria_points as f32 / to_store.criteria_max as f32) * 100.0 } else { 0.0 };
    store.upsert(&to_store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubEmbeddings {
        job: Option<EmbeddingVector>,
        candidate: Option<EmbeddingVector>,
        nearest: Vec<(String, f32)>,
    }

    #[async_trait]
    impl EmbeddingStore for StubEmbeddings {
        async fn job_embedding(&self, _job_id: &str) -> Result<Option<EmbeddingVector>> {
            Ok(self.job.clone())
        }
        async fn candidate_embedding(&self, _candidate_id: &str) -> Result<Option<EmbeddingVector>> {
            Ok(self.candidate.clone())
        }
        async fn nearest_candidates(&self, _query: &EmbeddingVector, limit: usize) -> Result<Vec<(String, f32)>> {
            Ok(self.nearest.iter().take(limit).cloned().collect())
        }
    }

    struct StubCandidates;
    #[async_trait]
    impl CandidateDataSource for StubCandidates {
        async fn candidate_scoring_data(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>> {
            Ok(Some(CandidateScoringData { skills: vec![candidate_id.to_string()], ..Default::default() }))
        }
    }

    struct StubCriteria;
    #[async_trait]
    impl CriteriaSource for StubCriteria {
        async fn job_criteria(&self, _job_id: &str) -> Result<Vec<ScoringCriterion>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn find_matches_ranks_by_combined_score() {
        let orchestrator = MatchOrchestrator::new(
            StubEmbeddings { job: Some(EmbeddingVector::new(vec![1.0, 0.0])), candidate: None, nearest: vec![("c1".into(), 0.9), ("c2".into(), 0.5)] },
            StubCandidates,
            StubCriteria,
            DEFAULT_SEMANTIC_WEIGHT,
            DEFAULT_CRITERIA_WEIGHT,
        );

        let results = orchestrator.find_matches("job-1", &FindMatchesOptions { min_score: 0.0, ..Default::default() }).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].candidate_id, "c1");
        assert_eq!(results[0].rank, 1);
    }

    #[tokio::test]
    async fn find_matches_returns_empty_without_job_embedding() {
        let orchestrator =
            MatchOrchestrator::new(StubEmbeddings { job: None, candidate: None, nearest: vec![] }, StubCandidates, StubCriteria, 0.4, 0.6);
        let results = orchestrator.find_matches("job-1", &FindMatchesOptions::default()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn calculate_single_match_none_without_both_embeddings() {
        let orchestrator = MatchOrchestrator::new(
            StubEmbeddings { job: Some(EmbeddingVector::new(vec![1.0])), candidate: None, nearest: vec![] },
            StubCandidates,
            StubCriteria,
            0.4,
            0.6,
        );
        let result = orchestrator.calculate_single_match("c1", "job-1").await.unwrap();
        assert!(result.is_none());
    }

    struct RecordingStore {
        last: Mutex<Option<MatchResult>>,
    }

    #[async_trait]
    impl MatchResultStore for RecordingStore {
        async fn upsert(&self, result: &MatchResult) -> Result<()> {
            *self.last.lock().unwrap() = Some(result.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn persist_recomputes_criteria_percentage() {
        let store = RecordingStore { last: Mutex::new(None) };
        let mut result = MatchResult {
            candidate_id: "c1".into(),
            job_id: "j1".into(),
            cosine: 0.8,
            criteria_points: 5,
            criteria_max: 10,
            combined_score: 70.0,
            rank: 1,
            breakdown: ScoreBreakdown { semantic_raw: 0.8, semantic_weighted: 32.0, criteria_percentage: 0.0, criteria_weighted: 0.0, semantic_weight: 0.4, criteria_weight: 0.6 },
            matched: Vec::new(),
            missing: Vec::new(),
            disqualified: false,
        };
        result.breakdown.criteria_percentage = 999.0; // stale value to be overwritten

        persist_match_result(&store, &result).await.unwrap();
        let stored = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(stored.breakdown.criteria_percentage, 50.0);
    }
}
