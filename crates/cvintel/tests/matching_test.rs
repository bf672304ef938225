//! End-to-end match-orchestrator scenarios over the in-memory reference
//! store (§6.2), exercising the combined-score and ranking invariants
//! from §8 against real trait objects rather than ad-hoc stubs.

use std::sync::Arc;

use cvintel::matching::{FindMatchesOptions, MatchOrchestrator};
use cvintel::store::InMemoryCandidateStore;
use cvintel::types::{CandidateEmbeddingRecord, CandidateScoringData, EmbeddingVector, JobEmbeddingRecord};

fn unit_vector(values: Vec<f32>) -> EmbeddingVector {
    let mut v = EmbeddingVector::new(values);
    v.normalize();
    v
}

fn candidate_record(id: &str, vector: EmbeddingVector) -> CandidateEmbeddingRecord {
    CandidateEmbeddingRecord {
        candidate_id: id.to_string(),
        combined: vector,
        parts: Default::default(),
        model_name: "test-model".to_string(),
        content_hash: "hash".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// Two candidates with cosine similarities of 0.80 and 0.60 against a job,
/// identical 50% criteria percentage (empty criteria lists score 100%, so
/// this test instead gives both candidates scoring data that yields
/// exactly 50% against one optional criterion), default weights (0.4,
/// 0.6): combined scores of 62 and 54, ranked 1 and 2 (§8 scenario 6).
#[tokio::test]
async fn combined_score_and_rank_match_weighted_formula() {
    let store = Arc::new(InMemoryCandidateStore::new());

    // A 45-degree-ish pair of unit vectors gives a clean 0.8/0.6 split: a
    // vector at cosine 0.8 from (1,0) is (0.8, 0.6); at 0.6 it's (0.6, 0.8).
    store.upsert_job_embedding(JobEmbeddingRecord {
        job_id: "job-1".to_string(),
        combined: unit_vector(vec![1.0, 0.0]),
        parts: Default::default(),
        model_name: "test-model".to_string(),
        content_hash: "hash".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    });
    store.upsert_candidate_embedding(candidate_record("high", EmbeddingVector::new(vec![0.8, 0.6])));
    store.upsert_candidate_embedding(candidate_record("low", EmbeddingVector::new(vec![0.6, 0.8])));

    // One optional criterion worth 10 points that exactly one of the two
    // skills each candidate has satisfies, giving both a 50% percentage.
    store.add_criterion(
        "job-1",
        cvintel::types::ScoringCriterion {
            criteria_type: cvintel::types::CriteriaType::Skill,
            value: "rust".to_string(),
            points: 10,
            required: false,
            weight: 1.0,
            min_value: None,
            per_unit_points: None,
            max_points: None,
            sort_order: 0,
        },
    );
    store.add_criterion(
        "job-1",
        cvintel::types::ScoringCriterion {
            criteria_type: cvintel::types::CriteriaType::Skill,
            value: "cobol".to_string(),
            points: 10,
            required: false,
            weight: 1.0,
            min_value: None,
            per_unit_points: None,
            max_points: None,
            sort_order: 1,
        },
    );
    store.set_candidate_scoring_data("high", CandidateScoringData { skills: vec!["rust".to_string()], ..Default::default() });
    store.set_candidate_scoring_data("low", CandidateScoringData { skills: vec!["rust".to_string()], ..Default::default() });

    let orchestrator = MatchOrchestrator::new(store.clone(), store.clone(), store.clone(), 0.4, 0.6);
    let results = orchestrator.find_matches("job-1", &FindMatchesOptions { min_score: 0.0, ..Default::default() }).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].candidate_id, "high");
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[1].candidate_id, "low");
    assert_eq!(results[1].rank, 2);

    assert!((results[0].combined_score - 62.0).abs() < 0.5);
    assert!((results[1].combined_score - 54.0).abs() < 0.5);

    // Rank monotonicity and score bounds (§8 invariants).
    for window in results.windows(2) {
        assert!(window[0].combined_score >= window[1].combined_score);
    }
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.rank, (i + 1) as u32);
        assert!(result.combined_score >= 0.0 && result.combined_score <= 100.0);
    }
}

#[tokio::test]
async fn persisted_match_result_is_retrievable_by_job() {
    let store = Arc::new(InMemoryCandidateStore::new());
    store.upsert_job_embedding(JobEmbeddingRecord {
        job_id: "job-1".to_string(),
        combined: unit_vector(vec![1.0, 0.0]),
        parts: Default::default(),
        model_name: "test-model".to_string(),
        content_hash: "hash".to_string(),
        created_at: "now".to_string(),
        updated_at: "now".to_string(),
    });
    store.upsert_candidate_embedding(candidate_record("c1", unit_vector(vec![1.0, 0.0])));

    let orchestrator = MatchOrchestrator::new(store.clone(), store.clone(), store.clone(), 0.4, 0.6);
    let result = orchestrator.calculate_single_match("c1", "job-1").await.unwrap().unwrap();

    cvintel::matching::persist_match_result(store.as_ref(), &result).await.unwrap();

    let stored = store.match_results_for_job("job-1");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].candidate_id, "c1");
}
