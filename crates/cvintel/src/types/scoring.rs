//! Scoring and matching types (§3, §4.10, §4.11).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The kind of a scoring criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
    Skill,
    Language,
    Certification,
    Experience,
    Education,
    Custom,
}

/// A single scoring criterion belonging to a job posting (§3
/// ScoringCriterion). Unique key per job: `(job_id, type, value)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct ScoringCriterion {
    pub criteria_type: CriteriaType,
    pub value: String,
    pub points: u32,
    pub required: bool,
    pub weight: f32,
    pub min_value: Option<u32>,
    pub per_unit_points: Option<f32>,
    pub max_points: Option<u32>,
    pub sort_order: i32,
}

impl ScoringCriterion {
    pub fn points_possible(&self) -> u32 {
        (self.points as f32 * self.weight).round() as u32
    }
}

/// The result of evaluating a single criterion (§3 CriterionResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct CriterionResult {
    pub criteria_type: CriteriaType,
    pub value: String,
    pub points_possible: u32,
    pub points_earned: u32,
    pub required: bool,
    pub matched: bool,
    pub details: String,
}

/// The normalised candidate profile §4.10's scoring engine consumes.
#[derive(Debug, Clone, Default)]
pub struct CandidateScoringData {
    pub skills: Vec<String>,
    pub languages: HashMap<String, String>,
    pub certifications: Vec<String>,
    pub experience_years: f32,
    pub education_level: String,
}

/// The complete scoring result for a candidate against a job's criteria
/// (§3 ScoringResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct ScoringResult {
    pub total_points: u32,
    pub max_points: u32,
    pub percentage: f32,
    pub matched: Vec<CriterionResult>,
    pub missing: Vec<CriterionResult>,
    pub required_missing: Vec<CriterionResult>,
    pub disqualified: bool,
    pub reason: Option<String>,
}

/// The result of matching one candidate against one job (§3 MatchResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct MatchResult {
    pub candidate_id: String,
    pub job_id: String,
    pub cosine: f32,
    pub criteria_points: u32,
    pub criteria_max: u32,
    pub combined_score: f32,
    pub rank: u32,
    pub breakdown: ScoreBreakdown,
    pub matched: Vec<CriterionResult>,
    pub missing: Vec<CriterionResult>,
    pub disqualified: bool,
}

/// The weighted components a combined score was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct ScoreBreakdown {
    pub semantic_raw: f32,
    pub semantic_weighted: f32,
    pub criteria_percentage: f32,
    pub criteria_weighted: f32,
    pub semantic_weight: f32,
    pub criteria_weight: f32,
}
