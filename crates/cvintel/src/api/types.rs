//! API request and response types (§6.1).

use serde::{Deserialize, Serialize};

use crate::types::{CriteriaType, MatchResult, OcrLine, ScoringCriterion, StructuredCandidate};

/// Basic status response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /health/live`: process liveness, independent of dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LivenessResponse {
    pub status: String,
}

/// `GET /health/ready`: whether dependencies are actually usable.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub components: ReadinessComponents,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReadinessComponents {
    pub embedding_model: bool,
    pub database: bool,
    pub ocr: bool,
}

/// `GET /health/info`: service metadata.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InfoResponse {
    pub app_name: String,
    pub version: String,
    pub environment: String,
}

/// The kind of entity an embedding is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Candidate,
    Job,
}

/// `POST /api/embeddings/generate` request body (§6.1).
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct EmbeddingGenerateRequest {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub text_content: String,
    #[serde(default)]
    pub skills_text: Option<String>,
    #[serde(default)]
    pub experience_text: Option<String>,
    #[serde(default)]
    pub requirements_text: Option<String>,
    #[serde(default = "default_store")]
    pub store: bool,
}

fn default_store() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingGenerateResponse {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub embedding_dimension: usize,
    pub stored: bool,
    pub content_hash: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct BulkEmbeddingRequest {
    pub items: Vec<EmbeddingGenerateRequest>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BulkEmbeddingResponse {
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// `GET /api/embeddings/candidate/{id}`: metadata only, never the vector.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingMetadataResponse {
    pub entity_id: String,
    pub embedding_dimension: usize,
    pub model_name: String,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// `POST /api/ocr/process` request body (§6.1).
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OcrProcessRequest {
    pub file_content: String,
    pub file_type: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_extract_structured")]
    pub extract_structured: bool,
}

fn default_extract_structured() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OcrLineResponse {
    pub text: String,
    pub confidence: f32,
    pub page: u32,
}

impl From<&OcrLine> for OcrLineResponse {
    fn from(line: &OcrLine) -> Self {
        Self { text: line.text.clone(), confidence: line.confidence, page: line.page }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrProcessResponse {
    pub lines: Vec<OcrLineResponse>,
    pub structured_data: Option<StructuredCandidate>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrFormatsResponse {
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrLanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrHealthResponse {
    pub engines: Vec<crate::ocr::EngineInfo>,
}

/// `POST /api/ocr/extract-structured` request: text-in, optionally with
/// line geometry for column-aware section splitting (§4.3).
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ExtractStructuredRequest {
    pub text: String,
    #[serde(default)]
    pub lines: Option<Vec<OcrLineResponse>>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SemanticSearchRequest {
    pub query_text: String,
    #[serde(default = "default_match_limit")]
    pub limit: usize,
    #[serde(default)]
    pub min_similarity: f32,
}

fn default_match_limit() -> usize {
    crate::matching::DEFAULT_MATCH_LIMIT
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SemanticMatchItem {
    pub candidate_id: String,
    pub score: f32,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SingleMatchRequest {
    pub candidate_id: String,
    pub job_id: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct FindMatchesRequest {
    pub job_id: String,
    #[serde(default)]
    pub min_score: Option<f32>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_breakdown: Option<bool>,
    #[serde(default)]
    pub exclude_disqualified: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct StoreMatchResultRequest {
    pub match_result: MatchResult,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StoreMatchResultResponse {
    pub stored: bool,
}

/// A scoring criterion as exposed through the CRUD routes, carrying the
/// composite `(type, value)` key clients use to reference it (§6.2;
/// no surrogate id exists in the underlying table).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoringCriterionDto {
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

impl From<ScoringCriterionDto> for ScoringCriterion {
    fn from(dto: ScoringCriterionDto) -> Self {
        Self {
            criteria_type: dto.criteria_type,
            value: dto.value,
            points: dto.points,
            required: dto.required,
            weight: dto.weight,
            min_value: dto.min_value,
            per_unit_points: dto.per_unit_points,
            max_points: dto.max_points,
            sort_order: dto.sort_order,
        }
    }
}

impl From<&ScoringCriterion> for ScoringCriterionDto {
    fn from(criterion: &ScoringCriterion) -> Self {
        Self {
            criteria_type: criterion.criteria_type,
            value: criterion.value.clone(),
            points: criterion.points,
            required: criterion.required,
            weight: criterion.weight,
            min_value: criterion.min_value,
            per_unit_points: criterion.per_unit_points,
            max_points: criterion.max_points,
            sort_order: criterion.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeleteCriterionResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ScoringCalculateRequest {
    pub candidate_data: CandidateScoringDataDto,
    pub criteria: Vec<ScoringCriterionDto>,
}

/// JSON-friendly mirror of [`crate::types::CandidateScoringData`]: the
/// core type uses a `HashMap` for languages, which this keeps as-is since
/// both serialize identically.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct CandidateScoringDataDto {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub experience_years: f32,
    #[serde(default)]
    pub education_level: String,
}

impl From<CandidateScoringDataDto> for crate::types::CandidateScoringData {
    fn from(dto: CandidateScoringDataDto) -> Self {
        Self {
            skills: dto.skills,
            languages: dto.languages,
            certifications: dto.certifications,
            experience_years: dto.experience_years,
            education_level: dto.education_level,
        }
    }
}

/// A named preset criteria set exposed via `GET /api/scoring/templates`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ScoringTemplate {
    pub name: String,
    pub description: String,
    pub criteria: Vec<ScoringCriterionDto>,
}
