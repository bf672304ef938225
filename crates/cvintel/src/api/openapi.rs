//! OpenAPI 3.1 schema generation for the cvintel API (§6.1, §10).
//!
//! The schema is served at `GET /openapi.json`.

use utoipa::OpenApi;

/// OpenAPI documentation structure: every route in §6.1 and the request
/// and response types it carries.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "cvintel API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Résumé-to-match pipeline: OCR, layout-aware structured extraction, embeddings and scoring."
    ),
    paths(
        super::handlers::health_handler,
        super::handlers::liveness_handler,
        super::handlers::readiness_handler,
        super::handlers::info_handler,
        super::handlers::embeddings_generate_handler,
        super::handlers::embeddings_bulk_generate_handler,
        super::handlers::candidate_embedding_metadata_handler,
        super::handlers::delete_candidate_embedding_handler,
        super::handlers::ocr_process_handler,
        super::handlers::ocr_process_upload_handler,
        super::handlers::ocr_formats_handler,
        super::handlers::ocr_languages_handler,
        super::handlers::ocr_health_handler,
        super::handlers::extract_structured_handler,
        super::handlers::matching_semantic_handler,
        super::handlers::matching_single_handler,
        super::handlers::matching_search_handler,
        super::handlers::matching_store_result_handler,
        super::handlers::matching_results_for_job_handler,
        super::handlers::list_criteria_handler,
        super::handlers::add_criterion_handler,
        super::handlers::delete_criterion_handler,
        super::handlers::delete_all_criteria_handler,
        super::handlers::scoring_calculate_handler,
        super::handlers::scoring_templates_handler,
    ),
    components(
        schemas(
            super::types::HealthResponse,
            super::types::LivenessResponse,
            super::types::ReadinessResponse,
            super::types::ReadinessComponents,
            super::types::InfoResponse,
            super::types::EntityType,
            super::types::EmbeddingGenerateRequest,
            super::types::EmbeddingGenerateResponse,
            super::types::BulkEmbeddingRequest,
            super::types::BulkEmbeddingResponse,
            super::types::EmbeddingMetadataResponse,
            super::types::DeleteResponse,
            super::types::OcrProcessRequest,
            super::types::OcrLineResponse,
            super::types::OcrProcessResponse,
            super::types::OcrFormatsResponse,
            super::types::OcrLanguagesResponse,
            super::types::OcrHealthResponse,
            super::types::ExtractStructuredRequest,
            super::types::SemanticSearchRequest,
            super::types::SemanticMatchItem,
            super::types::SingleMatchRequest,
            super::types::FindMatchesRequest,
            super::types::StoreMatchResultRequest,
            super::types::StoreMatchResultResponse,
            super::types::ScoringCriterionDto,
            super::types::DeleteCriterionResponse,
            super::types::ScoringCalculateRequest,
            super::types::CandidateScoringDataDto,
            super::types::ScoringTemplate,
            super::error::ErrorResponse,
            crate::types::StructuredCandidate,
            crate::types::Tier1Profile,
            crate::types::ConfidenceField,
            crate::types::JobRecord,
            crate::types::EducationRecord,
            crate::types::SkillToken,
            crate::types::RawSections,
            crate::types::MatchResult,
            crate::types::ScoreBreakdown,
            crate::types::CriterionResult,
            crate::types::ScoringResult,
            crate::types::CriteriaType,
            crate::ocr::EngineInfo,
            crate::ocr::EngineRole,
        )
    ),
    tags(
        (name = "health", description = "Health and readiness endpoints"),
        (name = "embeddings", description = "Embedding generation and lookup"),
        (name = "ocr", description = "OCR and structured extraction"),
        (name = "matching", description = "Candidate-to-job matching"),
        (name = "scoring", description = "Criteria and scoring"),
    )
)]
pub struct ApiDoc;

/// Generate the OpenAPI JSON schema as a pretty-printed string.
pub fn openapi_json() -> String {
    ApiDoc::openapi().to_pretty_json().unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_valid_json_and_names_the_service() {
        let schema = openapi_json();
        let parsed: serde_json::Value = serde_json::from_str(&schema).expect("schema is valid JSON");
        assert!(parsed["openapi"].is_string());
        assert!(schema.contains("cvintel API"));
    }

    #[test]
    fn schema_includes_every_route() {
        let schema = openapi_json();
        assert!(schema.contains("/health"));
        assert!(schema.contains("/api/embeddings/generate"));
        assert!(schema.contains("/api/ocr/process"));
        assert!(schema.contains("/api/matching/search"));
        assert!(schema.contains("/api/scoring/calculate"));
    }
}
