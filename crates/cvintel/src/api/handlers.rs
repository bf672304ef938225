//! API request handlers (§6.1).

use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;

use crate::embeddings::{compose_candidate_embedding, compose_job_embedding, embed_query};
use crate::error::PipelineError;
use crate::matching::{EmbeddingStore, FindMatchesOptions, MatchOrchestrator};
use crate::pipeline::{structured_candidate_from_lines, structured_candidate_from_text};
use crate::scoring::calculate_score;
use crate::types::OcrLine;

use super::error::ApiError;
use super::state::AppState;
use super::types::*;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn require_embedder(state: &AppState) -> Result<&std::sync::Arc<dyn crate::embeddings::Embedder>, ApiError> {
    state.embedder.as_ref().ok_or_else(|| PipelineError::Unavailable("no embedding model is configured".into()).into())
}

/// `GET /health`
#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = HealthResponse)))]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// `GET /health/live`
#[utoipa::path(get, path = "/health/live", tag = "health", responses((status = 200, description = "Process is alive", body = LivenessResponse)))]
pub async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive".to_string() })
}

/// `GET /health/ready`
#[utoipa::path(get, path = "/health/ready", tag = "health", responses((status = 200, description = "Dependency readiness", body = ReadinessResponse)))]
pub async fn readiness_handler(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let components = ReadinessComponents { embedding_model: state.embedder.is_some(), database: true, ocr: state.ocr_ready() };
    let status = if components.embedding_model && components.ocr { "ready" } else { "degraded" };
    Json(ReadinessResponse { status: status.to_string(), components })
}

/// `GET /health/info`
#[utoipa::path(get, path = "/health/info", tag = "health", responses((status = 200, description = "Service metadata", body = InfoResponse)))]
pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse { app_name: state.config.app_name.clone(), version: env!("CARGO_PKG_VERSION").to_string(), environment: state.config.environment.clone() })
}

/// `POST /api/embeddings/generate`
#[utoipa::path(
    post, path = "/api/embeddings/generate", tag = "embeddings",
    request_body = EmbeddingGenerateRequest,
    responses(
        (status = 200, description = "Embedding generated", body = EmbeddingGenerateResponse),
        (status = 422, description = "Bad input", body = ErrorResponse),
        (status = 503, description = "No embedding model configured", body = ErrorResponse),
    )
)]
pub async fn embeddings_generate_handler(State(state): State<AppState>, Json(request): Json<EmbeddingGenerateRequest>) -> Result<Json<EmbeddingGenerateResponse>, ApiError> {
    if request.text_content.trim().len() < 10 {
        return Err(PipelineError::BadInput("text_content must be at least 10 characters".into()).into());
    }
    let embedder = require_embedder(&state)?;

    let response = match request.entity_type {
        EntityType::Candidate => {
            let record = compose_candidate_embedding(embedder.as_ref(), request.entity_id.clone(), Some(&request.text_content), request.skills_text.as_deref(), request.experience_text.as_deref(), &now())?;
            let response = EmbeddingGenerateResponse { entity_id: record.candidate_id.clone(), entity_type: EntityType::Candidate, embedding_dimension: record.combined.dimension(), stored: request.store, content_hash: record.content_hash.clone() };
            if request.store {
                state.store.upsert_candidate_embedding(record);
            }
            response
        }
        EntityType::Job => {
            let record = compose_job_embedding(embedder.as_ref(), request.entity_id.clone(), Some(&request.text_content), request.requirements_text.as_deref(), &now())?;
            let response = EmbeddingGenerateResponse { entity_id: record.job_id.clone(), entity_type: EntityType::Job, embedding_dimension: record.combined.dimension(), stored: request.store, content_hash: record.content_hash.clone() };
            if request.store {
                state.store.upsert_job_embedding(record);
            }
            response
        }
    };

    Ok(Json(response))
}

/// `POST /api/embeddings/bulk-generate`
///
/// Fans out independent per-entity work and aggregates
/// `{processed, failed, errors[]}`; partial failures are not atomic (§5).
#[utoipa::path(
    post, path = "/api/embeddings/bulk-generate", tag = "embeddings",
    request_body = BulkEmbeddingRequest,
    responses((status = 200, description = "Per-item results", body = BulkEmbeddingResponse))
)]
pub async fn embeddings_bulk_generate_handler(State(state): State<AppState>, Json(request): Json<BulkEmbeddingRequest>) -> Result<Json<BulkEmbeddingResponse>, ApiError> {
    let mut processed = 0;
    let mut errors = Vec::new();

    for item in request.items {
        let entity_id = item.entity_id.clone();
        match embeddings_generate_handler(State(state.clone()), Json(item)).await {
            Ok(_) => processed += 1,
            Err(e) => errors.push(format!("{entity_id}: {}", e.body.error)),
        }
    }

    Ok(Json(BulkEmbeddingResponse { failed: errors.len(), processed, errors }))
}

/// `GET /api/embeddings/candidate/{id}` — metadata only, never the vector.
#[utoipa::path(
    get, path = "/api/embeddings/candidate/{id}", tag = "embeddings",
    params(("id" = String, Path, description = "Candidate id")),
    responses(
        (status = 200, description = "Embedding metadata", body = EmbeddingMetadataResponse),
        (status = 404, description = "No embedding stored for this candidate", body = ErrorResponse),
    )
)]
pub async fn candidate_embedding_metadata_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<EmbeddingMetadataResponse>, ApiError> {
    let record = state.store.candidate_embedding_record(&id).ok_or_else(|| PipelineError::NotFound(format!("no embedding stored for candidate {id}")))?;
    Ok(Json(EmbeddingMetadataResponse {
        entity_id: record.candidate_id,
        embedding_dimension: record.combined.dimension(),
        model_name: record.model_name,
        content_hash: record.content_hash,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}

/// `DELETE /api/embeddings/candidate/{id}`
#[utoipa::path(
    delete, path = "/api/embeddings/candidate/{id}", tag = "embeddings",
    params(("id" = String, Path, description = "Candidate id")),
    responses((status = 200, description = "Whether an embedding was removed", body = DeleteResponse))
)]
pub async fn delete_candidate_embedding_handler(State(state): State<AppState>, Path(id): Path<String>) -> Json<DeleteResponse> {
    Json(DeleteResponse { deleted: state.store.remove_candidate_embedding(&id) })
}

fn document_kind_from_file_type(file_type: &str) -> Result<crate::image::DocumentKind, ApiError> {
    use crate::image::DocumentKind;
    match file_type.to_lowercase().as_str() {
        "pdf" => Ok(DocumentKind::Pdf),
        "png" => Ok(DocumentKind::Png),
        "jpeg" | "jpg" => Ok(DocumentKind::Jpeg),
        "tiff" | "tif" => Ok(DocumentKind::Tiff),
        "bmp" => Ok(DocumentKind::Bmp),
        "gif" => Ok(DocumentKind::Gif),
        "webp" => Ok(DocumentKind::Webp),
        other => Err(PipelineError::BadInput(format!("unsupported file_type: {other}")).into()),
    }
}

/// `POST /api/ocr/process`
#[utoipa::path(
    post, path = "/api/ocr/process", tag = "ocr",
    request_body = OcrProcessRequest,
    responses(
        (status = 200, description = "Recognised lines and optional structured extraction", body = OcrProcessResponse),
        (status = 503, description = "OCR support is not enabled", body = ErrorResponse),
    )
)]
#[cfg(feature = "ocr")]
pub async fn ocr_process_handler(State(state): State<AppState>, Json(request): Json<OcrProcessRequest>) -> Result<Json<OcrProcessResponse>, ApiError> {
    let kind = document_kind_from_file_type(&request.file_type)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(request.file_content).map_err(|e| PipelineError::BadInput(format!("invalid base64 file_content: {e}")))?;

    let (lines, structured) = crate::pipeline::extract_structured_document(bytes, kind, &state.ocr_registry).await?;

    let structured_data = if request.extract_structured { Some(structured) } else { None };
    Ok(Json(OcrProcessResponse { lines: lines.iter().map(OcrLineResponse::from).collect(), structured_data }))
}

#[utoipa::path(
    post, path = "/api/ocr/process", tag = "ocr",
    request_body = OcrProcessRequest,
    responses(
        (status = 200, description = "Recognised lines and optional structured extraction", body = OcrProcessResponse),
        (status = 503, description = "OCR support is not enabled", body = ErrorResponse),
    )
)]
#[cfg(not(feature = "ocr"))]
pub async fn ocr_process_handler(State(_state): State<AppState>, Json(_request): Json<OcrProcessRequest>) -> Result<Json<OcrProcessResponse>, ApiError> {
    Err(PipelineError::Unavailable("OCR support is not enabled".into()).into())
}

/// `POST /api/ocr/process-upload` — multipart variant of `ocr_process_handler`.
#[utoipa::path(
    post, path = "/api/ocr/process-upload", tag = "ocr",
    responses(
        (status = 200, description = "Recognised lines and optional structured extraction", body = OcrProcessResponse),
        (status = 503, description = "OCR support is not enabled", body = ErrorResponse),
    )
)]
#[cfg(feature = "ocr")]
pub async fn ocr_process_upload_handler(State(state): State<AppState>, mut multipart: axum::extract::Multipart) -> Result<Json<OcrProcessResponse>, ApiError> {
    let mut file_bytes = None;
    let mut file_type = None;
    let mut extract_structured = true;

    while let Some(field) = multipart.next_field().await.map_err(|e| PipelineError::BadInput(e.to_string()))? {
        match field.name().unwrap_or_default() {
            "file" => {
                file_type = field.content_type().map(|c| c.to_string());
                file_bytes = Some(field.bytes().await.map_err(|e| PipelineError::BadInput(e.to_string()))?.to_vec());
            }
            "file_type" => file_type = Some(field.text().await.map_err(|e| PipelineError::BadInput(e.to_string()))?),
            "extract_structured" => extract_structured = field.text().await.map_err(|e| PipelineError::BadInput(e.to_string()))?.parse().unwrap_or(true),
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| PipelineError::BadInput("no file field provided".into()))?;
    let file_type = file_type.ok_or_else(|| PipelineError::BadInput("file_type could not be determined".into()))?;
    let kind = document_kind_from_file_type(&file_type)?;

    let (lines, structured) = crate::pipeline::extract_structured_document(bytes, kind, &state.ocr_registry).await?;
    let structured_data = if extract_structured { Some(structured) } else { None };
    Ok(Json(OcrProcessResponse { lines: lines.iter().map(OcrLineResponse::from).collect(), structured_data }))
}

#[utoipa::path(
    post, path = "/api/ocr/process-upload", tag = "ocr",
    responses(
        (status = 200, description = "Recognised lines and optional structured extraction", body = OcrProcessResponse),
        (status = 503, description = "OCR support is not enabled", body = ErrorResponse),
    )
)]
#[cfg(not(feature = "ocr"))]
pub async fn ocr_process_upload_handler(State(_state): State<AppState>, _multipart: axum::extract::Multipart) -> Result<Json<OcrProcessResponse>, ApiError> {
    Err(PipelineError::Unavailable("OCR support is not enabled".into()).into())
}

/// `GET /api/ocr/formats`
#[utoipa::path(get, path = "/api/ocr/formats", tag = "ocr", responses((status = 200, description = "Supported file formats", body = OcrFormatsResponse)))]
pub async fn ocr_formats_handler() -> Json<OcrFormatsResponse> {
    Json(OcrFormatsResponse { formats: vec!["pdf".into(), "png".into(), "jpeg".into(), "tiff".into(), "bmp".into(), "gif".into(), "webp".into()] })
}

/// `GET /api/ocr/languages`
#[utoipa::path(get, path = "/api/ocr/languages", tag = "ocr", responses((status = 200, description = "Languages supported by configured engines", body = OcrLanguagesResponse)))]
pub async fn ocr_languages_handler(State(state): State<AppState>) -> Json<OcrLanguagesResponse> {
    #[cfg(feature = "ocr")]
    let languages = state.ocr_registry.engine_info().into_iter().flat_map(|e| e.languages).collect::<std::collections::BTreeSet<_>>().into_iter().collect();
    #[cfg(not(feature = "ocr"))]
    let languages = {
        let _ = &state;
        Vec::new()
    };
    Json(OcrLanguagesResponse { languages })
}

/// `GET /api/ocr/health`
#[utoipa::path(get, path = "/api/ocr/health", tag = "ocr", responses((status = 200, description = "Configured OCR engines and their readiness", body = OcrHealthResponse)))]
pub async fn ocr_health_handler(State(state): State<AppState>) -> Json<OcrHealthResponse> {
    #[cfg(feature = "ocr")]
    let engines = state.ocr_registry.engine_info();
    #[cfg(not(feature = "ocr"))]
    let engines = {
        let _ = &state;
        Vec::new()
    };
    Json(OcrHealthResponse { engines })
}

/// `POST /api/ocr/extract-structured` — text-in, `StructuredCandidate`-out.
#[utoipa::path(
    post, path = "/api/ocr/extract-structured", tag = "ocr",
    request_body = ExtractStructuredRequest,
    responses(
        (status = 200, description = "Structured extraction result", body = crate::types::StructuredCandidate),
        (status = 422, description = "No recognisable personal information", body = ErrorResponse),
    )
)]
pub async fn extract_structured_handler(Json(request): Json<ExtractStructuredRequest>) -> Result<Json<crate::types::StructuredCandidate>, ApiError> {
    let candidate = match request.lines {
        Some(lines) if !lines.is_empty() => {
            let ocr_lines: Vec<OcrLine> = lines
                .into_iter()
                .map(|l| OcrLine::new(l.text, l.confidence, crate::types::Polygon::from_rect(0.0, 0.0, 1.0, 1.0), l.page))
                .collect();
            structured_candidate_from_lines(&ocr_lines)?
        }
        _ => structured_candidate_from_text(&request.text)?,
    };
    Ok(Json(candidate))
}

/// `POST /api/matching/semantic` — free-text semantic search (§4.11).
#[utoipa::path(
    post, path = "/api/matching/semantic", tag = "matching",
    request_body = SemanticSearchRequest,
    responses((status = 200, description = "Ranked candidate ids by cosine similarity", body = [SemanticMatchItem]))
)]
pub async fn matching_semantic_handler(State(state): State<AppState>, Json(request): Json<SemanticSearchRequest>) -> Result<Json<Vec<SemanticMatchItem>>, ApiError> {
    let embedder = require_embedder(&state)?;
    let query_embedding = embed_query(embedder.as_ref(), &request.query_text)?;
    let hits = state.store.nearest_candidates(&query_embedding, request.limit).await?;
    let items = hits.into_iter().filter(|(_, score)| *score >= request.min_similarity).map(|(candidate_id, score)| SemanticMatchItem { candidate_id, score }).collect();
    Ok(Json(items))
}

fn orchestrator(state: &AppState) -> MatchOrchestrator<std::sync::Arc<crate::store::InMemoryCandidateStore>, std::sync::Arc<crate::store::InMemoryCandidateStore>, std::sync::Arc<crate::store::InMemoryCandidateStore>> {
    MatchOrchestrator::new(state.store.clone(), state.store.clone(), state.store.clone(), state.config.semantic_weight, state.config.criteria_weight)
}

/// `POST /api/matching/single` (§4.11 `calculate_single_match`).
#[utoipa::path(
    post, path = "/api/matching/single", tag = "matching",
    request_body = SingleMatchRequest,
    responses(
        (status = 200, description = "Combined match score and breakdown", body = crate::types::MatchResult),
        (status = 404, description = "Candidate or job has no stored embedding", body = ErrorResponse),
    )
)]
pub async fn matching_single_handler(State(state): State<AppState>, Json(request): Json<SingleMatchRequest>) -> Result<Json<crate::types::MatchResult>, ApiError> {
    let result = orchestrator(&state).calculate_single_match(&request.candidate_id, &request.job_id).await?;
    result.map(Json).ok_or_else(|| PipelineError::NotFound(format!("candidate {} or job {} has no stored embedding", request.candidate_id, request.job_id)).into())
}

/// `POST /api/matching/search` (§4.11 `find_matches`).
#[utoipa::path(
    post, path = "/api/matching/search", tag = "matching",
    request_body = FindMatchesRequest,
    responses((status = 200, description = "Ranked candidate matches for a job", body = [crate::types::MatchResult]))
)]
pub async fn matching_search_handler(State(state): State<AppState>, Json(request): Json<FindMatchesRequest>) -> Result<Json<Vec<crate::types::MatchResult>>, ApiError> {
    let defaults = FindMatchesOptions::default();
    let options = FindMatchesOptions {
        min_score: request.min_score.unwrap_or(defaults.min_score),
        limit: request.limit.unwrap_or(defaults.limit),
        include_breakdown: request.include_breakdown.unwrap_or(defaults.include_breakdown),
        exclude_disqualified: request.exclude_disqualified.unwrap_or(defaults.exclude_disqualified),
    };
    let results = orchestrator(&state).find_matches(&request.job_id, &options).await?;
    Ok(Json(results))
}

/// `POST /api/matching/store-result`
#[utoipa::path(
    post, path = "/api/matching/store-result", tag = "matching",
    request_body = StoreMatchResultRequest,
    responses((status = 200, description = "Match result persisted", body = StoreMatchResultResponse))
)]
pub async fn matching_store_result_handler(State(state): State<AppState>, Json(request): Json<StoreMatchResultRequest>) -> Result<Json<StoreMatchResultResponse>, ApiError> {
    crate::matching::persist_match_result(state.store.as_ref(), &request.match_result).await?;
    Ok(Json(StoreMatchResultResponse { stored: true }))
}

/// `GET /api/matching/results/{job_id}`
#[utoipa::path(
    get, path = "/api/matching/results/{job_id}", tag = "matching",
    params(("job_id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Stored match results for the job", body = [crate::types::MatchResult]))
)]
pub async fn matching_results_for_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<Vec<crate::types::MatchResult>> {
    Json(state.store.match_results_for_job(&job_id))
}

/// `GET /api/scoring/criteria/{job_id}`
#[utoipa::path(
    get, path = "/api/scoring/criteria/{job_id}", tag = "scoring",
    params(("job_id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Criteria configured for the job", body = [ScoringCriterionDto]))
)]
pub async fn list_criteria_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<Vec<ScoringCriterionDto>> {
    Json(state.store.list_criteria(&job_id).iter().map(ScoringCriterionDto::from).collect())
}

/// `POST /api/scoring/criteria/{job_id}/add`
#[utoipa::path(
    post, path = "/api/scoring/criteria/{job_id}/add", tag = "scoring",
    params(("job_id" = String, Path, description = "Job id")),
    request_body = ScoringCriterionDto,
    responses((status = 200, description = "Criterion added", body = ScoringCriterionDto))
)]
pub async fn add_criterion_handler(State(state): State<AppState>, Path(job_id): Path<String>, Json(dto): Json<ScoringCriterionDto>) -> Json<ScoringCriterionDto> {
    let criterion: crate::types::ScoringCriterion = dto.into();
    let response = ScoringCriterionDto::from(&criterion);
    state.store.add_criterion(job_id, criterion);
    Json(response)
}

/// `DELETE /api/scoring/criteria/{job_id}/{crit_id}` — `crit_id` is the
/// composite `type:value` key, since the underlying table has no
/// surrogate id (§6.2).
#[utoipa::path(
    delete, path = "/api/scoring/criteria/{job_id}/{crit_id}", tag = "scoring",
    params(
        ("job_id" = String, Path, description = "Job id"),
        ("crit_id" = String, Path, description = "Composite '<type>:<value>' criterion key"),
    ),
    responses(
        (status = 200, description = "Number of criteria removed", body = DeleteCriterionResponse),
        (status = 422, description = "Malformed crit_id", body = ErrorResponse),
    )
)]
pub async fn delete_criterion_handler(State(state): State<AppState>, Path((job_id, crit_id)): Path<(String, String)>) -> Result<Json<DeleteCriterionResponse>, ApiError> {
    let (type_part, value) = crit_id.split_once(':').ok_or_else(|| PipelineError::BadInput("crit_id must be of the form '<type>:<value>'".into()))?;
    let criteria_type = parse_criteria_type(type_part)?;
    Ok(Json(DeleteCriterionResponse { removed: state.store.delete_criterion(&job_id, criteria_type, value) }))
}

/// `DELETE /api/scoring/criteria/{job_id}` — removes every criterion.
#[utoipa::path(
    delete, path = "/api/scoring/criteria/{job_id}", tag = "scoring",
    params(("job_id" = String, Path, description = "Job id")),
    responses((status = 200, description = "Number of criteria removed", body = DeleteCriterionResponse))
)]
pub async fn delete_all_criteria_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<DeleteCriterionResponse> {
    Json(DeleteCriterionResponse { removed: state.store.delete_all_criteria(&job_id) })
}

fn parse_criteria_type(value: &str) -> Result<crate::types::CriteriaType, ApiError> {
    use crate::types::CriteriaType;
    match value.to_lowercase().as_str() {
        "skill" => Ok(CriteriaType::Skill),
        "language" => Ok(CriteriaType::Language),
        "certification" => Ok(CriteriaType::Certification),
        "experience" => Ok(CriteriaType::Experience),
        "education" => Ok(CriteriaType::Education),
        "custom" => Ok(CriteriaType::Custom),
        other => Err(PipelineError::BadInput(format!("unknown criteria type: {other}")).into()),
    }
}

/// `POST /api/scoring/calculate`
#[utoipa::path(
    post, path = "/api/scoring/calculate", tag = "scoring",
    request_body = ScoringCalculateRequest,
    responses((status = 200, description = "Scoring breakdown against the supplied criteria", body = crate::types::ScoringResult))
)]
pub async fn scoring_calculate_handler(Json(request): Json<ScoringCalculateRequest>) -> Json<crate::types::ScoringResult> {
    let candidate_data = request.candidate_data.into();
    let criteria: Vec<crate::types::ScoringCriterion> = request.criteria.into_iter().map(Into::into).collect();
    Json(calculate_score(&candidate_data, &criteria))
}

/// `GET /api/scoring/templates` — built-in preset criteria sets.
#[utoipa::path(get, path = "/api/scoring/templates", tag = "scoring", responses((status = 200, description = "Preset criteria sets", body = [ScoringTemplate])))]
pub async fn scoring_templates_handler() -> Json<Vec<ScoringTemplate>> {
    Json(vec![ScoringTemplate {
        name: "software-engineer".to_string(),
        description: "A general-purpose template for software engineering roles.".to_string(),
        criteria: vec![
            ScoringCriterionDto { criteria_type: crate::types::CriteriaType::Skill, value: "Rust".into(), points: 20, required: false, weight: 1.0, min_value: None, per_unit_points: None, max_points: None, sort_order: 0 },
            ScoringCriterionDto { criteria_type: crate::types::CriteriaType::Experience, value: "years".into(), points: 30, required: false, weight: 1.0, min_value: Some(3), per_unit_points: Some(5.0), max_points: Some(30), sort_order: 1 },
            ScoringCriterionDto { criteria_type: crate::types::CriteriaType::Education, value: "bachelor".into(), points: 10, required: false, weight: 1.0, min_value: None, per_unit_points: None, max_points: None, sort_order: 2 },
        ],
    }])
}
