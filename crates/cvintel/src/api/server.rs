//! API server setup and configuration.

use std::net::{IpAddr, SocketAddr};

use axum::{
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

use super::handlers::*;
use super::state::AppState;

/// `GET /openapi.json` — the OpenAPI 3.1 schema for every route above.
async fn openapi_handler() -> impl IntoResponse {
    ([(axum::http::header::CONTENT_TYPE, "application/json")], super::openapi::openapi_json())
}

fn cors_layer(config: &PipelineConfig) -> CorsLayer {
    if config.cors_allows_all() {
        tracing::warn!(
            "CORS configured to allow all origins (default). This permits CSRF attacks. \
             Set `cors_origins` (or CVINTEL_CORS_ORIGINS) to a comma-separated allow-list for production."
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<_> = config.cors_origins.iter().filter_map(|o| o.parse::<axum::http::HeaderValue>().ok()).collect();
    tracing::info!(count = origins.len(), "CORS configured with explicit allowed origins");
    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
}

/// Build the API router with all routes configured (§6.1).
///
/// This is public so callers can embed the router into their own
/// axum application rather than going through [`serve`].
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Health routes are exempt from the request timeout (§5) so that
    // liveness/readiness probes aren't affected by downstream slowness.
    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/health/info", get(info_handler))
        .route("/openapi.json", get(openapi_handler));

    let api_routes = Router::new()
        .route("/api/embeddings/generate", post(embeddings_generate_handler))
        .route("/api/embeddings/bulk-generate", post(embeddings_bulk_generate_handler))
        .route("/api/embeddings/candidate/{id}", get(candidate_embedding_metadata_handler).delete(delete_candidate_embedding_handler))
        .route("/api/ocr/process", post(ocr_process_handler))
        .route("/api/ocr/process-upload", post(ocr_process_upload_handler))
        .route("/api/ocr/formats", get(ocr_formats_handler))
        .route("/api/ocr/languages", get(ocr_languages_handler))
        .route("/api/ocr/health", get(ocr_health_handler))
        .route("/api/ocr/extract-structured", post(extract_structured_handler))
        .route("/api/matching/semantic", post(matching_semantic_handler))
        .route("/api/matching/single", post(matching_single_handler))
        .route("/api/matching/search", post(matching_search_handler))
        .route("/api/matching/store-result", post(matching_store_result_handler))
        .route("/api/matching/results/{job_id}", get(matching_results_for_job_handler))
        .route("/api/scoring/criteria/{job_id}", get(list_criteria_handler).delete(delete_all_criteria_handler))
        .route("/api/scoring/criteria/{job_id}/add", post(add_criterion_handler))
        .route("/api/scoring/criteria/{job_id}/{crit_id}", delete(delete_criterion_handler))
        .route("/api/scoring/calculate", post(scoring_calculate_handler))
        .route("/api/scoring/templates", get(scoring_templates_handler))
        .layer(TimeoutLayer::new(config.request_timeout()));

    let router = health_routes
        .merge(api_routes)
        .layer(RequestBodyLimitLayer::new(config.max_file_size_bytes()))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http());

    router.with_state(state)
}

/// Start the API server, binding to the host/port in `config`.
pub async fn serve(config: PipelineConfig) -> Result<()> {
    let host = config.host.clone();
    let port = config.port;

    let ip: IpAddr = host.parse().map_err(|e| PipelineError::BadInput(format!("invalid host address: {e}")))?;
    let addr = SocketAddr::new(ip, port);

    let state = AppState::new(config);
    let app = create_router(state);

    tracing::info!(%addr, "starting cvintel API server");

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(PipelineError::Io)?;
    axum::serve(listener, app).await.map_err(|e| PipelineError::Internal(e.to_string()))?;

    Ok(())
}

/// Start the API server with an already-assembled [`AppState`] (e.g. with
/// an embedder and OCR registry wired in).
pub async fn serve_with_state(state: AppState) -> Result<()> {
    let host = state.config.host.clone();
    let port = state.config.port;

    let ip: IpAddr = host.parse().map_err(|e| PipelineError::BadInput(format!("invalid host address: {e}")))?;
    let addr = SocketAddr::new(ip, port);
    let app = create_router(state);

    tracing::info!(%addr, "starting cvintel API server");

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(PipelineError::Io)?;
    axum::serve(listener, app).await.map_err(|e| PipelineError::Internal(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_with_default_state() {
        let router = create_router(AppState::default());
        assert!(std::mem::size_of_val(&router) > 0);
    }

    #[tokio::test]
    async fn health_route_responds_without_timeout_layer_blocking_it() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let router = create_router(AppState::default());
        let response = router.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_route_serves_the_schema() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let router = create_router(AppState::default());
        let response = router.oneshot(Request::builder().uri("/openapi.json").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
