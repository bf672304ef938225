//! REST API server exposing the pipeline (§6.1).
//!
//! # Endpoints
//!
//! - `GET /health`, `/health/live`, `/health/ready`, `/health/info`
//! - `POST /api/embeddings/generate`, `/api/embeddings/bulk-generate`
//! - `GET|DELETE /api/embeddings/candidate/{id}`
//! - `POST /api/ocr/process`, `/api/ocr/process-upload`, `/api/ocr/extract-structured`
//! - `GET /api/ocr/formats`, `/api/ocr/languages`, `/api/ocr/health`
//! - `POST /api/matching/semantic`, `/single`, `/search`, `/store-result`
//! - `GET /api/matching/results/{job_id}`
//! - `GET|DELETE /api/scoring/criteria/{job_id}`, `POST .../add`, `DELETE .../{crit_id}`
//! - `POST /api/scoring/calculate`, `GET /api/scoring/templates`
//! - `GET /openapi.json`
//!
//! # Examples
//!
//! ```no_run
//! use cvintel::api::{serve, AppState};
//! use cvintel::config::PipelineConfig;
//!
//! #[tokio::main]
//! async fn main() -> cvintel::Result<()> {
//!     serve(PipelineConfig::default()).await
//! }
//! ```

mod error;
mod handlers;
pub mod openapi;
mod server;
mod state;
mod types;

pub use error::{ApiError, ErrorResponse};
pub use server::{create_router, serve, serve_with_state};
pub use state::AppState;
pub use types::*;
