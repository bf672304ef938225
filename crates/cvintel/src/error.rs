//! Pipeline-wide error taxonomy.

use thiserror::Error;

/// The error taxonomy for the résumé-to-match pipeline.
///
/// Parsing and scoring components recover locally and never construct
/// this type for merely unusual input; it is reserved for hard failures
/// (decoding, OCR, dependency absence, upstream/network failure).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    #[error("upstream service failure: {0}")]
    Upstream(String),

    #[error("request exceeded its time budget")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    ImageProcessing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// No tier-1 personal-info field could be recognised (§4.8).
    pub fn no_personal_info() -> Self {
        Self::BadInput("no personal info could be extracted from the document".into())
    }

    /// Neither the primary nor the fallback OCR engine is available (§4.2).
    pub fn engine_unavailable() -> Self {
        Self::Unavailable("no OCR engine is available".into())
    }
}
