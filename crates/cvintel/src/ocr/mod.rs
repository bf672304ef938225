//! OCR Engine abstraction (C2, §4.2).

#[cfg(feature = "ocr")]
pub mod tesseract;

#[cfg(feature = "paddle-ocr")]
pub mod paddle;

pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::PageImage;
use crate::types::OcrLine;

/// Which slot an engine occupies in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub enum EngineRole {
    Primary,
    Fallback,
}

/// Tuning knobs that affect only the primary (detector-based) engine (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrTuning {
    pub detection_threshold: f32,
    pub box_threshold: f32,
    pub unclip_ratio: f32,
    pub recognition_batch_size: usize,
    pub enable_detection: bool,
    pub enable_classification: bool,
    pub enable_recognition: bool,
}

impl Default for OcrTuning {
    fn default() -> Self {
        Self {
            detection_threshold: 0.3,
            box_threshold: 0.6,
            unclip_ratio: 1.5,
            recognition_batch_size: 6,
            enable_detection: true,
            enable_classification: true,
            enable_recognition: true,
        }
    }
}

/// Reported state of a configured engine, exposed via `engine_info` (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct EngineInfo {
    pub role: EngineRole,
    pub name: String,
    pub available: bool,
    pub languages: Vec<String>,
}

/// The capability interface every OCR backend implements (§9): `{
/// extract_lines(page) -> OcrLine[]; info() -> EngineInfo }`.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Produce recognised lines for one page image. Line order is the
    /// engine's reported order; callers must not assume reading order.
    async fn extract_lines(&self, page: &PageImage, page_index: u32) -> Result<Vec<OcrLine>>;

    fn info(&self) -> EngineInfo;
}
