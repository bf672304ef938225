//! Primary/fallback OCR engine selection (C2, §4.2).
//!
//! The registry holds at most one primary and one fallback backend. A page
//! is always attempted on the primary first; if the primary is unavailable
//! (failed to initialise, or not compiled in) the registry falls back
//! silently, logging once at startup rather than on every page.

use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::image::PageImage;
use crate::types::OcrLine;

use super::{EngineInfo, EngineRole, OcrBackend};

pub struct OcrBackendRegistry {
    primary: Option<Arc<dyn OcrBackend>>,
    fallback: Option<Arc<dyn OcrBackend>>,
}

impl OcrBackendRegistry {
    pub fn new_empty() -> Self {
        Self { primary: None, fallback: None }
    }

    /// Register a backend in its declared role, replacing any previous
    /// occupant of that slot.
    pub fn register(&mut self, backend: Arc<dyn OcrBackend>) {
        let info = backend.info();
        if !info.available {
            tracing::warn!(engine = %info.name, role = ?info.role, "OCR backend unavailable at registration");
        }
        match info.role {
            EngineRole::Primary => self.primary = Some(backend),
            EngineRole::Fallback => self.fallback = Some(backend),
        }
    }

    /// The backend that should service the next page: the primary if it
    /// reports itself available, otherwise the fallback.
    fn active(&self) -> Result<&Arc<dyn OcrBackend>> {
        if let Some(primary) = &self.primary {
            if primary.info().available {
                return Ok(primary);
            }
            tracing::warn!("primary OCR engine unavailable, falling back");
        }
        self.fallback.as_ref().ok_or_else(PipelineError::engine_unavailable)
    }

    pub async fn extract_lines(&self, page: &PageImage, page_index: u32) -> Result<Vec<OcrLine>> {
        self.active()?.extract_lines(page, page_index).await
    }

    /// Report the state of both slots, for health/diagnostics endpoints.
    pub fn engine_info(&self) -> Vec<EngineInfo> {
        let mut infos = Vec::new();
        if let Some(p) = &self.primary {
            infos.push(p.info());
        }
        if let Some(f) = &self.fallback {
            infos.push(f.info());
        }
        infos
    }
}

impl Default for OcrBackendRegistry {
    fn default() -> Self {
        Self::new_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polygon;
    use async_trait::async_trait;

    struct StubBackend {
        role: EngineRole,
        name: &'static str,
        available: bool,
    }

    #[async_trait]
    impl OcrBackend for StubBackend {
        async fn extract_lines(&self, _page: &PageImage, page_index: u32) -> Result<Vec<OcrLine>> {
            Ok(vec![OcrLine::new(self.name.to_string(), 90.0, Polygon::from_rect(0.0, 0.0, 10.0, 10.0), page_index)])
        }

        fn info(&self) -> EngineInfo {
            EngineInfo { role: self.role, name: self.name.to_string(), available: self.available, languages: vec!["eng".into()] }
        }
    }

    fn blank_page() -> PageImage {
        PageImage { rgb: image::RgbImage::new(4, 4), width: 4, height: 4 }
    }

    #[tokio::test]
    async fn prefers_primary_when_available() {
        let mut registry = OcrBackendRegistry::new_empty();
        registry.register(Arc::new(StubBackend { role: EngineRole::Primary, name: "paddle-ocr", available: true }));
        registry.register(Arc::new(StubBackend { role: EngineRole::Fallback, name: "tesseract", available: true }));

        let lines = registry.extract_lines(&blank_page(), 0).await.unwrap();
        assert_eq!(lines[0].text, "paddle-ocr");
    }

    #[tokio::test]
    async fn falls_back_when_primary_unavailable() {
        let mut registry = OcrBackendRegistry::new_empty();
        registry.register(Arc::new(StubBackend { role: EngineRole::Primary, name: "paddle-ocr", available: false }));
        registry.register(Arc::new(StubBackend { role: EngineRole::Fallback, name: "tesseract", available: true }));

        let lines = registry.extract_lines(&blank_page(), 0).await.unwrap();
        assert_eq!(lines[0].text, "tesseract");
    }

    #[tokio::test]
    async fn errors_when_no_engine_available() {
        let registry = OcrBackendRegistry::new_empty();
        let err = registry.extract_lines(&blank_page(), 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::Unavailable(_)));
    }
}
