//! Shared server state (§5): configuration, the embedding model, the OCR
//! registry and the reference store, threaded through handlers via
//! axum's `State` extractor. Everything is behind `Arc`, so `AppState`
//! itself is cheap to clone per request.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::embeddings::Embedder;
use crate::store::InMemoryCandidateStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub store: Arc<InMemoryCandidateStore>,
    pub embedder: Option<Arc<dyn Embedder>>,
    #[cfg(feature = "ocr")]
    pub ocr_registry: Arc<crate::ocr::registry::OcrBackendRegistry>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(InMemoryCandidateStore::new()),
            embedder: None,
            #[cfg(feature = "ocr")]
            ocr_registry: Arc::new(crate::ocr::registry::OcrBackendRegistry::new_empty()),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[cfg(feature = "ocr")]
    pub fn with_ocr_registry(mut self, registry: crate::ocr::registry::OcrBackendRegistry) -> Self {
        self.ocr_registry = Arc::new(registry);
        self
    }

    /// Whether the OCR family of routes has an engine actually available,
    /// used by `GET /health/ready` (§6.1).
    pub fn ocr_ready(&self) -> bool {
        #[cfg(feature = "ocr")]
        {
            self.ocr_registry.engine_info().iter().any(|e| e.available)
        }
        #[cfg(not(feature = "ocr"))]
        {
            false
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
