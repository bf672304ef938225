//! Layered pipeline configuration: defaults, overridden by a TOML/JSON
//! file, overridden in turn by `CVINTEL_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

fn default_app_name() -> String {
    "cvintel".to_string()
}
fn default_environment() -> String {
    "development".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2Q".to_string()
}
fn default_embedding_dimension() -> usize {
    384
}
fn default_semantic_weight() -> f32 {
    0.4
}
fn default_criteria_weight() -> f32 {
    0.6
}
fn default_min_score() -> f32 {
    50.0
}
fn default_match_limit() -> usize {
    50
}
fn default_rate_limit_requests() -> u32 {
    100
}
fn default_rate_limit_window_secs() -> u64 {
    60
}
fn default_max_file_size_mb() -> usize {
    20
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_candidate_data_url() -> String {
    "http://localhost:4004".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// The pipeline's full runtime configuration (§4.13, §10).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,
    #[serde(default = "default_criteria_weight")]
    pub criteria_weight: f32,
    #[serde(default = "default_min_score")]
    pub default_min_score: f32,
    #[serde(default = "default_match_limit")]
    pub default_match_limit: usize,

    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: usize,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout applied to every non-health route (§5), in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_candidate_data_url")]
    pub candidate_data_url: String,
    #[serde(default)]
    pub candidate_data_client_id: Option<String>,
    #[serde(default)]
    pub candidate_data_client_secret: Option<String>,
    #[serde(default)]
    pub candidate_data_token_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            environment: default_environment(),
            log_level: default_log_level(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            semantic_weight: default_semantic_weight(),
            criteria_weight: default_criteria_weight(),
            default_min_score: default_min_score(),
            default_match_limit: default_match_limit(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            cors_origins: Vec::new(),
            max_file_size_mb: default_max_file_size_mb(),
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            candidate_data_url: default_candidate_data_url(),
            candidate_data_client_id: None,
            candidate_data_client_secret: None,
            candidate_data_token_url: None,
        }
    }
}

impl PipelineConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_allows_all(&self) -> bool {
        self.cors_origins.is_empty()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1_048_576
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Load from a `.toml` or `.json` file, auto-detected by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            PipelineError::BadInput(format!("cannot determine config format: no extension on {}", path.display()))
        })?;

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(|e| PipelineError::BadInput(format!("invalid TOML in {}: {e}", path.display()))),
            "json" => serde_json::from_str(&content).map_err(|e| PipelineError::BadInput(format!("invalid JSON in {}: {e}", path.display()))),
            other => Err(PipelineError::BadInput(format!("unsupported config format: .{other} (expected .toml or .json)"))),
        }
    }

    /// Apply `CVINTEL_*` environment variable overrides on top of this config.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("CVINTEL_HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("CVINTEL_PORT") {
            self.port = v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_PORT must be a valid u16: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("CVINTEL_CORS_ORIGINS") {
            self.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = std::env::var("CVINTEL_SEMANTIC_WEIGHT") {
            self.semantic_weight = v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_SEMANTIC_WEIGHT must be a float: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_CRITERIA_WEIGHT") {
            self.criteria_weight = v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_CRITERIA_WEIGHT must be a float: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_DEFAULT_MIN_SCORE") {
            self.default_min_score = v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_DEFAULT_MIN_SCORE must be a float: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_MAX_FILE_SIZE_MB must be a usize: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs =
                v.parse().map_err(|e| PipelineError::BadInput(format!("CVINTEL_REQUEST_TIMEOUT_SECS must be a u64: {e}")))?;
        }
        if let Ok(v) = std::env::var("CVINTEL_CANDIDATE_DATA_URL") {
            self.candidate_data_url = v;
        }
        if let Ok(v) = std::env::var("CVINTEL_CANDIDATE_DATA_CLIENT_ID") {
            self.candidate_data_client_id = Some(v);
        }
        if let Ok(v) = std::env::var("CVINTEL_CANDIDATE_DATA_CLIENT_SECRET") {
            self.candidate_data_client_secret = Some(v);
        }
        if let Ok(v) = std::env::var("CVINTEL_CANDIDATE_DATA_TOKEN_URL") {
            self.candidate_data_token_url = Some(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.semantic_weight, 0.4);
        assert_eq!(config.criteria_weight, 0.6);
        assert_eq!(config.default_min_score, 50.0);
        assert_eq!(config.default_match_limit, 50);
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.rate_limit_requests, 100);
        assert_eq!(config.rate_limit_window_secs, 60);
        assert_eq!(config.max_file_size_mb, 20);
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn cors_allows_all_when_origins_empty() {
        assert!(PipelineConfig::default().cors_allows_all());
    }

    #[test]
    fn from_file_loads_toml_and_keeps_unset_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"0.0.0.0\"\nport = 9000\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.semantic_weight, 0.4);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "host: 0.0.0.0").unwrap();
        assert!(PipelineConfig::from_file(&path).is_err());
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_override_applies_on_top_of_defaults() {
        unsafe {
            std::env::set_var("CVINTEL_PORT", "3030");
        }
        let mut config = PipelineConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.port, 3030);
        unsafe {
            std::env::remove_var("CVINTEL_PORT");
        }
    }
}
