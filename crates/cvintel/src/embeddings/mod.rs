//! Embedding Composer (C9, §4.9): per-part embedding, weighted
//! combination, and a process-wide model cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, Result};
use crate::types::{CandidateEmbeddingParts, CandidateEmbeddingRecord, EmbeddingVector, JobEmbeddingParts, JobEmbeddingRecord};

const MAX_CHARS: usize = 8000;
const CANDIDATE_WEIGHTS: [f32; 3] = [0.5, 0.3, 0.2];
const JOB_WEIGHTS: [f32; 2] = [0.6, 0.4];

/// The capability every embedding model provider implements: embed a
/// batch of already-prefixed, already-truncated strings.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn name(&self) -> &str;
    /// Whether this model expects `"query: "`/`"passage: "` retrieval
    /// prefixes (E5-family models do; most BGE/MiniLM models don't).
    fn uses_retrieval_prefixes(&self) -> bool;
}

#[cfg(feature = "embeddings")]
pub mod fastembed_backend {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    static MODEL_CACHE: OnceCell<RwLock<HashMap<String, Arc<Mutex<TextEmbedding>>>>> = OnceCell::new();

    fn cache() -> &'static RwLock<HashMap<String, Arc<Mutex<TextEmbedding>>>> {
        MODEL_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
    }

    /// Double-checked-locking model registry, keyed by model name, so
    /// repeated requests for the same model reuse one loaded instance
    /// instead of reloading weights per call (§4.9).
    pub fn get_or_init_model(model_name: &str) -> Result<Arc<Mutex<TextEmbedding>>> {
        {
            let read = cache().read().map_err(|e| PipelineError::Internal(format!("model cache read lock poisoned: {e}")))?;
            if let Some(existing) = read.get(model_name) {
                return Ok(Arc::clone(existing));
            }
        }

        let mut write = cache().write().map_err(|e| PipelineError::Internal(format!("model cache write lock poisoned: {e}")))?;
        if let Some(existing) = write.get(model_name) {
            return Ok(Arc::clone(existing));
        }

        let model = match model_name {
            "AllMiniLML6V2Q" => EmbeddingModel::AllMiniLML6V2Q,
            "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
            "MultilingualE5Base" => EmbeddingModel::MultilingualE5Base,
            other => return Err(PipelineError::BadInput(format!("unknown embedding model: {other}"))),
        };

        let embedding = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| PipelineError::Unavailable(format!("failed to initialise embedding model: {e}")))?;
        let arc = Arc::new(Mutex::new(embedding));
        write.insert(model_name.to_string(), Arc::clone(&arc));
        Ok(arc)
    }

    /// The default model (384-dim, quantised MiniLM) matching this
    /// deployment's configured embedding dimension.
    pub struct FastEmbedder {
        model_name: String,
    }

    impl FastEmbedder {
        pub fn new(model_name: impl Into<String>) -> Self {
            Self { model_name: model_name.into() }
        }
    }

    impl Embedder for FastEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = get_or_init_model(&self.model_name)?;
            let mut locked = model.lock().map_err(|e| PipelineError::Internal(format!("model lock poisoned: {e}")))?;
            locked
                .embed(texts.to_vec(), None)
                .map_err(|e| PipelineError::Internal(format!("embedding generation failed: {e}")))
        }

        fn name(&self) -> &str {
            &self.model_name
        }

        fn uses_retrieval_prefixes(&self) -> bool {
            self.model_name == "MultilingualE5Base"
        }
    }
}

/// Trim, collapse internal whitespace runs, and truncate to 8000
/// characters (§4.9 pre-encoding normalisation).
fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_CHARS).collect()
}

fn prefixed(embedder: &dyn Embedder, text: &str, is_query: bool) -> String {
    let normalized = normalize_text(text);
    if embedder.uses_retrieval_prefixes() {
        format!("{}{}", if is_query { "query: " } else { "passage: " }, normalized)
    } else {
        normalized
    }
}

fn embed_one(embedder: &dyn Embedder, text: &str, is_query: bool) -> Result<EmbeddingVector> {
    let prepared = prefixed(embedder, text, is_query);
    let mut vectors = embedder.embed(&[prepared])?;
    let raw = vectors.pop().ok_or_else(|| PipelineError::Internal("embedder returned no vectors".into()))?;
    Ok(EmbeddingVector::new(raw))
}

/// sha256-hex of the concatenation of raw parts in canonical order (§4.9).
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn weighted_combine(parts: &[(Option<&EmbeddingVector>, f32)]) -> Option<EmbeddingVector> {
    let present: Vec<(&EmbeddingVector, f32)> = parts.iter().filter_map(|(v, w)| v.map(|v| (v, *w))).collect();
    if present.is_empty() {
        return None;
    }
    let dim = present[0].0.dimension();
    let mut combined = vec![0.0f32; dim];
    for (vector, weight) in &present {
        for (acc, value) in combined.iter_mut().zip(vector.0.iter()) {
            *acc += value * weight;
        }
    }
    let mut result = EmbeddingVector::new(combined);
    result.normalize();
    Some(result)
}

/// Embed and combine a candidate's optional parts with weights
/// `(0.5, 0.3, 0.2)` over (cv, skills, experience) (§4.9).
pub fn compose_candidate_embedding(
    embedder: &dyn Embedder,
    candidate_id: impl Into<String>,
    cv: Option<&str>,
    skills: Option<&str>,
    experience: Option<&str>,
    now: &str,
) -> Result<CandidateEmbeddingRecord> {
    let cv_vec = cv.map(|t| embed_one(embedder, t, false)).transpose()?;
    let skills_vec = skills.map(|t| embed_one(embedder, t, false)).transpose()?;
    let experience_vec = experience.map(|t| embed_one(embedder, t, false)).transpose()?;

    let combined = weighted_combine(&[
        (cv_vec.as_ref(), CANDIDATE_WEIGHTS[0]),
        (skills_vec.as_ref(), CANDIDATE_WEIGHTS[1]),
        (experience_vec.as_ref(), CANDIDATE_WEIGHTS[2]),
    ])
    .ok_or_else(|| PipelineError::BadInput("no candidate text parts were supplied".into()))?;

    let hash = content_hash(&[cv.unwrap_or(""), skills.unwrap_or(""), experience.unwrap_or("")]);

    Ok(CandidateEmbeddingRecord {
        candidate_id: candidate_id.into(),
        combined,
        parts: CandidateEmbeddingParts { cv: cv_vec, skills: skills_vec, experience: experience_vec },
        model_name: embedder.name().to_string(),
        content_hash: hash,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

/// Embed and combine a job's optional parts with weights `(0.6, 0.4)`
/// over (description, requirements) (§4.9).
pub fn compose_job_embedding(
    embedder: &dyn Embedder,
    job_id: impl Into<String>,
    description: Option<&str>,
    requirements: Option<&str>,
    now: &str,
) -> Result<JobEmbeddingRecord> {
    let description_vec = description.map(|t| embed_one(embedder, t, false)).transpose()?;
    let requirements_vec = requirements.map(|t| embed_one(embedder, t, false)).transpose()?;

    let combined = weighted_combine(&[
        (description_vec.as_ref(), JOB_WEIGHTS[0]),
        (requirements_vec.as_ref(), JOB_WEIGHTS[1]),
    ])
    .ok_or_else(|| PipelineError::BadInput("no job text parts were supplied".into()))?;

    let hash = content_hash(&[description.unwrap_or(""), requirements.unwrap_or("")]);

    Ok(JobEmbeddingRecord {
        job_id: job_id.into(),
        combined,
        parts: JobEmbeddingParts { description: description_vec, requirements: requirements_vec },
        model_name: embedder.name().to_string(),
        content_hash: hash,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

/// Embed free-text for a semantic-search query, using the query-side
/// retrieval prefix when the model expects one (§4.11
/// `semantic_search_query`).
pub fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<EmbeddingVector> {
    embed_one(embedder, text, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEmbedder;
    impl Embedder for StubEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0, 1.0]).collect())
        }
        fn name(&self) -> &str {
            "stub"
        }
        fn uses_retrieval_prefixes(&self) -> bool {
            false
        }
    }

    #[test]
    fn combine_weights_present_parts_and_normalizes() {
        let embedder = StubEmbedder;
        let record = compose_candidate_embedding(&embedder, "c1", Some("hello"), None, None, "2026-01-01T00:00:00Z").unwrap();
        assert!(record.combined.is_unit_norm());
        assert!(record.parts.cv.is_some());
        assert!(record.parts.skills.is_none());
    }

    #[test]
    fn missing_all_parts_is_an_error() {
        let embedder = StubEmbedder;
        assert!(compose_candidate_embedding(&embedder, "c1", None, None, None, "now").is_err());
    }

    #[test]
    fn content_hash_is_stable_for_same_input() {
        assert_eq!(content_hash(&["a", "b"]), content_hash(&["a", "b"]));
        assert_ne!(content_hash(&["a", "b"]), content_hash(&["a", "c"]));
    }

    #[test]
    fn normalize_text_truncates_at_8000_chars() {
        let long = "x".repeat(9000);
        assert_eq!(normalize_text(&long).chars().count(), MAX_CHARS);
    }
}
