//! Embedding vector and record types (§3, §4.9).

use serde::{Deserialize, Serialize};

/// A fixed-dimension embedding vector of 32-bit floats.
///
/// Invariant when used for cosine matching: `‖v‖₂ = 1 ± 1e-5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn l2_norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Normalises in place to unit length. A no-op on a zero vector.
    pub fn normalize(&mut self) {
        let norm = self.l2_norm();
        if norm > 0.0 {
            for v in &mut self.0 {
                *v /= norm;
            }
        }
    }

    pub fn is_unit_norm(&self) -> bool {
        (self.l2_norm() - 1.0).abs() < 1e-5
    }

    /// Cosine similarity; for unit-norm vectors this equals the dot product.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let denom = self.l2_norm() * other.l2_norm();
        if denom == 0.0 { 0.0 } else { dot / denom }
    }
}

/// The optional per-section embeddings that feed into a candidate's
/// combined vector (§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateEmbeddingParts {
    pub cv: Option<EmbeddingVector>,
    pub skills: Option<EmbeddingVector>,
    pub experience: Option<EmbeddingVector>,
}

/// The optional per-section embeddings that feed into a job's combined
/// vector (§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobEmbeddingParts {
    pub description: Option<EmbeddingVector>,
    pub requirements: Option<EmbeddingVector>,
}

/// A stored candidate embedding record (§3 EmbeddingRecord candidate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEmbeddingRecord {
    pub candidate_id: String,
    pub combined: EmbeddingVector,
    pub parts: CandidateEmbeddingParts,
    pub model_name: String,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored job embedding record (§3 EmbeddingRecord job).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEmbeddingRecord {
    pub job_id: String,
    pub combined: EmbeddingVector,
    pub parts: JobEmbeddingParts,
    pub model_name: String,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = EmbeddingVector::new(vec![3.0, 4.0]);
        v.normalize();
        assert!(v.is_unit_norm());
    }

    #[test]
    fn cosine_similarity_of_identical_unit_vectors_is_one() {
        let mut v = EmbeddingVector::new(vec![1.0, 2.0, 2.0]);
        v.normalize();
        let sim = v.cosine_similarity(&v);
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
