//! Cosine similarity over unit-normalized embeddings.

use ndarray::{Array1, ArrayView1};
use serde::Serialize;

use crate::error::{AppError, Result};

/// A fixed-length feature vector produced by an embedding provider.
pub type Embedding = Array1<f32>;

/// Cosine similarity between two embeddings, in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    /// The raw cosine similarity.
    pub fn value(self) -> f64 {
        self.0
    }

    /// The similarity scaled to a percentage and rounded to 2 decimal places.
    pub fn percent(self) -> f64 {
        (self.0 * 100.0 * 100.0).round() / 100.0
    }
}

/// Divide `v` by its Euclidean norm.
///
/// Accumulates in `f64` so that long feature vectors keep their precision.
///
/// # Errors
///
/// Returns [`AppError::DegenerateEmbedding`] if the norm is zero or not finite.
pub fn l2_normalize(v: ArrayView1<'_, f32>) -> Result<Array1<f64>> {
    let v = v.mapv(f64::from);
    let norm = v.dot(&v).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(AppError::DegenerateEmbedding(format!(
            "vector of length {} has norm {}",
            v.len(),
            norm
        )));
    }
    Ok(v / norm)
}

/// Cosine similarity of two embeddings.
///
/// Both inputs are unit-normalized first, so the result is the dot product of
/// the normalized vectors, clamped to `[-1, 1]` to absorb rounding.
///
/// # Errors
///
/// * [`AppError::DimensionMismatch`] if the lengths differ or are zero.
/// * [`AppError::DegenerateEmbedding`] if either vector has zero norm.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> Result<SimilarityScore> {
    if a.len() != b.len() || a.is_empty() {
        return Err(AppError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let a = l2_normalize(a.view())?;
    let b = l2_normalize(b.view())?;
    let sim = a.dot(&b).clamp(-1.0, 1.0);

    Ok(SimilarityScore(sim))
}

/// Cosine distance, `1 - cosine_similarity`.
pub fn cosine_distance(a: &Embedding, b: &Embedding) -> Result<f64> {
    cosine_similarity(a, b).map(|s| 1.0 - s.value())
}
