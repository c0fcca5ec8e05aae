//! JSON bodies returned by the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompareResponse {
    /// Cosine similarity as a percentage, rounded to 2 decimal places
    pub similarity: f64,
}

/// Body of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers
    pub status: String,
    /// Crate version the binary was built from
    pub version: String,
    /// Name of the loaded embedding provider
    pub model: String,
    /// Embedding dimensionality
    pub dimension: usize,
    /// When the server state was created
    pub started_at: DateTime<Utc>,
}
