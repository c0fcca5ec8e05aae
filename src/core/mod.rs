//! Core functionality: embedding extraction and similarity scoring

/// Compares two images through an embedding provider.
pub mod compare;
/// Embedding providers and image preprocessing.
pub mod embeddings;
pub mod histogram;
pub mod similarity;
