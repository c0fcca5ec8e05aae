#![doc(html_root_url = "https://docs.rs/imagesim/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # imagesim
//!
//! A small web service that scores how visually similar two images are.
//!
//! Each image is turned into an embedding by a pretrained convolutional
//! network, both embeddings are unit-normalized, and their dot product (the
//! cosine similarity) is reported as a percentage.
//!
//! ## Features
//!
//! - **Similarity scoring**: cosine similarity with explicit errors for
//!   degenerate (zero-norm) embeddings
//! - **Deep learning**: ResNet-50 feature extraction through libtorch
//!   (`embeddings` feature)
//! - **Colour histograms**: a dependency-free embedding provider for builds
//!   without libtorch
//! - **Web API**: `POST /compare` taking two multipart uploads (`api` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagesim::{cosine_similarity, ColorHistogramModel, EmbeddingProvider, Result};
//!
//! fn main() -> Result<()> {
//!     let model = ColorHistogramModel::new(8, 224)?;
//!     let a = model.embed(&image::open("a.jpg")?)?;
//!     let b = model.embed(&image::open("b.jpg")?)?;
//!     println!("similarity: {}%", cosine_similarity(&a, &b)?.percent());
//!     Ok(())
//! }
//! ```

// Internal modules
pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
mod state;
#[cfg(feature = "web")]
mod utils;

#[allow(dead_code, unreachable_pub, missing_docs)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// Public API exports
pub use crate::{
    core::{
        compare::ImageComparer,
        embeddings::{load_provider, preprocess_image, EmbeddingProvider},
        histogram::ColorHistogramModel,
        similarity::{cosine_distance, cosine_similarity, l2_normalize, Embedding, SimilarityScore},
    },
    error::{AppError, Result, ResultExt},
    state::{AppState, Backend, Config, ENV_PREFIX},
};

#[cfg(feature = "web")]
pub use crate::api::{
    create_router,
    handlers::{compare_images, health_check},
    responses::{CompareResponse, HealthResponse},
};

#[cfg(feature = "embeddings")]
pub use crate::core::embeddings::EmbeddingModel;

/// Initialize logging with default settings
///
/// `RUST_LOG` overrides the default `info` filter. Calling this twice is
/// harmless; the second call leaves the existing logger in place.
///
/// # Example
///
/// ```no_run
/// use imagesim::init;
///
/// fn main() {
///     init();
///     // Application code here
/// }
/// ```
pub fn init() {
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    let initialized = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .try_init()
        .is_ok();

    if initialized {
        log::info!(
            "Initializing imagesim {} ({})",
            built_info::PKG_VERSION,
            built_info::BUILT_TIME_UTC
        );
    }
}
