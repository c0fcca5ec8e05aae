use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;

use crate::core::embeddings::EmbeddingProvider;
use crate::core::similarity::{cosine_similarity, SimilarityScore};
use crate::error::Result;

/// Compares two images through an injected embedding provider.
///
/// Cheap to clone; every clone shares the same provider.
#[derive(Clone, Debug)]
pub struct ImageComparer {
    provider: Arc<dyn EmbeddingProvider>,
}

impl ImageComparer {
    /// Wrap a provider that was loaded once at startup.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// The provider used for feature extraction.
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Embed both images and score them. Blocking.
    pub fn compare_images(&self, a: &DynamicImage, b: &DynamicImage) -> Result<SimilarityScore> {
        let started = Instant::now();
        let first = self.provider.embed(a)?;
        let second = self.provider.embed(b)?;
        let score = cosine_similarity(&first, &second)?;

        log::debug!(
            "{} embeddings ({} dims) scored {:.6} in {:?}",
            self.provider.name(),
            first.len(),
            score.value(),
            started.elapsed()
        );
        Ok(score)
    }

    /// Decode two image files and compare them on the blocking pool.
    pub async fn compare_files<P, Q>(&self, a: P, b: Q) -> Result<SimilarityScore>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let a: PathBuf = a.as_ref().to_path_buf();
        let b: PathBuf = b.as_ref().to_path_buf();
        let comparer = self.clone();

        tokio::task::spawn_blocking(move || {
            let first = decode_image(&a)?;
            let second = decode_image(&b)?;
            comparer.compare_images(&first, &second)
        })
        .await?
    }
}

/// Open an image, sniffing the format from its content rather than its name.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let image = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(image)
}
