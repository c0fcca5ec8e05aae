//! Joint RGB colour histogram embeddings.
//!
//! A lightweight provider for builds without libtorch. It ignores spatial
//! layout entirely, so it only captures how colours are distributed.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::core::embeddings::EmbeddingProvider;
use crate::core::similarity::Embedding;
use crate::error::{AppError, Result};

/// Colour histogram over a fixed-size thumbnail of the image.
#[derive(Debug, Clone)]
pub struct ColorHistogramModel {
    bins: u32,
    image_size: u32,
}

impl ColorHistogramModel {
    /// 8 bins per channel, 512 dimensions in total
    pub const DEFAULT_BINS: u32 = 8;

    /// Create a histogram model with `bins` buckets per channel.
    ///
    /// `bins` must divide 256 so every bucket covers the same intensity range.
    pub fn new(bins: u32, image_size: u32) -> Result<Self> {
        if bins == 0 || bins > 256 || 256 % bins != 0 {
            return Err(AppError::Config(format!(
                "histogram bins must divide 256, got {}",
                bins
            )));
        }
        if image_size == 0 {
            return Err(AppError::Config("image size must be non-zero".to_string()));
        }
        Ok(Self { bins, image_size })
    }
}

impl EmbeddingProvider for ColorHistogramModel {
    fn name(&self) -> &str {
        "color-histogram"
    }

    fn dimension(&self) -> usize {
        (self.bins * self.bins * self.bins) as usize
    }

    fn embed(&self, image: &DynamicImage) -> Result<Embedding> {
        let mut hist = Embedding::zeros(self.dimension());
        if image.width() == 0 || image.height() == 0 {
            // Leaves a zero vector, which the scorer rejects as degenerate
            return Ok(hist);
        }

        let thumb = image
            .resize_exact(self.image_size, self.image_size, FilterType::Triangle)
            .to_rgb8();
        let width = 256 / self.bins;
        let bins = self.bins as usize;

        for pixel in thumb.pixels() {
            let [r, g, b] = pixel.0.map(|v| (v as u32 / width) as usize);
            hist[(r * bins + g) * bins + b] += 1.0;
        }

        let total = (self.image_size * self.image_size) as f32;
        hist.mapv_inplace(|count| count / total);
        Ok(hist)
    }
}
