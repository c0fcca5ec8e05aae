use std::fmt::Debug;
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::core::histogram::ColorHistogramModel;
use crate::core::similarity::Embedding;
use crate::error::Result;
use crate::state::{Backend, Config};

/// Per-channel ImageNet mean, RGB order
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel ImageNet standard deviation, RGB order
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Something that turns an image into a fixed-length feature vector.
///
/// Implementations are constructed once at startup and shared read-only
/// across requests, so they must be `Send + Sync`.
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Short identifier reported by the health endpoint.
    fn name(&self) -> &str;

    /// Length of every embedding this provider returns.
    fn dimension(&self) -> usize;

    /// Compute the embedding of a decoded image. Blocking.
    fn embed(&self, image: &DynamicImage) -> Result<Embedding>;
}

/// Resize, scale to `[0, 1]` and ImageNet-normalize an image.
///
/// Returns an NCHW array with a batch dimension of 1.
pub fn preprocess_image(img: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let side = size as usize;

    Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
    })
}

/// Build the embedding provider selected in the configuration.
pub fn load_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.backend {
        Backend::Histogram => {
            log::info!("Using colour histogram embeddings");
            Ok(Arc::new(ColorHistogramModel::new(
                ColorHistogramModel::DEFAULT_BINS,
                config.image_size,
            )?))
        }
        #[cfg(feature = "embeddings")]
        Backend::Resnet => {
            let model = torch::EmbeddingModel::load(
                &config.weights_path,
                tch::Device::cuda_if_available(),
                config.image_size,
            )?;
            Ok(Arc::new(model))
        }
        #[cfg(not(feature = "embeddings"))]
        Backend::Resnet => Err(crate::error::AppError::Config(
            "the resnet backend requires the `embeddings` feature".to_string(),
        )),
    }
}

#[cfg(feature = "embeddings")]
pub use torch::EmbeddingModel;

#[cfg(feature = "embeddings")]
mod torch {
    use std::path::Path;
    use std::sync::Mutex;

    use image::DynamicImage;
    use tch::{nn::ModuleT, vision::resnet, Device, Kind, Tensor};

    use super::{preprocess_image, EmbeddingProvider};
    use crate::core::similarity::Embedding;
    use crate::error::{AppError, Result};

    /// Output width of the pooled ResNet-50 trunk
    const RESNET50_FEATURES: usize = 2048;

    struct Network {
        // Owns the weights referenced by `net`.
        _vs: tch::nn::VarStore,
        net: tch::nn::FuncT<'static>,
    }

    /// Pretrained ResNet-50 with the classifier removed.
    ///
    /// The forward pass yields the globally pooled 2048-d feature vector.
    pub struct EmbeddingModel {
        network: Mutex<Network>,
        device: Device,
        image_size: u32,
    }

    impl std::fmt::Debug for EmbeddingModel {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("EmbeddingModel")
                .field("device", &self.device)
                .field("image_size", &self.image_size)
                .finish_non_exhaustive()
        }
    }

    impl EmbeddingModel {
        /// Load pretrained weights from a `.ot` file.
        pub fn load<P: AsRef<Path>>(weights: P, device: Device, image_size: u32) -> Result<Self> {
            let weights = weights.as_ref();
            if !weights.is_file() {
                return Err(AppError::Config(format!(
                    "model weights not found at {}",
                    weights.display()
                )));
            }

            let mut vs = tch::nn::VarStore::new(device);
            let net = resnet::resnet50_no_final_layer(&vs.root());
            vs.load(weights)
                .map_err(|e| AppError::Config(format!("failed to load {}: {}", weights.display(), e)))?;
            vs.freeze();

            log::info!(
                "Loaded ResNet-50 weights from {} on {:?}",
                weights.display(),
                device
            );

            Ok(Self {
                network: Mutex::new(Network { _vs: vs, net }),
                device,
                image_size,
            })
        }

        fn to_tensor(&self, img: &DynamicImage) -> Result<Tensor> {
            let input = preprocess_image(img, self.image_size);
            let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
            let data = input
                .as_slice()
                .ok_or_else(|| AppError::Embedding("input tensor is not contiguous".to_string()))?;

            Ok(Tensor::of_slice(data)
                .view(shape.as_slice())
                .to_kind(Kind::Float)
                .to(self.device))
        }
    }

    impl EmbeddingProvider for EmbeddingModel {
        fn name(&self) -> &str {
            "resnet50"
        }

        fn dimension(&self) -> usize {
            RESNET50_FEATURES
        }

        fn embed(&self, image: &DynamicImage) -> Result<Embedding> {
            let input = self.to_tensor(image)?;
            let network = self
                .network
                .lock()
                .map_err(|_| AppError::Internal("embedding model lock poisoned".to_string()))?;

            let output = tch::no_grad(|| network.net.forward_t(&input, false))
                .flatten(0, -1)
                .to_device(Device::Cpu);
            let features = Vec::<f32>::try_from(&output)?;

            Ok(Embedding::from(features))
        }
    }

}
