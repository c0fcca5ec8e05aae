use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::compare::ImageComparer;
use crate::core::embeddings::EmbeddingProvider;
use crate::error::{AppError, Result};

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "IMAGESIM_";

/// Which embedding provider to load at startup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Pretrained ResNet-50 through libtorch
    Resnet,
    /// Joint RGB colour histogram
    Histogram,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "embeddings") {
            Self::Resnet
        } else {
            Self::Histogram
        }
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resnet" | "resnet50" => Ok(Self::Resnet),
            "histogram" | "color-histogram" => Ok(Self::Histogram),
            other => Err(AppError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Configuration for the application
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory holding uploads while they are being compared
    pub upload_dir: PathBuf,
    /// Maximum request body size in bytes
    pub max_upload_size: usize,
    /// Allowed file extensions for uploads
    pub allowed_extensions: Vec<String>,
    /// Embedding provider to load
    pub backend: Backend,
    /// Pretrained weights for the resnet backend
    pub weights_path: PathBuf,
    /// Side length images are resized to before embedding
    pub image_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from("uploads"),
            max_upload_size: 20 * 1024 * 1024, // 20MB
            allowed_extensions: vec!["jpg", "jpeg", "png", "gif", "bmp", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            backend: Backend::default(),
            weights_path: PathBuf::from("resnet50.ot"),
            image_size: 224,
        }
    }
}

impl Config {
    /// Build a configuration from `IMAGESIM_*` environment variables.
    ///
    /// Unset variables keep their default; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = env_var("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &addr)?;
        }
        if let Some(dir) = env_var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(size) = env_var("MAX_UPLOAD_SIZE") {
            config.max_upload_size = parse("MAX_UPLOAD_SIZE", &size)?;
        }
        if let Some(exts) = env_var("ALLOWED_EXTENSIONS") {
            config.allowed_extensions = exts
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(backend) = env_var("BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(weights) = env_var("WEIGHTS") {
            config.weights_path = PathBuf::from(weights);
        }
        if let Some(size) = env_var("IMAGE_SIZE") {
            config.image_size = parse("IMAGE_SIZE", &size)?;
        }

        if config.image_size == 0 {
            return Err(AppError::Config("IMAGESIM_IMAGE_SIZE must be non-zero".to_string()));
        }
        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, key))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        AppError::Config(format!("invalid {}{} '{}': {}", ENV_PREFIX, key, value, e))
    })
}

/// Application state that can be shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Comparer wrapping the embedding provider loaded at startup
    pub comparer: ImageComparer,
    /// Creation time, reported by the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create the shared state around an already loaded provider
    pub fn new(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Arc<Self> {
        Arc::new(Self {
            config,
            comparer: ImageComparer::new(provider),
            started_at: Utc::now(),
        })
    }
}
