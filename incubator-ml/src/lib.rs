mod http;

pub mod hf_inference;
pub mod pipeline;
pub mod text;

use async_trait::async_trait;
use image::DynamicImage;
use incubator_types::Detection;

pub use hf_inference::{HfInferenceConfig, HfInferenceRecognizer};
pub use pipeline::{OcrPipeline, PipelineError};

/// Turns one line (or chunk of a line) into text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> anyhow::Result<String>;
}

/// Finds text blocks on a page and produces the page ink mask.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect(&self, image: &DynamicImage) -> anyhow::Result<Detection>;
}
