use std::sync::Arc;

use anyhow::Result;
use image::{DynamicImage, imageops};
use incubator_core::{ChunkError, ChunkingConfig, Line, extract_line};
use incubator_types::{Detection, TextBlock, TextDirection};
use tracing::instrument;

use crate::{TextDetector, TextRecognizer};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no text detector is configured")]
    DetectorUnavailable,
}

/// Drives detection, line extraction, chunking and recognition with
/// injected model clients.
#[derive(Clone)]
pub struct OcrPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    detector: Option<Arc<dyn TextDetector>>,
    chunking: ChunkingConfig,
}

impl OcrPipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, chunking: ChunkingConfig) -> Self {
        Self {
            recognizer,
            detector: None,
            chunking,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn TextDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Recognizes the whole image as a single piece.
    #[instrument(level = "info", skip_all)]
    pub async fn recognize(&self, image: &DynamicImage) -> Result<String> {
        self.recognizer.recognize(image).await
    }

    /// Splits a rectified line into chunks and recognizes them in order.
    #[instrument(level = "debug", skip(self, line), fields(width = line.image.width()))]
    pub async fn recognize_line(&self, line: &Line, direction: TextDirection) -> Result<String> {
        let chunks = self
            .chunking
            .chunker(direction)?
            .split(&line.image, &line.mask)?;
        tracing::debug!(chunks = chunks.len(), cuts = ?chunks.cut_points, "chunked line");

        let mut text = String::new();
        for chunk in chunks.images {
            // undo the rotation applied during extraction
            let chunk = match direction {
                TextDirection::Horizontal => chunk,
                TextDirection::Vertical => imageops::rotate90(&chunk),
            };
            let piece = self
                .recognizer
                .recognize(&DynamicImage::ImageRgb8(chunk))
                .await?;
            text.push_str(&piece);
        }

        Ok(text)
    }

    /// Detects text blocks on a page and fills in their text, top to bottom.
    #[instrument(level = "info", skip_all, fields(width = page.width(), height = page.height()))]
    pub async fn read_page(&self, page: &DynamicImage) -> Result<Vec<TextBlock>> {
        let detector = self
            .detector
            .as_ref()
            .ok_or(PipelineError::DetectorUnavailable)?;

        let Detection { mut blocks, mask } = detector.detect(page).await?;
        let page = page.to_rgb8();
        let (width, height) = page.dimensions();
        let mask = if mask.dimensions() == (width, height) {
            mask
        } else {
            tracing::debug!(
                mask = ?mask.dimensions(),
                page = ?(width, height),
                "resizing detector mask to page size"
            );
            imageops::resize(&mask, width, height, imageops::FilterType::Triangle)
        };

        blocks.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));
        tracing::info!(blocks = blocks.len(), "detected text blocks");

        for block in &mut blocks {
            let direction = block.direction();
            let quads = if block.lines.is_empty() {
                vec![block.quad()]
            } else {
                block.lines.clone()
            };

            let mut text = String::new();
            for quad in &quads {
                let line = match extract_line(
                    &page,
                    &mask,
                    quad,
                    direction,
                    self.chunking.text_height,
                ) {
                    Ok(line) => line,
                    Err(ChunkError::InvalidInput(reason)) => {
                        tracing::warn!(%reason, "skipping text line");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                };
                text.push_str(&self.recognize_line(&line, direction).await?);
            }
            block.text = Some(text);
        }

        Ok(blocks)
    }
}
