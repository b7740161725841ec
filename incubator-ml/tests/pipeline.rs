use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, RgbImage};
use incubator_core::{ChunkingConfig, Line};
use incubator_ml::{OcrPipeline, PipelineError, TextDetector, TextRecognizer};
use incubator_types::{Detection, TextBlock, TextDirection};

/// Answers with the size of every image it is asked to read.
#[derive(Default)]
struct SizeRecognizer {
    calls: Mutex<Vec<(u32, u32)>>,
}

#[async_trait]
impl TextRecognizer for SizeRecognizer {
    async fn recognize(&self, image: &DynamicImage) -> anyhow::Result<String> {
        let size = (image.width(), image.height());
        self.calls.lock().unwrap().push(size);
        Ok(format!("<{}x{}>", size.0, size.1))
    }
}

struct FixedDetector(Detection);

#[async_trait]
impl TextDetector for FixedDetector {
    async fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Detection> {
        Ok(self.0.clone())
    }
}

fn blank_line(width: u32, height: u32) -> Line {
    Line {
        image: RgbImage::new(width, height),
        mask: GrayImage::new(width, height),
    }
}

fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> [[f32; 2]; 4] {
    [[x1, y1], [x2, y1], [x2, y2], [x1, y2]]
}

#[tokio::test]
async fn horizontal_line_is_read_chunk_by_chunk() -> anyhow::Result<()> {
    let recognizer = Arc::new(SizeRecognizer::default());
    let pipeline = OcrPipeline::new(recognizer.clone(), ChunkingConfig::default());

    let text = pipeline
        .recognize_line(&blank_line(1200, 64), TextDirection::Horizontal)
        .await?;

    assert_eq!(text, "<336x64><400x64><464x64>");
    assert_eq!(recognizer.calls.lock().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn vertical_chunks_are_rotated_back() -> anyhow::Result<()> {
    let recognizer = Arc::new(SizeRecognizer::default());
    let pipeline = OcrPipeline::new(recognizer, ChunkingConfig::default());

    let text = pipeline
        .recognize_line(&blank_line(1200, 64), TextDirection::Vertical)
        .await?;

    assert_eq!(text, "<64x536><64x664>");
    Ok(())
}

#[tokio::test]
async fn short_line_is_read_in_one_piece() -> anyhow::Result<()> {
    let recognizer = Arc::new(SizeRecognizer::default());
    let pipeline = OcrPipeline::new(recognizer, ChunkingConfig::default());

    let text = pipeline
        .recognize_line(&blank_line(400, 64), TextDirection::Horizontal)
        .await?;

    assert_eq!(text, "<400x64>");
    Ok(())
}

#[tokio::test]
async fn page_requires_a_detector() {
    let pipeline = OcrPipeline::new(
        Arc::new(SizeRecognizer::default()),
        ChunkingConfig::default(),
    );
    assert!(!pipeline.has_detector());

    let err = pipeline
        .read_page(&DynamicImage::new_rgb8(10, 10))
        .await
        .expect_err("no detector configured");
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::DetectorUnavailable)
    ));
}

#[tokio::test]
async fn page_blocks_are_read_top_to_bottom() -> anyhow::Result<()> {
    let horizontal = TextBlock::new([10.0, 200.0, 210.0, 240.0], false);
    let mut vertical = TextBlock::new([260.0, 10.0, 330.0, 110.0], true);
    vertical.lines = vec![
        rect(300.0, 10.0, 320.0, 110.0),
        [[280.0, 50.0]; 4],
        rect(270.0, 10.0, 290.0, 110.0),
    ];

    let detector = FixedDetector(Detection {
        blocks: vec![horizontal, vertical],
        // half resolution, gets scaled up to the page
        mask: GrayImage::new(200, 150),
    });
    let recognizer = Arc::new(SizeRecognizer::default());
    let pipeline = OcrPipeline::new(recognizer.clone(), ChunkingConfig::default())
        .with_detector(Arc::new(detector));

    let blocks = pipeline.read_page(&DynamicImage::new_rgb8(400, 300)).await?;

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].vertical);
    assert_eq!(blocks[0].text.as_deref(), Some("<64x320><64x320>"));
    assert!(!blocks[1].vertical);
    assert_eq!(blocks[1].text.as_deref(), Some("<320x64>"));
    assert_eq!(recognizer.calls.lock().unwrap().len(), 3);
    Ok(())
}
