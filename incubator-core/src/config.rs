use incubator_types::TextDirection;
use serde::{Deserialize, Serialize};

use crate::{chunk::LineChunker, error::Result};

/// Tunables for line extraction and chunking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Height every line is rectified to before recognition.
    pub text_height: u32,
    pub max_ratio_horizontal: f32,
    pub max_ratio_vertical: f32,
    /// Width of the cut search window, in multiples of `text_height`.
    pub anchor_window: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            text_height: 64,
            max_ratio_horizontal: 8.0,
            max_ratio_vertical: 16.0,
            anchor_window: 2,
        }
    }
}

impl ChunkingConfig {
    pub fn max_ratio(&self, direction: TextDirection) -> f32 {
        match direction {
            TextDirection::Horizontal => self.max_ratio_horizontal,
            TextDirection::Vertical => self.max_ratio_vertical,
        }
    }

    pub fn chunker(&self, direction: TextDirection) -> Result<LineChunker> {
        LineChunker::new(
            self.text_height,
            self.max_ratio(direction),
            self.anchor_window,
        )
    }

    /// Fails with the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        self.chunker(TextDirection::Horizontal)?;
        self.chunker(TextDirection::Vertical)?;
        Ok(())
    }
}
