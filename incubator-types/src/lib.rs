mod direction;

pub use direction::TextDirection;

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Corner points of a text line on the page: top-left, top-right,
/// bottom-right, bottom-left.
pub type Quad = [[f32; 2]; 4];

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// `[x1, y1, x2, y2]` in page pixels.
    #[serde(rename = "box")]
    pub xyxy: [f32; 4],
    pub vertical: bool,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Quad>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TextBlock {
    pub fn new(xyxy: [f32; 4], vertical: bool) -> Self {
        Self {
            xyxy,
            vertical,
            ..Default::default()
        }
    }

    pub fn direction(&self) -> TextDirection {
        TextDirection::from_vertical(self.vertical)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.xyxy[0] + self.xyxy[2]) / 2.0,
            (self.xyxy[1] + self.xyxy[3]) / 2.0,
        )
    }

    /// The box as a line quad, used when the detector reported no lines.
    pub fn quad(&self) -> Quad {
        let [x1, y1, x2, y2] = self.xyxy;
        [[x1, y1], [x2, y1], [x2, y2], [x1, y2]]
    }
}

/// Output of a text detector for one page.
#[derive(Debug, Clone)]
pub struct Detection {
    pub blocks: Vec<TextBlock>,
    /// Page-sized text mask, higher values mean more likely ink.
    pub mask: GrayImage,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Blocks {
    pub blocks: Vec<TextBlock>,
}

/// Response body of the detection + recognition endpoint.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub blks: Blocks,
}

impl From<Vec<TextBlock>> for PageResponse {
    fn from(blocks: Vec<TextBlock>) -> Self {
        Self {
            blks: Blocks { blocks },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_uses_box_key() {
        let mut block = TextBlock::new([1.0, 2.0, 11.0, 42.0], true);
        block.text = Some("テスト".to_string());

        let value = serde_json::to_value(&block).expect("serialize block");
        assert_eq!(value["box"], serde_json::json!([1.0, 2.0, 11.0, 42.0]));
        assert_eq!(value["vertical"], serde_json::json!(true));
        assert_eq!(value["text"], serde_json::json!("テスト"));
        assert!(value.get("lines").is_none());
    }

    #[test]
    fn quad_follows_box_corners() {
        let block = TextBlock::new([10.0, 20.0, 30.0, 60.0], false);
        assert_eq!(
            block.quad(),
            [[10.0, 20.0], [30.0, 20.0], [30.0, 60.0], [10.0, 60.0]]
        );
        assert_eq!(block.center(), (20.0, 40.0));
    }

    #[test]
    fn direction_parses_lowercase() {
        assert_eq!(
            "vertical".parse::<TextDirection>().expect("parse direction"),
            TextDirection::Vertical
        );
        assert_eq!(TextDirection::Horizontal.to_string(), "horizontal");
        assert_eq!(
            TextDirection::from_vertical(true),
            TextDirection::Vertical
        );
    }
}
