use image::{
    GrayImage, Luma, Rgb, RgbImage,
    imageops::{self, FilterType},
};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use incubator_types::{Quad, TextDirection};
use tracing::instrument;

use crate::error::{ChunkError, Result};

/// A text line cut out of a page and normalised to a fixed height, with the
/// matching slice of the page mask. Text always runs along the width.
#[derive(Debug, Clone)]
pub struct Line {
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl Line {
    /// Builds a line from an upright crop and its mask. Vertical crops are
    /// turned counter-clockwise, so the top of the column ends up on the left.
    pub fn new(image: RgbImage, mask: GrayImage, direction: TextDirection) -> Result<Self> {
        check_mask(&image, &mask)?;

        Ok(match direction {
            TextDirection::Horizontal => Self { image, mask },
            TextDirection::Vertical => Self {
                image: imageops::rotate270(&image),
                mask: imageops::rotate270(&mask),
            },
        })
    }

    /// Scales an upright crop so the line is `text_height` across (its height
    /// for horizontal text, its width for vertical text), then builds it with
    /// [`Line::new`].
    pub fn fit(
        image: RgbImage,
        mask: GrayImage,
        direction: TextDirection,
        text_height: u32,
    ) -> Result<Self> {
        check_mask(&image, &mask)?;
        if text_height == 0 {
            return Err(ChunkError::Configuration(
                "text height must be positive".to_string(),
            ));
        }
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(ChunkError::InvalidInput(format!(
                "line has degenerate size {w}x{h}"
            )));
        }

        let th = f64::from(text_height);
        let (width, height) = match direction {
            TextDirection::Horizontal => (
                ((th * f64::from(w) / f64::from(h)).round() as u32).max(1),
                text_height,
            ),
            TextDirection::Vertical => (
                text_height,
                ((th * f64::from(h) / f64::from(w)).round() as u32).max(1),
            ),
        };

        if (width, height) == (w, h) {
            return Self::new(image, mask, direction);
        }
        tracing::debug!(from = ?(w, h), to = ?(width, height), "scaling line");
        Self::new(
            imageops::resize(&image, width, height, FilterType::Triangle),
            imageops::resize(&mask, width, height, FilterType::Triangle),
            direction,
        )
    }
}

#[instrument(level = "debug", skip(page, mask))]
pub fn extract_line(
    page: &RgbImage,
    mask: &GrayImage,
    quad: &Quad,
    direction: TextDirection,
    text_height: u32,
) -> Result<Line> {
    if page.dimensions() != mask.dimensions() {
        return Err(ChunkError::InvalidInput(format!(
            "page is {:?} but its mask is {:?}",
            page.dimensions(),
            mask.dimensions()
        )));
    }
    if text_height == 0 {
        return Err(ChunkError::Configuration(
            "text height must be positive".to_string(),
        ));
    }

    let (quad_width, quad_height) = quad_size(quad);
    if !(quad_width.is_finite() && quad_height.is_finite())
        || quad_width < f32::EPSILON
        || quad_height < f32::EPSILON
    {
        return Err(ChunkError::InvalidInput(format!(
            "degenerate line quad {quad:?}"
        )));
    }

    let th = text_height as f32;
    let (width, height) = match direction {
        TextDirection::Horizontal => (
            ((th * quad_width / quad_height).round() as u32).max(1),
            text_height,
        ),
        TextDirection::Vertical => (
            text_height,
            ((th * quad_height / quad_width).round() as u32).max(1),
        ),
    };

    let (w, h) = (width as f32, height as f32);
    let from = (*quad).map(|[x, y]| (x, y));
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        ChunkError::InvalidInput(format!("cannot rectify line quad {quad:?}"))
    })?;

    let mut image = RgbImage::new(width, height);
    warp_into(
        page,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut image,
    );
    let mut line_mask = GrayImage::new(width, height);
    warp_into(
        mask,
        &projection,
        Interpolation::Bilinear,
        Luma([0]),
        &mut line_mask,
    );

    Line::new(image, line_mask, direction)
}

fn check_mask(image: &RgbImage, mask: &GrayImage) -> Result<()> {
    if image.dimensions() != mask.dimensions() {
        return Err(ChunkError::InvalidInput(format!(
            "line is {:?} but its mask is {:?}",
            image.dimensions(),
            mask.dimensions()
        )));
    }
    Ok(())
}

/// Mean lengths of the horizontal and vertical edges of `quad`.
fn quad_size(quad: &Quad) -> (f32, f32) {
    let dist = |a: [f32; 2], b: [f32; 2]| (a[0] - b[0]).hypot(a[1] - b[1]);
    let [tl, tr, br, bl] = *quad;
    (
        (dist(tl, tr) + dist(bl, br)) / 2.0,
        (dist(tl, bl) + dist(tr, br)) / 2.0,
    )
}
