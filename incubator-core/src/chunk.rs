//! Splitting of overly long text lines for the recognizer.
//!
//! The recognizer works on roughly square inputs, so a long line is cut into
//! pieces whose aspect ratio stays below `max_ratio`. Cuts are placed near
//! evenly spaced anchors, at the column where the smoothed ink density of the
//! line mask is lowest.

use image::{GrayImage, ImageBuffer, Pixel, imageops};
use tracing::instrument;

use crate::error::{ChunkError, Result};

/// Column slices of a line image together with the cut points used.
#[derive(Debug, Clone)]
pub struct Chunks<P: Pixel> {
    pub images: Vec<ImageBuffer<P, Vec<P::Subpixel>>>,
    pub cut_points: Vec<u32>,
}

impl<P: Pixel> Chunks<P> {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineChunker {
    text_height: u32,
    max_ratio: f32,
    anchor_window: u32,
}

impl LineChunker {
    /// `anchor_window` is measured in multiples of `text_height`.
    pub fn new(text_height: u32, max_ratio: f32, anchor_window: u32) -> Result<Self> {
        if text_height == 0 {
            return Err(ChunkError::Configuration(
                "text height must be positive".to_string(),
            ));
        }
        if !max_ratio.is_finite() || max_ratio <= 0.0 {
            return Err(ChunkError::Configuration(format!(
                "max ratio must be positive, got {max_ratio}"
            )));
        }
        if anchor_window == 0 {
            return Err(ChunkError::Configuration(
                "anchor window must be positive".to_string(),
            ));
        }

        Ok(Self {
            text_height,
            max_ratio,
            anchor_window,
        })
    }

    pub fn max_ratio(&self) -> f32 {
        self.max_ratio
    }

    /// Splits `line` along its width. A line that already fits is returned
    /// as the only chunk, with no cut points.
    #[instrument(level = "debug", skip_all)]
    pub fn split<P>(
        &self,
        line: &ImageBuffer<P, Vec<P::Subpixel>>,
        mask: &GrayImage,
    ) -> Result<Chunks<P>>
    where
        P: Pixel + 'static,
        P::Subpixel: 'static,
    {
        if line.dimensions() != mask.dimensions() {
            let (w, h) = line.dimensions();
            let (mw, mh) = mask.dimensions();
            return Err(ChunkError::InvalidInput(format!(
                "line is {w}x{h} but its mask is {mw}x{mh}"
            )));
        }

        let cut_points = self.cut_points(mask)?;
        let images = if cut_points.is_empty() {
            vec![line.clone()]
        } else {
            split_columns(line, &cut_points)
        };

        Ok(Chunks { images, cut_points })
    }

    /// Computes the cut points for a line from its mask alone.
    pub fn cut_points(&self, mask: &GrayImage) -> Result<Vec<u32>> {
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return Err(ChunkError::InvalidInput(format!(
                "line has degenerate size {width}x{height}"
            )));
        }

        let ratio = f64::from(width) / f64::from(height);
        let max_ratio = f64::from(self.max_ratio);
        if ratio <= max_ratio {
            return Ok(Vec::new());
        }

        let num_chunks = (ratio / max_ratio).ceil() as usize;
        let width = width as usize;
        if num_chunks > width {
            return Err(ChunkError::Configuration(format!(
                "cannot cut a {width} px wide line into {num_chunks} chunks"
            )));
        }

        let density = self.density(mask);
        let half_window = (self.anchor_window as usize * self.text_height as usize) / 2;
        let num_cuts = num_chunks - 1;

        let mut cut_points = Vec::with_capacity(num_cuts);
        let mut previous = 0usize;
        for k in 1..num_chunks {
            let anchor = k * width / num_chunks;
            // every later cut still needs a column of its own
            let remaining = num_cuts - k;
            let lower = anchor.saturating_sub(half_window).max(previous + 1);
            let upper = (anchor + half_window).min(width - remaining);

            let cut = if lower < upper {
                lower + argmin(&density[lower..upper])
            } else {
                anchor.clamp(previous + 1, width - 1 - remaining)
            };

            cut_points.push(cut as u32);
            previous = cut;
        }

        tracing::debug!(width, height, num_chunks, ?cut_points, "split text line");

        Ok(cut_points)
    }

    /// Per-column ink sum smoothed with a Gaussian of `2h` taps and standard
    /// deviation `h / 8`, scaled so the densest column is 1.
    fn density(&self, mask: &GrayImage) -> Vec<f64> {
        let (width, _) = mask.dimensions();
        let mut columns = vec![0.0f64; width as usize];
        for (x, _, pixel) in mask.enumerate_pixels() {
            columns[x as usize] += f64::from(pixel.0[0]);
        }

        let kernel = gaussian_window(
            2 * self.text_height as usize,
            f64::from(self.text_height) / 8.0,
        );
        let mut density = convolve_same(&columns, &kernel);

        let max = density.iter().copied().fold(0.0f64, f64::max);
        if max > 0.0 {
            density.iter_mut().for_each(|v| *v /= max);
        }

        density
    }
}

/// Splits `image` into column ranges at the given increasing cut points.
pub fn split_columns<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    cut_points: &[u32],
) -> Vec<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let bounds: Vec<u32> = std::iter::once(0)
        .chain(cut_points.iter().copied())
        .chain(std::iter::once(width))
        .collect();

    bounds
        .windows(2)
        .map(|range| {
            imageops::crop_imm(image, range[0], 0, range[1] - range[0], height).to_image()
        })
        .collect()
}

fn gaussian_window(len: usize, std: f64) -> Vec<f64> {
    let center = (len as f64 - 1.0) / 2.0;
    (0..len)
        .map(|n| {
            let x = (n as f64 - center) / std;
            (-0.5 * x * x).exp()
        })
        .collect()
}

/// Discrete convolution in "same" mode: the full result trimmed to the
/// length of `signal`, centred on it.
fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let offset = kernel.len().saturating_sub(1) / 2;
    (0..signal.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, weight)| {
                    (i + offset)
                        .checked_sub(k)
                        .and_then(|j| signal.get(j))
                        .map(|value| weight * value)
                })
                .sum()
        })
        .collect()
}

/// Index of the first minimum.
fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |best, (i, value)| if *value < values[best] { i } else { best })
}
