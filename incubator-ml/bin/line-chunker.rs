mod common;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use image::{GrayImage, imageops};
use incubator_core::LineChunker;

/// Splits a text line image at its lowest-ink columns and writes the pieces.
#[derive(Parser)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Ink mask of the line. Defaults to the inverted luminance of the input.
    #[arg(short, long, value_name = "FILE")]
    mask: Option<PathBuf>,

    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    #[arg(long, default_value_t = 64)]
    text_height: u32,

    #[arg(long, default_value_t = 8.0)]
    max_ratio: f32,

    #[arg(long, default_value_t = 2)]
    anchor_window: u32,
}

fn main() -> anyhow::Result<()> {
    common::init_tracing();

    let cli = Cli::parse();
    let line = image::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?
        .to_rgb8();
    let mask: GrayImage = match &cli.mask {
        Some(path) => image::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?
            .to_luma8(),
        None => {
            let mut luma = image::DynamicImage::ImageRgb8(line.clone()).to_luma8();
            imageops::invert(&mut luma);
            luma
        }
    };

    let chunker = LineChunker::new(cli.text_height, cli.max_ratio, cli.anchor_window)?;
    let chunks = chunker.split(&line, &mask)?;

    std::fs::create_dir_all(&cli.output)?;
    let stem = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("line");
    for (index, chunk) in chunks.images.iter().enumerate() {
        let path = cli.output.join(format!("{stem}_{index}.png"));
        chunk.save(&path)?;
        tracing::info!(path = %path.display(), width = chunk.width(), "wrote chunk");
    }

    println!("{:?}", chunks.cut_points);

    Ok(())
}
