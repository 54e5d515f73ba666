//! Command-line harness for the PixLoad SVG decoder.
//!
//! Feeds an `.svg` or `.svgz` file through the incremental load pipeline in
//! fixed-size chunks (exercising the same path a streaming host would use)
//! and writes the raster as a PNG.
//!
//! ## Usage
//!
//! ```bash
//! svgrender input.svg output.png
//! svgrender input.svgz output.png --width 256 --height 256
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pixload_svg::{LoadOptions, LoadSession};

#[derive(Parser)]
#[command(name = "svgrender")]
#[command(about = "Render an SVG or gzip-wrapped SVG to PNG")]
struct Cli {
    /// Input .svg or .svgz file
    input: PathBuf,

    /// Output PNG path
    output: PathBuf,

    /// Override output width (defaults to the document's intrinsic width)
    #[arg(long)]
    width: Option<u32>,

    /// Override output height (defaults to the document's intrinsic height)
    #[arg(long)]
    height: Option<u32>,

    /// Dots-per-inch for resolving physical units
    #[arg(long, default_value = "96")]
    dpi: f32,

    /// Chunk size used when feeding the decoder
    #[arg(long, default_value = "4096")]
    chunk_size: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let (want_w, want_h) = (cli.width, cli.height);
    let mut session = LoadSession::begin(())
        .with_options(LoadOptions::new().with_dpi(cli.dpi))
        .on_size(move |w, h, _| {
            if let Some(width) = want_w {
                *w = width;
            }
            if let Some(height) = want_h {
                *h = height;
            }
        })
        .on_prepared(|image, _| {
            eprintln!("prepared: {}x{}", image.width(), image.height());
        });

    for chunk in bytes.chunks(cli.chunk_size.max(1)) {
        session.append(chunk)?;
    }
    let image = session
        .end()
        .with_context(|| format!("decoding {}", cli.input.display()))?;

    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().context("writing PNG header")?;

    if image.stride() == image.width() as usize * 4 {
        writer.write_image_data(image.pixels())?;
    } else {
        // Repack padded rows before encoding.
        let mut packed = Vec::with_capacity(image.width() as usize * image.height() as usize * 4);
        for y in 0..image.height() {
            packed.extend_from_slice(image.row(y));
        }
        writer.write_image_data(&packed)?;
    }
    writer.finish()?;

    image.release();
    Ok(())
}
