//! texmill CLI - command-line driver for the texture pipeline
//!
//! Decodes an input image, selects one of the mip pipelines (high-pass
//! wavelet, roughness-from-normal, coverage-preserving, hole-fill or plain)
//! and streams the resulting RGBA8 mip levels into a raw or zstd-compressed
//! payload file for a downstream block compressor.

mod error;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use error::CliError;
use texmill::pipeline::{ColorMode, PipelineOptions, TexturePipeline};
use texmill::sink::{RawSink, WrapMode, ZstdSink};
use texmill::surface::MipFilter;
use texmill::wavelet::YuvMode;

// ============================================================================
// CLI Argument Definitions
// ============================================================================

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum FilterArg {
    /// 2x2 average (fast, default)
    #[default]
    Box,
    /// 4-tap tent filter
    Triangle,
    /// Kaiser-windowed sinc
    Kaiser,
}

impl From<FilterArg> for MipFilter {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::Box => MipFilter::Box,
            FilterArg::Triangle => MipFilter::Triangle,
            FilterArg::Kaiser => MipFilter::Kaiser,
        }
    }
}

#[derive(Parser)]
#[command(name = "texmill")]
#[command(version = texmill::VERSION)]
#[command(about = "Prepare images for block-compressed GPU texture formats", long_about = None)]
struct Cli {
    /// Input image (PNG, TGA, JPEG, ...)
    input: PathBuf,

    /// Output payload file (default: input with .mips / .mips.zst extension)
    output: Option<PathBuf>,

    /// The input image is a colour map (default)
    #[arg(long)]
    color: bool,

    /// The input has an alpha channel used for transparency
    #[arg(long)]
    alpha: bool,

    /// The input image is a normal map
    #[arg(long, conflicts_with_all = ["tonormal", "linear", "color"])]
    normal: bool,

    /// Convert the input to a normal map downstream
    #[arg(long, conflicts_with_all = ["linear", "color"])]
    tonormal: bool,

    /// The input is in linear colour space
    #[arg(long, conflicts_with = "color")]
    linear: bool,

    /// Repeat wrapping mode (default: clamp)
    #[arg(long)]
    repeat: bool,

    /// Clamp wrapping mode
    #[arg(long, conflicts_with = "repeat")]
    clamp: bool,

    /// Disable mipmap generation
    #[arg(long)]
    nomips: bool,

    /// Fill transparent areas with nearby colour before mipping
    #[arg(long)]
    fillholes: bool,

    /// Premultiply alpha into colour
    #[arg(long)]
    premula: bool,

    /// Apply high-pass (band-pass wavelet) mipmap filtering, with an
    /// optional detail skip count (--high-pass=N)
    #[arg(long = "high-pass", num_args = 0..=1, require_equals = true, default_missing_value = "0", value_name = "SKIP")]
    high_pass: Option<i32>,

    /// High-pass option: convert mips to YCoCg
    #[arg(long)]
    yuv: bool,

    /// High-pass option: convert mips to YCoCg with luma pinned to gray
    #[arg(long, conflicts_with = "yuv")]
    yuvn: bool,

    /// Preserve alpha-test coverage: threshold in [0, 1] and channel 0..=3.
    /// Repeatable for up to four channels.
    #[arg(long, value_names = ["THRESHOLD", "CHANNEL"], num_args = 2, action = ArgAction::Append)]
    coverage: Vec<f32>,

    /// Derive roughness mips from the named normal map
    #[arg(long = "normal-to-roughness", value_name = "PATH")]
    normal_to_roughness: Option<PathBuf>,

    /// Mipmap filter for the plain path
    #[arg(long, value_enum, default_value = "box")]
    mipfilter: FilterArg,

    /// Transform input to RGBM (level 0 only)
    #[arg(long)]
    rgbm: bool,

    /// Scale image to use the entire colour range
    #[arg(long)]
    rangescale: bool,

    /// Compress the payload with streaming zstd
    #[arg(long)]
    zstd: bool,

    /// Do not print progress messages
    #[arg(long)]
    silent: bool,
}

// ============================================================================
// Option Assembly
// ============================================================================

fn color_mode(cli: &Cli) -> ColorMode {
    if cli.normal {
        ColorMode::Normal
    } else if cli.tonormal {
        ColorMode::ToNormal
    } else if cli.linear {
        ColorMode::Linear
    } else {
        ColorMode::Color
    }
}

fn build_options(cli: &Cli) -> Result<PipelineOptions, CliError> {
    let mut options = PipelineOptions::default()
        .with_color_mode(color_mode(cli))
        .with_mip_filter(cli.mipfilter.into())
        .with_wrap_mode(if cli.repeat {
            WrapMode::Repeat
        } else {
            WrapMode::Clamp
        });

    if let Some(skip) = cli.high_pass {
        options = options.with_high_pass(skip);
    }
    if cli.yuv {
        options = options.with_yuv(YuvMode::YCoCg);
    }
    if cli.yuvn {
        options = options.with_yuv(YuvMode::YCoCgGray);
    }

    if cli.coverage.len() > 8 {
        return Err(CliError::InvalidArguments(
            "at most four coverage pairs may be given".to_string(),
        ));
    }
    for pair in cli.coverage.chunks_exact(2) {
        let threshold = pair[0];
        let channel = pair[1];
        if channel.fract() != 0.0 || !(0.0..=3.0).contains(&channel) {
            return Err(CliError::InvalidArguments(format!(
                "coverage channel must be an integer 0..=3, got {}",
                channel
            )));
        }
        options = options.with_coverage(threshold, channel as usize);
    }

    if let Some(path) = &cli.normal_to_roughness {
        let normal = load_rgba(path)?;
        options = options.with_roughness_from_normal(normal);
    }

    if cli.nomips {
        options = options.without_mipmaps();
    }
    if cli.fillholes {
        options = options.with_fill_holes();
    }
    if cli.premula {
        options = options.with_premultiplied_alpha();
    }
    if cli.alpha {
        options = options.with_alpha_transparency();
    }
    if cli.rgbm {
        options = options.with_rgbm();
    }
    if cli.rangescale {
        options = options.with_range_scale();
    }

    Ok(options)
}

fn load_rgba(path: &Path) -> Result<image::RgbaImage, CliError> {
    let img = image::open(path).map_err(|error| CliError::ImageLoad {
        path: path.display().to_string(),
        error,
    })?;
    Ok(img.to_rgba8())
}

fn default_output(input: &Path, zstd: bool) -> PathBuf {
    let ext = if zstd { "mips.zst" } else { "mips" };
    input.with_extension(ext)
}

/// Total RGBA8 payload size for the full mip chain (or level 0 alone).
fn payload_estimate(w: u32, h: u32, mips: bool) -> u64 {
    let mut total = 0u64;
    let (mut w, mut h) = (w as u64, h as u64);
    loop {
        total += 4 * w * h;
        if !mips || (w <= 1 && h <= 1) {
            return total;
        }
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
}

// ============================================================================
// Entry Point
// ============================================================================

fn run(cli: &Cli) -> Result<PathBuf, CliError> {
    let image = load_rgba(&cli.input)?;
    let options = build_options(cli)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, cli.zstd));
    let file = File::create(&output).map_err(|error| CliError::FileCreate {
        path: output.display().to_string(),
        error,
    })?;
    let writer = BufWriter::new(file);

    let pipeline = TexturePipeline::new(options);
    if cli.zstd {
        let mut sink = ZstdSink::new(writer)?;
        pipeline.process(&image, &mut sink)?;
    } else {
        let total = payload_estimate(image.width(), image.height(), !cli.nomips);
        let mut sink = RawSink::new(writer).with_total_bytes(total);
        if !cli.silent {
            sink = sink.with_progress(Box::new(|_level, emitted, total| {
                if total > 0 {
                    print!("\r{}%", 100 * emitted / total);
                    let _ = std::io::Write::flush(&mut std::io::stdout());
                }
            }));
        }
        pipeline.process(&image, &mut sink)?;
    }

    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = texmill::logging::init_logging(cli.silent) {
        CliError::LoggingInit(e).exit();
    }

    if !cli.silent {
        println!("texmill {}", texmill::VERSION);
    }

    let timer = Instant::now();
    match run(&cli) {
        Ok(output) => {
            if !cli.silent {
                println!(
                    "\rwrote {} in {:.3} seconds",
                    output.display(),
                    timer.elapsed().as_secs_f64()
                );
            }
        }
        Err(e) => e.exit(),
    }
}
