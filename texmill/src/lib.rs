//! texmill - texture preprocessing for block-compressed GPU formats
//!
//! This library builds mipmap pyramids from decoded RGBA images and streams
//! them, level by level, to a pluggable compressor sink. Three specialised
//! pipelines share the mip stack as their data substrate:
//!
//! - **Band-pass wavelet mips** ([`wavelet`]): a Haar decomposition whose
//!   reconstruction attenuates the highest-frequency bands per level, so
//!   coarse mips come out smoothed while fine mips keep full detail.
//! - **Coverage-preserving mips** ([`surface`] + [`pipeline`]): alpha-tested
//!   textures keep the same visible coverage fraction at every level.
//! - **Roughness-from-normal mips**: a gloss channel absorbs the variance of
//!   a companion normal map as it is filtered down.
//!
//! # High-Level API
//!
//! ```no_run
//! use texmill::pipeline::{PipelineOptions, TexturePipeline};
//! use texmill::sink::MemorySink;
//! use image::RgbaImage;
//!
//! let image = RgbaImage::new(256, 256);
//! let options = PipelineOptions::default().with_high_pass(0);
//! let mut sink = MemorySink::new();
//! TexturePipeline::new(options).process(&image, &mut sink).unwrap();
//! ```

pub mod error;
pub mod fill;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod surface;
pub mod tile;
pub mod wavelet;

pub use error::PipelineError;

/// Version of the texmill library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
