//! Band-pass wavelet mipmap generation.
//!
//! A Haar-like 2D decomposition turns a square power-of-two RGBA image into
//! a pyramid of averages plus three detail bands per level. Reconstruction
//! re-composes every mip from the top average downward, scaling the detail
//! bands by a per-level coefficient so that coarse mips lose their
//! highest-frequency content while fine mips keep it. This is what
//! distinguishes the path from plain box downsampling: each emitted mip is a
//! band-passed version of the input rather than a blurred copy.
//!
//! # Example
//!
//! ```
//! use texmill::wavelet::{EmitOptions, WaveletPyramid};
//! use texmill::tile::ChannelMode;
//! use texmill::sink::MemorySink;
//!
//! let red = [255u8, 0, 0, 255].repeat(64);
//! let mut pyramid = WaveletPyramid::decompose(&red, 8, 0, ChannelMode::Linear).unwrap();
//! pyramid.reconstruct(0);
//!
//! let mut sink = MemorySink::new();
//! pyramid.emit_mips(&mut sink, &EmitOptions::default()).unwrap();
//! assert_eq!(sink.mips().len(), 4); // 1x1 .. 8x8
//! ```

mod decompose;
mod emit;
mod pyramid;
mod reconstruct;

pub use emit::{EmitOptions, YuvMode};
pub use pyramid::{
    detail_pyramid_len, sum_pyramid_len, LevelStats, WaveletPyramid, MAX_LEVELS,
};
