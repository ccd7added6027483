//! Output sink interface consumed by the pipelines.
//!
//! The core never writes containers itself: every mip level goes through a
//! caller-supplied [`TextureSink`], which is also where downstream
//! processing hints (wrap mode, gamma, normal-map handling) are forwarded.
//! Sinks only need to handle sequential calls on one thread.
//!
//! Three implementations ship with the crate:
//!
//! - [`MemorySink`] - collects levels in memory; the test workhorse and the
//!   natural adapter for in-process compressors.
//! - [`RawSink`] - passthrough to any [`std::io::Write`], with optional
//!   progress reporting.
//! - [`ZstdSink`] - streaming zstd compression with a bounded input buffer.

mod raw;
mod stream;

pub use raw::RawSink;
pub use stream::ZstdSink;

use crate::error::PipelineError;
use crate::surface::MipFilter;

/// Texture layout kinds understood by downstream containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    TwoD,
    ThreeD,
    Cube,
    Array,
}

/// Wrap-mode hint passed to the downstream compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
}

/// Alpha-mode hint passed to the downstream compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    None,
    Transparency,
    Premultiplied,
}

/// Receiver for an ordered sequence of RGBA8 mip levels.
///
/// The data methods are fallible; a sink failure surfaces as
/// [`PipelineError::Compressor`] and aborts the invocation. Configuration
/// setters are hints with no-op defaults, mirroring what a compressing
/// backend would accept before data arrives.
pub trait TextureSink {
    /// Announce the texture layout before any mip data.
    fn set_texture_layout(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        depth: u32,
        array_size: u32,
    ) -> Result<(), PipelineError>;

    /// Deliver one mip level as tightly packed RGBA8.
    fn set_mipmap_data(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        depth: u32,
        face: u32,
        level: u32,
    ) -> Result<(), PipelineError>;

    /// Signal end-of-output. Streaming sinks flush here.
    fn finish(&mut self) -> Result<(), PipelineError>;

    fn set_wrap_mode(&mut self, _mode: WrapMode) {}
    fn set_alpha_mode(&mut self, _mode: AlphaMode) {}
    fn set_gamma(&mut self, _input_gamma: f32, _output_gamma: f32) {}
    fn set_normal_map(&mut self, _is_normal_map: bool) {}
    fn set_convert_to_normal_map(&mut self, _convert: bool) {}
    fn set_normalize_mipmaps(&mut self, _normalize: bool) {}
    fn set_mipmap_filter(&mut self, _filter: MipFilter) {}
    fn set_mipmap_generation(&mut self, _enabled: bool) {}
}

/// One mip level captured by [`MemorySink`].
#[derive(Debug, Clone)]
pub struct MipRecord {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub face: u32,
    pub data: Vec<u8>,
}

/// Texture layout captured by [`MemorySink`].
#[derive(Debug, Clone, Copy)]
pub struct LayoutRecord {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
}

/// Collects everything a pipeline emits, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    layout: Option<LayoutRecord>,
    mips: Vec<MipRecord>,
    wrap_mode: WrapMode,
    alpha_mode: AlphaMode,
    gamma: Option<(f32, f32)>,
    normal_map: bool,
    convert_to_normal_map: bool,
    normalize_mipmaps: bool,
    mipmap_filter: Option<MipFilter>,
    mipmap_generation: bool,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            mipmap_generation: true,
            ..Default::default()
        }
    }

    /// Captured mip levels, in the order the pipeline delivered them.
    pub fn mips(&self) -> &[MipRecord] {
        &self.mips
    }

    /// The captured mip with the given level index, if delivered.
    pub fn mip(&self, level: u32) -> Option<&MipRecord> {
        self.mips.iter().find(|m| m.level == level)
    }

    pub fn layout(&self) -> Option<&LayoutRecord> {
        self.layout.as_ref()
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    pub fn gamma(&self) -> Option<(f32, f32)> {
        self.gamma
    }

    pub fn is_normal_map(&self) -> bool {
        self.normal_map
    }

    pub fn converts_to_normal_map(&self) -> bool {
        self.convert_to_normal_map
    }

    pub fn normalizes_mipmaps(&self) -> bool {
        self.normalize_mipmaps
    }

    pub fn mipmap_filter(&self) -> Option<MipFilter> {
        self.mipmap_filter
    }

    pub fn generates_mipmaps(&self) -> bool {
        self.mipmap_generation
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl TextureSink for MemorySink {
    fn set_texture_layout(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        depth: u32,
        array_size: u32,
    ) -> Result<(), PipelineError> {
        self.layout = Some(LayoutRecord {
            kind,
            width,
            height,
            depth,
            array_size,
        });
        Ok(())
    }

    fn set_mipmap_data(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        depth: u32,
        face: u32,
        level: u32,
    ) -> Result<(), PipelineError> {
        self.mips.push(MipRecord {
            level,
            width,
            height,
            depth,
            face,
            data: bytes.to_vec(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        self.finished = true;
        Ok(())
    }

    fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    fn set_alpha_mode(&mut self, mode: AlphaMode) {
        self.alpha_mode = mode;
    }

    fn set_gamma(&mut self, input_gamma: f32, output_gamma: f32) {
        self.gamma = Some((input_gamma, output_gamma));
    }

    fn set_normal_map(&mut self, is_normal_map: bool) {
        self.normal_map = is_normal_map;
    }

    fn set_convert_to_normal_map(&mut self, convert: bool) {
        self.convert_to_normal_map = convert;
    }

    fn set_normalize_mipmaps(&mut self, normalize: bool) {
        self.normalize_mipmaps = normalize;
    }

    fn set_mipmap_filter(&mut self, filter: MipFilter) {
        self.mipmap_filter = Some(filter);
    }

    fn set_mipmap_generation(&mut self, enabled: bool) {
        self.mipmap_generation = enabled;
    }
}
