//! Pipeline configuration.

use image::RgbaImage;

use crate::sink::WrapMode;
use crate::surface::MipFilter;
use crate::wavelet::YuvMode;

/// Channel interpretation of the input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// sRGB colour map (default).
    #[default]
    Color,
    /// Linear data, no gamma handling.
    Linear,
    /// The input is a normal map.
    Normal,
    /// Convert the colour input to a normal map downstream.
    ToNormal,
}

/// Everything the orchestrator needs to pick and drive one mip pipeline.
///
/// Built with chained `with_*` calls:
///
/// ```
/// use texmill::pipeline::PipelineOptions;
/// use texmill::surface::MipFilter;
///
/// let options = PipelineOptions::default()
///     .with_coverage(0.5, 3)
///     .with_mip_filter(MipFilter::Kaiser);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub(crate) color_mode: ColorMode,
    pub(crate) mip_filter: MipFilter,
    pub(crate) wrap_mode: WrapMode,
    pub(crate) no_mipmaps: bool,
    pub(crate) premultiply_alpha: bool,
    pub(crate) alpha_transparency: bool,
    pub(crate) high_pass: Option<i32>,
    pub(crate) yuv: YuvMode,
    pub(crate) coverage: [Option<f32>; 4],
    pub(crate) fill_holes: bool,
    pub(crate) roughness_normal: Option<RgbaImage>,
    pub(crate) rgbm: bool,
    pub(crate) range_scale: bool,
}

impl PipelineOptions {
    /// Select the wavelet band-pass pipeline with the given detail skip.
    pub fn with_high_pass(mut self, skip: i32) -> Self {
        self.high_pass = Some(skip);
        self
    }

    /// Chroma conversion applied when the wavelet path emits mips.
    /// Only meaningful together with [`with_high_pass`](Self::with_high_pass).
    pub fn with_yuv(mut self, yuv: YuvMode) -> Self {
        self.yuv = yuv;
        self
    }

    /// Preserve alpha-test coverage at `threshold` on `channel` (0..=3).
    /// Repeatable for up to four channels.
    pub fn with_coverage(mut self, threshold: f32, channel: usize) -> Self {
        self.coverage[channel] = Some(threshold);
        self
    }

    /// Derive a roughness channel from the named normal map while mipping.
    pub fn with_roughness_from_normal(mut self, normal: RgbaImage) -> Self {
        self.roughness_normal = Some(normal);
        self
    }

    /// Fill transparent regions before mipping.
    pub fn with_fill_holes(mut self) -> Self {
        self.fill_holes = true;
        self
    }

    /// Channel interpretation of the input.
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    /// Filter used by the plain (non-wavelet) mip chain.
    pub fn with_mip_filter(mut self, filter: MipFilter) -> Self {
        self.mip_filter = filter;
        self
    }

    /// Wrap-mode hint forwarded to the sink.
    pub fn with_wrap_mode(mut self, mode: WrapMode) -> Self {
        self.wrap_mode = mode;
        self
    }

    /// Emit level 0 only.
    pub fn without_mipmaps(mut self) -> Self {
        self.no_mipmaps = true;
        self
    }

    /// Premultiply alpha into colour before any processing.
    pub fn with_premultiplied_alpha(mut self) -> Self {
        self.premultiply_alpha = true;
        self
    }

    /// The alpha channel carries transparency.
    pub fn with_alpha_transparency(mut self) -> Self {
        self.alpha_transparency = true;
        self
    }

    /// Encode colour as RGBM (shared multiplier in alpha); level 0 only.
    pub fn with_rgbm(mut self) -> Self {
        self.rgbm = true;
        self
    }

    /// Scale colour to use the entire range before RGBM encoding.
    pub fn with_range_scale(mut self) -> Self {
        self.range_scale = true;
        self
    }

    /// The wavelet path's detail skip, when the high-pass pipeline is
    /// selected.
    pub fn high_pass(&self) -> Option<i32> {
        self.high_pass
    }

    pub fn yuv(&self) -> YuvMode {
        self.yuv
    }

    /// Per-channel coverage thresholds, indexed by channel.
    pub fn coverage(&self) -> &[Option<f32>; 4] {
        &self.coverage
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn mip_filter(&self) -> MipFilter {
        self.mip_filter
    }

    pub(crate) fn wants_coverage(&self) -> bool {
        self.coverage.iter().any(Option::is_some)
    }
}
