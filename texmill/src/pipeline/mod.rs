//! Pipeline orchestration.
//!
//! Exactly one mip-producing path runs per invocation, chosen with a fixed
//! precedence: **high-pass > roughness > coverage > hole-fill > plain**.
//! The orchestrator loads the input, forwards the channel-interpretation
//! configuration to the sink, streams the produced levels and finally calls
//! [`finish`](crate::sink::TextureSink::finish). The wavelet path delivers
//! coarsest level first; every other path delivers level 0 first.

mod options;

pub use options::{ColorMode, PipelineOptions};

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::fill;
use crate::sink::{AlphaMode, TextureKind, TextureSink};
use crate::surface::{validate_coverage_pair, MipFilter, Surface};
use crate::tile::ChannelMode;
use crate::wavelet::{EmitOptions, WaveletPyramid};

/// One-shot texture pipeline: owns its options, borrows a sink per run.
/// Stateless across invocations.
pub struct TexturePipeline {
    options: PipelineOptions,
}

impl TexturePipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Run the selected pipeline over `image`, streaming mips into `sink`.
    ///
    /// # Errors
    ///
    /// Fails on invalid input (wavelet dimension violation, bad coverage
    /// pair, mismatched roughness normal) and propagates sink failures
    /// unchanged. Nothing is committed past the first error.
    pub fn process(
        &self,
        image: &RgbaImage,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        let opts = &self.options;
        self.configure_sink(image, sink)?;

        if let Some(skip) = opts.high_pass {
            if opts.roughness_normal.is_some() || opts.wants_coverage() || opts.fill_holes {
                warn!("multiple mip pipelines requested; high-pass wins");
            }
            self.process_high_pass(image, skip, sink)?;
        } else if opts.roughness_normal.is_some() {
            if opts.wants_coverage() || opts.fill_holes {
                warn!("multiple mip pipelines requested; roughness-from-normal wins");
            }
            self.process_roughness(image, sink)?;
        } else if opts.wants_coverage() {
            if opts.fill_holes {
                warn!("coverage preservation requested; hole filling skipped");
            }
            self.process_coverage(image, sink)?;
        } else {
            self.process_plain(image, sink)?;
        }

        sink.finish()
    }

    /// Forward layout, wrap/alpha hints and the channel-interpretation
    /// settings the downstream compressor expects for this kind of map.
    fn configure_sink(
        &self,
        image: &RgbaImage,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        let opts = &self.options;
        sink.set_texture_layout(TextureKind::TwoD, image.width(), image.height(), 1, 1)?;
        sink.set_wrap_mode(opts.wrap_mode);

        let alpha_mode = if opts.premultiply_alpha {
            AlphaMode::Premultiplied
        } else if opts.alpha_transparency {
            AlphaMode::Transparency
        } else {
            AlphaMode::None
        };
        sink.set_alpha_mode(alpha_mode);

        if opts.high_pass.is_some() {
            // Band-passed mips arrive fully baked; the compressor must not
            // re-gamma or renormalize them.
            sink.set_normal_map(true);
            sink.set_convert_to_normal_map(false);
            sink.set_gamma(1.0, 1.0);
            sink.set_normalize_mipmaps(false);
        } else {
            match opts.color_mode {
                ColorMode::Linear => {
                    sink.set_normal_map(false);
                    sink.set_convert_to_normal_map(false);
                    sink.set_gamma(1.0, 1.0);
                    sink.set_normalize_mipmaps(false);
                }
                ColorMode::Normal => {
                    sink.set_normal_map(true);
                    sink.set_convert_to_normal_map(false);
                    sink.set_gamma(1.0, 1.0);
                    sink.set_normalize_mipmaps(true);
                }
                ColorMode::ToNormal => {
                    sink.set_normal_map(false);
                    sink.set_convert_to_normal_map(true);
                    sink.set_gamma(1.0, 1.0);
                    sink.set_normalize_mipmaps(true);
                }
                ColorMode::Color => {
                    sink.set_normal_map(false);
                    sink.set_convert_to_normal_map(false);
                    sink.set_gamma(2.2, 2.2);
                    sink.set_normalize_mipmaps(false);
                }
            }
        }

        if opts.no_mipmaps {
            sink.set_mipmap_generation(false);
        }
        sink.set_mipmap_filter(opts.mip_filter);
        Ok(())
    }

    fn process_high_pass(
        &self,
        image: &RgbaImage,
        skip: i32,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        if image.width() != image.height() {
            return Err(PipelineError::InvalidInput(format!(
                "high-pass input must be square, got {}x{}",
                image.width(),
                image.height()
            )));
        }

        let mode = match self.options.color_mode {
            ColorMode::Normal => ChannelMode::Normal,
            ColorMode::Linear => ChannelMode::Linear,
            ColorMode::Color | ColorMode::ToNormal => ChannelMode::Sgamma,
        };
        debug!(skip, ?mode, "running high-pass pipeline");

        let mut pyramid = WaveletPyramid::decompose(image.as_raw(), image.width(), 0, mode)?;
        pyramid.reconstruct(skip);

        let emit = EmitOptions {
            tosrgb: mode == ChannelMode::Sgamma,
            tonormal: mode == ChannelMode::Normal,
            yuv: self.options.yuv,
        };
        pyramid.emit_mips(sink, &emit)
    }

    fn process_roughness(
        &self,
        image: &RgbaImage,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        // Checked by the caller; the borrow keeps the options immutable.
        let Some(normal_image) = self.options.roughness_normal.as_ref() else {
            return Err(PipelineError::InvalidInput(
                "roughness path needs a normal map".to_string(),
            ));
        };
        debug!("running roughness-from-normal pipeline");

        let mut surf = Surface::from_image(image);
        if self.options.premultiply_alpha {
            surf.premultiply_alpha();
        }
        let normal = Surface::from_image(normal_image);

        self.emit_surface(&surf, 0, sink)?;
        if self.options.no_mipmaps {
            return Ok(());
        }

        let mut level = 1;
        while surf.build_next_mipmap(MipFilter::Box) {
            surf.roughness_mip_from_normal(&normal)?;
            self.emit_surface(&surf, level, sink)?;
            level += 1;
        }
        Ok(())
    }

    fn process_coverage(
        &self,
        image: &RgbaImage,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        let opts = &self.options;
        for (k, threshold) in opts.coverage.iter().enumerate() {
            if let Some(t) = threshold {
                validate_coverage_pair(*t, k)?;
            }
        }
        debug!("running coverage-preserving pipeline");

        let mut surf = Surface::from_image(image);
        if opts.premultiply_alpha {
            surf.premultiply_alpha();
        }

        self.emit_surface(&surf, 0, sink)?;

        let mut initial = [0.0f32; 4];
        for (k, threshold) in opts.coverage.iter().enumerate() {
            if let Some(t) = threshold {
                initial[k] = surf.alpha_test_coverage(*t, k);
            }
        }

        if opts.no_mipmaps {
            return Ok(());
        }

        let mut level = 1;
        while surf.build_next_mipmap(MipFilter::Box) {
            // Scale an emitted copy; the running chain stays unscaled so the
            // rescaling never compounds level over level.
            let mut mip = surf.clone();
            for (k, threshold) in opts.coverage.iter().enumerate() {
                if let Some(t) = threshold {
                    mip.scale_alpha_to_coverage(initial[k], *t, k);
                }
            }
            self.emit_surface(&mip, level, sink)?;
            level += 1;
        }
        Ok(())
    }

    fn process_plain(
        &self,
        image: &RgbaImage,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        let opts = &self.options;
        let mut surf = Surface::from_image(image);

        if opts.fill_holes {
            fill::fill_holes(&mut surf, fill::DEFAULT_BLUR_PASSES);
        }
        if opts.premultiply_alpha {
            surf.premultiply_alpha();
        }

        if opts.rgbm {
            debug!("running rgbm encode, level 0 only");
            if opts.range_scale {
                surf.range_scale(16.0);
            }
            surf.to_gamma(2.0);
            surf.to_rgbm(1.0, 0.15);
            return self.emit_surface(&surf, 0, sink);
        }

        debug!(filter = ?opts.mip_filter, "running plain mip pipeline");
        self.emit_surface(&surf, 0, sink)?;
        if opts.no_mipmaps {
            return Ok(());
        }

        let mut level = 1;
        while surf.build_next_mipmap(opts.mip_filter) {
            self.emit_surface(&surf, level, sink)?;
            level += 1;
        }
        Ok(())
    }

    fn emit_surface(
        &self,
        surf: &Surface,
        level: u32,
        sink: &mut dyn TextureSink,
    ) -> Result<(), PipelineError> {
        sink.set_mipmap_data(
            &surf.to_rgba8(),
            surf.width() as u32,
            surf.height() as u32,
            1,
            0,
            level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemorySink, WrapMode};
    use image::Rgba;

    fn solid_image(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn test_plain_path_emits_full_chain_finest_first() {
        let image = solid_image(8, 8, [40, 80, 120, 255]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default())
            .process(&image, &mut sink)
            .unwrap();

        let levels: Vec<u32> = sink.mips().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3]);
        assert_eq!(sink.mips()[0].width, 8);
        assert_eq!(sink.mips()[3].width, 1);
        assert!(sink.is_finished());
    }

    #[test]
    fn test_plain_path_level0_matches_input() {
        let image = solid_image(4, 4, [1, 2, 3, 4]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default())
            .process(&image, &mut sink)
            .unwrap();

        assert_eq!(sink.mips()[0].data, image.as_raw().as_slice());
    }

    #[test]
    fn test_nomips_emits_level0_only() {
        let image = solid_image(8, 8, [9, 9, 9, 255]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default().without_mipmaps())
            .process(&image, &mut sink)
            .unwrap();

        assert_eq!(sink.mips().len(), 1);
        assert!(!sink.generates_mipmaps());
    }

    #[test]
    fn test_high_pass_wins_over_other_paths() {
        let image = solid_image(8, 8, [10, 20, 30, 255]);
        let mut sink = MemorySink::new();
        let options = PipelineOptions::default()
            .with_high_pass(0)
            .with_coverage(0.5, 3)
            .with_fill_holes();
        TexturePipeline::new(options).process(&image, &mut sink).unwrap();

        // Wavelet delivery order: coarsest first.
        let levels: Vec<u32> = sink.mips().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_high_pass_rejects_non_square() {
        let image = solid_image(8, 4, [0, 0, 0, 255]);
        let mut sink = MemorySink::new();
        let err = TexturePipeline::new(PipelineOptions::default().with_high_pass(0))
            .process(&image, &mut sink);
        assert!(matches!(err, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_high_pass_rejects_non_pow2() {
        let image = solid_image(12, 12, [0, 0, 0, 255]);
        let mut sink = MemorySink::new();
        let err = TexturePipeline::new(PipelineOptions::default().with_high_pass(0))
            .process(&image, &mut sink);
        assert!(matches!(err, Err(PipelineError::NotPow2(12))));
    }

    #[test]
    fn test_coverage_path_emits_finest_first() {
        let image = solid_image(8, 8, [0, 0, 0, 255]);
        let mut sink = MemorySink::new();
        let options = PipelineOptions::default().with_coverage(0.5, 3);
        TexturePipeline::new(options).process(&image, &mut sink).unwrap();

        let levels: Vec<u32> = sink.mips().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_coverage_rejects_bad_threshold() {
        let image = solid_image(4, 4, [0, 0, 0, 255]);
        let mut sink = MemorySink::new();
        let options = PipelineOptions::default().with_coverage(1.5, 3);
        let err = TexturePipeline::new(options).process(&image, &mut sink);
        assert!(matches!(err, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_roughness_path_raises_alpha_on_bumpy_normals() {
        let image = solid_image(4, 4, [100, 100, 100, 0]);
        // Normal map with strongly divergent slopes.
        let mut normal = RgbaImage::new(4, 4);
        for (x, _y, px) in normal.enumerate_pixels_mut() {
            *px = if x % 2 == 0 {
                Rgba([255, 128, 128, 255])
            } else {
                Rgba([0, 128, 128, 255])
            };
        }

        let mut sink = MemorySink::new();
        let options = PipelineOptions::default().with_roughness_from_normal(normal);
        TexturePipeline::new(options).process(&image, &mut sink).unwrap();

        // Level 0 passes through untouched; deeper levels absorb variance.
        assert_eq!(sink.mip(0).unwrap().data[3], 0);
        let mip1 = sink.mip(1).unwrap();
        assert!(mip1.data[3] > 128, "alpha {} should jump", mip1.data[3]);
    }

    #[test]
    fn test_rgbm_emits_single_level() {
        let image = solid_image(8, 8, [255, 128, 0, 255]);
        let mut sink = MemorySink::new();
        let options = PipelineOptions::default().with_rgbm().with_range_scale();
        TexturePipeline::new(options).process(&image, &mut sink).unwrap();

        assert_eq!(sink.mips().len(), 1);
        // Multiplier ends up in alpha.
        assert_eq!(sink.mips()[0].data[3], 255);
    }

    #[test]
    fn test_fill_holes_bleeds_color_into_transparent_texels() {
        let mut image = RgbaImage::new(4, 4);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let mut sink = MemorySink::new();
        let options = PipelineOptions::default().with_fill_holes().without_mipmaps();
        TexturePipeline::new(options).process(&image, &mut sink).unwrap();

        let level0 = &sink.mips()[0].data;
        // The far corner picked up the seed colour.
        assert_eq!(level0[(3 * 4 + 3) * 4], 255);
        assert_eq!(level0[(3 * 4 + 3) * 4 + 1], 0);
    }

    #[test]
    fn test_sink_receives_color_map_configuration() {
        let image = solid_image(4, 4, [0, 0, 0, 255]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default().with_wrap_mode(WrapMode::Repeat))
            .process(&image, &mut sink)
            .unwrap();

        assert_eq!(sink.gamma(), Some((2.2, 2.2)));
        assert_eq!(sink.wrap_mode(), WrapMode::Repeat);
        assert!(!sink.is_normal_map());
    }

    #[test]
    fn test_sink_receives_normal_map_configuration() {
        let image = solid_image(4, 4, [128, 128, 255, 255]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default().with_color_mode(ColorMode::Normal))
            .process(&image, &mut sink)
            .unwrap();

        assert_eq!(sink.gamma(), Some((1.0, 1.0)));
        assert!(sink.is_normal_map());
        assert!(sink.normalizes_mipmaps());
    }

    #[test]
    fn test_sink_receives_tonormal_configuration() {
        let image = solid_image(4, 4, [128, 128, 128, 255]);
        let mut sink = MemorySink::new();
        TexturePipeline::new(PipelineOptions::default().with_color_mode(ColorMode::ToNormal))
            .process(&image, &mut sink)
            .unwrap();

        assert!(!sink.is_normal_map());
        assert!(sink.converts_to_normal_map());
        assert!(sink.normalizes_mipmaps());
    }

    #[test]
    fn test_sink_failure_aborts_processing() {
        struct FailingSink;
        impl TextureSink for FailingSink {
            fn set_texture_layout(
                &mut self,
                _: TextureKind,
                _: u32,
                _: u32,
                _: u32,
                _: u32,
            ) -> Result<(), PipelineError> {
                Ok(())
            }
            fn set_mipmap_data(
                &mut self,
                _: &[u8],
                _: u32,
                _: u32,
                _: u32,
                _: u32,
                _: u32,
            ) -> Result<(), PipelineError> {
                Err(PipelineError::Compressor("backend rejected level".into()))
            }
            fn finish(&mut self) -> Result<(), PipelineError> {
                Ok(())
            }
        }

        let image = solid_image(4, 4, [0, 0, 0, 255]);
        let err = TexturePipeline::new(PipelineOptions::default())
            .process(&image, &mut FailingSink);
        assert!(matches!(err, Err(PipelineError::Compressor(_))));
    }
}
