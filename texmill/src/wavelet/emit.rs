//! Quantized RGBA8 mip emission.

use tracing::debug;

use super::pyramid::{saturate, sum_level_offset, WaveletPyramid};
use crate::error::PipelineError;
use crate::sink::TextureSink;

/// Encode gamma applied on the way out of the sRGB and YCoCg paths.
const SGAMMA_ENCODE: f32 = 1.0 / 2.2;

/// Chroma handling at mip emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvMode {
    /// Keep RGB.
    #[default]
    Off,
    /// Project to YCoCg with dithered luma.
    YCoCg,
    /// Project to YCoCg and pin luma to mid-gray, isolating chroma.
    YCoCgGray,
}

/// Pixel treatment for emitted mips. `tonormal` wins over the colour flags;
/// `tosrgb` and `yuv` may combine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    /// Re-encode R,G,B through gamma 1/2.2.
    pub tosrgb: bool,
    /// Repack (x, y) slopes as a unit normal.
    pub tonormal: bool,
    /// Chroma projection.
    pub yuv: YuvMode,
}

impl WaveletPyramid {
    /// Quantize every level of the average pyramid to RGBA8 and deliver it
    /// to the sink, **coarsest level first** (the topmost mip carries the
    /// highest level index; downstream container layout depends on this
    /// order).
    ///
    /// # Errors
    ///
    /// Propagates sink failures unchanged.
    pub fn emit_mips(
        &self,
        sink: &mut dyn TextureSink,
        opts: &EmitOptions,
    ) -> Result<(), PipelineError> {
        for e in 0..=self.levels {
            let level = (self.levels - e) as u32;
            let wlev = 1usize << e;
            let off = sum_level_offset(self.levels, e);
            let src = &self.sums[off..off + 4 * wlev * wlev];

            let mut bytes = vec![0u8; 4 * wlev * wlev];
            quantize_level(src, opts, &mut bytes);

            debug!(level, size = wlev, "emitting wavelet mip");
            sink.set_mipmap_data(&bytes, wlev as u32, wlev as u32, 1, 0, level)?;
        }
        Ok(())
    }
}

/// Quantize one level's RGBA floats to bytes under the emit options.
/// Alpha is written as 255 unconditionally in all paths.
fn quantize_level(src: &[f32], opts: &EmitOptions, out: &mut [u8]) {
    for (pi, (ps, pw)) in src
        .chunks_exact(4)
        .zip(out.chunks_exact_mut(4))
        .enumerate()
    {
        let mut fvec = [0.0f32; 3];

        if opts.tonormal {
            let nx = ps[1];
            let ny = ps[2];
            let blue2 = 1.0 - (nx * nx + ny * ny);
            let nz = if blue2 > 0.0 { blue2.sqrt() } else { 0.0 };
            fvec[0] = saturate((nz + 1.0) * 0.5);
            fvec[1] = saturate((nx + 1.0) * 0.5);
            fvec[2] = saturate((ny + 1.0) * 0.5);
        } else if opts.tosrgb || opts.yuv != YuvMode::Off {
            fvec[0] = saturate(ps[0]).powf(SGAMMA_ENCODE);
            fvec[1] = saturate(ps[1]).powf(SGAMMA_ENCODE);
            fvec[2] = saturate(ps[2]).powf(SGAMMA_ENCODE);

            match opts.yuv {
                YuvMode::Off => {}
                YuvMode::YCoCg => {
                    rgb_to_ycocg(&mut fvec);
                    fvec[0] += (0.5 / 63.0) * dither_noise((pi * 4) as i32);
                }
                YuvMode::YCoCgGray => {
                    rgb_to_ycocg(&mut fvec);
                    fvec[0] = 0.5;
                }
            }
        } else {
            fvec[0] = saturate(ps[0]);
            fvec[1] = saturate(ps[1]);
            fvec[2] = saturate(ps[2]);
        }

        pw[0] = (0.5 + 255.0 * fvec[0]) as u8;
        pw[1] = (0.5 + 255.0 * fvec[1]) as u8;
        pw[2] = (0.5 + 255.0 * fvec[2]) as u8;
        pw[3] = 255;
    }
}

/// Project gamma-encoded RGB onto the YCoCg basis, chroma biased to
/// mid-range so neutral colours land on 128.
fn rgb_to_ycocg(v: &mut [f32; 3]) {
    let (r, g, b) = (v[0], v[1], v[2]);
    v[0] = (r + 2.0 * g + b) * 0.25;
    v[1] = (r - b) * 0.5 + 0.5;
    v[2] = (-r + 2.0 * g - b) * 0.5 + 0.5;
}

/// Deterministic dither sequence over the pixel's float index: an integer
/// hash mapped to [-1, 1]. Identical invocations produce identical bytes.
fn dither_noise(k: i32) -> f32 {
    const K: i32 = 2047483673;
    const IRANGE: f32 = 1.0 / 2147483648.0;
    let p = K.wrapping_mul(k).wrapping_add(1).wrapping_mul(k);
    p as f32 * IRANGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::tile::ChannelMode;

    fn emit(bytes: &[u8], w: u32, mode: ChannelMode, skip: i32, opts: EmitOptions) -> MemorySink {
        let mut pyr = WaveletPyramid::decompose(bytes, w, 0, mode).unwrap();
        pyr.reconstruct(skip);
        let mut sink = MemorySink::new();
        pyr.emit_mips(&mut sink, &opts).unwrap();
        sink
    }

    #[test]
    fn test_levels_arrive_coarsest_first() {
        let bytes = [128u8; 4 * 4 * 4];
        let sink = emit(&bytes, 4, ChannelMode::Linear, 0, EmitOptions::default());

        let dims: Vec<(u32, u32)> = sink.mips().iter().map(|m| (m.level, m.width)).collect();
        assert_eq!(dims, vec![(2, 1), (1, 2), (0, 4)]);
    }

    #[test]
    fn test_solid_red_survives_every_path_stage() {
        let bytes: Vec<u8> = [255u8, 0, 0, 255].repeat(64);
        let sink = emit(
            &bytes,
            8,
            ChannelMode::Sgamma,
            0,
            EmitOptions {
                tosrgb: true,
                ..Default::default()
            },
        );

        for mip in sink.mips() {
            for px in mip.data.chunks_exact(4) {
                assert_eq!(px, [255, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn test_alpha_emitted_as_opaque() {
        let bytes: Vec<u8> = [10u8, 20, 30, 77].repeat(16);
        let sink = emit(&bytes, 4, ChannelMode::Linear, 0, EmitOptions::default());

        for mip in sink.mips() {
            for px in mip.data.chunks_exact(4) {
                assert_eq!(px[3], 255);
            }
        }
    }

    #[test]
    fn test_ycocg_neutral_chroma_is_128() {
        let bytes: Vec<u8> = [128u8, 128, 128, 255].repeat(256);
        let sink = emit(
            &bytes,
            16,
            ChannelMode::Sgamma,
            0,
            EmitOptions {
                tosrgb: true,
                yuv: YuvMode::YCoCg,
                ..Default::default()
            },
        );

        for mip in sink.mips() {
            for px in mip.data.chunks_exact(4) {
                assert_eq!(px[1], 128, "Co must be neutral");
                assert_eq!(px[2], 128, "Cg must be neutral");
                // Luma carries the bounded dither.
                assert!(px[0] >= 125 && px[0] <= 131, "Y = {}", px[0]);
            }
        }
    }

    #[test]
    fn test_ycocg_dither_is_deterministic() {
        let bytes: Vec<u8> = (0..16 * 16 * 4).map(|i| (i % 251) as u8).collect();
        let opts = EmitOptions {
            tosrgb: true,
            yuv: YuvMode::YCoCg,
            ..Default::default()
        };
        let a = emit(&bytes, 16, ChannelMode::Sgamma, 0, opts);
        let b = emit(&bytes, 16, ChannelMode::Sgamma, 0, opts);

        assert_eq!(a.mips().len(), b.mips().len());
        for (ma, mb) in a.mips().iter().zip(b.mips()) {
            assert_eq!(ma.data, mb.data, "level {} must be byte-identical", ma.level);
        }
    }

    #[test]
    fn test_ycocg_gray_pins_luma() {
        let bytes: Vec<u8> = (0..8 * 8 * 4).map(|i| (i % 256) as u8).collect();
        let sink = emit(
            &bytes,
            8,
            ChannelMode::Sgamma,
            0,
            EmitOptions {
                tosrgb: true,
                yuv: YuvMode::YCoCgGray,
                ..Default::default()
            },
        );

        for mip in sink.mips() {
            for px in mip.data.chunks_exact(4) {
                assert_eq!(px[0], 128);
            }
        }
    }

    #[test]
    fn test_normal_repack_top_level_is_flat_plus_x() {
        // The decomposer forces the top average of a normal map to (1, 0, 0),
        // which repacks to (255, 128, 128, 255).
        let bytes: Vec<u8> = [127u8, 127, 255, 255].repeat(16);
        let sink = emit(
            &bytes,
            4,
            ChannelMode::Normal,
            0,
            EmitOptions {
                tonormal: true,
                ..Default::default()
            },
        );

        let top = &sink.mips()[0];
        assert_eq!(top.level, 2);
        assert_eq!(&top.data[..], [255, 128, 128, 255]);
    }

    #[test]
    fn test_normal_repack_emits_unit_normals() {
        // Constant tilted normal: nx = ny = some moderate slope.
        let bytes: Vec<u8> = [127u8, 157, 247, 255].repeat(64);
        let sink = emit(
            &bytes,
            8,
            ChannelMode::Normal,
            2,
            EmitOptions {
                tonormal: true,
                ..Default::default()
            },
        );

        for mip in sink.mips() {
            if mip.level as usize == 3 {
                continue; // top level is pinned flat
            }
            for px in mip.data.chunks_exact(4) {
                let nz = f32::from(px[0]) / 127.5 - 1.0;
                let nx = f32::from(px[1]) / 127.5 - 1.0;
                let ny = f32::from(px[2]) / 127.5 - 1.0;
                let len = (nx * nx + ny * ny + nz * nz).sqrt();
                assert!((len - 1.0).abs() < 2.0 / 127.0, "|n| = {}", len);
            }
        }
    }

    #[test]
    fn test_dither_noise_range_and_determinism() {
        for k in (0..4096).step_by(4) {
            let n = dither_noise(k);
            assert!((-1.0..=1.0).contains(&n));
            assert_eq!(n, dither_noise(k));
        }
    }
}
