//! Downsampling kernels for the non-wavelet mip paths.

/// Mipmap filter selection for box-chain pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipFilter {
    /// 2x2 average.
    #[default]
    Box,
    /// 4-tap tent.
    Triangle,
    /// 6-tap Kaiser-windowed sinc (width 3, alpha 4).
    Kaiser,
}

impl MipFilter {
    /// Symmetric tap weights for a 2x downsample, normalized to sum 1.
    /// Tap `j` reads input index `2*out + j - (taps/2 - 1)`, clamped.
    pub(crate) fn taps(self) -> Vec<f32> {
        match self {
            MipFilter::Box => vec![0.5, 0.5],
            MipFilter::Triangle => vec![1.0 / 8.0, 3.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0],
            MipFilter::Kaiser => kaiser_taps(3.0, 4.0),
        }
    }
}

/// Kaiser-windowed sinc sampled for a 2x downsample: offsets +-0.5, +-1.5,
/// +-2.5 from the output centre, argument halved by the scale.
fn kaiser_taps(width: f32, alpha: f32) -> Vec<f32> {
    let n = 2 * width as usize;
    let mut taps = Vec::with_capacity(n);
    let mut sum = 0.0f32;

    for j in 0..n {
        let x = (j as f32 + 0.5) - width;
        let t = x / 2.0;
        let w = sinc(t) * kaiser_window(t / width, alpha);
        taps.push(w);
        sum += w;
    }
    for w in &mut taps {
        *w /= sum;
    }
    taps
}

fn sinc(x: f32) -> f32 {
    let t = std::f32::consts::PI * x;
    if t.abs() < 1e-6 {
        1.0
    } else {
        t.sin() / t
    }
}

fn kaiser_window(u: f32, alpha: f32) -> f32 {
    bessel_i0(alpha * (1.0 - u * u).max(0.0).sqrt()) / bessel_i0(alpha)
}

/// Modified Bessel function of the first kind, order zero, by power series.
fn bessel_i0(x: f32) -> f32 {
    let half = f64::from(x) / 2.0;
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let mut k = 1.0f64;
    loop {
        term *= (half / k) * (half / k);
        sum += term;
        if term < 1e-12 * sum {
            return sum as f32;
        }
        k += 1.0;
    }
}

/// Separable 2x downsample of one float plane with clamp addressing.
pub(crate) fn downsample_2x_plane(
    src: &[f32],
    w: usize,
    h: usize,
    taps: &[f32],
    dst: &mut [f32],
) {
    let nw = (w / 2).max(1);
    let nh = (h / 2).max(1);
    let half = taps.len() / 2;

    // Horizontal pass into a nw x h scratch plane.
    let mut tmp = vec![0.0f32; nw * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for ox in 0..nw {
            let mut acc = 0.0;
            for (j, tap) in taps.iter().enumerate() {
                let ix = (2 * ox + j).saturating_sub(half - 1).min(w - 1);
                acc += tap * row[ix];
            }
            tmp[y * nw + ox] = acc;
        }
    }

    // Vertical pass into the destination.
    for oy in 0..nh {
        for ox in 0..nw {
            let mut acc = 0.0;
            for (j, tap) in taps.iter().enumerate() {
                let iy = (2 * oy + j).saturating_sub(half - 1).min(h - 1);
                acc += tap * tmp[iy * nw + ox];
            }
            dst[oy * nw + ox] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_sum_to_one() {
        for filter in [MipFilter::Box, MipFilter::Triangle, MipFilter::Kaiser] {
            let sum: f32 = filter.taps().iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "{:?} sums to {}", filter, sum);
        }
    }

    #[test]
    fn test_taps_are_symmetric() {
        for filter in [MipFilter::Box, MipFilter::Triangle, MipFilter::Kaiser] {
            let taps = filter.taps();
            for j in 0..taps.len() / 2 {
                let mirror = taps[taps.len() - 1 - j];
                assert!((taps[j] - mirror).abs() < 1e-6, "{:?} tap {}", filter, j);
            }
        }
    }

    #[test]
    fn test_kaiser_has_negative_lobes() {
        let taps = MipFilter::Kaiser.taps();
        assert_eq!(taps.len(), 6);
        assert!(taps[0] < 0.0);
        assert!(taps[5] < 0.0);
        assert!(taps[2] > 0.4);
    }

    #[test]
    fn test_box_downsample_averages_quads() {
        let src = [0.0, 0.4, 0.8, 1.0, //
                   0.2, 0.6, 0.9, 0.7, //
                   0.0, 0.0, 1.0, 1.0, //
                   0.0, 0.0, 1.0, 1.0];
        let mut dst = [0.0f32; 4];
        downsample_2x_plane(&src, 4, 4, &MipFilter::Box.taps(), &mut dst);

        assert!((dst[0] - 0.3).abs() < 1e-6);
        assert!((dst[1] - 0.85).abs() < 1e-6);
        assert!((dst[2] - 0.0).abs() < 1e-6);
        assert!((dst[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_plane_survives_every_filter() {
        let src = vec![0.37f32; 8 * 8];
        for filter in [MipFilter::Box, MipFilter::Triangle, MipFilter::Kaiser] {
            let mut dst = vec![0.0f32; 4 * 4];
            downsample_2x_plane(&src, 8, 8, &filter.taps(), &mut dst);
            for v in &dst {
                assert!((v - 0.37).abs() < 1e-5, "{:?} produced {}", filter, v);
            }
        }
    }

    #[test]
    fn test_single_column_downsample() {
        let src = vec![1.0f32, 0.0, 1.0, 0.0];
        let mut dst = vec![0.0f32; 2];
        downsample_2x_plane(&src, 1, 4, &MipFilter::Box.taps(), &mut dst);
        assert!((dst[0] - 0.5).abs() < 1e-6);
        assert!((dst[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bessel_i0_reference_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-6);
        // I0(1) = 1.26607, I0(4) = 11.30192 (Abramowitz & Stegun).
        assert!((bessel_i0(1.0) - 1.26607).abs() < 1e-4);
        assert!((bessel_i0(4.0) - 11.30192).abs() < 1e-3);
    }
}
