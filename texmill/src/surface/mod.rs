//! Planar float surface for the box-chain mip pipelines.
//!
//! A [`Surface`] stores one `f32` plane per RGBA channel, the shape the
//! coverage and roughness paths want: channel-wise thresholding, scaling and
//! filtering without interleaved strides. Images enter as linear byte/255
//! values; gamma, RGBM and tone mapping are explicit operations.

mod filter;
mod roughness;

pub use filter::MipFilter;

use image::RgbaImage;

use crate::error::PipelineError;

/// An RGBA image as four owned float planes.
#[derive(Debug, Clone)]
pub struct Surface {
    width: usize,
    height: usize,
    channels: [Vec<f32>; 4],
}

impl Surface {
    /// Build a surface from tightly packed RGBA8 bytes, channels mapped to
    /// byte/255.
    pub fn from_rgba8(bytes: &[u8], width: usize, height: usize) -> Self {
        let n = width * height;
        let mut channels = [
            vec![0.0f32; n],
            vec![0.0f32; n],
            vec![0.0f32; n],
            vec![0.0f32; n],
        ];
        for (i, px) in bytes.chunks_exact(4).take(n).enumerate() {
            for c in 0..4 {
                channels[c][i] = f32::from(px[c]) / 255.0;
            }
        }
        Self {
            width,
            height,
            channels,
        }
    }

    /// Build a surface from a decoded [`RgbaImage`].
    pub fn from_image(image: &RgbaImage) -> Self {
        Self::from_rgba8(
            image.as_raw(),
            image.width() as usize,
            image.height() as usize,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// One channel plane (0 = R, 1 = G, 2 = B, 3 = A), row-major.
    pub fn channel(&self, k: usize) -> &[f32] {
        &self.channels[k]
    }

    pub fn channel_mut(&mut self, k: usize) -> &mut [f32] {
        &mut self.channels[k]
    }

    /// Quantize to tightly packed RGBA8, clamping each channel.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let n = self.width * self.height;
        let mut out = vec![0u8; n * 4];
        for i in 0..n {
            for c in 0..4 {
                out[i * 4 + c] = (self.channels[c][i].clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            }
        }
        out
    }

    /// Replace the surface with its next mip under the given filter.
    ///
    /// Returns `false` (leaving the surface untouched) once at 1x1.
    pub fn build_next_mipmap(&mut self, filter: MipFilter) -> bool {
        if self.width <= 1 && self.height <= 1 {
            return false;
        }
        let taps = filter.taps();
        let nw = (self.width / 2).max(1);
        let nh = (self.height / 2).max(1);

        for plane in &mut self.channels {
            let mut next = vec![0.0f32; nw * nh];
            filter::downsample_2x_plane(plane, self.width, self.height, &taps, &mut next);
            *plane = next;
        }
        self.width = nw;
        self.height = nh;
        true
    }

    /// Fraction of texels whose channel `k` meets `threshold`.
    pub fn alpha_test_coverage(&self, threshold: f32, k: usize) -> f32 {
        let n = self.channels[k].len();
        let passing = self.channels[k].iter().filter(|&&v| v >= threshold).count();
        passing as f32 / n as f32
    }

    /// Scale channel `k` so its coverage at `threshold` matches `target`.
    ///
    /// The texel count crossing the threshold is monotone in the scale, so a
    /// plain bisection over the scalar converges. The upper bracket is
    /// applied: it is the smallest scale whose coverage meets the target,
    /// while the midpoint can land a hair below the crossing and drop whole
    /// texel groups. The channel is scaled and saturated to [0, 1].
    pub fn scale_alpha_to_coverage(&mut self, target: f32, threshold: f32, k: usize) {
        let mut lo = 0.0f32;
        let mut hi = 8.0f32;
        for _ in 0..32 {
            let mid = 0.5 * (lo + hi);
            let coverage = {
                let n = self.channels[k].len();
                let passing = self.channels[k]
                    .iter()
                    .filter(|&&v| v * mid >= threshold)
                    .count();
                passing as f32 / n as f32
            };
            if coverage < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        for v in &mut self.channels[k] {
            *v = (*v * hi).clamp(0.0, 1.0);
        }
    }

    /// Affine remap of channel `k`: `v = v * scale + bias`.
    pub fn scale_bias(&mut self, k: usize, scale: f32, bias: f32) {
        for v in &mut self.channels[k] {
            *v = *v * scale + bias;
        }
    }

    /// Clamp channel `k` to [0, 1].
    pub fn clamp(&mut self, k: usize) {
        for v in &mut self.channels[k] {
            *v = v.clamp(0.0, 1.0);
        }
    }

    /// Gamma-encode the colour channels: `v = v^(1/gamma)` on clamped input.
    pub fn to_gamma(&mut self, gamma: f32) {
        let inv = 1.0 / gamma;
        for plane in &mut self.channels[..3] {
            for v in plane {
                *v = v.clamp(0.0, 1.0).powf(inv);
            }
        }
    }

    /// Linear tone map: colours outside [0, 1] are scaled down uniformly per
    /// pixel, clamping brightness without changing hue.
    pub fn tone_map_linear(&mut self) {
        for i in 0..self.width * self.height {
            let m = self.channels[0][i]
                .max(self.channels[1][i])
                .max(self.channels[2][i]);
            if m > 1.0 {
                for plane in &mut self.channels[..3] {
                    plane[i] /= m;
                }
            }
        }
    }

    /// Minimum and maximum value of channel `k`.
    pub fn range(&self, k: usize) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &self.channels[k] {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    /// Encode colour as RGB times a shared multiplier stored in alpha.
    ///
    /// `m = clamp(max(r, g, b), threshold, range)`; colour divides by `m`
    /// and alpha holds `(m - threshold) / (range - threshold)`.
    pub fn to_rgbm(&mut self, range: f32, threshold: f32) {
        for i in 0..self.width * self.height {
            let m = self.channels[0][i]
                .max(self.channels[1][i])
                .max(self.channels[2][i])
                .clamp(threshold, range);
            for plane in &mut self.channels[..3] {
                plane[i] = (plane[i] / m).clamp(0.0, 1.0);
            }
            self.channels[3][i] = (m - threshold) / (range - threshold);
        }
    }

    /// Premultiply colour by alpha.
    pub fn premultiply_alpha(&mut self) {
        for i in 0..self.width * self.height {
            let a = self.channels[3][i];
            for plane in &mut self.channels[..3] {
                plane[i] *= a;
            }
        }
    }

    /// Scale the colour channels into [0, 1] from their measured range.
    ///
    /// The divisor is the largest channel maximum, capped at `max_range`;
    /// afterwards brightness is tone-mapped down and alpha clamped. Used
    /// ahead of RGBM encoding.
    pub fn range_scale(&mut self, max_range: f32) {
        let mut color_range = 0.0f32;
        for k in 0..3 {
            let (_, max) = self.range(k);
            color_range = color_range.max(max);
        }
        if color_range > max_range {
            color_range = max_range;
        }
        if color_range > 0.0 {
            for k in 0..3 {
                self.scale_bias(k, 1.0 / color_range, 0.0);
            }
        }
        self.tone_map_linear();
        self.clamp(3);
    }
}

/// Validate a coverage threshold/channel pair from the driver.
pub fn validate_coverage_pair(threshold: f32, channel: usize) -> Result<(), PipelineError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PipelineError::InvalidInput(format!(
            "coverage threshold {} outside [0, 1]",
            threshold
        )));
    }
    if channel > 3 {
        return Err(PipelineError::InvalidInput(format!(
            "coverage channel {} outside 0..=3",
            channel
        )));
    }
    Ok(())
}
