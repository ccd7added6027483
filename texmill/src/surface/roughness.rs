//! Roughness propagation from a companion normal map.

use super::Surface;
use crate::error::PipelineError;

impl Surface {
    /// Fold the filtered normal map's variance into this surface's alpha
    /// (roughness) channel.
    ///
    /// `normal` is the full-resolution normal map, channels encoding unit
    /// normals as `(v * 2 - 1)`. For each texel of this surface the
    /// corresponding block of normals is averaged; the shortening of the
    /// averaged vector measures slope variance, and the roughness becomes
    /// `sqrt(r^2 + (1 - |n|) / |n|)`, saturated. A flat normal map averages
    /// to unit length and leaves roughness unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the normal map dimensions
    /// are not an integer multiple of this surface's.
    pub fn roughness_mip_from_normal(&mut self, normal: &Surface) -> Result<(), PipelineError> {
        if self.width == 0
            || self.height == 0
            || normal.width % self.width != 0
            || normal.height % self.height != 0
        {
            return Err(PipelineError::InvalidInput(format!(
                "normal map {}x{} does not tile surface {}x{}",
                normal.width, normal.height, self.width, self.height
            )));
        }

        let bx = normal.width / self.width;
        let by = normal.height / self.height;
        let inv = 1.0 / (bx * by) as f32;

        for ty in 0..self.height {
            for tx in 0..self.width {
                let mut nx = 0.0f32;
                let mut ny = 0.0f32;
                let mut nz = 0.0f32;
                for sy in 0..by {
                    for sx in 0..bx {
                        let i = (ty * by + sy) * normal.width + tx * bx + sx;
                        nx += normal.channels[0][i] * 2.0 - 1.0;
                        ny += normal.channels[1][i] * 2.0 - 1.0;
                        nz += normal.channels[2][i] * 2.0 - 1.0;
                    }
                }
                nx *= inv;
                ny *= inv;
                nz *= inv;

                // Packed normals quantize to slightly over unit length, so
                // the variance needs a floor at zero.
                let len = (nx * nx + ny * ny + nz * nz).sqrt().max(1e-4);
                let variance = ((1.0 - len) / len).max(0.0);

                let t = ty * self.width + tx;
                let r = self.channels[3][t];
                self.channels[3][t] = (r * r + variance).sqrt().clamp(0.0, 1.0);
            }
        }
        Ok(())
    }
}
