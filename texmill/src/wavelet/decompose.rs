//! Forward Haar-like decomposition.

use tracing::debug;

use super::pyramid::{
    detail_pyramid_len, detail_step_offset, saturate, sum_level_offset, sum_pyramid_len,
    LevelStats, WaveletPyramid, MAX_LEVELS,
};
use crate::error::PipelineError;
use crate::tile::{load_row, ChannelMode};

impl WaveletPyramid {
    /// Decompose a square power-of-two RGBA8 image into the average and
    /// detail pyramids.
    ///
    /// `pitch` is the byte stride between input rows; pass 0 for tightly
    /// packed. The rows are lifted to floats under `mode` directly into the
    /// finest slab of the average pyramid, then transformed level by level:
    ///
    /// ```text
    /// sa  = (a+b)/2      db  = a-b
    /// sc  = (c+d)/2      dd  = c-d
    /// sac = (sa+sc)/2    dac = sa-sc
    /// sbd = (db+dd)/2    dbd = db-dd
    /// ```
    ///
    /// `sac` becomes the coarser average; `(dac, sbd, dbd)` are the detail
    /// bands. All four channels use the same formula, so alpha rides through
    /// the pyramid unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotPow2`] when `width` is not a positive
    /// power of two.
    pub fn decompose(
        rgba: &[u8],
        width: u32,
        pitch: usize,
        mode: ChannelMode,
    ) -> Result<Self, PipelineError> {
        if width == 0 || !width.is_power_of_two() {
            return Err(PipelineError::NotPow2(width));
        }

        let w = width as usize;
        let levels = width.trailing_zeros() as usize;
        debug_assert!(levels < MAX_LEVELS);
        let pitch = if pitch == 0 { 4 * w } else { pitch };

        let mut sums = vec![0.0f32; sum_pyramid_len(levels)];
        for y in 0..w {
            let src = &rgba[y * pitch..y * pitch + 4 * w];
            load_row(src, mode, &mut sums[y * 4 * w..(y + 1) * 4 * w]);
        }

        let details = vec![0.0f32; detail_pyramid_len(levels)];
        let gray = vec![0u8; w * w];
        let mut pyramid = Self {
            width: w,
            levels,
            mode,
            sums,
            details,
            gray,
            stats: [LevelStats::default(); MAX_LEVELS],
            recon: None,
        };

        for e in (1..=levels).rev() {
            pyramid.decompose_level(e);
        }
        pyramid.normalize_top();

        debug!(width = w, levels, "wavelet decomposition complete");
        Ok(pyramid)
    }

    /// Collapse the `2^e` level into the `2^(e-1)` level, recording detail
    /// bands, the gray diagnostic plane and per-level statistics.
    fn decompose_level(&mut self, e: usize) {
        let win = 1usize << e;
        let half = win / 2;
        let in_off = sum_level_offset(self.levels, e);
        let out_off = sum_level_offset(self.levels, e - 1);
        let d_off = detail_step_offset(self.levels, e);

        // The coarser slab sits after the finer one, so a single split
        // yields the read and write views without aliasing.
        let (head, tail) = self.sums.split_at_mut(out_off);
        let input = &head[in_off..in_off + 4 * win * win];
        let output = &mut tail[..4 * half * half];
        let det = &mut self.details[d_off..d_off + 12 * half * half];
        let gray = &mut self.gray[..4 * half * half];
        let stat = &mut self.stats[e];

        for j in 0..half {
            for i in 0..half {
                let block = j * half + i;
                let p00 = ((2 * j) * win + 2 * i) * 4;
                let p01 = ((2 * j + 1) * win + 2 * i) * 4;

                for c in 0..4 {
                    let a = input[p00 + c];
                    let b = input[p00 + 4 + c];
                    let cc = input[p01 + c];
                    let d = input[p01 + 4 + c];

                    let sa = (a + b) / 2.0;
                    let db = a - b;
                    let sc = (cc + d) / 2.0;
                    let dd = cc - d;

                    let sac = (sa + sc) / 2.0;
                    let dac = sa - sc;
                    let sbd = (db + dd) / 2.0;
                    let dbd = db - dd;

                    output[block * 4 + c] = sac;
                    let di = block * 12 + c * 3;
                    det[di] = dac;
                    det[di + 1] = sbd;
                    det[di + 2] = dbd;

                    let v = dac.abs() + sbd.abs() + dbd.abs();
                    gray[block * 4 + c] = (saturate(v) * 255.0 + 0.5) as u8;
                    stat.mean_abs[c] += v;
                    stat.rms[c] += v * v;
                }

                gray[block * 4 + 3] = 255;
            }
        }

        let n = (3 * win * win / 4) as f32;
        for c in 0..4 {
            stat.mean_abs[c] /= n;
            stat.rms[c] = (stat.rms[c] / n).sqrt();
        }
    }

    /// Align the topmost 1x1 average with what the mip emitter will store.
    ///
    /// Normal maps get a flat +x surface; colour gets each channel rounded
    /// through 8 bits so the stored top level round-trips exactly.
    fn normalize_top(&mut self) {
        let top = self.sums.len() - 4;
        match self.mode {
            ChannelMode::Normal => {
                self.sums[top] = 1.0;
                self.sums[top + 1] = 0.0;
                self.sums[top + 2] = 0.0;
            }
            _ => {
                for c in 0..3 {
                    let q = (self.sums[top + c] * 255.0 + 0.5).floor();
                    self.sums[top + c] = q / 255.0;
                }
            }
        }
    }
}
