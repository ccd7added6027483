//! Band-pass reconstruction from the stored pyramids.

use tracing::debug;

use super::pyramid::{detail_step_offset, sum_level_offset, WaveletPyramid};

impl WaveletPyramid {
    /// Re-compose every mip level from the top average plus detail bands.
    ///
    /// `skip` is the detail floor: it shifts the level at which the detail
    /// coefficient reaches unity. While composing the level of size `2^t`,
    /// the step from size `2^i` applies
    ///
    /// ```text
    /// cf = if i < levsup { 2^(i - levsup) } else { 1 },
    /// levsup = levels - 1 - t - skip
    /// ```
    ///
    /// so the highest-frequency bands fade out of coarser mips while finer
    /// mips keep them in full. `skip = levels` makes `cf` always 1 and the
    /// finest reconstruction equals the loaded tile.
    ///
    /// Each composed level is copied back into the average pyramid, so the
    /// next level builds on the most recent result and the mip emitter reads
    /// the band-passed values.
    pub fn reconstruct(&mut self, skip: i32) {
        let mut recon = vec![0.0f32; self.sums.len()];
        for t in 0..=self.levels {
            self.reconstruct_level(t, skip, &mut recon);
        }
        debug!(skip, levels = self.levels, "band-pass reconstruction complete");
        self.recon = Some(recon);
    }

    /// Compose the level of size `2^t` from the top down.
    fn reconstruct_level(&mut self, t: usize, skip: i32, recon: &mut [f32]) {
        let levels = self.levels;

        // Seed the coarsest slab with the stored top average.
        let top = recon.len() - 4;
        recon[top..].copy_from_slice(&self.sums[top..]);

        let levsup = levels as i32 - 1 - t as i32 - skip;
        for i in 0..t {
            let cf = if (i as i32) < levsup {
                (2.0f32).powi(i as i32 - levsup)
            } else {
                1.0
            };
            compose_level(recon, levels, i, &self.details, cf);
        }

        // Copy the finished level back so the next pass (and the emitter)
        // starts from this result.
        let off = sum_level_offset(levels, t);
        let n = 4usize << (2 * t);
        self.sums[off..off + n].copy_from_slice(&recon[off..off + n]);
    }
}

/// Invert one 2x2 block step: compose the `2^(e+1)` level from the `2^e`
/// level and its detail bands, the bands scaled by `cf`.
fn compose_level(recon: &mut [f32], levels: usize, e: usize, details: &[f32], cf: f32) {
    let win = 1usize << e;
    let wout = win * 2;
    let in_off = sum_level_offset(levels, e);
    let out_off = sum_level_offset(levels, e + 1);
    let d_off = detail_step_offset(levels, e + 1);

    // The finer slab precedes the coarser one; one split separates the
    // write view from the read view.
    let (head, tail) = recon.split_at_mut(in_off);
    let input = &tail[..4 * win * win];
    let output = &mut head[out_off..out_off + 4 * wout * wout];
    let det = &details[d_off..d_off + 12 * win * win];

    for j in 0..win {
        for i in 0..win {
            let block = j * win + i;
            for c in 0..4 {
                let sac = input[block * 4 + c];
                let di = block * 12 + c * 3;
                let dac = cf * det[di];
                let sbd = cf * det[di + 1];
                let dbd = cf * det[di + 2];

                let sa = sac + dac / 2.0;
                let sc = sac - dac / 2.0;
                let db = sbd + dbd / 2.0;
                let dd = sbd - dbd / 2.0;

                let p00 = ((2 * j) * wout + 2 * i) * 4 + c;
                let p01 = ((2 * j + 1) * wout + 2 * i) * 4 + c;
                output[p00] = sa + db / 2.0;
                output[p00 + 4] = sa - db / 2.0;
                output[p01] = sc + dd / 2.0;
                output[p01 + 4] = sc - dd / 2.0;
            }
        }
    }
}
