//! Hole filling for transparent regions.
//!
//! Alpha-masked texels get plausible colour before mipping: first a Voronoi
//! fill copies each hole texel from its nearest opaque texel, then a few
//! masked blur passes soften the resulting cell borders. Without this, box
//! filtering drags the (usually black) colour of transparent texels into
//! the visible mip texels along cutout edges.

use tracing::debug;

use crate::surface::Surface;

/// Alpha at or above this marks a texel as a colour source.
const OPAQUE_THRESHOLD: f32 = 0.5;

/// Blur passes applied after the Voronoi fill.
pub const DEFAULT_BLUR_PASSES: usize = 8;

/// Fill transparent texels from their nearest opaque neighbours, then run
/// `blur_passes` masked blurs. A surface with no opaque texels (or no
/// transparent ones) is returned unchanged.
pub fn fill_holes(surface: &mut Surface, blur_passes: usize) {
    let mask = opaque_mask(surface);
    let holes = mask.iter().filter(|&&m| !m).count();
    if holes == 0 || holes == mask.len() {
        return;
    }
    debug!(
        holes,
        total = mask.len(),
        "filling transparent texels before mipping"
    );

    voronoi_fill(surface, &mask);
    for _ in 0..blur_passes {
        blur_pass(surface, &mask);
    }
}

fn opaque_mask(surface: &Surface) -> Vec<bool> {
    surface
        .channel(3)
        .iter()
        .map(|&a| a >= OPAQUE_THRESHOLD)
        .collect()
}

/// Two-pass chamfer propagation of the nearest opaque texel. Each pass
/// inherits candidate seeds from already-visited neighbours and keeps the
/// one with the smallest true squared distance.
fn voronoi_fill(surface: &mut Surface, mask: &[bool]) {
    let w = surface.width();
    let h = surface.height();
    const UNSET: usize = usize::MAX;

    let mut seed = vec![UNSET; w * h];
    for (i, &opaque) in mask.iter().enumerate() {
        if opaque {
            seed[i] = i;
        }
    }

    let dist2 = |i: usize, s: usize| -> u64 {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        let (sx, sy) = ((s % w) as i64, (s / w) as i64);
        ((x - sx) * (x - sx) + (y - sy) * (y - sy)) as u64
    };

    let mut relax = |seed: &mut Vec<usize>, i: usize, neighbours: &[(i64, i64)]| {
        let x = (i % w) as i64;
        let y = (i / w) as i64;
        let mut best = seed[i];
        let mut best_d = if best == UNSET {
            u64::MAX
        } else {
            dist2(i, best)
        };
        for &(dx, dy) in neighbours {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }
            let n = (ny as usize) * w + nx as usize;
            if seed[n] == UNSET {
                continue;
            }
            let d = dist2(i, seed[n]);
            if d < best_d {
                best = seed[n];
                best_d = d;
            }
        }
        seed[i] = best;
    };

    // Forward sweep looks up and left, backward sweep down and right.
    const FORWARD: [(i64, i64); 4] = [(-1, 0), (0, -1), (-1, -1), (1, -1)];
    const BACKWARD: [(i64, i64); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

    for i in 0..w * h {
        relax(&mut seed, i, &FORWARD);
    }
    for i in (0..w * h).rev() {
        relax(&mut seed, i, &BACKWARD);
    }

    for i in 0..w * h {
        if !mask[i] {
            let s = seed[i];
            if s != UNSET {
                for k in 0..3 {
                    let v = surface.channel(k)[s];
                    surface.channel_mut(k)[i] = v;
                }
            }
        }
    }
}

/// One 3x3 average over the hole texels; opaque texels keep their colour.
fn blur_pass(surface: &mut Surface, mask: &[bool]) {
    let w = surface.width();
    let h = surface.height();

    for k in 0..3 {
        let src = surface.channel(k).to_vec();
        let dst = surface.channel_mut(k);
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                if mask[i] {
                    continue;
                }
                let mut sum = 0.0f32;
                let mut count = 0.0f32;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        sum += src[(ny as usize) * w + nx as usize];
                        count += 1.0;
                    }
                }
                dst[i] = sum / count;
            }
        }
    }
}
