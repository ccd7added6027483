//! Scanline loading into linear float tiles.
//!
//! Every pipeline starts from the same primitive: an RGBA8 scanline turned
//! into a row of floats under one of three channel interpretations. The
//! wavelet decomposer loads rows directly into the finest slab of its
//! average pyramid; the surface paths load whole tiles.

/// How the 8-bit channels of an input image are interpreted when lifted to
/// floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Values are already linear; channel = byte / 255.
    Linear,
    /// Colour is sRGB-encoded; R,G,B decoded via gamma 2.2, alpha linear.
    Sgamma,
    /// Signed normal components centred at 127; x,y,z in [-1, 1], alpha
    /// forced to 1.
    Normal,
}

/// Decode gamma used for the `Sgamma` interpretation.
pub const SGAMMA_DECODE: f32 = 2.2;

/// Convert one RGBA8 scanline into floats.
///
/// `src` holds `len` 4-byte RGBA samples; `dst` receives `4 * len` floats.
/// Preconditions (slice lengths) are enforced by the caller.
pub fn load_row(src: &[u8], mode: ChannelMode, dst: &mut [f32]) {
    // True division rather than reciprocal multiplication: byte / 255 must
    // be correctly rounded for the loader round-trip guarantees.
    for (px, out) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        match mode {
            ChannelMode::Linear => {
                out[0] = f32::from(px[0]) / 255.0;
                out[1] = f32::from(px[1]) / 255.0;
                out[2] = f32::from(px[2]) / 255.0;
                out[3] = f32::from(px[3]) / 255.0;
            }
            ChannelMode::Sgamma => {
                out[0] = (f32::from(px[0]) / 255.0).powf(SGAMMA_DECODE);
                out[1] = (f32::from(px[1]) / 255.0).powf(SGAMMA_DECODE);
                out[2] = (f32::from(px[2]) / 255.0).powf(SGAMMA_DECODE);
                out[3] = f32::from(px[3]) / 255.0;
            }
            ChannelMode::Normal => {
                out[0] = f32::from(i16::from(px[0]) - 127) / 127.0;
                out[1] = f32::from(i16::from(px[1]) - 127) / 127.0;
                out[2] = f32::from(i16::from(px[2]) - 127) / 127.0;
                out[3] = 1.0;
            }
        }
    }
}

/// A decoded image as `width * height * 4` floats, row-major RGBA.
///
/// Created by the row loader and handed off to whichever pipeline owns the
/// rest of the processing.
#[derive(Debug, Clone)]
pub struct LinearTile {
    width: usize,
    height: usize,
    mode: ChannelMode,
    data: Vec<f32>,
}

impl LinearTile {
    /// Load a tightly-or-loosely packed RGBA8 buffer.
    ///
    /// `pitch` is the byte stride between rows; pass 0 for tightly packed
    /// (`4 * width`).
    pub fn from_rgba8(
        bytes: &[u8],
        width: usize,
        height: usize,
        pitch: usize,
        mode: ChannelMode,
    ) -> Self {
        let pitch = if pitch == 0 { 4 * width } else { pitch };
        let mut data = vec![0.0f32; width * height * 4];

        for (y, row) in data.chunks_exact_mut(width * 4).enumerate() {
            let src = &bytes[y * pitch..y * pitch + width * 4];
            load_row(src, mode, row);
        }

        Self {
            width,
            height,
            mode,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// The backing floats, row-major, 4 per pixel.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_maps_bytes_exactly() {
        let src: Vec<u8> = (0..=255u8).flat_map(|b| [b, b, b, b]).collect();
        let mut dst = vec![0.0f32; 256 * 4];
        load_row(&src, ChannelMode::Linear, &mut dst);

        for b in 0..=255usize {
            let expect = b as f32 / 255.0;
            assert_eq!(dst[b * 4], expect, "byte {}", b);
            assert_eq!(dst[b * 4 + 3], expect, "alpha byte {}", b);
        }
    }

    #[test]
    fn test_sgamma_decodes_gamma_2_2() {
        let src: Vec<u8> = (0..=255u8).flat_map(|b| [b, 0, 0, b]).collect();
        let mut dst = vec![0.0f32; 256 * 4];
        load_row(&src, ChannelMode::Sgamma, &mut dst);

        for b in 0..=255usize {
            let expect = (b as f32 / 255.0).powf(2.2);
            assert_eq!(dst[b * 4], expect, "byte {}", b);
            // Alpha stays linear.
            assert_eq!(dst[b * 4 + 3], b as f32 / 255.0);
        }
    }

    #[test]
    fn test_normal_centres_at_127() {
        let src = [127u8, 0, 255, 9];
        let mut dst = [0.0f32; 4];
        load_row(&src, ChannelMode::Normal, &mut dst);

        assert_eq!(dst[0], 0.0);
        assert_eq!(dst[1], -1.0);
        assert_eq!(dst[2], 128.0 / 127.0);
        assert_eq!(dst[3], 1.0);
    }

    #[test]
    fn test_tile_honours_pitch() {
        // Two 1-pixel rows with 4 bytes of padding between them.
        let bytes = [10u8, 20, 30, 40, 0, 0, 0, 0, 50, 60, 70, 80, 0, 0, 0, 0];
        let tile = LinearTile::from_rgba8(&bytes, 1, 2, 8, ChannelMode::Linear);

        assert_eq!(tile.data()[0], 10.0 / 255.0);
        assert_eq!(tile.data()[4], 50.0 / 255.0);
    }

    #[test]
    fn test_tile_default_pitch() {
        let bytes = [255u8, 0, 0, 255, 0, 255, 0, 255];
        let tile = LinearTile::from_rgba8(&bytes, 2, 1, 0, ChannelMode::Linear);

        assert_eq!(tile.width(), 2);
        assert_eq!(tile.height(), 1);
        assert_eq!(tile.data()[0], 1.0);
        assert_eq!(tile.data()[5], 1.0);
    }
}
