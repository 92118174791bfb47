//! Per-pixel color operations used to build anaglyphs.
//!
//! - [`desaturate`] scales HSL saturation while keeping hue and lightness.
//! - [`ChannelMix`] is a 3×3 percentage matrix, one row per output channel.
//! - [`screen`] is the lightening blend `1 − (1−a)(1−b)`.

use super::raster::ImagingError;
use image::{Rgb, RgbImage};

/// A channel-mixer matrix in percent.
///
/// `rows[out][src]` is the weight of source channel `src` in output channel
/// `out`: `out_c = Σ rows[c][i] · src_i / 100`, clamped to 0–255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMix {
    pub rows: [[u32; 3]; 3],
}

impl ChannelMix {
    /// Keep only red.
    pub const RED: Self = Self::new([[100, 0, 0], [0, 0, 0], [0, 0, 0]]);
    /// Cyan driven entirely by the source green channel.
    pub const CYAN: Self = Self::new([[0, 0, 0], [0, 100, 0], [0, 100, 0]]);
    /// Keep only green.
    pub const GREEN: Self = Self::new([[0, 0, 0], [0, 100, 0], [0, 0, 0]]);
    /// Magenta driven entirely by the source red channel.
    pub const MAGENTA: Self = Self::new([[100, 0, 0], [0, 0, 0], [100, 0, 0]]);

    pub const fn new(rows: [[u32; 3]; 3]) -> Self {
        Self { rows }
    }

    pub fn apply_pixel(&self, px: Rgb<u8>) -> Rgb<u8> {
        let src = px.0.map(u32::from);
        let mix = |row: [u32; 3]| {
            let sum = row[0] * src[0] + row[1] * src[1] + row[2] * src[2];
            ((sum + 50) / 100).min(255) as u8
        };
        Rgb([mix(self.rows[0]), mix(self.rows[1]), mix(self.rows[2])])
    }

    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        map_pixels(img, |px| self.apply_pixel(px))
    }
}

/// Reduce saturation by `amount` (0.0 = unchanged, 1.0 = gray).
///
/// In HSL every channel sits at `L + S·k(H)` for a hue-dependent offset, so
/// scaling the distance of each channel from `L = (max + min) / 2` scales S
/// and leaves H and L untouched.
pub fn desaturate_pixel(px: Rgb<u8>, amount: f32) -> Rgb<u8> {
    let [r, g, b] = px.0.map(f32::from);
    let lightness = (r.max(g).max(b) + r.min(g).min(b)) / 2.0;
    let keep = (1.0 - amount).clamp(0.0, 1.0);
    Rgb(px.0.map(|c| {
        let c = f32::from(c);
        (lightness + (c - lightness) * keep).round().clamp(0.0, 255.0) as u8
    }))
}

pub fn desaturate(img: &RgbImage, amount: f32) -> RgbImage {
    map_pixels(img, |px| desaturate_pixel(px, amount))
}

/// Screen blend of two 8-bit channel values.
pub fn screen_channel(a: u8, b: u8) -> u8 {
    let inv = (255 - u32::from(a)) * (255 - u32::from(b));
    (255 - (inv + 127) / 255) as u8
}

/// Screen-blend `top` over `bottom`. Both rasters must be the same size.
pub fn screen(top: &RgbImage, bottom: &RgbImage) -> Result<RgbImage, ImagingError> {
    if top.dimensions() != bottom.dimensions() {
        return Err(ImagingError::SizeMismatch(
            top.dimensions(),
            bottom.dimensions(),
        ));
    }
    let mut out = bottom.clone();
    for (dst, src) in out.pixels_mut().zip(top.pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            *d = screen_channel(s, *d);
        }
    }
    Ok(out)
}

fn map_pixels(img: &RgbImage, f: impl Fn(Rgb<u8>) -> Rgb<u8>) -> RgbImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        *px = f(*px);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Channel mixing
    // =========================================================================

    #[test]
    fn red_mix_keeps_only_red() {
        assert_eq!(ChannelMix::RED.apply_pixel(Rgb([200, 100, 50])), Rgb([200, 0, 0]));
    }

    #[test]
    fn cyan_mix_drives_blue_from_green() {
        assert_eq!(ChannelMix::CYAN.apply_pixel(Rgb([200, 100, 50])), Rgb([0, 100, 100]));
    }

    #[test]
    fn green_mix_keeps_only_green() {
        assert_eq!(ChannelMix::GREEN.apply_pixel(Rgb([200, 100, 50])), Rgb([0, 100, 0]));
    }

    #[test]
    fn magenta_mix_drives_blue_from_red() {
        assert_eq!(ChannelMix::MAGENTA.apply_pixel(Rgb([200, 100, 50])), Rgb([200, 0, 200]));
    }

    #[test]
    fn mix_clamps_overflow() {
        let boost = ChannelMix::new([[100, 100, 100], [0, 0, 0], [0, 0, 0]]);
        assert_eq!(boost.apply_pixel(Rgb([200, 200, 200])), Rgb([255, 0, 0]));
    }

    #[test]
    fn mix_rounds_partial_weights() {
        let half = ChannelMix::new([[50, 0, 0], [0, 50, 0], [0, 0, 50]]);
        // 51 * 50 / 100 = 25.5 → 26
        assert_eq!(half.apply_pixel(Rgb([51, 10, 0])), Rgb([26, 5, 0]));
    }

    // =========================================================================
    // Desaturation
    // =========================================================================

    #[test]
    fn desaturate_half_moves_channels_halfway_to_lightness() {
        // max 200, min 0 → L = 100
        let px = desaturate_pixel(Rgb([200, 100, 0]), 0.5);
        assert_eq!(px, Rgb([150, 100, 50]));
    }

    #[test]
    fn desaturate_preserves_gray() {
        assert_eq!(desaturate_pixel(Rgb([77, 77, 77]), 0.5), Rgb([77, 77, 77]));
    }

    #[test]
    fn desaturate_full_is_lightness_gray() {
        assert_eq!(desaturate_pixel(Rgb([255, 0, 0]), 1.0), Rgb([128, 128, 128]));
    }

    #[test]
    fn desaturate_keeps_lightness() {
        let before = Rgb([240u8, 30, 90]);
        let after = desaturate_pixel(before, 0.5);
        let l = |p: Rgb<u8>| {
            let max = *p.0.iter().max().unwrap() as i32;
            let min = *p.0.iter().min().unwrap() as i32;
            max + min
        };
        assert!((l(before) - l(after)).abs() <= 1);
    }

    // =========================================================================
    // Screen blend
    // =========================================================================

    #[test]
    fn screen_with_black_is_identity() {
        for v in [0u8, 1, 64, 128, 254, 255] {
            assert_eq!(screen_channel(v, 0), v);
            assert_eq!(screen_channel(0, v), v);
        }
    }

    #[test]
    fn screen_with_white_is_white() {
        assert_eq!(screen_channel(255, 17), 255);
        assert_eq!(screen_channel(17, 255), 255);
    }

    #[test]
    fn screen_never_darkens() {
        for a in (0..=255u8).step_by(15) {
            for b in (0..=255u8).step_by(15) {
                let s = screen_channel(a, b);
                assert!(s >= a.max(b), "screen({a}, {b}) = {s}");
            }
        }
    }

    #[test]
    fn screen_mid_grays() {
        // 1 - 0.5 * 0.5 = 0.75
        assert_eq!(screen_channel(128, 128), 192);
    }

    #[test]
    fn screen_rejects_mismatched_sizes() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(matches!(screen(&a, &b), Err(ImagingError::SizeMismatch(_, _))));
    }

    #[test]
    fn screen_of_red_over_cyan_combines_channels() {
        let red = RgbImage::from_pixel(1, 1, Rgb([180, 0, 0]));
        let cyan = RgbImage::from_pixel(1, 1, Rgb([0, 90, 90]));
        let out = screen(&red, &cyan).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgb([180, 90, 90]));
    }
}
