//! Resize and sharpen rasters for the gallery.
//!
//! | Step | Implementation |
//! |---|---|
//! | Resize | `image::imageops::resize` with `CatmullRom` (bicubic) |
//! | Sharpen | Gaussian `image::imageops::blur`, then `orig + amount·(orig − blur)` |
//!
//! `image::imageops::unsharpen` always adds the full high-pass back; the
//! gallery pass needs a fractional amount, so the mask is applied here.

use super::params::UnsharpMask;
use image::RgbImage;
use image::imageops::FilterType;

/// Bicubic resample to exact dimensions.
pub fn resize(img: &RgbImage, dims: (u32, u32)) -> RgbImage {
    if img.dimensions() == dims {
        return img.clone();
    }
    image::imageops::resize(img, dims.0, dims.1, FilterType::CatmullRom)
}

/// Unsharp mask with a fractional amount.
///
/// Channels whose difference from the blurred value is at or below
/// `threshold` are left untouched.
pub fn unsharp_mask(img: &RgbImage, mask: UnsharpMask) -> RgbImage {
    if mask.amount == 0.0 {
        return img.clone();
    }
    let blurred = image::imageops::blur(img, mask.sigma);
    let mut out = img.clone();
    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (c, s) in px.0.iter_mut().zip(soft.0) {
            let diff = i32::from(*c) - i32::from(s);
            if diff.unsigned_abs() > u32::from(mask.threshold) {
                let sharpened = f32::from(*c) + mask.amount * diff as f32;
                *c = sharpened.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Resize, then sharpen. The mask runs on the final pixel grid.
pub fn resize_and_sharpen(img: &RgbImage, dims: (u32, u32), mask: UnsharpMask) -> RgbImage {
    unsharp_mask(&resize(img, dims), mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::stereo_raster;
    use image::Rgb;

    #[test]
    fn resize_hits_exact_dimensions() {
        let img = stereo_raster(300, 100);
        assert_eq!(resize(&img, (96, 32)).dimensions(), (96, 32));
        assert_eq!(resize(&img, (853, 480)).dimensions(), (853, 480));
    }

    #[test]
    fn resize_same_size_is_identity() {
        let img = stereo_raster(20, 10);
        assert_eq!(resize(&img, (20, 10)), img);
    }

    #[test]
    fn sharpen_flat_image_is_identity() {
        let img = RgbImage::from_pixel(16, 16, Rgb([120, 60, 30]));
        assert_eq!(unsharp_mask(&img, UnsharpMask::gallery()), img);
    }

    #[test]
    fn sharpen_increases_edge_contrast() {
        let mut img = RgbImage::from_pixel(16, 8, Rgb([60, 60, 60]));
        for y in 0..8 {
            for x in 8..16 {
                img.put_pixel(x, y, Rgb([180, 180, 180]));
            }
        }
        let out = unsharp_mask(&img, UnsharpMask::gallery());
        // Dark side of the edge gets darker, bright side brighter
        assert!(out.get_pixel(7, 4)[0] < 60);
        assert!(out.get_pixel(8, 4)[0] > 180);
        // Far from the edge nothing changes
        assert_eq!(out.get_pixel(0, 4)[0], 60);
        assert_eq!(out.get_pixel(15, 4)[0], 180);
    }

    #[test]
    fn zero_amount_is_identity() {
        let img = stereo_raster(16, 8);
        let mask = UnsharpMask {
            amount: 0.0,
            ..UnsharpMask::gallery()
        };
        assert_eq!(unsharp_mask(&img, mask), img);
    }

    #[test]
    fn high_threshold_skips_sharpening() {
        let img = stereo_raster(16, 8);
        let mask = UnsharpMask {
            threshold: 255,
            ..UnsharpMask::gallery()
        };
        assert_eq!(unsharp_mask(&img, mask), img);
    }

    #[test]
    fn resize_and_sharpen_output_size() {
        let img = stereo_raster(64, 20);
        let out = resize_and_sharpen(&img, (32, 10), UnsharpMask::gallery());
        assert_eq!(out.dimensions(), (32, 10));
    }
}
