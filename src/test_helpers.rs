//! Shared test utilities for the stereo-suite test suite.
//!
//! Provides synthetic stereo rasters, on-disk JPEG fixtures, and config
//! construction from inline TOML.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_test_jpeg(&tmp.path().join("pair.jpg"), 64, 32);
//!
//! let config = config_from_toml(r#"
//! [defaults]
//! month = "March"
//! year = 2024
//! "#);
//! ```

use crate::config::{BatchConfig, resolve_config, stock_defaults_value};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Rasters
// =========================================================================

/// A side-by-side pair whose eyes are easy to tell apart.
///
/// The left eye is warm and varies along x, the right eye is cool and
/// varies along y, so swaps and channel mixes show up in pixel asserts.
pub fn stereo_raster(width: u32, height: u32) -> RgbImage {
    let half = width / 2;
    RgbImage::from_fn(width, height, |x, y| {
        if x < half {
            Rgb([
                (200 + x % 56) as u8,
                (x * 7 % 256) as u8,
                (y * 3 % 128) as u8,
            ])
        } else {
            Rgb([
                (y * 5 % 100) as u8,
                (120 + y % 100) as u8,
                (150 + (x - half) % 100) as u8,
            ])
        }
    })
}

/// Encode [`stereo_raster`] as a baseline JPEG.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = stereo_raster(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Config
// =========================================================================

/// Build a validated [`BatchConfig`] from inline TOML, panicking on errors.
pub fn config_from_toml(src: &str) -> BatchConfig {
    let overlay: toml::Value = toml::from_str(src)
        .unwrap_or_else(|e| panic!("invalid test TOML: {e}\n{src}"));
    resolve_config(stock_defaults_value().unwrap(), Some(overlay))
        .unwrap_or_else(|e| panic!("invalid test config: {e}\n{src}"))
}
