//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{BoundingBox, ScaleBasis};

/// Whether a combined stereo pair counts as landscape.
///
/// The decision is made per eye: a pair is landscape when one half
/// (`width / 2`) is wider than it is tall.
///
/// ```
/// # use stereo_suite::imaging::is_landscape_pair;
/// assert!(is_landscape_pair(3000, 1000));
/// assert!(!is_landscape_pair(1920, 1080)); // each eye is 960x1080
/// ```
pub fn is_landscape_pair(width: u32, height: u32) -> bool {
    f64::from(width) / 2.0 > f64::from(height)
}

/// Scale factor that fits the combined pair into the bounding box.
///
/// Landscape pairs are scaled so the full pair width equals `max_width`;
/// portrait pairs so the height equals `max_height`.
pub fn pair_scale_factor(pair: (u32, u32), bounds: BoundingBox) -> f64 {
    let (width, height) = pair;
    if is_landscape_pair(width, height) {
        f64::from(bounds.max_width) / f64::from(width)
    } else {
        f64::from(bounds.max_height) / f64::from(height)
    }
}

/// Apply a scale factor, rounding to the nearest pixel (minimum 1).
pub fn scale_dimensions(dims: (u32, u32), factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((f64::from(v) * factor).round() as u32).max(1);
    (scale(dims.0), scale(dims.1))
}

/// Calculate the output dimensions of one variant raster.
///
/// # Arguments
/// * `raster` - Dimensions of the variant being resized (W×H or W/2×H)
/// * `pair` - Dimensions of the original combined stereo pair
/// * `bounds` - Configured maximum width/height
/// * `basis` - See [`ScaleBasis`]
pub fn target_dimensions(
    raster: (u32, u32),
    pair: (u32, u32),
    bounds: BoundingBox,
    basis: ScaleBasis,
) -> (u32, u32) {
    match basis {
        ScaleBasis::Combined => scale_dimensions(raster, pair_scale_factor(pair, bounds)),
        ScaleBasis::Own => {
            let factor = if is_landscape_pair(pair.0, pair.1) {
                f64::from(bounds.max_width) / f64::from(raster.0)
            } else {
                f64::from(bounds.max_height) / f64::from(raster.1)
            };
            scale_dimensions(raster, factor)
        }
    }
}
