//! Image processing, pure Rust on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (any format, converted to RGB8) |
//! | **Stereo variants** | crop/replace + per-pixel HSL, channel mix, screen |
//! | **Resize** | `CatmullRom` + fractional unsharp mask |
//! | **Layered master** | multi-page RGBA TIFF via `tiff` |
//!
//! The module is split into:
//! - **Raster**: [`SourceImage`] and the imaging error type
//! - **Color**: per-pixel operations used by the anaglyphs
//! - **Stereo**: the four variants and the layered group structure
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Resize**: resampling and sharpening

mod calculations;
pub mod color;
pub mod layered;
mod params;
pub mod raster;
pub mod resize;
pub mod stereo;

pub use calculations::{is_landscape_pair, pair_scale_factor, scale_dimensions, target_dimensions};
pub use layered::{BlendMode, Layer, LayeredDocument};
pub use params::{BoundingBox, Quality, ScaleBasis, UnsharpMask};
pub use raster::{ImagingError, SourceImage, probe};
pub use resize::resize_and_sharpen;
pub use stereo::{Anaglyph, StereoSet, Variant};
