//! Parameter types for raster operations.
//!
//! These structs describe *what* to do, not *how* to do it. The pipeline
//! resolves them once per batch (or per photo) from the config and hands them
//! to the pure functions in [`resize`](super::resize) and the exporter.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality on the 0–100 scale, clamped to 1–100 on construction.
//! - [`UnsharpMask`]: amount / radius / threshold of the post-resize sharpening pass.
//! - [`ScaleBasis`]: which dimensions drive the resize of each variant.
//! - [`BoundingBox`]: the configured maximum output width and height.

use serde::{Deserialize, Serialize};

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(60)
    }
}

/// Unsharp-mask parameters.
///
/// - `amount`: fraction of the high-pass detail added back (0.25 = 25%)
/// - `sigma`: Gaussian blur radius in pixels
/// - `threshold`: minimum difference (0-255) before a channel is sharpened
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    pub amount: f32,
    pub sigma: f32,
    pub threshold: u8,
}

impl UnsharpMask {
    /// The pass applied to every gallery output: 25%, 1px, threshold 0.
    pub fn gallery() -> Self {
        Self {
            amount: 0.25,
            sigma: 1.0,
            threshold: 0,
        }
    }
}

impl Default for UnsharpMask {
    fn default() -> Self {
        Self::gallery()
    }
}

/// How output dimensions are derived for each variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleBasis {
    /// One scale factor, computed from the combined stereo pair, is applied to
    /// every variant. Half-width anaglyphs come out half as wide as the
    /// parallel rendering.
    #[default]
    Combined,
    /// Orientation is still decided from the pair, but each raster is fitted
    /// to the bounding box using its own width and height.
    Own,
}

/// Maximum output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            max_width: 960,
            max_height: 480,
        }
    }
}
