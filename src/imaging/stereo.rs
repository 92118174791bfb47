//! Derivation of the four stereo renderings from one side-by-side pair.
//!
//! | Variant | Size | Rule |
//! |---|---|---|
//! | Parallel | W×H | identity copy |
//! | Crosseyed | W×H | left and right halves swap places |
//! | Red/Blue anaglyph | W/2×H | red-tinted left screened over cyan-tinted right |
//! | Green/Magenta anaglyph | W/2×H | green-tinted left screened over magenta-tinted right |
//!
//! Anaglyph halves are desaturated by 50% before tinting so strongly colored
//! subjects don't leak into the wrong eye.

use super::color::{ChannelMix, desaturate, screen};
use super::layered::{BlendMode, Layer, LayeredDocument};
use super::raster::{ImagingError, SourceImage, left_half, right_half};
use image::RgbImage;

/// Saturation reduction applied to both anaglyph halves.
pub const ANAGLYPH_DESATURATION: f32 = 0.5;

/// One of the four gallery renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Parallel,
    Crosseyed,
    RedBlueAnaglyph,
    GreenMagentaAnaglyph,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Parallel,
        Variant::Crosseyed,
        Variant::RedBlueAnaglyph,
        Variant::GreenMagentaAnaglyph,
    ];

    /// Filename suffix: `<slug>_<suffix>.jpg`.
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Parallel => "parallel",
            Variant::Crosseyed => "crosseyed",
            Variant::RedBlueAnaglyph => "anaglyph-redBlue",
            Variant::GreenMagentaAnaglyph => "anaglyph-greenMagenta",
        }
    }

    /// Layer group name in the editable master.
    pub fn group(self) -> &'static str {
        match self {
            Variant::Parallel => "parallel",
            Variant::Crosseyed => "crosseyed",
            Variant::RedBlueAnaglyph => "redBlue",
            Variant::GreenMagentaAnaglyph => "greenMagenta",
        }
    }

    pub fn anaglyph(self) -> Option<Anaglyph> {
        match self {
            Variant::RedBlueAnaglyph => Some(Anaglyph::RedBlue),
            Variant::GreenMagentaAnaglyph => Some(Anaglyph::GreenMagenta),
            Variant::Parallel | Variant::Crosseyed => None,
        }
    }
}

/// The two anaglyph color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anaglyph {
    RedBlue,
    GreenMagenta,
}

impl Anaglyph {
    pub fn variant(self) -> Variant {
        match self {
            Anaglyph::RedBlue => Variant::RedBlueAnaglyph,
            Anaglyph::GreenMagenta => Variant::GreenMagentaAnaglyph,
        }
    }

    /// Mix applied to the left-eye half.
    pub fn left_mix(self) -> ChannelMix {
        match self {
            Anaglyph::RedBlue => ChannelMix::RED,
            Anaglyph::GreenMagenta => ChannelMix::GREEN,
        }
    }

    /// Mix applied to the right-eye half.
    pub fn right_mix(self) -> ChannelMix {
        match self {
            Anaglyph::RedBlue => ChannelMix::CYAN,
            Anaglyph::GreenMagenta => ChannelMix::MAGENTA,
        }
    }
}

/// Desaturated, channel-mixed eye halves, before compositing.
#[derive(Debug, Clone)]
pub struct TintedPair {
    pub left: RgbImage,
    pub right: RgbImage,
}

impl TintedPair {
    /// Screen the left half over the right half at the same origin.
    pub fn composite(&self) -> Result<RgbImage, ImagingError> {
        screen(&self.left, &self.right)
    }
}

/// Parallel view: the unmodified pair.
pub fn parallel(source: &SourceImage) -> RgbImage {
    source.raster().clone()
}

/// Swap the left and right halves of an even-width raster.
///
/// Applying it twice returns the original.
pub fn swap_halves(img: &RgbImage) -> RgbImage {
    let half = img.width() / 2;
    let mut out = RgbImage::new(img.width(), img.height());
    image::imageops::replace(&mut out, &right_half(img), 0, 0);
    image::imageops::replace(&mut out, &left_half(img), i64::from(half), 0);
    out
}

/// Cross-eyed view: halves swapped, canvas size unchanged.
pub fn crosseyed(source: &SourceImage) -> RgbImage {
    swap_halves(source.raster())
}

/// Desaturate and tint each eye for the given anaglyph scheme.
pub fn tint_halves(source: &SourceImage, kind: Anaglyph) -> TintedPair {
    let tint =
        |half: RgbImage, mix: ChannelMix| mix.apply(&desaturate(&half, ANAGLYPH_DESATURATION));
    TintedPair {
        left: tint(source.left(), kind.left_mix()),
        right: tint(source.right(), kind.right_mix()),
    }
}

/// Anaglyph view: `W/2 × H`.
pub fn anaglyph(source: &SourceImage, kind: Anaglyph) -> Result<RgbImage, ImagingError> {
    tint_halves(source, kind).composite()
}

/// Every rendering of one pair, computed once and shared between the JPEG
/// exports and the layered master.
#[derive(Debug, Clone)]
pub struct StereoSet {
    pub pair: (u32, u32),
    pub parallel: RgbImage,
    pub crosseyed: RgbImage,
    pub red_blue: TintedPair,
    pub green_magenta: TintedPair,
}

impl StereoSet {
    pub fn derive(source: &SourceImage) -> Self {
        Self {
            pair: source.dimensions(),
            parallel: parallel(source),
            crosseyed: crosseyed(source),
            red_blue: tint_halves(source, Anaglyph::RedBlue),
            green_magenta: tint_halves(source, Anaglyph::GreenMagenta),
        }
    }

    pub fn tinted(&self, kind: Anaglyph) -> &TintedPair {
        match kind {
            Anaglyph::RedBlue => &self.red_blue,
            Anaglyph::GreenMagenta => &self.green_magenta,
        }
    }

    /// The flattened raster for a variant.
    pub fn raster(&self, variant: Variant) -> Result<RgbImage, ImagingError> {
        match variant.anaglyph() {
            Some(kind) => self.tinted(kind).composite(),
            None if variant == Variant::Crosseyed => Ok(self.crosseyed.clone()),
            None => Ok(self.parallel.clone()),
        }
    }

    /// Build the layered master: one group per variant, eyes as separate layers.
    ///
    /// Offsets place each layer on the full `W × H` canvas the way the
    /// flattened rendering shows it: cross-eyed halves sit swapped, anaglyph
    /// halves are stacked on the left `W/2` columns.
    pub fn layers(&self) -> LayeredDocument {
        let (width, height) = self.pair;
        let half = width / 2;
        let mut doc = LayeredDocument::new(width, height);

        doc.push(Layer::new("parallel", "parallel", self.parallel.clone()));
        doc.push(
            Layer::new("crosseyed", "left", left_half(&self.parallel)).with_offset(half, 0),
        );
        doc.push(Layer::new("crosseyed", "right", right_half(&self.parallel)));

        for kind in [Anaglyph::RedBlue, Anaglyph::GreenMagenta] {
            let group = kind.variant().group();
            let pair = self.tinted(kind);
            doc.push(Layer::new(group, "left", pair.left.clone()).with_blend(BlendMode::Screen));
            doc.push(Layer::new(group, "right", pair.right.clone()));
        }
        doc
    }
}
