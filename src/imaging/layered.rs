//! Editable layered master document.
//!
//! Each variant is kept as a named group of layers so a retoucher can adjust
//! one eye without touching the other. The document is written as a
//! multi-page TIFF: one RGBA page per layer on the full pair canvas, pixels
//! outside the layer fully transparent. The page name tag carries
//! `group/layer` and the image description carries the blend mode.

use super::color::screen_channel;
use super::raster::ImagingError;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

/// TIFF `PageName` (285).
pub const PAGE_NAME_TAG: Tag = Tag::Unknown(285);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal,
    Screen,
}

impl BlendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Screen => "screen",
        }
    }

    fn blend(self, top: Rgb<u8>, bottom: Rgb<u8>) -> Rgb<u8> {
        match self {
            BlendMode::Normal => top,
            BlendMode::Screen => {
                Rgb([0, 1, 2].map(|i| screen_channel(top[i], bottom[i])))
            }
        }
    }
}

/// One raster placed on the document canvas.
#[derive(Debug, Clone)]
pub struct Layer {
    pub group: String,
    pub name: String,
    pub offset_x: u32,
    pub offset_y: u32,
    pub blend: BlendMode,
    pub raster: RgbImage,
}

impl Layer {
    pub fn new(group: &str, name: &str, raster: RgbImage) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            offset_x: 0,
            offset_y: 0,
            blend: BlendMode::Normal,
            raster,
        }
    }

    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// `group/name`, as stored in the page name tag.
    pub fn path(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}

/// A stack of layers on a fixed canvas.
///
/// Within a group, layers are listed top first.
#[derive(Debug, Clone)]
pub struct LayeredDocument {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

impl LayeredDocument {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layer_paths(&self) -> Vec<String> {
        self.layers.iter().map(Layer::path).collect()
    }

    /// Composite one group onto a black canvas, bottom layer first.
    pub fn flatten_group(&self, group: &str) -> RgbImage {
        let mut canvas = RgbImage::new(self.width, self.height);
        for layer in self.layers.iter().rev().filter(|l| l.group == group) {
            for (x, y, px) in layer.raster.enumerate_pixels() {
                let (cx, cy) = (x + layer.offset_x, y + layer.offset_y);
                if cx < self.width && cy < self.height {
                    let below = *canvas.get_pixel(cx, cy);
                    canvas.put_pixel(cx, cy, layer.blend.blend(*px, below));
                }
            }
        }
        canvas
    }

    /// Render a layer onto a transparent canvas the size of the document.
    fn layer_canvas(&self, layer: &Layer) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        for (x, y, px) in layer.raster.enumerate_pixels() {
            let (cx, cy) = (x + layer.offset_x, y + layer.offset_y);
            if cx < self.width && cy < self.height {
                canvas.put_pixel(cx, cy, Rgba([px[0], px[1], px[2], 255]));
            }
        }
        canvas
    }

    /// Write every layer as one page of a multi-page TIFF.
    pub fn write_tiff(&self, path: &Path) -> Result<(), ImagingError> {
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = TiffEncoder::new(writer)?;

        for layer in &self.layers {
            let canvas = self.layer_canvas(layer);
            let mut page = encoder.new_image::<colortype::RGBA8>(self.width, self.height)?;
            page.encoder()
                .write_tag(PAGE_NAME_TAG, layer.path().as_str())?;
            page.encoder()
                .write_tag(Tag::ImageDescription, layer.blend.as_str())?;
            page.write_data(canvas.as_raw())?;
        }
        Ok(())
    }
}
