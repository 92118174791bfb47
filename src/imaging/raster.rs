//! The source raster of one stereo photograph.
//!
//! A [`SourceImage`] is an RGB8 side-by-side pair: the left half is the left
//! eye, the right half the right eye. It is read once, never mutated, and
//! every derived rendering borrows from it.

use image::{DynamicImage, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Stereo pair width must be even, got {0}px")]
    OddWidth(u32),
    #[error("Image has no pixels ({0}x{1})")]
    Empty(u32, u32),
    #[error("Raster sizes differ: {0:?} vs {1:?}")]
    SizeMismatch((u32, u32), (u32, u32)),
    #[error("Failed to write layered master: {0}")]
    Tiff(#[from] tiff::TiffError),
}

/// A validated side-by-side stereo pair.
#[derive(Debug, Clone)]
pub struct SourceImage {
    raster: RgbImage,
}

impl SourceImage {
    /// Wrap an RGB raster, checking the pair invariants (even width, non-empty).
    pub fn new(raster: RgbImage) -> Result<Self, ImagingError> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ImagingError::Empty(width, height));
        }
        if width % 2 != 0 {
            return Err(ImagingError::OddWidth(width));
        }
        Ok(Self { raster })
    }

    /// Accept any decoded image; grayscale, alpha and 16-bit inputs are
    /// converted to RGB8.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, ImagingError> {
        Self::new(img.into_rgb8())
    }

    /// Decode a file from disk.
    pub fn open(path: &Path) -> Result<Self, ImagingError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|source| ImagingError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_dynamic(img)
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Width of one eye.
    pub fn half_width(&self) -> u32 {
        self.width() / 2
    }

    /// Left-eye half (`W/2 × H`).
    pub fn left(&self) -> RgbImage {
        left_half(&self.raster)
    }

    /// Right-eye half (`W/2 × H`).
    pub fn right(&self) -> RgbImage {
        right_half(&self.raster)
    }
}

/// Read dimensions from the file header and check the pair invariants
/// without decoding pixels.
pub fn probe(path: &Path) -> Result<(u32, u32), ImagingError> {
    let (width, height) = image::image_dimensions(path).map_err(|source| ImagingError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if width == 0 || height == 0 {
        return Err(ImagingError::Empty(width, height));
    }
    if width % 2 != 0 {
        return Err(ImagingError::OddWidth(width));
    }
    Ok((width, height))
}

/// Copy out the left half of a raster.
pub fn left_half(img: &RgbImage) -> RgbImage {
    let half = img.width() / 2;
    image::imageops::crop_imm(img, 0, 0, half, img.height()).to_image()
}

/// Copy out the right half of a raster.
pub fn right_half(img: &RgbImage) -> RgbImage {
    let half = img.width() / 2;
    image::imageops::crop_imm(img, half, 0, half, img.height()).to_image()
}
