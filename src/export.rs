//! Writing rendered variants to disk.
//!
//! ```text
//! processed/
//! ├── test_photo_stereo.tif                 # layered master, always written
//! ├── test_photo_parallel.jpg
//! ├── test_photo_crosseyed.jpg
//! ├── test_photo_anaglyph-redBlue.jpg
//! └── test_photo_anaglyph-greenMagenta.jpg
//! ```
//!
//! JPEGs are baseline RGB with no embedded color profile.

use crate::imaging::{ImagingError, LayeredDocument, Quality, Variant};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to write {path}: {source}")]
    Master {
        path: PathBuf,
        source: ImagingError,
    },
}

/// `<slug>_<suffix>.jpg`
pub fn output_filename(slug: &str, variant: Variant) -> String {
    format!("{slug}_{}.jpg", variant.suffix())
}

/// `<slug>_stereo.tif`
pub fn master_filename(slug: &str) -> String {
    format!("{slug}_stereo.tif")
}

/// Encode an RGB raster as JPEG at the given quality.
pub fn write_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    // Quality is already clamped to 1-100
    JpegEncoder::new_with_quality(writer, quality.value() as u8)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|source| ExportError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the layered master document.
pub fn write_master(doc: &LayeredDocument, path: &Path) -> Result<(), ExportError> {
    doc.write_tiff(path).map_err(|source| ExportError::Master {
        path: path.to_path_buf(),
        source,
    })
}
