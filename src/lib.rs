//! # Stereo Suite
//!
//! Batch converter for side-by-side ("parallel") stereo photographs. Every
//! input frame is split into its left/right eye halves and re-rendered in the
//! four formats a stereo gallery needs:
//!
//! | Output | File |
//! |--------|------|
//! | Parallel (diverging eyes) | `<slug>_parallel.jpg` |
//! | Cross-eyed (halves swapped) | `<slug>_crosseyed.jpg` |
//! | Red/cyan anaglyph | `<slug>_anaglyph-redBlue.jpg` |
//! | Green/magenta anaglyph | `<slug>_anaglyph-greenMagenta.jpg` |
//! | Layered editable master | `<slug>_stereo.tif` |
//! | Gallery manifest (whole batch) | `stereo_manifest.xml` |
//!
//! # Pipeline
//!
//! ```text
//! originals/*.jpg ──scan──► InputPhoto ──stereo──► variants ──resize/sharpen──► JPEGs
//!        stereo.toml ──config/metadata──┘  └──layers──► master.tif
//!                                        └──record──► ManifestRecorder ──finalize──► XML
//! ```
//!
//! Photos are independent of each other and run in parallel on a rayon pool.
//! The only shared state is the [`manifest::ManifestRecorder`], which buffers
//! entries in memory and writes the XML exactly once after every photo has
//! finished.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `stereo.toml` loading, defaults, per-photo cascade, validation |
//! | [`metadata`] | Resolves a photo's title, photographer, competition date and formats |
//! | [`scan`] | Finds the input JPEGs in the source directory |
//! | [`imaging`] | Pure raster operations: halves, channel mixing, blending, resizing, sharpening, layered TIFF |
//! | [`export`] | Output naming and JPEG/master encoding |
//! | [`manifest`] | Thread-safe manifest collection and XML serialization |
//! | [`process`] | Per-photo pipeline, failure isolation and progress events |
//! | [`output`] | CLI output formatting of progress events |
//!
//! # Design Decisions
//!
//! ## Owned rasters instead of a document model
//!
//! Each variant is an independently owned `RgbImage` produced by a pure
//! function of the source raster. Nothing is mutated in place, so the four
//! renderings can be produced, resized and dropped without coordinating
//! shared layer state.
//!
//! ## Failures stay with their photo
//!
//! A photo that cannot be decoded, has an odd width, or lacks a competition
//! date is reported and skipped; the rest of the batch carries on. Only a
//! manifest write failure aborts the run, and the manifest is written through
//! a temporary file so a failed run never leaves a truncated XML behind.

pub mod config;
pub mod export;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
