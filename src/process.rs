//! Batch processing of stereo pairs.
//!
//! Stage 2 of the pipeline. Takes the inputs found by [`crate::scan`] and runs
//! each one end to end:
//!
//! ```text
//! settings → PhotoMetadata → decode → StereoSet ─┬→ <slug>_stereo.tif
//!                                                └→ per enabled variant:
//!                                                   resize → sharpen → <slug>_<suffix>.jpg
//!                                                → ManifestRecorder::record
//! ```
//!
//! After every photo has finished, the manifest is written once.
//!
//! ## Failure isolation
//!
//! A photo that fails (missing date, odd width, undecodable, unwritable) is
//! reported as [`ProcessEvent::PhotoFailed`] and left out of the manifest; the
//! rest of the batch carries on. Files it had already written are removed.
//! Only batch-level problems (source directory missing, output directory or
//! manifest unwritable) abort with [`ProcessError`].
//!
//! Slugs are claimed before any rendering starts. When two inputs resolve to
//! the same slug, the first in filename order keeps it and the others fail
//! with [`PhotoError::SlugTaken`], so no two photos ever write the same files.
//!
//! ## Parallel Processing
//!
//! Photos are processed in parallel using [rayon](https://docs.rs/rayon). Each
//! photo's pipeline is independent. Results are collected in input order and
//! recorded into the [`ManifestRecorder`] after the parallel iterator joins,
//! so photos sharing a datestamp keep filename order in the manifest.

use crate::config::BatchConfig;
use crate::export::{ExportError, master_filename, output_filename, write_jpeg, write_master};
use crate::imaging::{
    ImagingError, SourceImage, StereoSet, UnsharpMask, probe, resize_and_sharpen,
    target_dimensions,
};
use crate::manifest::{ManifestEntry, ManifestError, ManifestRecorder};
use crate::metadata::{MetadataError, PhotoMetadata};
use crate::scan::{InputPhoto, ScanError, scan};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Batch-level failure. Aborts the run.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Failure of a single photo. The batch continues.
#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("{0}")]
    Metadata(#[from] MetadataError),
    #[error("{0}")]
    Imaging(#[from] ImagingError),
    #[error("{0}")]
    Export(#[from] ExportError),
    #[error("output name {slug:?} is already used by {owner}")]
    SlugTaken { slug: String, owner: String },
}

/// Progress events sent to the CLI while the batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// The source directory held no inputs; an empty manifest is still written.
    NoInputs { source: PathBuf },
    PhotoProcessed {
        /// 1-based position in filename order.
        index: usize,
        filename: String,
        title: String,
        /// Dimensions of the resized parallel rendering.
        dimensions: (u32, u32),
        /// Written files, master first.
        outputs: Vec<String>,
    },
    PhotoFailed {
        index: usize,
        filename: String,
        error: String,
    },
}

/// What one successfully processed photo produced.
#[derive(Debug, Clone)]
pub struct PhotoOutput {
    pub metadata: PhotoMetadata,
    pub master: PathBuf,
    pub outputs: Vec<PathBuf>,
    /// Dimensions of the resized parallel rendering.
    pub dimensions: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPhoto {
    pub filename: String,
    pub error: String,
}

/// Summary of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub processed: usize,
    pub failed: Vec<FailedPhoto>,
    pub manifest_path: PathBuf,
}

/// Process every stereo pair in `source` into `output_dir`.
pub fn process(
    source: &Path,
    output_dir: &Path,
    config: &BatchConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    let inputs = scan(source)?;
    std::fs::create_dir_all(output_dir)?;

    let emit = |event: ProcessEvent| {
        if let Some(tx) = &progress {
            tx.send(event).ok();
        }
    };

    if inputs.is_empty() {
        warn!(source = %source.display(), "no input photos found");
        emit(ProcessEvent::NoInputs {
            source: source.to_path_buf(),
        });
    }

    let resolved = claim_slugs(
        &inputs,
        inputs.iter().map(|input| resolve_metadata(input, config)).collect(),
    );

    // Collected in input order whatever order the workers finish in.
    let results: Vec<Result<PhotoOutput, PhotoError>> = inputs
        .par_iter()
        .zip(resolved)
        .enumerate()
        .map(|(i, (input, metadata))| {
            let result = metadata.and_then(|m| render_photo(input, m, output_dir));
            match &result {
                Ok(out) => emit(processed_event(i + 1, out)),
                Err(e) => {
                    warn!(file = %input.filename, error = %e, "photo failed");
                    emit(ProcessEvent::PhotoFailed {
                        index: i + 1,
                        filename: input.filename.clone(),
                        error: e.to_string(),
                    });
                }
            }
            result
        })
        .collect();

    let recorder = ManifestRecorder::new();
    let mut failed = Vec::new();
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(out) => recorder.record(ManifestEntry::from_photo(&out.metadata, out.dimensions)),
            Err(e) => failed.push(FailedPhoto {
                filename: input.filename.clone(),
                error: e.to_string(),
            }),
        }
    }

    let processed = recorder.len();
    let manifest_path = recorder.finalize(output_dir)?;
    info!(processed, failed = failed.len(), "batch complete");

    Ok(BatchResult {
        processed,
        failed,
        manifest_path,
    })
}

fn processed_event(index: usize, out: &PhotoOutput) -> ProcessEvent {
    let name = |p: &PathBuf| {
        p.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    ProcessEvent::PhotoProcessed {
        index,
        filename: out.metadata.filename.clone(),
        title: out.metadata.title.clone(),
        dimensions: out.dimensions,
        outputs: std::iter::once(&out.master)
            .chain(&out.outputs)
            .map(name)
            .collect(),
    }
}

fn resolve_metadata(input: &InputPhoto, config: &BatchConfig) -> Result<PhotoMetadata, PhotoError> {
    let settings = config
        .photo_settings(&input.filename)
        .map_err(MetadataError::from)?;
    Ok(PhotoMetadata::resolve(&input.filename, &settings, &config.output)?)
}

/// Give each slug to the first input (in filename order) that resolves to it.
/// Later inputs with the same slug fail instead of writing over its files.
fn claim_slugs(
    inputs: &[InputPhoto],
    resolved: Vec<Result<PhotoMetadata, PhotoError>>,
) -> Vec<Result<PhotoMetadata, PhotoError>> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    inputs
        .iter()
        .zip(resolved)
        .map(|(input, metadata)| {
            let metadata = metadata?;
            let slug = metadata.slug();
            match owners.get(slug.as_str()) {
                Some(owner) => Err(PhotoError::SlugTaken {
                    slug,
                    owner: owner.to_string(),
                }),
                None => {
                    owners.insert(slug, &input.filename);
                    Ok(metadata)
                }
            }
        })
        .collect()
}

/// Run the full pipeline for one photo.
///
/// The layered master is written before any JPEG. Working rasters are
/// dropped when this returns.
pub fn process_photo(
    input: &InputPhoto,
    output_dir: &Path,
    config: &BatchConfig,
) -> Result<PhotoOutput, PhotoError> {
    render_photo(input, resolve_metadata(input, config)?, output_dir)
}

/// Decode, render and write one photo whose metadata is already resolved.
///
/// If any write fails, the files this photo already wrote are removed.
#[tracing::instrument(skip_all, fields(file = %input.filename))]
fn render_photo(
    input: &InputPhoto,
    metadata: PhotoMetadata,
    output_dir: &Path,
) -> Result<PhotoOutput, PhotoError> {
    let set = {
        let source = SourceImage::open(&input.path)?;
        debug!(width = source.width(), height = source.height(), "decoded");
        StereoSet::derive(&source)
    };

    let slug = metadata.slug();
    let master = output_dir.join(master_filename(&slug));
    let mut written = Vec::new();
    match write_outputs(&set, &metadata, &master, output_dir, &mut written) {
        Ok(outputs) => Ok(PhotoOutput {
            dimensions: target_dimensions(
                set.pair,
                set.pair,
                metadata.bounds,
                metadata.scale_basis,
            ),
            metadata,
            master,
            outputs,
        }),
        Err(e) => {
            for path in written.iter().filter(|p| p.is_file()) {
                if let Err(err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %err, "could not remove partial output");
                }
            }
            Err(e)
        }
    }
}

/// Write the master then each enabled JPEG. Each path is pushed onto
/// `written` before its file is created.
fn write_outputs(
    set: &StereoSet,
    metadata: &PhotoMetadata,
    master: &Path,
    output_dir: &Path,
    written: &mut Vec<PathBuf>,
) -> Result<Vec<PathBuf>, PhotoError> {
    written.push(master.to_path_buf());
    write_master(&set.layers(), master)?;

    let slug = metadata.slug();
    let mask = UnsharpMask::gallery();
    let mut outputs = Vec::new();
    for variant in metadata.formats.variants() {
        let raster = set.raster(variant)?;
        let dims = target_dimensions(
            raster.dimensions(),
            set.pair,
            metadata.bounds,
            metadata.scale_basis,
        );
        let path = output_dir.join(output_filename(&slug, variant));
        written.push(path.clone());
        write_jpeg(&resize_and_sharpen(&raster, dims, mask), &path, metadata.quality)?;
        debug!(variant = variant.suffix(), width = dims.0, height = dims.1, "wrote jpeg");
        outputs.push(path);
    }
    Ok(outputs)
}

// ============================================================================
// Dry run
// ============================================================================

/// One input as `check` sees it.
#[derive(Debug)]
pub struct PlannedPhoto {
    pub index: usize,
    pub filename: String,
    pub outcome: Result<PlannedOutput, PhotoError>,
}

#[derive(Debug, Clone)]
pub struct PlannedOutput {
    pub metadata: PhotoMetadata,
    /// Source pair dimensions from the file header.
    pub source_dimensions: (u32, u32),
    /// Files that `process` would write, master first.
    pub outputs: Vec<String>,
}

/// Everything `check` reports.
#[derive(Debug)]
pub struct Plan {
    pub photos: Vec<PlannedPhoto>,
    /// `[photos]` keys in the config that match no input file.
    pub unmatched_keys: Vec<String>,
    /// Slugs shared by more than one input; later photos would overwrite
    /// earlier ones.
    pub duplicate_slugs: Vec<String>,
}

impl Plan {
    pub fn has_problems(&self) -> bool {
        self.photos.iter().any(|p| p.outcome.is_err())
            || !self.unmatched_keys.is_empty()
            || !self.duplicate_slugs.is_empty()
    }
}

/// Resolve metadata and read image headers for every input without writing
/// anything.
pub fn plan(source: &Path, config: &BatchConfig) -> Result<Plan, ProcessError> {
    let inputs = scan(source)?;
    let photos: Vec<PlannedPhoto> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| PlannedPhoto {
            index: i + 1,
            filename: input.filename.clone(),
            outcome: plan_photo(input, config),
        })
        .collect();

    let filenames: Vec<&str> = inputs.iter().map(|i| i.filename.as_str()).collect();
    let unmatched_keys = config
        .unmatched_photo_keys(&filenames)
        .into_iter()
        .map(String::from)
        .collect();

    let mut slug_counts: BTreeMap<String, usize> = BTreeMap::new();
    for photo in &photos {
        if let Ok(planned) = &photo.outcome {
            *slug_counts.entry(planned.metadata.slug()).or_default() += 1;
        }
    }
    let duplicate_slugs = slug_counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(slug, _)| slug)
        .collect();

    Ok(Plan {
        photos,
        unmatched_keys,
        duplicate_slugs,
    })
}

fn plan_photo(input: &InputPhoto, config: &BatchConfig) -> Result<PlannedOutput, PhotoError> {
    let metadata = resolve_metadata(input, config)?;
    let source_dimensions = probe(&input.path)?;

    let slug = metadata.slug();
    let outputs = std::iter::once(master_filename(&slug))
        .chain(
            metadata
                .formats
                .variants()
                .into_iter()
                .map(|v| output_filename(&slug, v)),
        )
        .collect();

    Ok(PlannedOutput {
        metadata,
        source_dimensions,
        outputs,
    })
}
