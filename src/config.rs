//! Batch configuration module.
//!
//! Handles loading, validating, and merging `stereo.toml`. The file replaces
//! the interactive prompts of a one-photo-at-a-time workflow: output bounds
//! and quality for the whole batch, shared photo defaults, and a table of
//! per-photo metadata keyed by filename.
//!
//! ## Config File Location
//!
//! By default the file is read from the source directory; `--config` points
//! elsewhere:
//!
//! ```text
//! originals/
//! ├── stereo.toml
//! ├── sample.jpg
//! └── harbour.jpg
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! max_width = 960           # Landscape bound (px)
//! max_height = 480          # Portrait bound (px)
//! quality = 60              # JPEG quality (0-100)
//! scale_basis = "combined"  # or "own"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [defaults]                # Applied to every photo
//! year = 2024
//!
//! [photos."sample.jpg"]     # Overrides [defaults] for one photo
//! title = "Test Photo"
//! photographer = "Jane Doe"
//! month = "March"
//! formats.red_blue = false
//! ```
//!
//! ## Cascade
//!
//! ```text
//! PhotoSettings::default() ← [defaults] ← [photos."<file>"]
//! ```
//!
//! Per-photo tables are merged key-by-key over `[defaults]` (nested tables
//! such as `formats` merge too), then deserialized. Unknown keys are rejected
//! at every level to catch typos early.

use crate::imaging::{BoundingBox, Quality, ScaleBasis, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the source directory when `--config` is absent.
pub const CONFIG_FILENAME: &str = "stereo.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid settings for {key}: {source}")]
    Photo {
        key: String,
        source: toml::de::Error,
    },
}

/// Batch configuration loaded from `stereo.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Output bounds, quality and scale basis.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Photo settings shared by every input.
    pub defaults: toml::Table,
    /// Per-photo settings keyed by filename (or file stem).
    pub photos: BTreeMap<String, toml::Table>,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Every `[photos]` entry is resolved as well, so a typo in the last
    /// photo fails the batch before the first one is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.max_width == 0 || self.output.max_height == 0 {
            return Err(ConfigError::Validation(
                "output.max_width and output.max_height must be non-zero".into(),
            ));
        }
        if self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 0-100".into(),
            ));
        }
        self.defaults_settings()?;
        for key in self.photos.keys() {
            let settings = self.settings_for_key(key)?;
            settings.validate(key)?;
        }
        Ok(())
    }

    /// Resolve the settings for one input file.
    ///
    /// Looks up `[photos."<filename>"]` first, then `[photos."<stem>"]`.
    /// Files without an entry get the `[defaults]` alone.
    pub fn photo_settings(&self, filename: &str) -> Result<PhotoSettings, ConfigError> {
        match self.photo_key(filename) {
            Some(key) => self.settings_for_key(key),
            None => self.defaults_settings(),
        }
    }

    /// The `[photos]` key that applies to a filename, if any.
    pub fn photo_key(&self, filename: &str) -> Option<&str> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        [filename, stem]
            .into_iter()
            .find_map(|k| self.photos.get_key_value(k).map(|(k, _)| k.as_str()))
    }

    /// `[photos]` keys that match none of the given filenames.
    pub fn unmatched_photo_keys<'a>(&'a self, filenames: &[&str]) -> Vec<&'a str> {
        let matched: Vec<&str> = filenames.iter().filter_map(|f| self.photo_key(f)).collect();
        self.photos
            .keys()
            .map(String::as_str)
            .filter(|k| !matched.contains(k))
            .collect()
    }

    fn defaults_settings(&self) -> Result<PhotoSettings, ConfigError> {
        toml::Value::Table(self.defaults.clone())
            .try_into()
            .map_err(|source| ConfigError::Photo {
                key: "defaults".to_string(),
                source,
            })
    }

    fn settings_for_key(&self, key: &str) -> Result<PhotoSettings, ConfigError> {
        let overlay = self.photos.get(key).cloned().unwrap_or_default();
        let merged = merge_toml(
            toml::Value::Table(self.defaults.clone()),
            toml::Value::Table(overlay),
        );
        merged.try_into().map_err(|source| ConfigError::Photo {
            key: key.to_string(),
            source,
        })
    }
}

/// Output settings for every rendered JPEG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Width bound for landscape pairs (px).
    pub max_width: u32,
    /// Height bound for portrait pairs (px).
    pub max_height: u32,
    /// JPEG quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Which dimensions drive the resize of each variant.
    pub scale_basis: ScaleBasis,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let bounds = BoundingBox::default();
        Self {
            max_width: bounds.max_width,
            max_height: bounds.max_height,
            quality: Quality::default().value(),
            scale_basis: ScaleBasis::default(),
        }
    }
}

impl OutputConfig {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel photo workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Settings for one photo after the `[defaults]` cascade.
///
/// Everything is optional here; [`crate::metadata::PhotoMetadata::resolve`]
/// applies fallbacks and reports what is still missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoSettings {
    pub title: Option<String>,
    /// "Firstname Lastname", split when `firstname`/`lastname` are absent.
    pub photographer: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub description: Option<String>,
    pub month: Option<MonthSpec>,
    pub year: Option<i32>,
    /// Competition group, e.g. "Group A".
    pub group: Option<String>,
    /// Placement, e.g. "1st" or "Honorable Mention".
    pub status: Option<String>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality: Option<u32>,
    pub formats: FormatFlags,
}

impl PhotoSettings {
    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        if self.max_width == Some(0) || self.max_height == Some(0) {
            return Err(ConfigError::Validation(format!(
                "photos.\"{key}\": max_width and max_height must be non-zero"
            )));
        }
        if self.quality.is_some_and(|q| q > 100) {
            return Err(ConfigError::Validation(format!(
                "photos.\"{key}\": quality must be 0-100"
            )));
        }
        Ok(())
    }
}

/// A month given either by name (`"March"`, `"mar"`) or number (`3`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MonthSpec {
    Number(u32),
    Name(String),
}

/// Which variants are written as JPEGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatFlags {
    pub parallel: bool,
    pub crosseyed: bool,
    pub red_blue: bool,
    pub green_magenta: bool,
}

impl Default for FormatFlags {
    fn default() -> Self {
        Self {
            parallel: true,
            crosseyed: true,
            red_blue: true,
            green_magenta: true,
        }
    }
}

impl FormatFlags {
    pub fn enabled(&self, variant: Variant) -> bool {
        match variant {
            Variant::Parallel => self.parallel,
            Variant::Crosseyed => self.crosseyed,
            Variant::RedBlueAnaglyph => self.red_blue,
            Variant::GreenMagentaAnaglyph => self.green_magenta,
        }
    }

    /// Enabled variants in output order.
    pub fn variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.enabled(*v))
            .collect()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BatchConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Default config location for a source directory.
pub fn default_config_path(source: &Path) -> PathBuf {
    source.join(CONFIG_FILENAME)
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the batch config from a file path.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(config_path: &Path) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(config_path)?;
    if overlay.is_none() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `stereo.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Stereo Suite Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the source directory as stereo.toml, or pass
# --config <path>. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Landscape pairs (each eye wider than tall) are scaled so the full pair
# is this wide.
max_width = 960

# Portrait pairs are scaled so they are this tall.
max_height = 480

# JPEG quality (0 = worst, 100 = best).
quality = 60

# "combined": one scale factor from the full pair for every variant, so
#             anaglyphs come out half as wide as the parallel view.
# "own":      each variant is fitted to the bound on its own.
scale_basis = "combined"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel photo workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Photo defaults
# ---------------------------------------------------------------------------
# Every key below may also appear in a [photos."<file>"] table, which wins.
[defaults]
# photographer = "Firstname Lastname"
# firstname = ""
# lastname = ""
# description = ""
# month = "January"        # name, abbreviation, or 1-12
# year = 2024
# group = "Group A"
# status = "1st"
# max_width = 960          # per-photo override of [output]
# max_height = 480
# quality = 60

[defaults.formats]
parallel = true
crosseyed = true
red_blue = true
green_magenta = true

# ---------------------------------------------------------------------------
# Photos
# ---------------------------------------------------------------------------
# Keyed by filename or file stem. The title falls back to the file stem.
#
# [photos."sample.jpg"]
# title = "Test Photo"
# photographer = "Jane Doe"
# month = "March"
# year = 2024
# formats.red_blue = false
"##
}
