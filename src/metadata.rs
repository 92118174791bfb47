//! Photo metadata resolution.
//!
//! Every photo in a batch needs a title, photographer, date and the set of
//! formats to render. Values come from the batch config (see
//! [`crate::config`]) with a few fallbacks:
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title**: `title` → file stem
//! - **Firstname**: `firstname` → first word of `photographer` → ""
//! - **Lastname**: `lastname` → remaining words of `photographer` → ""
//! - **Bounds / quality**: per-photo value → `[output]`
//!
//! Month and year have no fallback. A photo without them is rejected, since
//! the manifest is ordered by the date they produce.
//!
//! ## Datestamp
//!
//! The manifest sorts on milliseconds since the Unix epoch of the first day of
//! the photo's month at 00:00 UTC:
//!
//! ```text
//! March 2024 → 2024-03-01T00:00:00Z → 1709251200000
//! ```
//!
//! ## Slug
//!
//! Output filenames derive from the title: lowercased, spaces to underscores,
//! path separators and other characters that are invalid in filenames also
//! to underscores. Everything else (including non-ASCII) is kept.

use crate::config::{ConfigError, FormatFlags, MonthSpec, OutputConfig, PhotoSettings};
use crate::imaging::{BoundingBox, Quality, ScaleBasis};
use chrono::{Month, NaiveDate, NaiveTime};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no month given")]
    MissingMonth,
    #[error("no year given")]
    MissingYear,
    #[error("unrecognized month {0:?}")]
    InvalidMonth(String),
    #[error("invalid date: {0} {1}")]
    InvalidDate(&'static str, i32),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Fully resolved, immutable metadata for one photo.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoMetadata {
    /// Source filename, e.g. `sample.jpg`.
    pub filename: String,
    pub title: String,
    pub firstname: String,
    pub lastname: String,
    pub description: String,
    pub month: Month,
    pub year: i32,
    /// Epoch milliseconds of the first of the month, 00:00 UTC.
    pub datestamp: i64,
    pub formats: FormatFlags,
    pub bounds: BoundingBox,
    pub quality: Quality,
    pub scale_basis: ScaleBasis,
    pub group: Option<String>,
    pub status: Option<String>,
}

impl PhotoMetadata {
    /// Apply fallbacks to cascaded settings and validate the date.
    pub fn resolve(
        filename: &str,
        settings: &PhotoSettings,
        output: &OutputConfig,
    ) -> Result<Self, MetadataError> {
        let stem = file_stem(filename);
        let title = resolve(&[settings.title.as_deref(), Some(stem)])
            .unwrap_or_else(|| filename.to_string());

        let (first, last) = settings
            .photographer
            .as_deref()
            .map(split_photographer)
            .unwrap_or_default();

        let month = match &settings.month {
            Some(spec) => parse_month(spec)?,
            None => return Err(MetadataError::MissingMonth),
        };
        let year = settings.year.ok_or(MetadataError::MissingYear)?;
        let batch_bounds = output.bounds();

        Ok(Self {
            filename: filename.to_string(),
            title,
            firstname: resolve(&[settings.firstname.as_deref(), Some(first.as_str())])
                .unwrap_or_default(),
            lastname: resolve(&[settings.lastname.as_deref(), Some(last.as_str())])
                .unwrap_or_default(),
            description: resolve(&[settings.description.as_deref()]).unwrap_or_default(),
            month,
            year,
            datestamp: datestamp(year, month)?,
            formats: settings.formats,
            bounds: BoundingBox {
                max_width: settings.max_width.unwrap_or(batch_bounds.max_width),
                max_height: settings.max_height.unwrap_or(batch_bounds.max_height),
            },
            quality: Quality::new(settings.quality.unwrap_or(output.quality)),
            scale_basis: output.scale_basis,
            group: resolve(&[settings.group.as_deref()]),
            status: resolve(&[settings.status.as_deref()]),
        })
    }

    /// Filename-safe form of the title.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value (trimmed).
///
/// ```text
/// title:     resolve(&[config_title, file_stem])
/// firstname: resolve(&[config_firstname, photographer_first_word])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Parse a month name (full or three-letter, any case) or number 1-12.
pub fn parse_month(spec: &MonthSpec) -> Result<Month, MetadataError> {
    match spec {
        MonthSpec::Number(n) => u8::try_from(*n)
            .ok()
            .and_then(|n| Month::try_from(n).ok())
            .ok_or_else(|| MetadataError::InvalidMonth(n.to_string())),
        MonthSpec::Name(name) => name
            .trim()
            .parse::<Month>()
            .map_err(|_| MetadataError::InvalidMonth(name.clone())),
    }
}

/// Epoch milliseconds of the first day of `month` in `year`, 00:00 UTC.
pub fn datestamp(year: i32, month: Month) -> Result<i64, MetadataError> {
    let date = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
        .ok_or(MetadataError::InvalidDate(month.name(), year))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Split "Firstname Lastname" at the first whitespace.
///
/// Everything after the first word is the last name, so
/// `"Anna van der Berg"` gives `("Anna", "van der Berg")`.
pub fn split_photographer(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Characters replaced in slugs besides spaces.
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a title into the stem shared by a photo's output files.
///
/// ```
/// # use stereo_suite::metadata::slugify;
/// assert_eq!(slugify("Test Photo"), "test_photo");
/// assert_eq!(slugify("Dusk / Dawn"), "dusk___dawn");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == ' ' || c.is_control() || UNSAFE_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PhotoSettings {
        PhotoSettings {
            month: Some(MonthSpec::Name("March".into())),
            year: Some(2024),
            ..PhotoSettings::default()
        }
    }

    // =========================================================================
    // resolve() tests
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_none() {
        assert_eq!(
            resolve(&[Some("Config Title"), Some("stem")]),
            Some("Config Title".to_string())
        );
    }

    #[test]
    fn resolve_skips_none_and_empty() {
        assert_eq!(resolve(&[None, Some(""), Some("Fallback")]), Some("Fallback".to_string()));
    }

    #[test]
    fn resolve_skips_whitespace_only() {
        assert_eq!(
            resolve(&[Some("  \n\t  "), Some("Fallback")]),
            Some("Fallback".to_string())
        );
    }

    #[test]
    fn resolve_returns_none_for_empty_sources() {
        assert_eq!(resolve(&[]), None);
        assert_eq!(resolve(&[None, None]), None);
    }

    #[test]
    fn resolve_trims_whitespace() {
        assert_eq!(
            resolve(&[Some("  Padded Title  ")]),
            Some("Padded Title".to_string())
        );
    }

    // =========================================================================
    // Months and datestamps
    // =========================================================================

    #[test]
    fn parse_month_names_and_abbreviations() {
        assert_eq!(parse_month(&MonthSpec::Name("March".into())).unwrap(), Month::March);
        assert_eq!(parse_month(&MonthSpec::Name("march".into())).unwrap(), Month::March);
        assert_eq!(parse_month(&MonthSpec::Name("Sep".into())).unwrap(), Month::September);
    }

    #[test]
    fn parse_month_numbers() {
        assert_eq!(parse_month(&MonthSpec::Number(1)).unwrap(), Month::January);
        assert_eq!(parse_month(&MonthSpec::Number(12)).unwrap(), Month::December);
    }

    #[test]
    fn parse_month_rejects_out_of_range() {
        assert!(matches!(
            parse_month(&MonthSpec::Number(0)),
            Err(MetadataError::InvalidMonth(_))
        ));
        assert!(matches!(
            parse_month(&MonthSpec::Number(13)),
            Err(MetadataError::InvalidMonth(_))
        ));
        assert!(matches!(
            parse_month(&MonthSpec::Name("Smarch".into())),
            Err(MetadataError::InvalidMonth(_))
        ));
    }

    #[test]
    fn datestamp_is_first_of_month_utc() {
        assert_eq!(datestamp(2024, Month::March).unwrap(), 1_709_251_200_000);
        assert_eq!(datestamp(1970, Month::January).unwrap(), 0);
    }

    #[test]
    fn datestamps_order_by_date() {
        let feb = datestamp(2024, Month::February).unwrap();
        let mar = datestamp(2024, Month::March).unwrap();
        let jan_next = datestamp(2025, Month::January).unwrap();
        assert!(feb < mar && mar < jan_next);
    }

    // =========================================================================
    // Photographer and slug
    // =========================================================================

    #[test]
    fn split_photographer_first_word() {
        assert_eq!(split_photographer("Jane Doe"), ("Jane".into(), "Doe".into()));
        assert_eq!(
            split_photographer("  Anna van der Berg "),
            ("Anna".into(), "van der Berg".into())
        );
        assert_eq!(split_photographer("Cher"), ("Cher".into(), String::new()));
    }

    #[test]
    fn slugify_lowercases_and_underscores() {
        assert_eq!(slugify("Test Photo"), "test_photo");
        assert_eq!(slugify("Harbour At Dusk"), "harbour_at_dusk");
    }

    #[test]
    fn slugify_replaces_path_characters() {
        assert_eq!(slugify("a/b\\c:d"), "a_b_c_d");
        assert_eq!(slugify("what?"), "what_");
    }

    #[test]
    fn slugify_keeps_unicode() {
        assert_eq!(slugify("Café München"), "café_münchen");
    }

    // =========================================================================
    // PhotoMetadata::resolve
    // =========================================================================

    #[test]
    fn title_falls_back_to_stem() {
        let meta =
            PhotoMetadata::resolve("harbour.jpg", &settings(), &OutputConfig::default()).unwrap();
        assert_eq!(meta.title, "harbour");
        assert_eq!(meta.slug(), "harbour");
    }

    #[test]
    fn photographer_fills_names() {
        let s = PhotoSettings {
            title: Some("Test Photo".into()),
            photographer: Some("Jane Doe".into()),
            firstname: Some(String::new()),
            ..settings()
        };
        let meta = PhotoMetadata::resolve("sample.jpg", &s, &OutputConfig::default()).unwrap();
        assert_eq!(meta.title, "Test Photo");
        assert_eq!(meta.firstname, "Jane");
        assert_eq!(meta.lastname, "Doe");
        assert_eq!(meta.month_name(), "March");
        assert_eq!(meta.datestamp, 1_709_251_200_000);
    }

    #[test]
    fn explicit_names_win_over_photographer() {
        let s = PhotoSettings {
            photographer: Some("Jane Doe".into()),
            lastname: Some("Smith".into()),
            ..settings()
        };
        let meta = PhotoMetadata::resolve("a.jpg", &s, &OutputConfig::default()).unwrap();
        assert_eq!(meta.firstname, "Jane");
        assert_eq!(meta.lastname, "Smith");
    }

    #[test]
    fn missing_month_is_error() {
        let s = PhotoSettings {
            month: None,
            ..settings()
        };
        let result = PhotoMetadata::resolve("a.jpg", &s, &OutputConfig::default());
        assert!(matches!(result, Err(MetadataError::MissingMonth)));
    }

    #[test]
    fn missing_year_is_error() {
        let s = PhotoSettings {
            year: None,
            ..settings()
        };
        let result = PhotoMetadata::resolve("a.jpg", &s, &OutputConfig::default());
        assert!(matches!(result, Err(MetadataError::MissingYear)));
    }

    #[test]
    fn per_photo_output_overrides() {
        let s = PhotoSettings {
            max_width: Some(1200),
            quality: Some(90),
            ..settings()
        };
        let meta = PhotoMetadata::resolve("a.jpg", &s, &OutputConfig::default()).unwrap();
        assert_eq!(meta.bounds.max_width, 1200);
        assert_eq!(meta.bounds.max_height, 480);
        assert_eq!(meta.quality.value(), 90);
    }

    #[test]
    fn quality_zero_clamps_to_one() {
        let output = OutputConfig {
            quality: 0,
            ..OutputConfig::default()
        };
        let meta = PhotoMetadata::resolve("a.jpg", &settings(), &output).unwrap();
        assert_eq!(meta.quality.value(), 1);
    }

    #[test]
    fn group_and_status_are_optional() {
        let meta =
            PhotoMetadata::resolve("a.jpg", &settings(), &OutputConfig::default()).unwrap();
        assert_eq!(meta.group, None);
        assert_eq!(meta.status, None);

        let s = PhotoSettings {
            group: Some("Group A".into()),
            status: Some("1st".into()),
            ..settings()
        };
        let meta = PhotoMetadata::resolve("a.jpg", &s, &OutputConfig::default()).unwrap();
        assert_eq!(meta.group.as_deref(), Some("Group A"));
        assert_eq!(meta.status.as_deref(), Some("1st"));
    }
}
