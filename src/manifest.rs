//! Batch manifest: one record per processed photo, written once as XML.
//!
//! Workers call [`ManifestRecorder::record`] concurrently; after the batch
//! joins, [`ManifestRecorder::finalize`] sorts by datestamp and writes
//! `stereo_manifest.xml`:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <gallery>
//!   <set>
//!     <datestamp>1709251200000</datestamp>
//!     <month>March</month>
//!     <year>2024</year>
//!     <filename>sample.jpg</filename>
//!     <title>Test Photo</title>
//!     <firstname>Jane</firstname>
//!     <lastname>Doe</lastname>
//!     <width>853</width>
//!     <height>480</height>
//!     <parallel>True</parallel>
//!     <crosseyed>True</crosseyed>
//!     <anaglyphredblue>True</anaglyphredblue>
//!     <anaglyphgreenmagenta>True</anaglyphgreenmagenta>
//!     <description></description>
//!     <group>Group A</group>      <!-- only when set -->
//!     <status>1st</status>        <!-- only when set -->
//!   </set>
//! </gallery>
//! ```
//!
//! (Shown indented; the file itself is written without whitespace between
//! elements.) The document is written to a temporary file in the output
//! directory and renamed into place, so a failed write never leaves a
//! truncated manifest behind.

use crate::metadata::PhotoMetadata;
use maud::{Markup, PreEscaped, html};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "stereo_manifest.xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to write manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One `<set>` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub datestamp: i64,
    pub month: String,
    pub year: i32,
    /// Source filename.
    pub filename: String,
    pub title: String,
    pub firstname: String,
    pub lastname: String,
    pub description: String,
    /// Dimensions of the resized parallel rendering.
    pub width: u32,
    pub height: u32,
    pub parallel: bool,
    pub crosseyed: bool,
    pub anaglyph_red_blue: bool,
    pub anaglyph_green_magenta: bool,
    pub group: Option<String>,
    pub status: Option<String>,
}

impl ManifestEntry {
    pub fn from_photo(meta: &PhotoMetadata, (width, height): (u32, u32)) -> Self {
        Self {
            datestamp: meta.datestamp,
            month: meta.month_name().to_string(),
            year: meta.year,
            filename: meta.filename.clone(),
            title: meta.title.clone(),
            firstname: meta.firstname.clone(),
            lastname: meta.lastname.clone(),
            description: meta.description.clone(),
            width,
            height,
            parallel: meta.formats.parallel,
            crosseyed: meta.formats.crosseyed,
            anaglyph_red_blue: meta.formats.red_blue,
            anaglyph_green_magenta: meta.formats.green_magenta,
            group: meta.group.clone(),
            status: meta.status.clone(),
        }
    }
}

/// Thread-safe collector of manifest entries.
#[derive(Debug, Default)]
pub struct ManifestRecorder {
    entries: Mutex<Vec<ManifestEntry>>,
}

impl ManifestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. No deduplication.
    pub fn record(&self, entry: ManifestEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the recorder and return entries ascending by datestamp.
    /// Ties keep insertion order.
    pub fn into_sorted(self) -> Vec<ManifestEntry> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        entries.sort_by_key(|e| e.datestamp);
        entries
    }

    /// Sort, serialize and atomically write `stereo_manifest.xml`.
    pub fn finalize(self, output_dir: &Path) -> Result<PathBuf, ManifestError> {
        let entries = self.into_sorted();
        let path = output_dir.join(MANIFEST_FILENAME);
        write_atomic(&path, render_xml(&entries).as_bytes())?;
        tracing::debug!(entries = entries.len(), path = %path.display(), "manifest written");
        Ok(path)
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn render_set(entry: &ManifestEntry) -> Markup {
    html! {
        set {
            datestamp { (entry.datestamp) }
            month { (entry.month) }
            year { (entry.year) }
            filename { (entry.filename) }
            title { (entry.title) }
            firstname { (entry.firstname) }
            lastname { (entry.lastname) }
            width { (entry.width) }
            height { (entry.height) }
            parallel { (bool_text(entry.parallel)) }
            crosseyed { (bool_text(entry.crosseyed)) }
            anaglyphredblue { (bool_text(entry.anaglyph_red_blue)) }
            anaglyphgreenmagenta { (bool_text(entry.anaglyph_green_magenta)) }
            description { (entry.description) }
            @if let Some(value) = &entry.group {
                group { (value) }
            }
            @if let Some(value) = &entry.status {
                status { (value) }
            }
        }
    }
}

/// Serialize entries, in the given order, as a manifest document.
pub fn render_xml(entries: &[ManifestEntry]) -> String {
    html! {
        (PreEscaped(XML_DECLARATION))
        gallery {
            @for entry in entries {
                (render_set(entry))
            }
        }
    }
    .into_string()
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ManifestError> {
    let io_err = |source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(filename: &str, datestamp: i64) -> ManifestEntry {
        ManifestEntry {
            datestamp,
            month: "March".into(),
            year: 2024,
            filename: filename.into(),
            title: "Test Photo".into(),
            firstname: "Jane".into(),
            lastname: "Doe".into(),
            description: String::new(),
            width: 853,
            height: 480,
            parallel: true,
            crosseyed: true,
            anaglyph_red_blue: true,
            anaglyph_green_magenta: false,
            group: None,
            status: None,
        }
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    #[test]
    fn entries_sorted_by_datestamp() {
        let recorder = ManifestRecorder::new();
        recorder.record(entry("c.jpg", 300));
        recorder.record(entry("a.jpg", 100));
        recorder.record(entry("b.jpg", 200));

        let names: Vec<_> = recorder
            .into_sorted()
            .into_iter()
            .map(|e| e.filename)
            .collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let recorder = ManifestRecorder::new();
        recorder.record(entry("second-month.jpg", 200));
        recorder.record(entry("first.jpg", 100));
        recorder.record(entry("second.jpg", 100));
        recorder.record(entry("third.jpg", 100));

        let names: Vec<_> = recorder
            .into_sorted()
            .into_iter()
            .map(|e| e.filename)
            .collect();
        assert_eq!(names, ["first.jpg", "second.jpg", "third.jpg", "second-month.jpg"]);
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let recorder = Arc::new(ManifestRecorder::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        recorder.record(entry(&format!("{t}-{i}.jpg"), (i * 7 + t) % 11));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let recorder = Arc::into_inner(recorder).unwrap();
        assert_eq!(recorder.len(), 200);
        let sorted = recorder.into_sorted();
        assert!(sorted.windows(2).all(|w| w[0].datestamp <= w[1].datestamp));
    }

    // =========================================================================
    // XML rendering
    // =========================================================================

    #[test]
    fn empty_manifest_is_bare_gallery() {
        assert_eq!(
            render_xml(&[]),
            r#"<?xml version="1.0" encoding="UTF-8"?><gallery></gallery>"#
        );
    }

    #[test]
    fn set_fields_in_order() {
        let xml = render_xml(&[entry("sample.jpg", 1_709_251_200_000)]);
        let expected = concat!(
            "<set>",
            "<datestamp>1709251200000</datestamp>",
            "<month>March</month>",
            "<year>2024</year>",
            "<filename>sample.jpg</filename>",
            "<title>Test Photo</title>",
            "<firstname>Jane</firstname>",
            "<lastname>Doe</lastname>",
            "<width>853</width>",
            "<height>480</height>",
            "<parallel>True</parallel>",
            "<crosseyed>True</crosseyed>",
            "<anaglyphredblue>True</anaglyphredblue>",
            "<anaglyphgreenmagenta>False</anaglyphgreenmagenta>",
            "<description></description>",
            "</set>",
        );
        assert!(xml.contains(expected), "{xml}");
    }

    #[test]
    fn group_and_status_rendered_when_present() {
        let mut e = entry("a.jpg", 1);
        e.group = Some("Special Competition - Macro".into());
        e.status = Some("Honorable Mention".into());
        let xml = render_xml(&[e]);
        assert!(xml.contains(
            "<description></description><group>Special Competition - Macro</group>\
             <status>Honorable Mention</status></set>"
        ));
    }

    #[test]
    fn text_is_escaped() {
        let mut e = entry("a.jpg", 1);
        e.title = "Rock & <Roll>".into();
        let xml = render_xml(&[e]);
        assert!(xml.contains("<title>Rock &amp; &lt;Roll&gt;</title>"));
    }

    #[test]
    fn entry_from_photo_metadata() {
        use crate::config::{FormatFlags, MonthSpec, OutputConfig, PhotoSettings};

        let settings = PhotoSettings {
            title: Some("Test Photo".into()),
            photographer: Some("Jane Doe".into()),
            month: Some(MonthSpec::Name("March".into())),
            year: Some(2024),
            formats: FormatFlags {
                red_blue: false,
                ..FormatFlags::default()
            },
            ..PhotoSettings::default()
        };
        let meta =
            PhotoMetadata::resolve("sample.jpg", &settings, &OutputConfig::default()).unwrap();
        let e = ManifestEntry::from_photo(&meta, (853, 480));

        assert_eq!(e.filename, "sample.jpg");
        assert_eq!(e.month, "March");
        assert_eq!(e.datestamp, 1_709_251_200_000);
        assert_eq!((e.width, e.height), (853, 480));
        assert!(e.parallel && e.crosseyed && e.anaglyph_green_magenta);
        assert!(!e.anaglyph_red_blue);
    }

    // =========================================================================
    // finalize
    // =========================================================================

    #[test]
    fn finalize_writes_file() {
        let tmp = TempDir::new().unwrap();
        let recorder = ManifestRecorder::new();
        recorder.record(entry("b.jpg", 2));
        recorder.record(entry("a.jpg", 1));

        let path = recorder.finalize(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join(MANIFEST_FILENAME));

        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        let a = xml.find("a.jpg").unwrap();
        let b = xml.find("b.jpg").unwrap();
        assert!(a < b);
        assert_eq!(xml.matches("<set>").count(), 2);
    }

    #[test]
    fn finalize_overwrites_previous_manifest() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILENAME), "stale").unwrap();

        ManifestRecorder::new().finalize(tmp.path()).unwrap();
        let xml = std::fs::read_to_string(tmp.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(xml.ends_with("<gallery></gallery>"));
    }

    #[test]
    fn finalize_failure_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        let result = ManifestRecorder::new().finalize(&missing);
        assert!(matches!(result, Err(ManifestError::Io { .. })));
        assert!(!missing.join(MANIFEST_FILENAME).exists());
        // No stray temp files in the parent either
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
