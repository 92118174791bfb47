//! CLI output formatting for `process` and `check`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each photo leads with
//! its positional index and title; the source file and everything written
//! for it follow as indented context lines.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001 Harbour at Dusk (960x320)
//!     Source: harbour.jpg
//!     harbour_at_dusk_stereo.tif
//!     harbour_at_dusk_parallel.jpg
//!     harbour_at_dusk_crosseyed.jpg
//! 002 FAILED (sample.jpg)
//!     Error: no month given
//!
//! Processed 1 photo, 1 failed
//! Manifest: processed/stereo_manifest.xml
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 Harbour at Dusk
//!     Source: harbour.jpg (3000x1000)
//!     Photographer: Jane Doe
//!     Date: March 2024
//!     Writes: harbour_at_dusk_stereo.tif, harbour_at_dusk_parallel.jpg
//! 002 FAILED (odd.jpg)
//!     Error: Stereo pair width must be even, got 3001px
//!
//! Warnings
//!     Config entry matches no input: ghost.jpg
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{BatchResult, Plan, ProcessEvent};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Photo header: titled photos show the title, failures show the filename
/// in parens since there is no resolved title.
///
/// ```text
/// 001 The Sunset
/// 002 FAILED (broken.jpg)
/// ```
fn photo_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} FAILED ({})", format_index(index), filename),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::NoInputs { source } => vec![format!(
            "Warning: no stereo pairs (*.jpg, *.jpeg) found in {}",
            source.display()
        )],
        ProcessEvent::PhotoProcessed {
            index,
            filename,
            title,
            dimensions,
            outputs,
        } => {
            let mut lines = vec![format!(
                "{} ({}x{})",
                photo_line(*index, Some(title), filename),
                dimensions.0,
                dimensions.1
            )];
            lines.push(format!("{}Source: {}", indent(1), filename));
            lines.extend(outputs.iter().map(|o| format!("{}{}", indent(1), o)));
            lines
        }
        ProcessEvent::PhotoFailed {
            index,
            filename,
            error,
        } => vec![
            photo_line(*index, None, filename),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(result: &BatchResult) -> Vec<String> {
    let mut headline = format!("Processed {}", plural(result.processed, "photo"));
    if !result.failed.is_empty() {
        headline.push_str(&format!(", {} failed", result.failed.len()));
    }
    vec![
        String::new(),
        headline,
        format!("Manifest: {}", result.manifest_path.display()),
    ]
}

/// Print the end-of-batch summary to stdout.
pub fn print_summary(result: &BatchResult) {
    for line in format_summary(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format a dry-run plan: one block per input, then warnings.
pub fn format_plan(plan: &Plan) -> Vec<String> {
    let mut lines = Vec::new();

    for photo in &plan.photos {
        match &photo.outcome {
            Ok(planned) => {
                let meta = &planned.metadata;
                let (w, h) = planned.source_dimensions;
                lines.push(photo_line(photo.index, Some(&meta.title), &photo.filename));
                lines.push(format!("{}Source: {} ({}x{})", indent(1), photo.filename, w, h));
                let name = format!("{} {}", meta.firstname, meta.lastname);
                if !name.trim().is_empty() {
                    lines.push(format!("{}Photographer: {}", indent(1), name.trim()));
                }
                lines.push(format!(
                    "{}Date: {} {}",
                    indent(1),
                    meta.month_name(),
                    meta.year
                ));
                if let Some(group) = &meta.group {
                    lines.push(format!("{}Group: {}", indent(1), group));
                }
                lines.push(format!("{}Writes: {}", indent(1), planned.outputs.join(", ")));
            }
            Err(e) => {
                lines.push(photo_line(photo.index, None, &photo.filename));
                lines.push(format!("{}Error: {}", indent(1), e));
            }
        }
    }

    if plan.photos.is_empty() {
        lines.push("No stereo pairs (*.jpg, *.jpeg) found".to_string());
    }

    let warnings: Vec<String> = plan
        .unmatched_keys
        .iter()
        .map(|k| format!("Config entry matches no input: {k}"))
        .chain(
            plan.duplicate_slugs
                .iter()
                .map(|s| format!("Several photos share the output name: {s}")),
        )
        .collect();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        lines.extend(warnings.iter().map(|w| format!("{}{}", indent(1), w)));
    }

    lines
}

/// Print check output to stdout.
pub fn print_plan(plan: &Plan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}
