//! Result types returned by the conversion entry points.
//!
//! * [`ConversionOutput`] is the in-memory result of
//!   [`crate::convert::convert_to_bytes`]: merged PDF bytes plus statistics.
//! * [`ConversionResult`] is the flat, serialisable terminal value returned by
//!   [`crate::convert::convert`]. It is never an `Err`: failures are folded
//!   into `success: false` with an error message.
//! * [`DeckInspection`] is what [`crate::convert::inspect`] learns about a deck
//!   without capturing it.

use crate::config::FormatMode;
use crate::error::{Html2PdfError, SlideError};
use crate::pipeline::format::{FormatSource, PageDimensions};
use crate::pipeline::slides::DetectedSlides;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Merged PDF plus everything learned while producing it.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The merged, serialised PDF document.
    pub pdf: Vec<u8>,
    /// Page size every slide was printed at.
    pub dimensions: PageDimensions,
    pub format_source: FormatSource,
    pub slides: DetectedSlides,
    /// One entry per captured slide, in page order.
    pub reports: Vec<SlideReport>,
    pub stats: ConversionStats,
}

/// What happened to a single slide.
#[derive(Debug, Clone, Serialize)]
pub struct SlideReport {
    /// 1-indexed.
    pub slide_num: usize,
    /// Strategy that moved the deck here; `None` for single-slide decks or
    /// when every strategy failed.
    pub navigation: Option<String>,
    /// Size of the single-page artifact.
    pub bytes: usize,
    /// Set when navigation failed and the slide was captured as-is.
    pub warning: Option<SlideError>,
}

/// Timing and count statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub slide_count: usize,
    /// Slides whose navigation could not be resolved.
    pub navigation_warnings: usize,
    pub pdf_bytes: usize,
    pub total_duration_ms: u64,
    pub capture_duration_ms: u64,
    pub merge_duration_ms: u64,
}

/// Terminal value of [`crate::convert::convert`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub output_path: PathBuf,
    pub slide_count: usize,
    pub byte_size: usize,
    pub elapsed_ms: u64,
    pub dimensions: Option<PageDimensions>,
    pub detection_method: Option<String>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(output_path: &Path, output: &ConversionOutput, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            output_path: output_path.to_path_buf(),
            slide_count: output.stats.slide_count,
            byte_size: output.pdf.len(),
            elapsed_ms,
            dimensions: Some(output.dimensions),
            detection_method: Some(output.slides.method.to_string()),
            error: None,
        }
    }

    pub fn failed(output_path: &Path, error: &Html2PdfError, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            output_path: output_path.to_path_buf(),
            slide_count: 0,
            byte_size: 0,
            elapsed_ms,
            dimensions: None,
            detection_method: None,
            error: Some(error.to_string()),
        }
    }
}

/// Format and slide detection for a deck, without capture.
#[derive(Debug, Clone, Serialize)]
pub struct DeckInspection {
    pub url: String,
    pub dimensions: PageDimensions,
    pub format_source: FormatSource,
    pub slides: DetectedSlides,
    /// Orientation suggested by scanning the HTML source; advisory only.
    pub source_hint: FormatMode,
}
