//! Error types for the edgequake-html2pdf library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`Html2PdfError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input, browser failed to start, load timeout, zero slides,
//!   capture or merge failure). Returned as `Err(Html2PdfError)` from the
//!   `Result`-returning entry points and flattened into
//!   [`crate::output::ConversionResult`] by [`crate::convert::convert`].
//!
//! * [`SessionError`] — raised by the rendering collaborator (the headless
//!   browser) for a single primitive operation. Detection and capture code
//!   lifts it into [`Html2PdfError::Session`]; the navigator swallows it and
//!   falls through to the next strategy.
//!
//! * [`SlideError`] — **Non-fatal**: navigation to one slide failed. The slide
//!   is still captured in whatever state the document is in; the error is
//!   stored in [`crate::output::SlideReport`] for the caller to inspect.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-html2pdf library.
#[derive(Debug, Error)]
pub enum Html2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nPlace your HTML file in the 'input' folder or pass a path.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but does not look like an HTML document.
    #[error("Input is not an HTML file: '{path}'\nExpected a .html, .htm or .xhtml file.")]
    NotHtml { path: PathBuf },

    /// The path could not be turned into a `file://` URL.
    #[error("Invalid input '{input}': cannot be expressed as a file URL")]
    InvalidInput { input: String },

    // ── Browser errors ────────────────────────────────────────────────────
    /// The headless browser could not be started.
    #[error(
        "Failed to launch headless browser: {0}\n\n\
Install Google Chrome or Chromium, or point CHROME_PATH / --chrome at an executable."
    )]
    BrowserLaunchFailed(String),

    /// The document did not finish loading within the configured ceiling.
    #[error("Loading '{url}' timed out after {secs}s\nIncrease --load-timeout.")]
    LoadTimeout { url: String, secs: u64 },

    /// The browser reported a navigation error for the input document.
    #[error("Failed to load '{url}': {detail}")]
    LoadFailed { url: String, detail: String },

    /// A rendering primitive failed outside the best-effort navigation path.
    #[error(transparent)]
    Session(#[from] SessionError),

    // ── Detection errors ──────────────────────────────────────────────────
    /// Slide detection resolved to zero slides; nothing would be captured.
    #[error("No slides detected in the presentation")]
    NoSlidesDetected,

    // ── Capture / assembly errors ─────────────────────────────────────────
    /// The renderer could not snapshot a slide.
    #[error("Capture failed for slide {slide}: {detail}")]
    CaptureFailed { slide: usize, detail: String },

    /// A slide artifact could not be decoded or the merged document could
    /// not be serialised.
    #[error("PDF merge failed: {0}")]
    MergeFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure inside the rendering collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// In-page script evaluation failed or returned an unexpected shape.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// A synthetic click or key event could not be dispatched.
    #[error("input dispatch failed: {0}")]
    Input(String),

    /// Resizing the viewport failed.
    #[error("viewport change failed: {0}")]
    Viewport(String),

    /// The print-to-PDF call failed.
    #[error("print failed: {0}")]
    Print(String),

    /// The browser process or connection is gone.
    #[error("browser connection lost: {0}")]
    Disconnected(String),
}

/// A non-fatal error for a single slide.
///
/// Stored alongside [`crate::output::SlideReport`]. The conversion continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideError {
    /// Every navigation strategy failed or was unsupported by the document.
    #[error("Slide {slide}: could not navigate ({detail})")]
    NavigationFailed { slide: usize, detail: String },
}
