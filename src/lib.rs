//! # edgequake-html2pdf
//!
//! Convert browser-rendered HTML slide decks into a single paginated PDF.
//!
//! ## Why this crate?
//!
//! Printing a slide deck straight from a browser gives you one long page, or
//! whatever the deck's print stylesheet happens to produce. Decks are driven
//! by JavaScript: only one slide is visible at a time and the rest sit behind
//! navigation functions, indicator dots or arrow keys. This crate drives the
//! deck the way a presenter would, one slide at a time, and prints each slide
//! onto its own correctly sized page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML
//!  │
//!  ├─ 1. Input     validate the local file, build a file:// URL
//!  ├─ 2. Format    fixed preset, or viewport meta / slide box / body aspect
//!  ├─ 3. Slides    selector → indicators → counter → single page
//!  ├─ 4. Navigate  exposed function → indicator click → Home/ArrowRight
//!  ├─ 5. Capture   settle, print exactly one page per slide
//!  └─ 6. Assemble  append the pages, in order, into one PDF (lopdf)
//! ```
//!
//! Steps 2–5 share one headless Chrome session that is closed on every exit
//! path. Navigation is best effort: a slide that cannot be reached is logged
//! and captured as-is rather than failing the conversion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_html2pdf::{convert, ConversionConfig, FormatMode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ConversionConfig::builder()
//!         .format(FormatMode::Auto)
//!         .wait_time_ms(1000)
//!         .build()
//!         .unwrap();
//!     let result = convert("input/presentation.html", "output/deck.pdf", &config).await;
//!     if !result.success {
//!         eprintln!("{}", result.error.unwrap_or_default());
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-html2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Browser
//!
//! A Chrome or Chromium installation is required. It is located via
//! `CHROME_PATH`, the usual install locations and `PATH`; see the
//! `chrome-locate` crate.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod browser;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use browser::{ChromeLauncher, RenderSession, SessionLauncher};
pub use config::{
    ConversionConfig, ConversionConfigBuilder, DetectionPolicy, FormatMode, NavigationMethod,
};
pub use convert::{
    convert, convert_from_html, convert_from_html_with, convert_sync, convert_to_bytes,
    convert_with, convert_with_launcher, inspect, inspect_with,
};
pub use error::{Html2PdfError, SessionError, SlideError};
pub use output::{ConversionOutput, ConversionResult, ConversionStats, DeckInspection, SlideReport};
pub use pipeline::format::PageDimensions;
pub use pipeline::slides::DetectionMethod;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
