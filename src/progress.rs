//! Progress-callback trait for per-slide conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the capturer walks the deck.
//!
//! # Example
//!
//! ```rust
//! use edgequake_html2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captured: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_slide_captured(&self, slide_num: usize, total_slides: usize, bytes: usize) {
//!         self.captured.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Slide {}/{} captured ({} bytes)", slide_num, total_slides, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     captured: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each slide.
///
/// Slides are captured strictly in order on a single blocking thread, but the
/// callback is shared through an `Arc` and may outlive that thread, so
/// implementations must be `Send + Sync`. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after slide detection, before the first capture.
    fn on_conversion_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called before navigating to a slide.
    ///
    /// # Arguments
    /// * `slide_num`    — 1-indexed slide number
    /// * `total_slides` — detected slide count
    fn on_slide_start(&self, slide_num: usize, total_slides: usize) {
        let _ = (slide_num, total_slides);
    }

    /// Called when every navigation strategy failed for a slide. The slide is
    /// still captured afterwards.
    fn on_navigation_warning(&self, slide_num: usize, total_slides: usize, detail: &str) {
        let _ = (slide_num, total_slides, detail);
    }

    /// Called after a slide snapshot is produced.
    ///
    /// # Arguments
    /// * `bytes` — size of the single-page PDF artifact
    fn on_slide_captured(&self, slide_num: usize, total_slides: usize, bytes: usize) {
        let _ = (slide_num, total_slides, bytes);
    }

    /// Called once after every slide has been captured and merged.
    fn on_conversion_complete(&self, total_slides: usize, captured: usize) {
        let _ = (total_slides, captured);
    }

    /// Called once when the pipeline stops on a fatal error. No further
    /// events follow.
    fn on_conversion_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
