//! The rendering collaborator: a live, script-capable document session.
//!
//! The pipeline never talks to a browser directly. Every stage receives a
//! [`RenderSession`] by reference, which keeps per-conversion navigation state
//! explicit (one session per conversion, nothing global) and lets tests drive
//! the heuristics against a scripted in-memory document.
//!
//! ```text
//! SessionLauncher::launch ──▶ RenderSession ──▶ SessionGuard (close on drop)
//!                               │
//!            format / slides ◀──┤ read-only DOM probes
//!            navigate        ◀──┤ function calls, clicks, key presses
//!            capture         ◀──┘ print_page
//! ```
//!
//! [`chrome`] provides the production implementation on top of
//! `headless_chrome`.

pub mod chrome;
#[cfg(test)]
pub(crate) mod fake;

use crate::config::ConversionConfig;
use crate::error::{Html2PdfError, SessionError};
use crate::pipeline::format::PageDimensions;
use std::ops::{Deref, DerefMut};
use tracing::debug;
use url::Url;

pub use chrome::{ChromeLauncher, ChromeSession};

/// CSS pixels per inch, as used by every browser print pipeline.
pub const CSS_PX_PER_INCH: f64 = 96.0;

/// Computed CSS box size of an element, truncated to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementSize {
    pub width: f64,
    pub height: f64,
}

impl ElementSize {
    /// Both sides are at least one pixel.
    pub fn is_positive(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }
}

/// Parameters for a single-page snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Forced page width in CSS pixels.
    pub width_px: u32,
    /// Forced page height in CSS pixels.
    pub height_px: u32,
    /// Uniform margin on all four sides, in CSS pixels.
    pub margin_px: f64,
    /// Render scale factor.
    pub scale: f64,
    /// Reserved quality hint, passed through untouched.
    pub quality: u8,
    /// Paint CSS backgrounds.
    pub print_background: bool,
    /// Restrict output to these pages of the would-be print document.
    pub page_ranges: String,
    /// Let the document's `@page` size win over `width_px`/`height_px`.
    pub prefer_css_page_size: bool,
    /// Print header/footer decoration.
    pub display_header_footer: bool,
}

impl CaptureOptions {
    /// Snapshot options for one slide at `dims`.
    pub fn for_page(dims: PageDimensions, config: &ConversionConfig) -> Self {
        Self {
            width_px: dims.width,
            height_px: dims.height,
            margin_px: config.margin,
            scale: config.scale,
            quality: config.quality,
            print_background: true,
            page_ranges: "1".to_string(),
            prefer_css_page_size: false,
            display_header_footer: false,
        }
    }

    pub fn paper_width_in(&self) -> f64 {
        f64::from(self.width_px) / CSS_PX_PER_INCH
    }

    pub fn paper_height_in(&self) -> f64 {
        f64::from(self.height_px) / CSS_PX_PER_INCH
    }

    pub fn margin_in(&self) -> f64 {
        self.margin_px / CSS_PX_PER_INCH
    }
}

/// A loaded document that can be probed, driven and printed.
///
/// Probes take `&self` and must not mutate the document. Actions take
/// `&mut self`: they change what the document shows, so two actions on the
/// same session can never interleave.
pub trait RenderSession: Send {
    /// Resize the layout viewport.
    fn set_viewport(&mut self, dims: PageDimensions) -> Result<(), SessionError>;

    /// `content` attribute of `<meta name="{name}">`, if present.
    fn meta_content(&self, name: &str) -> Result<Option<String>, SessionError>;

    /// Computed width/height of the first element matching `selector`.
    ///
    /// Values follow `parseInt` semantics: non-numeric lengths (`auto`) come
    /// back as 0.
    fn element_size(&self, selector: &str) -> Result<Option<ElementSize>, SessionError>;

    /// Number of elements matching `selector`.
    fn count_elements(&self, selector: &str) -> Result<usize, SessionError>;

    /// Text content of the first element matching `selector`.
    fn text_content(&self, selector: &str) -> Result<Option<String>, SessionError>;

    /// Whether `window[name]` is a function.
    fn has_function(&self, name: &str) -> Result<bool, SessionError>;

    /// Call `window[name](index)`.
    fn call_function(&mut self, name: &str, index: usize) -> Result<(), SessionError>;

    /// Click the `index`-th element matching `selector`. Returns `false` when
    /// there is no such element.
    fn click_element(&mut self, selector: &str, index: usize) -> Result<bool, SessionError>;

    /// Dispatch a key press (`"Home"`, `"ArrowRight"`, …) to the page.
    fn press_key(&mut self, key: &str) -> Result<(), SessionError>;

    /// Print the current document state to a PDF byte buffer.
    fn print_page(&mut self, options: &CaptureOptions) -> Result<Vec<u8>, SessionError>;

    /// Release the underlying browser resources. Must be idempotent.
    fn close(&mut self);
}

/// Opens a document in a fresh, independent session.
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: RenderSession + 'static;

    /// Load `url` and return once the document is ready, failing with
    /// [`Html2PdfError::LoadTimeout`] after `config.load_timeout_secs`.
    fn launch(&self, url: &Url, config: &ConversionConfig) -> Result<Self::Session, Html2PdfError>;
}

/// Owns a session and closes it when dropped.
///
/// Early returns, `?` propagation and panics all drop the guard, so the
/// browser process is released on every exit path.
pub struct SessionGuard<S: RenderSession> {
    session: S,
}

impl<S: RenderSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: RenderSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: RenderSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: RenderSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.session.close();
        debug!("Rendering session released");
    }
}
