//! Format detection: decide the page size every slide is printed at.
//!
//! A fixed format (`horizontal`/`vertical`) short-circuits everything: the
//! explicit width/height, or the mode's preset, is returned without touching
//! the document. In `auto` mode the detector probes the live document, in
//! order, until one source yields a positive size:
//!
//! 1. `<meta name="viewport">` carrying numeric `width=` **and** `height=`
//! 2. the computed CSS box of the first slide-like element
//! 3. the computed CSS box of `<body>`, reduced to an orientation by aspect
//!    ratio (> 1.3 → landscape preset, otherwise portrait preset)
//! 4. landscape preset
//!
//! Every probe is read-only; the detector never changes document state.

use crate::browser::RenderSession;
use crate::config::{ConversionConfig, FormatMode, HORIZONTAL_PRESET, VERTICAL_PRESET};
use crate::error::Html2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Elements whose box is taken as "the slide size" in auto mode.
pub const FIRST_SLIDE_SELECTOR: &str = ".slide, [data-slide], section";

/// Body aspect ratios strictly above this are treated as landscape.
pub const LANDSCAPE_RATIO: f64 = 1.3;

/// Page size in CSS pixels. Both sides are always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: u32,
    pub height: u32,
}

impl PageDimensions {
    /// `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn landscape() -> Self {
        Self {
            width: HORIZONTAL_PRESET.0,
            height: HORIZONTAL_PRESET.1,
        }
    }

    pub fn portrait() -> Self {
        Self {
            width: VERTICAL_PRESET.0,
            height: VERTICAL_PRESET.1,
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.width >= self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl fmt::Display for PageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Implied by width vs. height; square pages count as landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Where the detected dimensions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatSource {
    /// Fixed by configuration.
    Configured,
    ViewportMeta,
    SlideElement,
    BodyAspect,
    Fallback,
}

/// Pick the page size for this conversion.
pub fn detect(
    session: &dyn RenderSession,
    config: &ConversionConfig,
) -> Result<(PageDimensions, FormatSource), Html2PdfError> {
    if let Some(preset) = config.format.preset() {
        let dims = configured_dimensions(config.format, config.width, config.height, preset);
        info!("Using configured format: {} ({:?})", dims, config.format);
        return Ok((dims, FormatSource::Configured));
    }

    let (dims, source) = detect_auto(session)?;
    info!("Detected format: {} (from {:?})", dims, source);
    Ok((dims, source))
}

/// Explicit dimensions win when both are given; a single explicit side is
/// completed from the preset.
fn configured_dimensions(
    mode: FormatMode,
    width: Option<u32>,
    height: Option<u32>,
    preset: (u32, u32),
) -> PageDimensions {
    let w = width.filter(|&w| w > 0).unwrap_or(preset.0);
    let h = height.filter(|&h| h > 0).unwrap_or(preset.1);
    debug!("Configured {:?}: {}x{}", mode, w, h);
    PageDimensions { width: w, height: h }
}

fn detect_auto(session: &dyn RenderSession) -> Result<(PageDimensions, FormatSource), Html2PdfError> {
    if let Some(content) = session.meta_content("viewport")? {
        if let Some(dims) = parse_viewport_meta(&content) {
            return Ok((dims, FormatSource::ViewportMeta));
        }
        debug!("Viewport meta has no explicit size: {:?}", content);
    }

    if let Some(size) = session.element_size(FIRST_SLIDE_SELECTOR)? {
        if size.is_positive() {
            let dims = PageDimensions {
                width: size.width as u32,
                height: size.height as u32,
            };
            return Ok((dims, FormatSource::SlideElement));
        }
    }

    if let Some(size) = session.element_size("body")? {
        if size.is_positive() {
            return Ok((
                orientation_from_aspect(size.width, size.height),
                FormatSource::BodyAspect,
            ));
        }
    }

    Ok((PageDimensions::landscape(), FormatSource::Fallback))
}

static RE_VIEWPORT_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwidth\s*=\s*(\d+)").unwrap());
static RE_VIEWPORT_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bheight\s*=\s*(\d+)").unwrap());

/// Extract `width=N, height=M` from a viewport `content` attribute.
///
/// Both must be present and positive; `width=device-width` yields `None`.
pub fn parse_viewport_meta(content: &str) -> Option<PageDimensions> {
    let width = RE_VIEWPORT_WIDTH
        .captures(content)
        .and_then(|c| c[1].parse::<u32>().ok())?;
    let height = RE_VIEWPORT_HEIGHT
        .captures(content)
        .and_then(|c| c[1].parse::<u32>().ok())?;
    PageDimensions::new(width, height)
}

/// Collapse a body box to one of the two presets.
pub fn orientation_from_aspect(width: f64, height: f64) -> PageDimensions {
    if width / height > LANDSCAPE_RATIO {
        PageDimensions::landscape()
    } else {
        PageDimensions::portrait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeSession;

    fn auto() -> ConversionConfig {
        ConversionConfig::default()
    }

    #[test]
    fn viewport_meta_parsing() {
        assert_eq!(
            parse_viewport_meta("width=1280, height=720"),
            PageDimensions::new(1280, 720)
        );
        assert_eq!(
            parse_viewport_meta("initial-scale=1, height = 1920, width = 1080"),
            PageDimensions::new(1080, 1920)
        );
        assert_eq!(parse_viewport_meta("width=device-width, initial-scale=1"), None);
        assert_eq!(parse_viewport_meta("width=1280"), None);
        assert_eq!(parse_viewport_meta("width=0, height=720"), None);
    }

    #[test]
    fn fixed_vertical_uses_explicit_dimensions_unconditionally() {
        // Document CSS says landscape; configuration wins without inspection.
        let mut session = FakeSession::new()
            .with_meta("viewport", "width=1920, height=1080")
            .with_size(FIRST_SLIDE_SELECTOR, 1920.0, 1080.0);
        session.broken_scripts = true;
        let config = ConversionConfig::builder()
            .format(FormatMode::Vertical)
            .width(1080)
            .height(1920)
            .build()
            .unwrap();

        let (dims, source) = detect(&session, &config).unwrap();
        assert_eq!(dims, PageDimensions::new(1080, 1920).unwrap());
        assert_eq!(source, FormatSource::Configured);
    }

    #[test]
    fn fixed_modes_fall_back_to_presets() {
        let session = FakeSession::new();
        let vertical = ConversionConfig::builder()
            .format(FormatMode::Vertical)
            .build()
            .unwrap();
        assert_eq!(detect(&session, &vertical).unwrap().0, PageDimensions::portrait());

        let horizontal = ConversionConfig::builder()
            .format(FormatMode::Horizontal)
            .height(900)
            .build()
            .unwrap();
        assert_eq!(
            detect(&session, &horizontal).unwrap().0,
            PageDimensions::new(1920, 900).unwrap()
        );
    }

    #[test]
    fn auto_ignores_explicit_dimensions() {
        let session = FakeSession::new();
        let config = ConversionConfig::builder().width(800).height(600).build().unwrap();
        let (dims, source) = detect(&session, &config).unwrap();
        assert_eq!(dims, PageDimensions::landscape());
        assert_eq!(source, FormatSource::Fallback);
    }

    #[test]
    fn viewport_meta_wins_over_slide_size() {
        let session = FakeSession::new()
            .with_meta("viewport", "width=1024, height=768")
            .with_size(FIRST_SLIDE_SELECTOR, 1920.0, 1080.0);
        let (dims, source) = detect(&session, &auto()).unwrap();
        assert_eq!(dims, PageDimensions::new(1024, 768).unwrap());
        assert_eq!(source, FormatSource::ViewportMeta);
    }

    #[test]
    fn slide_element_size_used_when_meta_lacks_size() {
        let session = FakeSession::new()
            .with_meta("viewport", "width=device-width")
            .with_size(FIRST_SLIDE_SELECTOR, 1280.0, 720.0);
        let (dims, source) = detect(&session, &auto()).unwrap();
        assert_eq!(dims, PageDimensions::new(1280, 720).unwrap());
        assert_eq!(source, FormatSource::SlideElement);
    }

    #[test]
    fn zero_sized_slide_falls_through_to_body() {
        let session = FakeSession::new()
            .with_size(FIRST_SLIDE_SELECTOR, 0.0, 720.0)
            .with_size("body", 400.0, 800.0);
        let (dims, source) = detect(&session, &auto()).unwrap();
        assert_eq!(dims, PageDimensions::portrait());
        assert_eq!(source, FormatSource::BodyAspect);
    }

    #[test]
    fn body_aspect_thresholds() {
        assert_eq!(orientation_from_aspect(1600.0, 900.0), PageDimensions::landscape());
        // Exactly 1.3 is not "greater than".
        assert_eq!(orientation_from_aspect(1300.0, 1000.0), PageDimensions::portrait());
        assert_eq!(orientation_from_aspect(1000.0, 1000.0), PageDimensions::portrait());
    }

    #[test]
    fn probe_failure_propagates() {
        let mut session = FakeSession::new();
        session.broken_scripts = true;
        assert!(detect(&session, &auto()).is_err());
    }

    #[test]
    fn orientation_from_dimensions() {
        assert_eq!(PageDimensions::landscape().orientation(), Orientation::Landscape);
        assert_eq!(PageDimensions::portrait().orientation(), Orientation::Portrait);
        assert_eq!(PageDimensions::new(5, 0), None);
        assert_eq!(PageDimensions::landscape().to_string(), "1920x1080");
    }
}
