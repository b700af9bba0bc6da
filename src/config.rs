//! Configuration types for HTML-deck-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. A config is immutable once a
//! conversion starts: every stage receives it by shared reference.
//!
//! # Design choice: builder over constructor
//! Most callers only care about one or two knobs (format, wait time). The
//! builder lets them set those and rely on documented defaults for the rest.

use crate::error::Html2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Landscape preset used for `horizontal` and as the final fallback.
pub const HORIZONTAL_PRESET: (u32, u32) = (1920, 1080);

/// Portrait preset used for `vertical`.
pub const VERTICAL_PRESET: (u32, u32) = (1080, 1920);

/// Configuration for an HTML-deck-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_html2pdf::{ConversionConfig, FormatMode};
///
/// let config = ConversionConfig::builder()
///     .format(FormatMode::Vertical)
///     .wait_time_ms(2000)
///     .slide_selector(".page")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Page format selection. Default: [`FormatMode::Auto`].
    pub format: FormatMode,

    /// Explicit page width in CSS pixels. Used only when `format` is not `Auto`.
    pub width: Option<u32>,

    /// Explicit page height in CSS pixels. Used only when `format` is not `Auto`.
    pub height: Option<u32>,

    /// Output quality, 1–100. Default: 100.
    ///
    /// Passed through to the renderer untouched; Chrome's vector PDF output
    /// has no quality knob, so the stock session ignores it.
    pub quality: u8,

    /// Settle time after each navigation, in milliseconds. Default: 1500.
    ///
    /// Also applied once after the initial load so entrance animations finish
    /// before slides are counted.
    pub wait_time_ms: u64,

    /// Delay between synthetic key presses, in milliseconds. Default: 100.
    pub key_delay_ms: u64,

    /// CSS selector tried before the built-in slide selectors. Default: `.slide`.
    pub slide_selector: String,

    /// Navigation strategy override. Default: [`NavigationMethod::Auto`].
    pub navigation_method: NavigationMethod,

    /// Uniform page margin in CSS pixels. Default: 0.
    pub margin: f64,

    /// Render scale factor applied at capture time (0.1–2.0). Default: 1.0.
    pub scale: f64,

    /// Hard ceiling on the initial document load, in seconds. Default: 60.
    pub load_timeout_secs: u64,

    /// How the slide-detection cascade picks a winner. Default: first match.
    pub detection_policy: DetectionPolicy,

    /// Explicit browser executable. If None, the executable is located
    /// automatically.
    pub chrome_path: Option<PathBuf>,

    /// Run Chrome with its sandbox enabled. Default: false.
    pub sandbox: bool,

    /// Optional per-slide progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: FormatMode::default(),
            width: None,
            height: None,
            quality: 100,
            wait_time_ms: 1500,
            key_delay_ms: 100,
            slide_selector: ".slide".to_string(),
            navigation_method: NavigationMethod::default(),
            margin: 0.0,
            scale: 1.0,
            load_timeout_secs: 60,
            detection_policy: DetectionPolicy::default(),
            chrome_path: None,
            sandbox: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("quality", &self.quality)
            .field("wait_time_ms", &self.wait_time_ms)
            .field("key_delay_ms", &self.key_delay_ms)
            .field("slide_selector", &self.slide_selector)
            .field("navigation_method", &self.navigation_method)
            .field("margin", &self.margin)
            .field("scale", &self.scale)
            .field("load_timeout_secs", &self.load_timeout_secs)
            .field("detection_policy", &self.detection_policy)
            .field("chrome_path", &self.chrome_path)
            .field("sandbox", &self.sandbox)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn format(mut self, format: FormatMode) -> Self {
        self.config.format = format;
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.config.width = Some(px);
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.config.height = Some(px);
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn wait_time_ms(mut self, ms: u64) -> Self {
        self.config.wait_time_ms = ms;
        self
    }

    pub fn key_delay_ms(mut self, ms: u64) -> Self {
        self.config.key_delay_ms = ms;
        self
    }

    pub fn slide_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.slide_selector = selector.into();
        self
    }

    pub fn navigation_method(mut self, method: NavigationMethod) -> Self {
        self.config.navigation_method = method;
        self
    }

    pub fn margin(mut self, px: f64) -> Self {
        self.config.margin = px;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.config.scale = if scale.is_finite() {
            scale.clamp(0.1, 2.0)
        } else {
            scale
        };
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.load_timeout_secs = secs;
        self
    }

    pub fn detection_policy(mut self, policy: DetectionPolicy) -> Self {
        self.config.detection_policy = policy;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Html2PdfError> {
        let c = &self.config;
        if c.width == Some(0) || c.height == Some(0) {
            return Err(Html2PdfError::InvalidConfig(
                "Page width and height must be positive".into(),
            ));
        }
        if !c.scale.is_finite() {
            return Err(Html2PdfError::InvalidConfig(format!(
                "Scale must be a finite number, got {}",
                c.scale
            )));
        }
        if !c.margin.is_finite() || c.margin < 0.0 {
            return Err(Html2PdfError::InvalidConfig(format!(
                "Margin must be a non-negative number, got {}",
                c.margin
            )));
        }
        if c.slide_selector.trim().is_empty() {
            return Err(Html2PdfError::InvalidConfig(
                "Slide selector must not be empty".into(),
            ));
        }
        if c.load_timeout_secs == 0 {
            return Err(Html2PdfError::InvalidConfig(
                "Load timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How page dimensions are chosen.
///
/// | Mode | Behaviour |
/// |------|-----------|
/// | `Auto` | Inspect the live document (viewport meta, first slide, body aspect) |
/// | `Horizontal` | Fixed landscape page: explicit width/height, else 1920×1080 |
/// | `Vertical` | Fixed portrait page: explicit width/height, else 1080×1920 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatMode {
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

impl FormatMode {
    /// The preset dimensions of a fixed mode; `None` for `Auto`.
    pub fn preset(self) -> Option<(u32, u32)> {
        match self {
            FormatMode::Auto => None,
            FormatMode::Horizontal => Some(HORIZONTAL_PRESET),
            FormatMode::Vertical => Some(VERTICAL_PRESET),
        }
    }
}

impl FromStr for FormatMode {
    type Err = Html2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FormatMode::Auto),
            "horizontal" | "landscape" => Ok(FormatMode::Horizontal),
            "vertical" | "portrait" => Ok(FormatMode::Vertical),
            other => Err(Html2PdfError::InvalidConfig(format!(
                "Unknown format '{other}' (expected auto, horizontal or vertical)"
            ))),
        }
    }
}

/// Which navigation strategies the navigator may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationMethod {
    /// Exposed function, then indicator click, then key presses. (default)
    #[default]
    Auto,
    /// Click the indicator dot at the slide's position.
    Dots,
    /// Call a navigation function exposed on `window`.
    Function,
    /// Synthesise Home / ArrowRight key presses.
    ArrowKeys,
}

impl FromStr for NavigationMethod {
    type Err = Html2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(NavigationMethod::Auto),
            "dots" => Ok(NavigationMethod::Dots),
            "function" => Ok(NavigationMethod::Function),
            "arrow-keys" | "arrows" | "keys" => Ok(NavigationMethod::ArrowKeys),
            other => Err(Html2PdfError::InvalidConfig(format!(
                "Unknown navigation method '{other}' (expected auto, dots, function or arrow-keys)"
            ))),
        }
    }
}

/// How the slide-detection cascade resolves competing signals.
///
/// Mixed-signal documents (e.g. three `.slide` elements next to five dots)
/// disagree between the two policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionPolicy {
    /// Strategies run in priority order; the first non-empty one wins. (default)
    #[default]
    FirstMatch,
    /// Every strategy runs; the largest count wins, ties to the earlier one.
    MaxCount,
}

impl FromStr for DetectionPolicy {
    type Err = Html2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-match" | "first" => Ok(DetectionPolicy::FirstMatch),
            "max-count" | "max" => Ok(DetectionPolicy::MaxCount),
            other => Err(Html2PdfError::InvalidConfig(format!(
                "Unknown detection policy '{other}' (expected first-match or max-count)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.format, FormatMode::Auto);
        assert_eq!(c.wait_time_ms, 1500);
        assert_eq!(c.slide_selector, ".slide");
        assert_eq!(c.navigation_method, NavigationMethod::Auto);
        assert_eq!(c.load_timeout_secs, 60);
        assert_eq!(c.scale, 1.0);
        assert_eq!(c.margin, 0.0);
        assert_eq!(c.quality, 100);
    }

    #[test]
    fn builder_clamps_scale_and_quality() {
        let c = ConversionConfig::builder()
            .scale(5.0)
            .quality(0)
            .build()
            .unwrap();
        assert_eq!(c.scale, 2.0);
        assert_eq!(c.quality, 1);
    }

    #[test]
    fn builder_rejects_zero_dimension() {
        let err = ConversionConfig::builder().width(0).build().unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_negative_margin() {
        assert!(ConversionConfig::builder().margin(-1.0).build().is_err());
    }

    #[test]
    fn builder_rejects_nan_scale() {
        assert!(ConversionConfig::builder().scale(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_blank_selector() {
        assert!(ConversionConfig::builder().slide_selector("  ").build().is_err());
    }

    #[test]
    fn parse_enums() {
        assert_eq!("vertical".parse::<FormatMode>().unwrap(), FormatMode::Vertical);
        assert_eq!("AUTO".parse::<FormatMode>().unwrap(), FormatMode::Auto);
        assert!("diagonal".parse::<FormatMode>().is_err());
        assert_eq!(
            "arrow-keys".parse::<NavigationMethod>().unwrap(),
            NavigationMethod::ArrowKeys
        );
        assert_eq!(
            "max-count".parse::<DetectionPolicy>().unwrap(),
            DetectionPolicy::MaxCount
        );
    }

    #[test]
    fn presets() {
        assert_eq!(FormatMode::Auto.preset(), None);
        assert_eq!(FormatMode::Horizontal.preset(), Some((1920, 1080)));
        assert_eq!(FormatMode::Vertical.preset(), Some((1080, 1920)));
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", ConversionConfig::default());
        assert!(dbg.contains("progress_callback: None"));
    }
}
