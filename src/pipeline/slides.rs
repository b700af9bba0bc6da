//! Slide detection: how many logical slides the deck has, and how we know.
//!
//! Detection is an ordered list of [`SlideDetectionStrategy`] objects:
//!
//! | # | strategy | signal |
//! |---|----------|--------|
//! | 1 | [`SelectorStrategy`] | configured selector, then [`BUILTIN_SELECTORS`] |
//! | 2 | [`IndicatorStrategy`] | navigation dots / pagination bullets |
//! | 3 | [`CounterStrategy`] | `current / total` text, total at most [`MAX_COUNTER_TOTAL`] |
//! | 4 | [`SinglePageFallback`] | always 1 |
//!
//! Under [`DetectionPolicy::FirstMatch`] the first strategy that reports a
//! non-zero count wins. Under [`DetectionPolicy::MaxCount`] every strategy
//! runs and the largest count wins, ties going to the earlier strategy.
//!
//! A resolved count of zero is a hard error ([`Html2PdfError::NoSlidesDetected`]).

use crate::browser::RenderSession;
use crate::config::{ConversionConfig, DetectionPolicy};
use crate::error::{Html2PdfError, SessionError};
use crate::pipeline::navigate::INDICATOR_SELECTOR;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, info, warn};

/// Common slide containers, tried after the configured selector.
pub const BUILTIN_SELECTORS: &[&str] = &[
    ".slide",
    "[data-slide]",
    "section",
    ".swiper-slide",
    ".reveal .slides section",
    ".step",
    ".page",
];

/// Elements that may hold a `current / total` counter.
pub const COUNTER_SELECTOR: &str = ".slide-counter, .slide-number";

/// Largest counter total accepted as a slide count. Anything above is page
/// text that merely looks like a counter and is ignored.
pub const MAX_COUNTER_TOTAL: usize = 1000;

static RE_COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*/\s*(\d+)").unwrap());

/// How the slide count was determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionMethod {
    /// Number of elements matching this selector.
    Selector(String),
    Indicators,
    Counter,
    SinglePage,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Selector(sel) => write!(f, "selector: {sel}"),
            DetectionMethod::Indicators => f.write_str("indicators"),
            DetectionMethod::Counter => f.write_str("counter"),
            DetectionMethod::SinglePage => f.write_str("single-page"),
        }
    }
}

impl Serialize for DetectionMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of slide detection. `total_count` is always ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedSlides {
    pub total_count: usize,
    pub method: DetectionMethod,
}

impl DetectedSlides {
    /// One descriptor per slide, in index order.
    pub fn descriptors(&self) -> impl Iterator<Item = SlideDescriptor<'_>> + '_ {
        (0..self.total_count).map(move |index| SlideDescriptor {
            index,
            total_count: self.total_count,
            method: &self.method,
        })
    }
}

/// A single slide position within a detected deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideDescriptor<'a> {
    /// 0-based.
    pub index: usize,
    pub total_count: usize,
    pub method: &'a DetectionMethod,
}

impl SlideDescriptor<'_> {
    /// 1-based, for display and progress events.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

// ── Strategies ───────────────────────────────────────────────────────────

/// One heuristic in the detection cascade.
///
/// `Ok(None)` means "no signal here"; the cascade moves on. A `Some` count of
/// zero is treated the same way.
pub trait SlideDetectionStrategy {
    fn name(&self) -> &'static str;

    fn try_detect(
        &self,
        session: &dyn RenderSession,
    ) -> Result<Option<DetectedSlides>, SessionError>;
}

/// Counts elements matching the configured selector, then the built-ins.
pub struct SelectorStrategy {
    selectors: Vec<String>,
}

impl SelectorStrategy {
    pub fn new(custom: &str) -> Self {
        let mut selectors = vec![custom.trim().to_string()];
        for builtin in BUILTIN_SELECTORS {
            if !selectors.iter().any(|s| s == builtin) {
                selectors.push((*builtin).to_string());
            }
        }
        Self { selectors }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

impl SlideDetectionStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn try_detect(
        &self,
        session: &dyn RenderSession,
    ) -> Result<Option<DetectedSlides>, SessionError> {
        for selector in &self.selectors {
            let count = session.count_elements(selector)?;
            debug!("Selector {:?} matched {} element(s)", selector, count);
            if count > 0 {
                return Ok(Some(DetectedSlides {
                    total_count: count,
                    method: DetectionMethod::Selector(selector.clone()),
                }));
            }
        }
        Ok(None)
    }
}

/// Counts indicator dots.
pub struct IndicatorStrategy;

impl SlideDetectionStrategy for IndicatorStrategy {
    fn name(&self) -> &'static str {
        "indicators"
    }

    fn try_detect(
        &self,
        session: &dyn RenderSession,
    ) -> Result<Option<DetectedSlides>, SessionError> {
        let count = session.count_elements(INDICATOR_SELECTOR)?;
        Ok((count > 0).then_some(DetectedSlides {
            total_count: count,
            method: DetectionMethod::Indicators,
        }))
    }
}

/// Parses the total out of a `3 / 12` style counter.
pub struct CounterStrategy;

impl SlideDetectionStrategy for CounterStrategy {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn try_detect(
        &self,
        session: &dyn RenderSession,
    ) -> Result<Option<DetectedSlides>, SessionError> {
        let Some(text) = session.text_content(COUNTER_SELECTOR)? else {
            return Ok(None);
        };
        let total = parse_counter_total(&text).filter(|&n| n > 0);
        if let Some(n) = total.filter(|&n| n > MAX_COUNTER_TOTAL) {
            warn!(
                "Ignoring slide counter total {} (above {})",
                n, MAX_COUNTER_TOTAL
            );
            return Ok(None);
        }
        Ok(total
            .map(|total_count| DetectedSlides {
                total_count,
                method: DetectionMethod::Counter,
            }))
    }
}

/// Always one slide: the whole document is the deck.
pub struct SinglePageFallback;

impl SlideDetectionStrategy for SinglePageFallback {
    fn name(&self) -> &'static str {
        "single-page"
    }

    fn try_detect(
        &self,
        _session: &dyn RenderSession,
    ) -> Result<Option<DetectedSlides>, SessionError> {
        Ok(Some(DetectedSlides {
            total_count: 1,
            method: DetectionMethod::SinglePage,
        }))
    }
}

/// Extract `total` from text containing `current / total`.
pub fn parse_counter_total(text: &str) -> Option<usize> {
    RE_COUNTER
        .captures(text)
        .and_then(|c| c[1].parse::<usize>().ok())
}

/// The default cascade, in priority order.
pub fn default_strategies(config: &ConversionConfig) -> Vec<Box<dyn SlideDetectionStrategy>> {
    vec![
        Box::new(SelectorStrategy::new(&config.slide_selector)),
        Box::new(IndicatorStrategy),
        Box::new(CounterStrategy),
        Box::new(SinglePageFallback),
    ]
}

// ── Entry point ──────────────────────────────────────────────────────────

/// Count the slides in the loaded document.
pub fn detect(
    session: &dyn RenderSession,
    config: &ConversionConfig,
) -> Result<DetectedSlides, Html2PdfError> {
    let strategies = default_strategies(config);
    detect_with(session, &strategies, config.detection_policy)
}

/// Run an explicit strategy list under `policy`.
pub fn detect_with(
    session: &dyn RenderSession,
    strategies: &[Box<dyn SlideDetectionStrategy>],
    policy: DetectionPolicy,
) -> Result<DetectedSlides, Html2PdfError> {
    let mut best: Option<DetectedSlides> = None;

    for strategy in strategies {
        let found = strategy
            .try_detect(session)?
            .filter(|d| d.total_count > 0);
        let Some(found) = found else {
            debug!("Detection strategy '{}' found nothing", strategy.name());
            continue;
        };
        debug!(
            "Detection strategy '{}' found {} slide(s)",
            strategy.name(),
            found.total_count
        );
        match policy {
            DetectionPolicy::FirstMatch => {
                best = Some(found);
                break;
            }
            DetectionPolicy::MaxCount => {
                if best
                    .as_ref()
                    .map_or(true, |b| found.total_count > b.total_count)
                {
                    best = Some(found);
                }
            }
        }
    }

    match best {
        Some(slides) => {
            info!(
                "Detected {} slide(s) using method: {}",
                slides.total_count, slides.method
            );
            Ok(slides)
        }
        None => Err(Html2PdfError::NoSlidesDetected),
    }
}
