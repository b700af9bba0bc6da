//! Navigation: make the document show slide `i`.
//!
//! Strategies are tried in order until one reports success:
//!
//! 1. [`FunctionNavigator`] calls the first of [`NAVIGATION_FUNCTIONS`] that
//!    exists on `window`
//! 2. [`IndicatorClickNavigator`] clicks the `i`-th indicator dot
//! 3. [`KeyPressNavigator`] presses `Home`, then `ArrowRight` `i` times
//!
//! A forced [`NavigationMethod`] narrows the list to one strategy. Failures
//! never abort the conversion: a strategy that errors is logged and skipped,
//! and if nothing works the slide is captured in whatever state the document
//! is in. The outcome is returned so the caller can report it.
//!
//! The key-press strategy rewinds to the first slide before stepping forward,
//! so it lands on `i` regardless of where an earlier strategy or the page's
//! own scripts left the deck.

use crate::browser::RenderSession;
use crate::config::{ConversionConfig, NavigationMethod};
use crate::error::SessionError;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Indicator dots / pagination bullets, in document order.
pub const INDICATOR_SELECTOR: &str = ".indicator-dot, .dot, .pagination-bullet";

/// Global functions recognised as "go to slide N".
pub const NAVIGATION_FUNCTIONS: &[&str] = &["showSlide", "goToSlide", "navigateToSlide"];

/// One way of moving the deck to a slide.
pub trait NavigationStrategy {
    fn name(&self) -> &'static str;

    /// `Ok(true)` if the strategy applied, `Ok(false)` if the document does
    /// not support it.
    fn try_navigate(
        &self,
        session: &mut dyn RenderSession,
        index: usize,
        config: &ConversionConfig,
    ) -> Result<bool, SessionError>;
}

pub struct FunctionNavigator;

impl NavigationStrategy for FunctionNavigator {
    fn name(&self) -> &'static str {
        "function"
    }

    fn try_navigate(
        &self,
        session: &mut dyn RenderSession,
        index: usize,
        _config: &ConversionConfig,
    ) -> Result<bool, SessionError> {
        for name in NAVIGATION_FUNCTIONS {
            if session.has_function(name)? {
                debug!("Calling {}({})", name, index);
                session.call_function(name, index)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub struct IndicatorClickNavigator;

impl NavigationStrategy for IndicatorClickNavigator {
    fn name(&self) -> &'static str {
        "dots"
    }

    fn try_navigate(
        &self,
        session: &mut dyn RenderSession,
        index: usize,
        _config: &ConversionConfig,
    ) -> Result<bool, SessionError> {
        session.click_element(INDICATOR_SELECTOR, index)
    }
}

pub struct KeyPressNavigator;

impl NavigationStrategy for KeyPressNavigator {
    fn name(&self) -> &'static str {
        "arrow-keys"
    }

    fn try_navigate(
        &self,
        session: &mut dyn RenderSession,
        index: usize,
        config: &ConversionConfig,
    ) -> Result<bool, SessionError> {
        let delay = Duration::from_millis(config.key_delay_ms);
        session.press_key("Home")?;
        for _ in 0..index {
            thread::sleep(delay);
            session.press_key("ArrowRight")?;
        }
        Ok(true)
    }
}

/// Strategies allowed by `method`, in the order they are tried.
pub fn strategies_for(method: NavigationMethod) -> Vec<Box<dyn NavigationStrategy>> {
    match method {
        NavigationMethod::Auto => vec![
            Box::new(FunctionNavigator),
            Box::new(IndicatorClickNavigator),
            Box::new(KeyPressNavigator),
        ],
        NavigationMethod::Function => vec![Box::new(FunctionNavigator)],
        NavigationMethod::Dots => vec![Box::new(IndicatorClickNavigator)],
        NavigationMethod::ArrowKeys => vec![Box::new(KeyPressNavigator)],
    }
}

/// What happened when navigating to one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The named strategy applied.
    Navigated(&'static str),
    /// Nothing applied; the detail lists what was tried.
    Unresolved(String),
}

impl NavigationOutcome {
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            NavigationOutcome::Navigated(name) => Some(name),
            NavigationOutcome::Unresolved(_) => None,
        }
    }
}

/// Drive the document to slide `index` (0-based). Never fails.
pub fn navigate_to(
    session: &mut dyn RenderSession,
    index: usize,
    config: &ConversionConfig,
) -> NavigationOutcome {
    let strategies = strategies_for(config.navigation_method);
    navigate_with(session, &strategies, index, config)
}

/// [`navigate_to`] over an explicit strategy list.
pub fn navigate_with(
    session: &mut dyn RenderSession,
    strategies: &[Box<dyn NavigationStrategy>],
    index: usize,
    config: &ConversionConfig,
) -> NavigationOutcome {
    let mut tried = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        match strategy.try_navigate(session, index, config) {
            Ok(true) => {
                debug!("Slide {}: navigated via {}", index + 1, strategy.name());
                return NavigationOutcome::Navigated(strategy.name());
            }
            Ok(false) => {
                debug!("Slide {}: {} not supported", index + 1, strategy.name());
                tried.push(format!("{}: unsupported", strategy.name()));
            }
            Err(e) => {
                debug!("Slide {}: {} failed: {}", index + 1, strategy.name(), e);
                tried.push(format!("{}: {}", strategy.name(), e));
            }
        }
    }

    let detail = if tried.is_empty() {
        "no navigation strategy configured".to_string()
    } else {
        tried.join("; ")
    };
    warn!(
        "Could not navigate to slide {} ({}); capturing current state",
        index + 1,
        detail
    );
    NavigationOutcome::Unresolved(detail)
}
