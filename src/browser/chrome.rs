//! [`RenderSession`] backed by a headless Chrome/Chromium via `headless_chrome`.
//!
//! One browser process per session. DOM probes are small JavaScript
//! expressions; selectors and names are embedded as JSON string literals so
//! arbitrary user selectors cannot break out of the expression.

use super::{CaptureOptions, ElementSize, RenderSession, SessionLauncher};
use crate::config::ConversionConfig;
use crate::error::{Html2PdfError, SessionError};
use crate::pipeline::format::PageDimensions;
use headless_chrome::types::{Bounds, PrintToPdfOptions};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Extra Chrome flags for rendering local decks.
const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--hide-scrollbars",
];

/// Launches a fresh headless Chrome for every conversion.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Explicit path, then `chrome-locate`, then headless_chrome's own search.
    fn executable(config: &ConversionConfig) -> Option<PathBuf> {
        if let Some(ref path) = config.chrome_path {
            return Some(path.clone());
        }
        match chrome_locate::find_chrome() {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("chrome-locate: {}; deferring to headless_chrome discovery", e);
                None
            }
        }
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self, url: &Url, config: &ConversionConfig) -> Result<ChromeSession, Html2PdfError> {
        let executable = Self::executable(config);
        info!(
            "Launching headless browser{}",
            executable
                .as_ref()
                .map(|p| format!(" ({})", p.display()))
                .unwrap_or_default()
        );

        let args: Vec<&OsStr> = CHROME_ARGS.iter().map(OsStr::new).collect();
        // The DevTools connection must survive the longest single wait.
        let idle = Duration::from_secs(config.load_timeout_secs)
            + Duration::from_millis(config.wait_time_ms)
            + Duration::from_secs(60);
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(executable)
            .args(args)
            .idle_browser_timeout(idle)
            .build()
            .map_err(|e| Html2PdfError::BrowserLaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(options).map_err(|e| Html2PdfError::BrowserLaunchFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Html2PdfError::BrowserLaunchFailed(e.to_string()))?;

        let session = ChromeSession {
            browser: Some(browser),
            tab,
        };
        // A failed load drops `session`, which closes the browser.
        session.load(url, config.load_timeout_secs)?;
        Ok(session)
    }
}

/// A loaded document in a dedicated Chrome process.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    fn load(&self, url: &Url, timeout_secs: u64) -> Result<(), Html2PdfError> {
        debug!("Navigating to {}", url);
        self.tab.set_default_timeout(Duration::from_secs(timeout_secs));
        self.tab
            .navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| {
                let detail = e.to_string();
                if is_timeout(&detail) {
                    Html2PdfError::LoadTimeout {
                        url: url.to_string(),
                        secs: timeout_secs,
                    }
                } else {
                    Html2PdfError::LoadFailed {
                        url: url.to_string(),
                        detail,
                    }
                }
            })?;
        info!("Document loaded: {}", url);
        Ok(())
    }

    fn eval(&self, expression: &str) -> Result<Value, SessionError> {
        if self.browser.is_none() {
            return Err(SessionError::Disconnected("session already closed".into()));
        }
        let remote = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(remote.value.unwrap_or(Value::Null))
    }
}

/// JSON string literal for embedding in a script.
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn is_timeout(detail: &str) -> bool {
    let lower = detail.to_ascii_lowercase();
    lower.contains("timeout") || lower.contains("timed out") || lower.contains("never came")
}

#[derive(Deserialize)]
struct SizeProbe {
    width: f64,
    height: f64,
}

impl RenderSession for ChromeSession {
    fn set_viewport(&mut self, dims: PageDimensions) -> Result<(), SessionError> {
        debug!("Setting viewport to {}", dims);
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(dims.width)),
                height: Some(f64::from(dims.height)),
            })
            .map_err(|e| SessionError::Viewport(e.to_string()))?;
        Ok(())
    }

    fn meta_content(&self, name: &str) -> Result<Option<String>, SessionError> {
        let js = format!(
            "(() => {{ const m = document.querySelector('meta[name=' + JSON.stringify({}) + ']'); \
             return m ? m.getAttribute('content') : null; }})()",
            js_str(name)
        );
        Ok(self.eval(&js)?.as_str().map(str::to_string))
    }

    fn element_size(&self, selector: &str) -> Result<Option<ElementSize>, SessionError> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return null; \
             const s = window.getComputedStyle(el); \
             return JSON.stringify({{ width: parseInt(s.width) || 0, height: parseInt(s.height) || 0 }}); }})()",
            js_str(selector)
        );
        match self.eval(&js)? {
            Value::String(json) => {
                let probe: SizeProbe = serde_json::from_str(&json)
                    .map_err(|e| SessionError::Script(format!("size probe: {e}")))?;
                Ok(Some(ElementSize {
                    width: probe.width,
                    height: probe.height,
                }))
            }
            _ => Ok(None),
        }
    }

    fn count_elements(&self, selector: &str) -> Result<usize, SessionError> {
        let js = format!("document.querySelectorAll({}).length", js_str(selector));
        let value = self.eval(&js)?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| SessionError::Script(format!("expected a count, got {value}")))
    }

    fn text_content(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.textContent : null; }})()",
            js_str(selector)
        );
        Ok(self.eval(&js)?.as_str().map(str::to_string))
    }

    fn has_function(&self, name: &str) -> Result<bool, SessionError> {
        let js = format!("typeof window[{}] === 'function'", js_str(name));
        Ok(self.eval(&js)?.as_bool().unwrap_or(false))
    }

    fn call_function(&mut self, name: &str, index: usize) -> Result<(), SessionError> {
        let js = format!(
            "(() => {{ window[{}]({}); return true; }})()",
            js_str(name),
            index
        );
        self.eval(&js).map(|_| ())
    }

    fn click_element(&mut self, selector: &str, index: usize) -> Result<bool, SessionError> {
        let js = format!(
            "(() => {{ const el = document.querySelectorAll({})[{}]; \
             if (!el) return false; el.click(); return true; }})()",
            js_str(selector),
            index
        );
        Ok(self.eval(&js)?.as_bool().unwrap_or(false))
    }

    fn press_key(&mut self, key: &str) -> Result<(), SessionError> {
        self.tab
            .press_key(key)
            .map_err(|e| SessionError::Input(e.to_string()))?;
        Ok(())
    }

    fn print_page(&mut self, options: &CaptureOptions) -> Result<Vec<u8>, SessionError> {
        let margin = options.margin_in();
        let pdf_options = PrintToPdfOptions {
            print_background: Some(options.print_background),
            display_header_footer: Some(options.display_header_footer),
            prefer_css_page_size: Some(options.prefer_css_page_size),
            paper_width: Some(options.paper_width_in()),
            paper_height: Some(options.paper_height_in()),
            margin_top: Some(margin),
            margin_bottom: Some(margin),
            margin_left: Some(margin),
            margin_right: Some(margin),
            scale: Some(options.scale),
            page_ranges: Some(options.page_ranges.clone()),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(pdf_options))
            .map_err(|e| SessionError::Print(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = self.tab.close(false) {
                warn!("Failed to close tab cleanly: {}", e);
            }
            // Dropping the browser kills the Chrome process.
            drop(browser);
            debug!("Headless browser closed");
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_strings_are_escaped() {
        assert_eq!(js_str(".slide"), r#"".slide""#);
        assert_eq!(js_str(r#"a[title="x"]"#), r#""a[title=\"x\"]""#);
        assert_eq!(js_str("'); alert(1); ('"), r#""'); alert(1); ('""#);
    }

    #[test]
    fn timeout_errors_recognised() {
        assert!(is_timeout("The event waited for never came"));
        assert!(is_timeout("Navigation Timeout Exceeded"));
        assert!(is_timeout("request timed out"));
        assert!(!is_timeout("net::ERR_FILE_NOT_FOUND"));
    }
}
