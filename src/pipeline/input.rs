//! Input resolution: turn a user-supplied path into a loadable `file://` URL.
//!
//! Validation happens here, before any browser is started, so a missing or
//! unreadable file fails fast and cheaply.

use crate::config::FormatMode;
use crate::error::Html2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// File extensions accepted as HTML documents (case-insensitive).
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// A validated local HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// `file://` URL of `path`.
    pub url: Url,
}

/// Check that `path` is an existing, readable HTML file and build its URL.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<ResolvedInput, Html2PdfError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Html2PdfError::FileNotFound { path });
    }
    if !is_html_path(&path) {
        return Err(Html2PdfError::NotHtml { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Html2PdfError::PermissionDenied { path });
        }
        Err(_) => return Err(Html2PdfError::FileNotFound { path }),
    }

    let canonical = path
        .canonicalize()
        .map_err(|_| Html2PdfError::FileNotFound { path: path.clone() })?;
    let url = Url::from_file_path(&canonical).map_err(|()| Html2PdfError::InvalidInput {
        input: canonical.display().to_string(),
    })?;

    debug!("Resolved input: {}", url);
    Ok(ResolvedInput {
        path: canonical,
        url,
    })
}

/// Whether the extension is one of [`HTML_EXTENSIONS`].
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| HTML_EXTENSIONS.iter().any(|h| e.eq_ignore_ascii_case(h)))
        .unwrap_or(false)
}

static RE_HORIZONTAL_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"width\s*=\s*1920\b|\b16\s*:\s*9\b").unwrap());
static RE_VERTICAL_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"width\s*=\s*1080\b|\b9\s*:\s*16\b").unwrap());

/// Guess the intended orientation from the HTML source alone.
///
/// Looks for `width=1920` / `16:9` (horizontal) or `width=1080` / `9:16`
/// (vertical). Advisory: the live format detector always has the final say.
pub fn sniff_format_hint(html: &str) -> FormatMode {
    if RE_HORIZONTAL_HINT.is_match(html) {
        FormatMode::Horizontal
    } else if RE_VERTICAL_HINT.is_match(html) {
        FormatMode::Vertical
    } else {
        FormatMode::Auto
    }
}
