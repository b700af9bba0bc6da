//! # chrome-locate
//!
//! Find an installed Chrome or Chromium executable so that callers of
//! `headless_chrome` do not have to pass a browser path by hand.
//!
//! ## How it works
//!
//! [`find_chrome`] checks, in order:
//!
//! 1. The `CHROME_PATH` environment variable (must point to an existing file).
//! 2. Well-known install locations for the current platform.
//! 3. Every directory on `PATH`, looking for the usual executable names.
//!
//! The first hit is cached for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! match chrome_locate::find_chrome() {
//!     Ok(path) => println!("using {}", path.display()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! ## Platform support
//!
//! | OS      | Locations checked                                             |
//! |---------|---------------------------------------------------------------|
//! | macOS   | `/Applications/*.app`, `~/Applications/*.app`                 |
//! | Linux   | `/usr/bin`, `/usr/local/bin`, `/snap/bin`, `/opt/google`      |
//! | Windows | `%ProgramFiles%`, `%ProgramFiles(x86)%`, `%LOCALAPPDATA%`     |

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides every other lookup.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum ChromeLocateError {
    /// The current OS is not one we know install locations for.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// `CHROME_PATH` was set but does not point to a file.
    #[error("CHROME_PATH points to '{path}', which does not exist")]
    EnvPathMissing { path: PathBuf },

    /// Nothing was found anywhere.
    #[error(
        "No Chrome/Chromium executable found (searched {searched} locations).\n\
Install Google Chrome or Chromium, or set CHROME_PATH=/path/to/chrome."
    )]
    NotFound { searched: usize },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Absolute install locations, most preferred first.
    install_paths: Vec<PathBuf>,
    /// Executable names to look for on `PATH`.
    exe_names: &'static [&'static str],
}

fn detect_platform() -> Result<PlatformInfo, ChromeLocateError> {
    match std::env::consts::OS {
        "macos" => {
            let bundles = [
                "Google Chrome.app/Contents/MacOS/Google Chrome",
                "Chromium.app/Contents/MacOS/Chromium",
                "Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
                "Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            ];
            let mut install_paths: Vec<PathBuf> = bundles
                .iter()
                .map(|b| Path::new("/Applications").join(b))
                .collect();
            if let Some(home) = dirs::home_dir() {
                install_paths.extend(bundles.iter().map(|b| home.join("Applications").join(b)));
            }
            Ok(PlatformInfo {
                install_paths,
                exe_names: &["chromium", "google-chrome"],
            })
        }
        "linux" => Ok(PlatformInfo {
            install_paths: [
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/usr/local/bin/chromium",
                "/snap/bin/chromium",
                "/opt/google/chrome/chrome",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            exe_names: &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
                "chrome",
            ],
        }),
        "windows" => {
            let suffixes = [
                r"Google\Chrome\Application\chrome.exe",
                r"Chromium\Application\chrome.exe",
                r"Microsoft\Edge\Application\msedge.exe",
            ];
            let mut roots: Vec<PathBuf> = ["ProgramFiles", "ProgramFiles(x86)"]
                .iter()
                .filter_map(|var| std::env::var_os(var).map(PathBuf::from))
                .collect();
            if let Some(local) = dirs::data_local_dir() {
                roots.push(local);
            }
            let install_paths = roots
                .iter()
                .flat_map(|root| suffixes.iter().map(move |s| root.join(s)))
                .collect();
            Ok(PlatformInfo {
                install_paths,
                exe_names: &["chrome.exe", "msedge.exe"],
            })
        }
        os => Err(ChromeLocateError::UnsupportedPlatform { os: os.to_string() }),
    }
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path of a Chrome/Chromium executable.
///
/// Honours `CHROME_PATH` first; an env var pointing at a missing file is an
/// error rather than a silent fallback, so typos surface immediately.
///
/// # Thread safety
///
/// Safe to call from multiple threads; the filesystem search runs at most a
/// handful of times and the result is cached after the first success.
pub fn find_chrome() -> Result<PathBuf, ChromeLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` if [`find_chrome`] would succeed.
pub fn is_chrome_available() -> bool {
    find_chrome().is_ok()
}

/// Every candidate path this platform would try, in lookup order.
///
/// Does not touch the filesystem; useful for error reports and `--verbose`.
pub fn candidate_paths() -> Vec<PathBuf> {
    let Ok(info) = detect_platform() else {
        return Vec::new();
    };
    let mut out = info.install_paths;
    out.extend(path_candidates(
        std::env::var_os("PATH").as_deref(),
        info.exe_names,
    ));
    out
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve() -> Result<PathBuf, ChromeLocateError> {
    if let Some(env_path) = std::env::var_os(CHROME_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            return Ok(p);
        }
        return Err(ChromeLocateError::EnvPathMissing { path: p });
    }

    let candidates = candidate_paths();
    if candidates.is_empty() {
        // Either the platform is unknown or PATH is empty; surface the former.
        detect_platform()?;
    }

    first_existing(&candidates).ok_or(ChromeLocateError::NotFound {
        searched: candidates.len(),
    })
}

/// Expand `PATH` × executable names into concrete candidate files.
fn path_candidates(path_var: Option<&std::ffi::OsStr>, exe_names: &[&str]) -> Vec<PathBuf> {
    let Some(path_var) = path_var else {
        return Vec::new();
    };
    std::env::split_paths(path_var)
        .flat_map(|dir| exe_names.iter().map(move |name| dir.join(name)))
        .collect()
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
