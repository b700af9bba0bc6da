//! Conversion entry points.
//!
//! The browser API is blocking, so the whole detect/navigate/capture sequence
//! for one deck runs on a single `spawn_blocking` thread. That thread owns the
//! rendering session for its lifetime; several conversions can run at once,
//! each with its own browser.
//!
//! | function | returns | writes a file |
//! |----------|---------|---------------|
//! | [`convert`] | [`ConversionResult`] (never `Err`) | yes |
//! | [`convert_to_bytes`] | `Result<ConversionOutput, _>` | no |
//! | [`convert_from_html`] | [`ConversionResult`] | yes |
//! | [`convert_sync`] | [`ConversionResult`] | yes |
//! | [`inspect`] | `Result<DeckInspection, _>` | no |
//!
//! The `*_with*` variants take an explicit [`SessionLauncher`] instead of
//! launching headless Chrome.

use crate::browser::{ChromeLauncher, RenderSession, SessionGuard, SessionLauncher};
use crate::config::ConversionConfig;
use crate::error::Html2PdfError;
use crate::output::{ConversionOutput, ConversionResult, ConversionStats, DeckInspection};
use crate::pipeline::capture::{self, CaptureRun};
use crate::pipeline::format::{self, FormatSource, PageDimensions};
use crate::pipeline::slides::{self, DetectedSlides};
use crate::pipeline::{assemble, input};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use url::Url;

/// Convert an HTML deck to a PDF file.
///
/// This is the primary entry point for the library. Every failure, from a
/// missing input file to a merge error, is folded into
/// `ConversionResult { success: false, error: Some(..) }`; the browser is
/// released and nothing is written to `output` in that case.
///
/// The output directory is created if needed and an existing file is
/// overwritten.
///
/// # Example
/// ```rust,no_run
/// use edgequake_html2pdf::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let result = convert("input/deck.html", "output/deck.pdf", &ConversionConfig::default()).await;
/// if result.success {
///     println!("{} slides, {} bytes", result.slide_count, result.byte_size);
/// } else {
///     eprintln!("{}", result.error.unwrap_or_default());
/// }
/// # }
/// ```
pub async fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    convert_with(ChromeLauncher::new(), input, output, config).await
}

/// [`convert`] with an explicit session launcher.
pub async fn convert_with<L: SessionLauncher>(
    launcher: L,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    let start = Instant::now();
    let output = output.as_ref();

    let result = match convert_with_launcher(launcher, input, config).await {
        Ok(converted) => write_atomic(output, &converted.pdf)
            .await
            .map(|()| converted),
        Err(e) => Err(e),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(converted) => {
            info!(
                "Wrote {} ({} slides, {} bytes) in {}ms",
                output.display(),
                converted.stats.slide_count,
                converted.pdf.len(),
                elapsed_ms
            );
            ConversionResult::succeeded(output, &converted, elapsed_ms)
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            ConversionResult::failed(output, &e, elapsed_ms)
        }
    }
}

/// Convert an HTML deck to PDF bytes in memory using headless Chrome.
pub async fn convert_to_bytes(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    convert_with_launcher(ChromeLauncher::new(), input, config).await
}

/// The full pipeline against an explicit launcher.
///
/// # Errors
/// Any fatal [`Html2PdfError`]. Navigation problems are not errors; they
/// show up as warnings in [`ConversionOutput::reports`].
pub async fn convert_with_launcher<L: SessionLauncher>(
    launcher: L,
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let result = run_pipeline(launcher, input.as_ref(), config).await;
    if let (Err(e), Some(cb)) = (&result, config.progress_callback.as_ref()) {
        cb.on_conversion_failed(&e.to_string());
    }
    result
}

async fn run_pipeline<L: SessionLauncher>(
    launcher: L,
    input: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input)?;
    info!("Starting conversion: {}", resolved.path.display());

    // ── Step 2: Detect + capture on one blocking thread ──────────────────
    let url = resolved.url.clone();
    let task_config = config.clone();
    let run = tokio::task::spawn_blocking(move || capture_deck(&launcher, &url, &task_config))
        .await
        .map_err(|e| Html2PdfError::Internal(format!("capture task failed: {e}")))??;

    // ── Step 3: Merge ────────────────────────────────────────────────────
    let merge_start = Instant::now();
    let artifacts = run.capture.artifacts;
    let pdf = tokio::task::spawn_blocking(move || assemble::merge(&artifacts))
        .await
        .map_err(|e| Html2PdfError::Internal(format!("merge task failed: {e}")))??;
    let merge_duration_ms = merge_start.elapsed().as_millis() as u64;

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let reports = run.capture.reports;
    let stats = ConversionStats {
        slide_count: run.slides.total_count,
        navigation_warnings: reports.iter().filter(|r| r.warning.is_some()).count(),
        pdf_bytes: pdf.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        capture_duration_ms: run.capture_duration_ms,
        merge_duration_ms,
    };

    info!(
        "Conversion complete: {} slides at {}, {}ms total",
        stats.slide_count, run.dimensions, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(run.slides.total_count, reports.len());
    }

    Ok(ConversionOutput {
        pdf,
        dimensions: run.dimensions,
        format_source: run.format_source,
        slides: run.slides,
        reports,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(convert(input, output, config)),
        Err(e) => ConversionResult::failed(
            output.as_ref(),
            &Html2PdfError::Internal(format!("Failed to create tokio runtime: {e}")),
            0,
        ),
    }
}

/// Convert an HTML string held in memory.
///
/// The markup is written to a managed temporary directory, which is removed
/// when the conversion returns. Relative asset URLs in the markup resolve
/// against that directory, so inline or absolute assets work best.
pub async fn convert_from_html(
    html: &str,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    convert_from_html_with(ChromeLauncher::new(), html, output, config).await
}

/// [`convert_from_html`] with an explicit session launcher.
pub async fn convert_from_html_with<L: SessionLauncher>(
    launcher: L,
    html: &str,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    let output = output.as_ref();
    let dir = match tempfile::Builder::new().prefix("html2pdf-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            return ConversionResult::failed(
                output,
                &Html2PdfError::Internal(format!("tempdir: {e}")),
                0,
            )
        }
    };
    let path = dir.path().join("presentation.html");
    if let Err(e) = tokio::fs::write(&path, html).await {
        return ConversionResult::failed(
            output,
            &Html2PdfError::Internal(format!("tempfile write: {e}")),
            0,
        );
    }
    // `dir` is dropped (and the file deleted) when this returns
    convert_with(launcher, &path, output, config).await
}

/// Detect format and slide count without capturing anything.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DeckInspection, Html2PdfError> {
    inspect_with(ChromeLauncher::new(), input, config).await
}

/// [`inspect`] with an explicit session launcher.
pub async fn inspect_with<L: SessionLauncher>(
    launcher: L,
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DeckInspection, Html2PdfError> {
    let resolved = input::resolve_input(input)?;
    let source = tokio::fs::read(&resolved.path)
        .await
        .map_err(|_| Html2PdfError::PermissionDenied {
            path: resolved.path.clone(),
        })?;
    let source_hint = input::sniff_format_hint(&String::from_utf8_lossy(&source));
    debug!("Source format hint: {:?}", source_hint);

    let url = resolved.url.clone();
    let task_config = config.clone();
    let (dimensions, format_source, slides) = tokio::task::spawn_blocking(move || {
        let mut session = SessionGuard::new(launcher.launch(&url, &task_config)?);
        let (dims, source) = prepare(&mut *session, &task_config)?;
        let slides = slides::detect(&*session, &task_config)?;
        Ok::<_, Html2PdfError>((dims, source, slides))
    })
    .await
    .map_err(|e| Html2PdfError::Internal(format!("inspect task failed: {e}")))??;

    Ok(DeckInspection {
        url: resolved.url.to_string(),
        dimensions,
        format_source,
        slides,
        source_hint,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything produced while the session was open.
struct DeckRun {
    dimensions: PageDimensions,
    format_source: FormatSource,
    slides: DetectedSlides,
    capture: CaptureRun,
    capture_duration_ms: u64,
}

/// Launch, detect, capture. The session is closed when the guard drops,
/// whichever way this returns.
fn capture_deck<L: SessionLauncher>(
    launcher: &L,
    url: &Url,
    config: &ConversionConfig,
) -> Result<DeckRun, Html2PdfError> {
    let mut session = SessionGuard::new(launcher.launch(url, config)?);
    let (dimensions, format_source) = prepare(&mut *session, config)?;

    let slides = slides::detect(&*session, config)?;

    let capture_start = Instant::now();
    let capture = capture::capture_all(&mut *session, &slides, dimensions, config)?;
    let capture_duration_ms = capture_start.elapsed().as_millis() as u64;

    Ok(DeckRun {
        dimensions,
        format_source,
        slides,
        capture,
        capture_duration_ms,
    })
}

/// Pick the page size, apply it to the viewport and let the deck settle.
fn prepare(
    session: &mut dyn RenderSession,
    config: &ConversionConfig,
) -> Result<(PageDimensions, FormatSource), Html2PdfError> {
    let (dims, source) = format::detect(session, config)?;
    session.set_viewport(dims)?;
    thread::sleep(Duration::from_millis(config.wait_time_ms));
    Ok((dims, source))
}

/// Write via a sibling temp file and rename, so `path` never holds a partial PDF.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Html2PdfError> {
    let write_err = |source: std::io::Error| Html2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.pdf");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!path.with_extension("pdf.tmp").exists());
    }

    #[tokio::test]
    async fn missing_input_fails_before_launch() {
        struct Unreachable;
        impl SessionLauncher for Unreachable {
            type Session = crate::browser::fake::FakeSession;
            fn launch(
                &self,
                _url: &Url,
                _config: &ConversionConfig,
            ) -> Result<Self::Session, Html2PdfError> {
                panic!("launcher must not be reached for a missing input");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let result = convert_with(Unreachable, "/no/such/deck.html", &out, &ConversionConfig::default()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
        assert!(!out.exists());
    }
}
