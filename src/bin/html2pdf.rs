//! CLI binary for edgequake-html2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_html2pdf::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, DetectionPolicy, FormatMode,
    NavigationMethod, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the deck loads, then a bar
/// with one tick per captured slide.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Launching browser…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Capturing");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Detected {total_slides} slides"))
        ));
    }

    fn on_slide_start(&self, slide_num: usize, _total_slides: usize) {
        self.bar.set_message(format!("slide {slide_num}"));
    }

    fn on_navigation_warning(&self, slide_num: usize, total_slides: usize, detail: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            yellow("⚠"),
            slide_num,
            total_slides,
            dim(&format!("navigation failed ({detail}); capturing current view")),
        ));
    }

    fn on_slide_captured(&self, slide_num: usize, total_slides: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            green("✓"),
            slide_num,
            total_slides,
            dim(&format!("{:>7} bytes", bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_failed(&self, _error: &str) {
        // The caller prints the error; the spinner must be gone first.
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, total_slides: usize, captured: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        if warnings == 0 {
            eprintln!(
                "{} {}/{} slides captured",
                green("✔"),
                bold(&captured.to_string()),
                total_slides
            );
        } else {
            eprintln!(
                "{} {}/{} slides captured  ({} with navigation warnings)",
                cyan("⚠"),
                bold(&captured.to_string()),
                total_slides,
                yellow(&warnings.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default paths: input/presentation.html → output/presentation-<millis>.pdf
  html2pdf

  # Explicit input and output
  html2pdf deck.html deck.pdf

  # Portrait deck at a fixed size
  html2pdf story.html --format vertical --width 1080 --height 1920

  # Slow animations, custom slide markup
  html2pdf deck.html --wait 3000 --selector ".frame"

  # Force navigation through the deck's dots
  html2pdf deck.html --navigation dots

  # What would be captured, without capturing
  html2pdf --inspect-only deck.html

  # Machine-readable result
  html2pdf deck.html out.pdf --json

ENVIRONMENT VARIABLES:
  CHROME_PATH             Chrome/Chromium executable to use
  RUST_LOG                Override log filtering (e.g. edgequake_html2pdf=debug)
  HTML2PDF_*              Every flag can also be set as HTML2PDF_<FLAG>
"#;

/// Convert HTML slide decks to paginated PDF.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Convert HTML slide decks to paginated PDF",
    long_about = "Convert an HTML presentation into a PDF with one page per slide. Slides are \
detected from the markup (slide selectors, indicator dots or a slide counter), navigated with \
the deck's own functions, dots or arrow keys, and printed by headless Chrome.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTML file to convert.
    #[arg(default_value = "input/presentation.html")]
    input: PathBuf,

    /// Output PDF. Default: output/presentation-<unix-millis>.pdf
    output: Option<PathBuf>,

    /// Page format: auto, horizontal or vertical.
    #[arg(long, env = "HTML2PDF_FORMAT", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Page width in pixels (horizontal/vertical only).
    #[arg(long, env = "HTML2PDF_WIDTH", value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Page height in pixels (horizontal/vertical only).
    #[arg(long, env = "HTML2PDF_HEIGHT", value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// Settle time after each slide change, in milliseconds.
    #[arg(long = "wait", env = "HTML2PDF_WAIT", default_value_t = 1500)]
    wait_ms: u64,

    /// CSS selector tried before the built-in slide selectors.
    #[arg(long, env = "HTML2PDF_SELECTOR", default_value = ".slide")]
    selector: String,

    /// Navigation method: auto, dots, function or arrow-keys.
    #[arg(long, env = "HTML2PDF_NAVIGATION", value_enum, default_value = "auto")]
    navigation: NavigationArg,

    /// Uniform page margin in pixels.
    #[arg(long, env = "HTML2PDF_MARGIN", default_value_t = 0.0)]
    margin: f64,

    /// Render scale factor (0.1–2.0).
    #[arg(long, env = "HTML2PDF_SCALE", default_value_t = 1.0)]
    scale: f64,

    /// Output quality hint (1–100).
    #[arg(long, env = "HTML2PDF_QUALITY", default_value_t = 100,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Slide detection policy: first-match or max-count.
    #[arg(long, env = "HTML2PDF_POLICY", value_enum, default_value = "first-match")]
    policy: PolicyArg,

    /// Give up if the document has not loaded after this many seconds.
    #[arg(long, env = "HTML2PDF_LOAD_TIMEOUT", default_value_t = 60)]
    load_timeout: u64,

    /// Chrome/Chromium executable.
    #[arg(long = "chrome", env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Print the ConversionResult as JSON.
    #[arg(long, env = "HTML2PDF_JSON")]
    json: bool,

    /// Detect format and slides only; write nothing.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "HTML2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HTML2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HTML2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Auto,
    Horizontal,
    Vertical,
}

impl From<FormatArg> for FormatMode {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Auto => FormatMode::Auto,
            FormatArg::Horizontal => FormatMode::Horizontal,
            FormatArg::Vertical => FormatMode::Vertical,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum NavigationArg {
    Auto,
    Dots,
    Function,
    ArrowKeys,
}

impl From<NavigationArg> for NavigationMethod {
    fn from(v: NavigationArg) -> Self {
        match v {
            NavigationArg::Auto => NavigationMethod::Auto,
            NavigationArg::Dots => NavigationMethod::Dots,
            NavigationArg::Function => NavigationMethod::Function,
            NavigationArg::ArrowKeys => NavigationMethod::ArrowKeys,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    FirstMatch,
    MaxCount,
}

impl From<PolicyArg> for DetectionPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::FirstMatch => DetectionPolicy::FirstMatch,
            PolicyArg::MaxCount => DetectionPolicy::MaxCount,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Fail fast on a missing input ─────────────────────────────────────
    if !cli.input.exists() {
        eprintln!(
            "{} Input file not found: {}",
            red("✘"),
            bold(&cli.input.display().to_string())
        );
        eprintln!(
            "  {}",
            dim("Place your HTML file at input/presentation.html or pass a path.")
        );
        return Ok(ExitCode::FAILURE);
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let report = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect presentation")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise inspection")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            println!("Dimensions:   {} ({:?})", report.dimensions, report.dimensions.orientation());
            println!("From:         {:?}", report.format_source);
            println!("Slides:       {}", report.slides.total_count);
            println!("Detected by:  {}", report.slides.method);
            println!("Source hint:  {:?}", report.source_hint);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output_path = cli.output.clone().unwrap_or_else(default_output_path);
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {} → {}",
            cyan("◆"),
            cli.input.display(),
            bold(&output_path.display().to_string())
        );
    }

    let result = convert(&cli.input, &output_path, &config).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    }

    if !result.success {
        if !cli.json {
            eprintln!(
                "{} Conversion failed: {}",
                red("✘"),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        return Ok(ExitCode::FAILURE);
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {} slides  {}  {}ms  →  {}",
            green("✔"),
            result.slide_count,
            dim(&format!("{} bytes", result.byte_size)),
            result.elapsed_ms,
            bold(&output_path.display().to_string()),
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .format(cli.format.clone().into())
        .wait_time_ms(cli.wait_ms)
        .slide_selector(cli.selector.clone())
        .navigation_method(cli.navigation.clone().into())
        .margin(cli.margin)
        .scale(cli.scale)
        .quality(cli.quality)
        .detection_policy(cli.policy.clone().into())
        .load_timeout_secs(cli.load_timeout);

    if let Some(w) = cli.width {
        builder = builder.width(w);
    }
    if let Some(h) = cli.height {
        builder = builder.height(h);
    }
    if let Some(ref path) = cli.chrome_path {
        builder = builder.chrome_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `output/presentation-<unix-millis>.pdf`
fn default_output_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    PathBuf::from("output").join(format!("presentation-{millis}.pdf"))
}
