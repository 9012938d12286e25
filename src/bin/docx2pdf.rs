//! CLI binary for edgequake-docx2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docx2pdf::{
    build_index, convert_to_file_async, default_output_path, inspect, ConversionConfig,
    ConversionProgressCallback, EntryLevel, IndexEntry, MarkupWarning, PageSize, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress callback: a spinner while the document is scanned, then
/// a page bar once the layout engine knows the page count.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening DOCX…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Writing");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_paragraphs: usize) {
        self.bar.set_prefix("Scanning");
        self.bar.set_message(format!("{total_paragraphs} paragraphs"));
    }

    fn on_markup_warning(&self, warning: &MarkupWarning) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), warning));
    }

    fn on_index_built(&self, entries: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Index built: {entries} entries"))
        ));
    }

    fn on_layout_complete(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, entries: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        let tail = if warnings == 0 {
            String::new()
        } else {
            format!("  ({} markup warnings)", yellow(&warnings.to_string()))
        };
        eprintln!(
            "{} {} pages written, {} index entries{}",
            green("✔"),
            bold(&total_pages.to_string()),
            entries,
            tail
        );
    }
}

const AFTER_HELP: &str = r#"MARKUP:
  <m>Heading</m>      Main heading, numbered 1, 2, 3 …
  <s>Heading</s>      Subheading, numbered 1.1, 1.2 … under the latest main heading
  <b></b>             Advance the page number printed in the index by one

EXAMPLES:
  # Convert, writing report.pdf next to the source
  docx2pdf report.docx

  # Explicit output path and US Letter paper
  docx2pdf report.docx -o out/report.pdf --page-size letter

  # Print the index without producing a PDF
  docx2pdf --index-only report.docx

  # Machine-readable index and stats
  docx2pdf --json report.docx > result.json

  # Show DOCX core properties
  docx2pdf --inspect-only report.docx

ENVIRONMENT VARIABLES:
  DOCX2PDF_OUTPUT         Default for --output
  DOCX2PDF_PAGE_SIZE      a4 | letter
  DOCX2PDF_INDEX_TITLE    Heading above the index table
  DOCX2PDF_MARGIN         Page margin in points
  RUST_LOG                Overrides the log filter (e.g. edgequake_docx2pdf=debug)
"#;

/// Convert marked-up DOCX files to PDF with an index page.
#[derive(Parser, Debug)]
#[command(
    name = "docx2pdf",
    version,
    about = "Convert marked-up DOCX files to PDF with an auto-generated index page",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a .docx file.
    input: PathBuf,

    /// Write the PDF here instead of next to the input.
    #[arg(short, long, env = "DOCX2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Paper size.
    #[arg(long, env = "DOCX2PDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Heading printed above the index table.
    #[arg(long, env = "DOCX2PDF_INDEX_TITLE", default_value = "Index")]
    index_title: String,

    /// Margin on all sides, in points (72 = one inch).
    #[arg(long, env = "DOCX2PDF_MARGIN", default_value_t = 72.0)]
    margin: f32,

    /// Print the index table and exit without writing a PDF.
    #[arg(long)]
    index_only: bool,

    /// Print DOCX metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "DOCX2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCX2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCX2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCX2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; markup warnings still reach the
    // user through the callback.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).context("Failed to inspect DOCX")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:           {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:          {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:         {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:        {}", s);
            }
            if let Some(ref m) = meta.last_modified_by {
                println!("Modified by:    {}", m);
            }
            if let Some(ref c) = meta.creation_date {
                println!("Created:        {}", c);
            }
            if let Some(ref m) = meta.modification_date {
                println!("Modified:       {}", m);
            }
            println!("Paragraphs:     {}", meta.paragraph_count);
        }
        return Ok(());
    }

    // ── Index-only mode ──────────────────────────────────────────────────
    if cli.index_only {
        let entries = build_index(&cli.input).context("Failed to build index")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("Failed to serialise index")?
            );
        } else {
            print_index(&entries);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_to_file_async(&cli.input, &output_path, config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            for w in &output.warnings {
                eprintln!("  {} {}", yellow("⚠"), w);
            }
        }
        eprintln!(
            "{}  {} entries  {} pages  {}ms  →  {}",
            green("✔"),
            output.entries.len(),
            output.stats.rendered_pages,
            output.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "{} main / {} sub headings, {} body paragraphs, {} index pages counted",
                output.stats.main_headings,
                output.stats.sub_headings,
                output.stats.body_paragraphs,
                output.stats.synthetic_pages
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_size(cli.page_size.into())
        .margin(cli.margin)
        .index_title(cli.index_title.clone());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print the index as an aligned text table.
fn print_index(entries: &[IndexEntry]) {
    println!("{:>6}  {:<50}  {:>11}", "Ch. No", "Title", "Page Number");
    println!("{}", "─".repeat(71));
    for e in entries {
        let title = match e.level {
            EntryLevel::Main => e.text.clone(),
            EntryLevel::Sub => format!("  • {}", e.text.trim_start_matches('\t')),
        };
        println!("{:>6}  {:<50}  {:>11}", e.number_label(), title, e.page);
    }
}
