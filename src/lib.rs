//! # edgequake-docx2pdf
//!
//! Convert marked-up Word documents to PDF with an auto-generated index page.
//!
//! Authors tag headings directly in the document text:
//!
//! | Marker | Meaning |
//! |--------|---------|
//! | `<m>Title</m>` | main heading, numbered 1, 2, 3 … |
//! | `<s>Title</s>` | subheading, numbered 2.1, 2.2 … under the latest main heading |
//! | `<b></b>`      | advance the index page counter by one |
//!
//! The first PDF page holds an "Index" table (chapter number, title, page
//! number); the body follows on a fresh page with the markers stripped and
//! headings styled. Index page numbers are synthetic: they count `<b></b>`
//! markers, not physical pages of the output.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DOCX
//!  │
//!  ├─ 1. Input    validate the ZIP package, read w:body paragraphs
//!  ├─ 2. Markup   classify each paragraph (shared by index and body)
//!  ├─ 3. Scan     number main/sub entries, count page-break markers
//!  ├─ 4. Layout   index table + forced break + styled body, paginated
//!  └─ 5. Render   lopdf, base-14 Helvetica, atomic write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docx2pdf::{convert_to_file, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_to_file("report.docx", "report.pdf", &config)?;
//!     for entry in &output.entries {
//!         println!("{:>3}  {}  p.{}", entry.number_label(), entry.text, entry.page);
//!     }
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docx2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docx2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize};
pub use convert::{
    build_index, convert_from_bytes, convert_to_file, convert_to_file_async, default_output_path,
    inspect, render_document, scan_document,
};
pub use error::{Docx2PdfError, ErrorKind, MarkupWarning};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, RenderStats};
pub use pipeline::scan::{EntryLevel, IndexEntry, ScannedDocument};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
