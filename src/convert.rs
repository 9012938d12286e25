//! Conversion entry points.
//!
//! Two ways to drive the pipeline:
//!
//! * **Two-pass**: [`build_index`] then [`render_document`]. Each call opens
//!   the source afresh, so the document may change (or vanish) in between;
//!   the renderer prints whatever entries it is handed.
//! * **One-shot**: [`convert_to_file`] reads and classifies the document
//!   once and feeds the same [`ScannedDocument`] to both the index table and
//!   the body. [`convert_from_bytes`] and [`convert_to_file_async`] are thin
//!   wrappers around it.
//!
//! Both paths share [`crate::pipeline::markup::classify`], so a heading in
//! the index always has a matching heading in the body.

use crate::config::ConversionConfig;
use crate::error::Docx2PdfError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, RenderStats};
use crate::pipeline::markup::Block;
use crate::pipeline::scan::{scan_paragraphs, IndexEntry, ScannedDocument};
use crate::pipeline::{input, layout, render};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Read a DOCX and classify every paragraph.
pub fn scan_document(source: impl AsRef<Path>) -> Result<ScannedDocument, Docx2PdfError> {
    let doc = input::read_document(source.as_ref())?;
    Ok(scan_paragraphs(&doc.paragraphs))
}

/// Build the ordered index of a DOCX.
///
/// Calling it twice on an unchanged file yields identical entries.
///
/// # Example
/// ```rust,no_run
/// let entries = edgequake_docx2pdf::build_index("report.docx")?;
/// for e in &entries {
///     println!("{}\t{}\t{}", e.number_label(), e.text, e.page);
/// }
/// # Ok::<(), edgequake_docx2pdf::Docx2PdfError>(())
/// ```
pub fn build_index(source: impl AsRef<Path>) -> Result<Vec<IndexEntry>, Docx2PdfError> {
    let source = source.as_ref();
    let scanned = scan_document(source)?;
    info!(
        "Built index for {}: {} entries",
        source.display(),
        scanned.entries.len()
    );
    Ok(scanned.entries)
}

/// Re-read `source` and write the PDF with the given index rows.
///
/// The body is classified again from the file on disk; `entries` is printed
/// verbatim in the index table.
pub fn render_document(
    source: impl AsRef<Path>,
    entries: &[IndexEntry],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RenderStats, Docx2PdfError> {
    let doc = input::read_document(source.as_ref())?;
    let scanned = scan_paragraphs(&doc.paragraphs);
    render_blocks(
        entries,
        &scanned.blocks,
        &doc.metadata,
        output_path.as_ref(),
        config,
    )
}

/// Convert a DOCX to a PDF with an index page in one pass.
///
/// # Errors
/// Document-read errors for a missing or malformed source, output-write
/// errors when the PDF cannot be produced. Malformed markers are not errors;
/// they come back in [`ConversionOutput::warnings`].
pub fn convert_to_file(
    source: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2PdfError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    let output_path = output_path.as_ref();
    info!(
        "Starting conversion: {} -> {}",
        source.display(),
        output_path.display()
    );

    // ── Step 1: Read and classify ────────────────────────────────────────
    let scan_start = Instant::now();
    let doc = input::read_document(source)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(doc.paragraphs.len());
    }
    let scanned = scan_paragraphs(&doc.paragraphs);
    let scan_duration_ms = scan_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        for w in &scanned.warnings {
            cb.on_markup_warning(w);
        }
        cb.on_index_built(scanned.entries.len());
    }

    // ── Step 2: Lay out and write ────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render_blocks(
        &scanned.entries,
        &scanned.blocks,
        &doc.metadata,
        output_path,
        config,
    )?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        paragraphs: doc.paragraphs.len(),
        main_headings: scanned.main_headings(),
        sub_headings: scanned.sub_headings(),
        body_paragraphs: scanned.body_paragraphs(),
        synthetic_pages: scanned.synthetic_pages,
        rendered_pages: rendered.rendered_pages,
        scan_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} entries, {} pages, {} warnings, {}ms total",
        scanned.entries.len(),
        stats.rendered_pages,
        scanned.warnings.len(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.rendered_pages, scanned.entries.len());
    }

    Ok(ConversionOutput {
        entries: scanned.entries,
        warnings: scanned.warnings,
        metadata: doc.metadata,
        stats,
    })
}

/// Convert DOCX bytes held in memory, e.g. from an upload.
///
/// The bytes are spooled to a managed [`tempfile`] that is removed on
/// return.
pub fn convert_from_bytes(
    bytes: &[u8],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2PdfError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("docx2pdf-")
        .suffix(".docx")
        .tempfile()
        .map_err(|e| Docx2PdfError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.flush())
        .map_err(|e| Docx2PdfError::Internal(format!("tempfile write: {e}")))?;
    debug!("Spooled {} bytes to {}", bytes.len(), tmp.path().display());
    convert_to_file(tmp.path(), output_path, config)
}

/// Run [`convert_to_file`] on tokio's blocking pool.
pub async fn convert_to_file_async(
    source: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: ConversionConfig,
) -> Result<ConversionOutput, Docx2PdfError> {
    let source = source.as_ref().to_path_buf();
    let output_path = output_path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || convert_to_file(&source, &output_path, &config))
        .await
        .map_err(|e| Docx2PdfError::Internal(format!("conversion task failed: {e}")))?
}

/// Read DOCX core properties without rendering anything.
pub fn inspect(source: impl AsRef<Path>) -> Result<DocumentMetadata, Docx2PdfError> {
    Ok(input::read_document(source.as_ref())?.metadata)
}

/// `report.docx` → `report.pdf`, next to the source.
pub fn default_output_path(source: impl AsRef<Path>) -> PathBuf {
    source.as_ref().with_extension("pdf")
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn render_blocks(
    entries: &[IndexEntry],
    blocks: &[Block],
    metadata: &DocumentMetadata,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<RenderStats, Docx2PdfError> {
    let instructions = layout::plan(entries, blocks, config);
    let laid_out = layout::paginate(&instructions, config);
    debug!(
        "Laid out {} instructions on {} pages ({} index pages)",
        instructions.len(),
        laid_out.pages.len(),
        laid_out.index_pages
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_layout_complete(laid_out.pages.len());
    }

    render::write_pdf(
        &laid_out,
        config.page_size.dimensions(),
        metadata,
        output_path,
        config.progress_callback.as_ref(),
    )?;

    Ok(RenderStats {
        rendered_pages: laid_out.pages.len(),
        index_pages: laid_out.index_pages,
    })
}
