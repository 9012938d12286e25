//! Result types returned by the conversion entry points.

use crate::error::MarkupWarning;
use crate::pipeline::scan::IndexEntry;
use serde::{Deserialize, Serialize};

/// Everything a caller learns from a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Index rows in document order, as printed on the first page.
    pub entries: Vec<IndexEntry>,
    /// Non-fatal markup problems, in paragraph order.
    pub warnings: Vec<MarkupWarning>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Core properties of the source DOCX.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub last_modified_by: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// Number of top-level body paragraphs, empty ones included.
    pub paragraph_count: usize,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub paragraphs: usize,
    pub main_headings: usize,
    pub sub_headings: usize,
    pub body_paragraphs: usize,
    /// Final value of the synthetic page counter (1 + page-break markers).
    pub synthetic_pages: u32,
    /// Physical pages in the written PDF, index pages included.
    pub rendered_pages: usize,
    pub scan_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What the content pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Physical pages in the written PDF.
    pub rendered_pages: usize,
    /// Pages taken by the title and index table, before the forced break.
    pub index_pages: usize,
}
