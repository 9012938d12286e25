//! Index pass: turn classified paragraphs into numbered index entries.
//!
//! ## Synthetic page numbers
//!
//! The `page` of an [`IndexEntry`] is NOT the page the heading lands on in
//! the rendered PDF. It is a counter that starts at 1 and advances by one for
//! every paragraph carrying `<b></b>`. Authors use it to describe the page
//! structure of the printed original; the PDF layout engine never reads or
//! writes it.
//!
//! A break on the same paragraph as a heading is applied after the heading
//! has been numbered, so that heading keeps the old page.

use crate::error::MarkupWarning;
use crate::pipeline::markup::{self, Block, BlockKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Heading tier of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryLevel {
    Main,
    Sub,
}

/// One row of the index table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub level: EntryLevel,
    /// Chapter number for main entries. Subheadings carry their decimal in
    /// `text` and leave this column empty.
    pub number: Option<u32>,
    /// Main: heading text. Sub: `"\t{n.n} {heading}"`.
    pub text: String,
    /// Synthetic page number (see module docs).
    pub page: u32,
}

impl IndexEntry {
    /// Text for the "Ch. No" column; empty for subheadings.
    pub fn number_label(&self) -> String {
        self.number.map(|n| n.to_string()).unwrap_or_default()
    }
}

/// Running counters of the index pass.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    main: u32,
    sub: f64,
    page: u32,
    entries: Vec<IndexEntry>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            main: 0,
            sub: 0.0,
            page: 1,
            entries: Vec::new(),
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next block in document order.
    pub fn push(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::MainHeading(text) => {
                self.main += 1;
                self.sub = f64::from(self.main);
                self.entries.push(IndexEntry {
                    level: EntryLevel::Main,
                    number: Some(self.main),
                    text: text.clone(),
                    page: self.page,
                });
            }
            BlockKind::SubHeading(text) => {
                // Accumulated, not recomputed: after ten subheadings under
                // chapter 2 the label is "3.0".
                self.sub += 0.1;
                self.entries.push(IndexEntry {
                    level: EntryLevel::Sub,
                    number: None,
                    text: format!("\t{:.1} {}", self.sub, text),
                    page: self.page,
                });
            }
            BlockKind::Body(_) | BlockKind::Empty => {}
        }

        if block.page_break {
            self.page += 1;
        }
    }

    /// Current synthetic page (1 + breaks seen so far).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn finish(self) -> Vec<IndexEntry> {
        self.entries
    }
}

/// Paragraphs classified once, shared by the index and the content pass.
#[derive(Debug, Clone, Default)]
pub struct ScannedDocument {
    pub blocks: Vec<Block>,
    pub entries: Vec<IndexEntry>,
    pub warnings: Vec<MarkupWarning>,
    /// Value of the synthetic page counter after the last paragraph.
    pub synthetic_pages: u32,
}

impl ScannedDocument {
    pub fn main_headings(&self) -> usize {
        self.count(|k| matches!(k, BlockKind::MainHeading(_)))
    }

    pub fn sub_headings(&self) -> usize {
        self.count(|k| matches!(k, BlockKind::SubHeading(_)))
    }

    pub fn body_paragraphs(&self) -> usize {
        self.count(|k| matches!(k, BlockKind::Body(_)))
    }

    fn count(&self, pred: impl Fn(&BlockKind) -> bool) -> usize {
        self.blocks.iter().filter(|b| pred(&b.kind)).count()
    }
}

/// Classify every paragraph and build the index in one sweep.
pub fn scan_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> ScannedDocument {
    let mut blocks = Vec::with_capacity(paragraphs.len());
    let mut warnings = Vec::new();
    let mut builder = IndexBuilder::new();

    for (i, para) in paragraphs.iter().enumerate() {
        let (block, found) = markup::classify(i + 1, para.as_ref());
        for w in &found {
            warn!("{}", w);
        }
        warnings.extend(found);
        builder.push(&block);
        blocks.push(block);
    }

    let synthetic_pages = builder.page();
    let entries = builder.finish();
    debug!(
        "Scanned {} paragraphs: {} index entries, {} synthetic pages",
        blocks.len(),
        entries.len(),
        synthetic_pages
    );

    ScannedDocument {
        blocks,
        entries,
        warnings,
        synthetic_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(entries: &[IndexEntry]) -> Vec<(String, String, u32)> {
        entries
            .iter()
            .map(|e| (e.number_label(), e.text.clone(), e.page))
            .collect()
    }

    fn row(n: &str, text: &str, page: u32) -> (String, String, u32) {
        (n.to_string(), text.to_string(), page)
    }

    #[test]
    fn no_markers_no_entries() {
        let doc = scan_paragraphs(&["Plain text.", "", "More text."]);
        assert!(doc.entries.is_empty());
        assert_eq!(doc.synthetic_pages, 1);
        assert_eq!(doc.body_paragraphs(), 2);
    }

    #[test]
    fn main_headings_are_numbered_in_order_on_page_one() {
        let doc = scan_paragraphs(&["<m>A</m>", "text", "<m>B</m>", "<m>C</m>"]);
        let numbers: Vec<_> = doc.entries.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
        assert!(doc.entries.iter().all(|e| e.page == 1));
        assert!(doc.entries.iter().all(|e| e.level == EntryLevel::Main));
    }

    #[test]
    fn page_break_shifts_later_entries_by_one() {
        let doc = scan_paragraphs(&[
            "<m>A</m>",
            "<m>B</m>",
            "<b></b>",
            "<m>C</m>",
            "<s>C1</s>",
        ]);
        let pages: Vec<_> = doc.entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![1, 1, 2, 2]);
    }

    #[test]
    fn consecutive_breaks_accumulate() {
        let doc = scan_paragraphs(&["<m>A</m>", "<b></b>", "<b></b>", "<m>B</m>"]);
        assert_eq!(doc.entries[1].page, 3);
        assert_eq!(doc.synthetic_pages, 3);
    }

    #[test]
    fn sub_numbering_resets_per_main() {
        let doc = scan_paragraphs(&[
            "<m>One</m>",
            "<s>a</s>",
            "<m>Two</m>",
            "<s>b</s>",
            "<s>c</s>",
        ]);
        assert_eq!(
            rows(&doc.entries),
            vec![
                row("1", "One", 1),
                row("", "\t1.1 a", 1),
                row("2", "Two", 1),
                row("", "\t2.1 b", 1),
                row("", "\t2.2 c", 1),
            ]
        );
    }

    #[test]
    fn sub_before_any_main_counts_from_zero() {
        let doc = scan_paragraphs(&["<s>Preface</s>"]);
        assert_eq!(doc.entries[0].text, "\t0.1 Preface");
    }

    #[test]
    fn tenth_subheading_rolls_into_next_integer() {
        let mut paras = vec!["<m>Two</m>".to_string(), "<m>Two</m>".to_string()];
        paras.extend((0..10).map(|i| format!("<s>p{i}</s>")));
        let doc = scan_paragraphs(&paras);
        assert_eq!(doc.entries[10].text, "\t2.9 p8");
        assert_eq!(doc.entries[11].text, "\t3.0 p9");
    }

    #[test]
    fn intro_details_scenario() {
        let doc = scan_paragraphs(&[
            "<m>Intro</m>",
            "Some body text.",
            "<b></b>",
            "<m>Details</m>",
            "<s>First point</s>",
        ]);
        assert_eq!(
            rows(&doc.entries),
            vec![
                row("1", "Intro", 1),
                row("2", "Details", 2),
                row("", "\t2.1 First point", 2),
            ]
        );
    }

    #[test]
    fn break_on_heading_paragraph_applies_afterwards() {
        let doc = scan_paragraphs(&["<m>A</m><b></b>", "<m>B</m>"]);
        assert_eq!(doc.entries[0].page, 1);
        assert_eq!(doc.entries[1].page, 2);
    }

    #[test]
    fn unclosed_marker_produces_no_entry_and_a_warning() {
        let doc = scan_paragraphs(&["<m>Unclosed", "<m>Next</m>"]);
        assert_eq!(rows(&doc.entries), vec![row("1", "Next", 1)]);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].paragraph(), 1);
    }

    #[test]
    fn misordered_markers_keep_an_empty_numbered_entry() {
        let doc = scan_paragraphs(&["</m>x<m>", "<m>Next</m>"]);
        assert_eq!(rows(&doc.entries), vec![row("1", "", 1), row("2", "Next", 1)]);
    }

    #[test]
    fn scanning_is_idempotent() {
        let paras = ["<m>A</m>", "<s>x</s>", "<b></b>", "<m>B</m>"];
        assert_eq!(scan_paragraphs(&paras).entries, scan_paragraphs(&paras).entries);
    }
}
