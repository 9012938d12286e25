//! Content pass: turn index entries and classified blocks into positioned
//! drawing operations, page by page.
//!
//! Two steps, both pure:
//!
//! 1. [`plan`] builds the ordered render instructions: title, index table,
//!    forced page break, then one heading or paragraph per block.
//! 2. [`paginate`] flows those instructions top-down onto fixed-size pages,
//!    wrapping text with Helvetica metrics and starting a new page when the
//!    bottom margin is reached.
//!
//! The physical pages produced here have nothing to do with the synthetic
//! page numbers printed in the index; `<b></b>` never causes a page break in
//! the output.

use crate::config::ConversionConfig;
use crate::pipeline::markup::{Block, BlockKind};
use crate::pipeline::scan::{EntryLevel, IndexEntry};

/// Column headers of the index table.
pub const TABLE_HEADER: [&str; 3] = ["Ch. No", "Title", "Page Number"];

const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_Y: f32 = 3.0;
const TAB_INDENT: f32 = 18.0;
const HEADER_GRAY: f32 = 0.827;
const GRID_WIDTH: f32 = 1.0;
const BULLET: &str = "\u{2022} ";

// ── Fonts ────────────────────────────────────────────────────────────────

/// The two base-14 faces the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    /// PostScript name of the base-14 font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used in content streams.
    pub fn resource(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }
}

// Helvetica AFM advance widths for ' ' (32) through '~' (126).
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, face: FontFace) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    match c {
        ' '..='~' => table[c as usize - 32],
        '\u{2022}' => 350,
        _ => 556,
    }
}

/// Width of `text` in points.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, face))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap. `\n` forces a line break; other whitespace collapses.
/// Words wider than `max_width` are split between characters.
pub fn wrap_text(text: &str, max_width: f32, face: FontFace, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut line = String::new();
        for word in segment.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if text_width(&candidate, face, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if text_width(word, face, size) <= max_width {
                line = word.to_string();
            } else {
                for c in word.chars() {
                    line.push(c);
                    if text_width(&line, face, size) > max_width && line.chars().count() > 1 {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    }
                }
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

// ── Instructions ─────────────────────────────────────────────────────────

/// One cell of the index table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub face: FontFace,
    /// Gap between the bullet (or the cell padding) and the text, in points.
    pub indent: f32,
    /// Draw a bullet at the left edge of the first line.
    pub bullet: bool,
    /// Word-wrap to the column width. Cells that do not wrap are drawn on one
    /// line whatever their width.
    pub wrap: bool,
}

impl TableCell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            face: FontFace::Regular,
            indent: 0.0,
            bullet: false,
            wrap: false,
        }
    }

    fn header(text: &str) -> Self {
        Self {
            face: FontFace::Bold,
            ..Self::plain(text)
        }
    }

    /// Horizontal offset of the text from the padded cell edge.
    fn text_offset(&self, size: f32) -> f32 {
        let bullet = if self.bullet {
            text_width(BULLET, self.face, size)
        } else {
            0.0
        };
        bullet + self.indent
    }

    fn lines(&self, column_width: f32, size: f32) -> Vec<String> {
        if self.wrap {
            let width = column_width - 2.0 * CELL_PAD_X - self.text_offset(size);
            wrap_text(&self.text, width, self.face, size)
        } else if self.text.trim().is_empty() {
            Vec::new()
        } else {
            vec![self.text.clone()]
        }
    }
}

/// Ordered render instructions handed to [`paginate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Title(String),
    Table {
        header: [TableCell; 3],
        rows: Vec<[TableCell; 3]>,
    },
    Heading1(String),
    Heading2(String),
    Paragraph(String),
    Spacer(f32),
    PageBreak,
}

/// Build the index-table row for one entry.
pub fn index_row(entry: &IndexEntry) -> [TableCell; 3] {
    let title = match entry.level {
        EntryLevel::Main => TableCell {
            face: FontFace::Bold,
            wrap: true,
            ..TableCell::plain(entry.text.clone())
        },
        EntryLevel::Sub => {
            let tabs = entry.text.chars().take_while(|c| *c == '\t').count();
            TableCell {
                indent: tabs as f32 * TAB_INDENT,
                bullet: true,
                wrap: true,
                ..TableCell::plain(entry.text.trim_start_matches('\t'))
            }
        }
    };
    [
        TableCell::plain(entry.number_label()),
        title,
        TableCell::plain(entry.page.to_string()),
    ]
}

/// Lay out the whole document: index page(s), forced break, body.
pub fn plan(entries: &[IndexEntry], blocks: &[Block], config: &ConversionConfig) -> Vec<Instruction> {
    let header = TABLE_HEADER.map(TableCell::header);

    let mut out = vec![
        Instruction::Title(config.index_title.clone()),
        Instruction::Spacer(12.0),
        Instruction::Table {
            header,
            rows: entries.iter().map(index_row).collect(),
        },
        Instruction::PageBreak,
    ];

    for block in blocks {
        match &block.kind {
            BlockKind::MainHeading(text) => {
                out.push(Instruction::Heading1(text.clone()));
                out.push(Instruction::Spacer(12.0));
            }
            BlockKind::SubHeading(text) => {
                out.push(Instruction::Heading2(text.clone()));
                out.push(Instruction::Spacer(8.0));
            }
            BlockKind::Body(text) => {
                out.push(Instruction::Paragraph(text.clone()));
                out.push(Instruction::Spacer(6.0));
            }
            BlockKind::Empty => {}
        }
    }
    out
}

// ── Pagination ───────────────────────────────────────────────────────────

/// A positioned drawing primitive in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        face: FontFace,
        size: f32,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        /// Gray level of the fill, if filled.
        fill: Option<f32>,
        /// Stroke width of the outline, if outlined.
        stroke: Option<f32>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub ops: Vec<DrawOp>,
}

impl LaidOutPage {
    /// Text runs drawn on this page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rect { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LaidOutDocument {
    pub pages: Vec<LaidOutPage>,
    /// Pages before the first forced break.
    pub index_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    face: FontFace,
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    align: Align,
}

struct Layouter<'a> {
    config: &'a ConversionConfig,
    height: f32,
    pages: Vec<LaidOutPage>,
    current: LaidOutPage,
    cursor: f32,
    fresh: bool,
    index_pages: Option<usize>,
}

impl<'a> Layouter<'a> {
    fn new(config: &'a ConversionConfig) -> Self {
        let height = config.page_size.dimensions().1;
        Self {
            config,
            height,
            pages: Vec::new(),
            current: LaidOutPage::default(),
            cursor: height - config.margin,
            fresh: true,
            index_pages: None,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor = self.height - self.config.margin;
        self.fresh = true;
    }

    /// Start a new page unless `needed` points still fit on this one.
    fn ensure(&mut self, needed: f32) {
        if !self.fresh && self.cursor - needed < self.config.margin {
            self.new_page();
        }
    }

    fn style(&self, face: FontFace, size: f32) -> TextStyle {
        TextStyle {
            face,
            size,
            leading: size * self.config.line_spacing,
            space_before: 0.0,
            space_after: 0.0,
            align: Align::Left,
        }
    }

    fn text_block(&mut self, text: &str, style: TextStyle) {
        let margin = self.config.margin;
        let width = self.config.content_width();

        if !self.fresh {
            self.cursor -= style.space_before;
        }
        for line in wrap_text(text, width, style.face, style.size) {
            self.ensure(style.leading);
            let x = match style.align {
                Align::Left => margin,
                Align::Center => {
                    margin + (width - text_width(&line, style.face, style.size)).max(0.0) / 2.0
                }
            };
            self.current.ops.push(DrawOp::Text {
                x,
                y: self.cursor - style.size,
                face: style.face,
                size: style.size,
                text: line,
            });
            self.cursor -= style.leading;
            self.fresh = false;
        }
        self.cursor -= style.space_after;
    }

    fn spacer(&mut self, height: f32) {
        if self.fresh {
            return;
        }
        self.cursor -= height;
        if self.cursor < self.config.margin {
            self.new_page();
        }
    }

    fn table(&mut self, header: &[TableCell; 3], rows: &[[TableCell; 3]]) {
        let widths = self.config.column_widths;
        let table_width: f32 = widths.iter().sum();
        let left = self.config.margin + (self.config.content_width() - table_width) / 2.0;
        let size = self.config.body_font_size;
        let leading = size * self.config.line_spacing;

        for (i, row) in std::iter::once(header).chain(rows.iter()).enumerate() {
            let fill = (i == 0).then_some(HEADER_GRAY);
            let lines: Vec<Vec<String>> = row
                .iter()
                .zip(widths)
                .map(|(cell, w)| cell.lines(w, size))
                .collect();
            let line_count = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);

            // A row that fits on one page is never split. A taller one is
            // cut into slices that each fill the rest of a page.
            let mut start = 0;
            loop {
                let remaining = line_count - start;
                self.ensure(remaining as f32 * leading + 2.0 * CELL_PAD_Y);
                let room = ((self.cursor - self.config.margin - 2.0 * CELL_PAD_Y) / leading
                    + 1e-3)
                    .floor()
                    .max(1.0) as usize;
                let take = remaining.min(room);
                self.table_slice(row, &lines, start..start + take, left, fill, leading);
                start += take;
                if start >= line_count {
                    break;
                }
                self.new_page();
            }
        }
    }

    /// Draw lines `range` of one row as a boxed band below the cursor.
    fn table_slice(
        &mut self,
        row: &[TableCell; 3],
        lines: &[Vec<String>],
        range: std::ops::Range<usize>,
        left: f32,
        fill: Option<f32>,
        leading: f32,
    ) {
        let size = self.config.body_font_size;
        let height = range.len() as f32 * leading + 2.0 * CELL_PAD_Y;
        let top = self.cursor;
        let mut x = left;
        for ((cell, cell_lines), w) in row.iter().zip(lines).zip(self.config.column_widths) {
            self.current.ops.push(DrawOp::Rect {
                x,
                y: top - height,
                width: w,
                height,
                fill,
                stroke: Some(GRID_WIDTH),
            });
            let baseline = |n: usize| top - CELL_PAD_Y - size - (n - range.start) as f32 * leading;
            if cell.bullet && range.start == 0 {
                self.current.ops.push(DrawOp::Text {
                    x: x + CELL_PAD_X,
                    y: baseline(0),
                    face: cell.face,
                    size,
                    text: BULLET.trim_end().to_string(),
                });
            }
            for n in range.clone() {
                let Some(line) = cell_lines.get(n) else {
                    break;
                };
                self.current.ops.push(DrawOp::Text {
                    x: x + CELL_PAD_X + cell.text_offset(size),
                    y: baseline(n),
                    face: cell.face,
                    size,
                    text: line.clone(),
                });
            }
            x += w;
        }
        self.cursor -= height;
        self.fresh = false;
    }

    fn run(mut self, instructions: &[Instruction]) -> LaidOutDocument {
        let c = self.config;
        for instruction in instructions {
            match instruction {
                Instruction::Title(text) => {
                    let mut style = self.style(FontFace::Bold, c.title_font_size);
                    style.align = Align::Center;
                    style.space_after = 6.0;
                    self.text_block(text, style);
                }
                Instruction::Table { header, rows } => self.table(header, rows),
                Instruction::Heading1(text) => {
                    let mut style = self.style(FontFace::Bold, c.heading1_font_size);
                    style.space_after = 6.0;
                    self.text_block(text, style);
                }
                Instruction::Heading2(text) => {
                    let mut style = self.style(FontFace::Bold, c.heading2_font_size);
                    style.space_before = 12.0;
                    style.space_after = 6.0;
                    self.text_block(text, style);
                }
                Instruction::Paragraph(text) => {
                    let mut style = self.style(FontFace::Regular, c.body_font_size);
                    style.space_before = 6.0;
                    self.text_block(text, style);
                }
                Instruction::Spacer(h) => self.spacer(*h),
                Instruction::PageBreak => {
                    self.new_page();
                    if self.index_pages.is_none() {
                        self.index_pages = Some(self.pages.len());
                    }
                }
            }
        }
        self.pages.push(self.current);
        let index_pages = self.index_pages.unwrap_or(self.pages.len());
        LaidOutDocument {
            pages: self.pages,
            index_pages,
        }
    }
}

/// Flow `instructions` onto pages.
pub fn paginate(instructions: &[Instruction], config: &ConversionConfig) -> LaidOutDocument {
    Layouter::new(config).run(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scan::scan_paragraphs;

    fn layout(paragraphs: &[&str]) -> LaidOutDocument {
        let config = ConversionConfig::default();
        let doc = scan_paragraphs(paragraphs);
        paginate(&plan(&doc.entries, &doc.blocks, &config), &config)
    }

    fn sizes_on(page: &LaidOutPage) -> Vec<(String, f32)> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, size, .. } => Some((text.clone(), *size)),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }

    #[test]
    fn helvetica_widths() {
        // I + n + d + e + x = 278 + 556 + 556 + 556 + 500
        assert!((text_width("Index", FontFace::Regular, 10.0) - 24.46).abs() < 0.01);
        assert!(text_width("Index", FontFace::Bold, 10.0) > text_width("Index", FontFace::Regular, 10.0));
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 60.0, FontFace::Regular, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FontFace::Regular, 10.0) <= 60.0, "{line:?}");
        }
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap_text(&"W".repeat(40), 50.0, FontFace::Regular, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));
    }

    #[test]
    fn wrap_honours_hard_breaks_and_skips_blank_text() {
        assert_eq!(wrap_text("a\nb", 500.0, FontFace::Regular, 10.0), vec!["a", "b"]);
        assert!(wrap_text("  \t ", 500.0, FontFace::Regular, 10.0).is_empty());
    }

    #[test]
    fn sub_row_is_bulleted_and_indented() {
        let entry = IndexEntry {
            level: EntryLevel::Sub,
            number: None,
            text: "\t2.1 First point".into(),
            page: 2,
        };
        let [no, title, page] = index_row(&entry);
        assert_eq!(no.text, "");
        assert_eq!(title.text, "2.1 First point");
        assert!(title.bullet);
        assert_eq!(title.indent, TAB_INDENT);
        assert_eq!(page.text, "2");
    }

    #[test]
    fn bullet_hangs_at_cell_edge_and_only_text_is_indented() {
        let config = ConversionConfig::default();
        let doc = layout(&["<m>Intro</m>", "<s>Point</s>"]);
        let find = |wanted: &str| {
            doc.pages[0].ops.iter().find_map(|op| match op {
                DrawOp::Text { x, text, .. } if text == wanted => Some(*x),
                _ => None,
            })
        };
        let bullet_x = find("\u{2022}").expect("bullet drawn");
        let text_x = find("1.1 Point").expect("sub entry drawn");

        let table_width: f32 = config.column_widths.iter().sum();
        let left = config.margin + (config.content_width() - table_width) / 2.0;
        let title_left = left + config.column_widths[0];
        let size = config.body_font_size;
        assert!((bullet_x - (title_left + CELL_PAD_X)).abs() < 0.01);
        let expected = bullet_x + text_width(BULLET, FontFace::Regular, size) + TAB_INDENT;
        assert!((text_x - expected).abs() < 0.01, "{text_x} vs {expected}");
    }

    #[test]
    fn header_and_number_cells_never_wrap() {
        let header = TableCell::header("Page Number");
        assert_eq!(header.lines(30.0, 10.0), vec!["Page Number"]);
        assert!(TableCell::plain("").lines(72.0, 10.0).is_empty());

        let doc = layout(&["<m>Intro</m>"]);
        let texts: Vec<_> = doc.pages[0].texts().collect();
        assert_eq!(texts, vec!["Index", "Ch. No", "Title", "Page Number", "1", "Intro", "1"]);
    }

    #[test]
    fn title_cell_taller_than_a_page_is_split_across_pages() {
        let config = ConversionConfig::default();
        let words: Vec<String> = (0..3000).map(|i| format!("w{i}")).collect();
        let heading = format!("<m>{}</m>", words.join(" "));
        let doc = layout(&[heading.as_str()]);
        assert!(doc.index_pages >= 2, "got {} index pages", doc.index_pages);

        let margin = config.margin;
        for page in &doc.pages {
            for op in &page.ops {
                match op {
                    DrawOp::Text { y, .. } => assert!(*y >= margin, "text below margin at {y}"),
                    DrawOp::Rect { y, .. } => {
                        assert!(*y >= margin - 0.05, "cell below margin at {y}")
                    }
                }
            }
        }

        // Every word reaches the index table and the body exactly once each.
        let last = doc
            .pages
            .iter()
            .flat_map(|p| p.texts())
            .flat_map(str::split_whitespace)
            .filter(|w| *w == "w2999")
            .count();
        assert_eq!(last, 2);
    }

    #[test]
    fn main_row_is_bold_with_number() {
        let entry = IndexEntry {
            level: EntryLevel::Main,
            number: Some(3),
            text: "Results".into(),
            page: 4,
        };
        let [no, title, _] = index_row(&entry);
        assert_eq!(no.text, "3");
        assert_eq!(title.face, FontFace::Bold);
    }

    #[test]
    fn no_markers_gives_header_only_table_and_plain_body() {
        let doc = layout(&["Just text.", "More text."]);
        assert_eq!(doc.index_pages, 1);
        assert_eq!(doc.pages.len(), 2);

        let texts: Vec<_> = doc.pages[0].texts().collect();
        assert_eq!(texts, vec!["Index", "Ch. No", "Title", "Page Number"]);
        let filled = doc.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { fill: Some(_), .. }))
            .count();
        assert_eq!(filled, 3);

        let body = sizes_on(&doc.pages[1]);
        assert_eq!(
            body,
            vec![("Just text.".to_string(), 10.0), ("More text.".to_string(), 10.0)]
        );
    }

    #[test]
    fn body_starts_after_forced_break_with_heading_styles() {
        let doc = layout(&["<m>Intro</m>", "Body.", "<b></b>", "<s>Point</s>"]);
        assert_eq!(doc.index_pages, 1);
        let body = sizes_on(&doc.pages[1]);
        assert_eq!(
            body,
            vec![
                ("Intro".to_string(), 18.0),
                ("Body.".to_string(), 10.0),
                ("Point".to_string(), 14.0),
            ]
        );
    }

    #[test]
    fn page_break_markers_do_not_paginate_the_body() {
        let doc = layout(&["One.", "<b></b>", "Two.", "<b></b>", "Three."]);
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].texts().count(), 3);
    }

    #[test]
    fn long_body_overflows_onto_more_pages() {
        let para = "lorem ipsum dolor sit amet ".repeat(40);
        let paras: Vec<&str> = std::iter::repeat(para.as_str()).take(30).collect();
        let doc = layout(&paras);
        assert!(doc.pages.len() > 3, "got {} pages", doc.pages.len());
        let margin = ConversionConfig::default().margin;
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= margin - 3.0, "text below bottom margin at {y}");
                }
            }
        }
    }

    #[test]
    fn long_index_spills_onto_second_index_page() {
        let paras: Vec<String> = (0..80).map(|i| format!("<m>Chapter {i}</m>")).collect();
        let refs: Vec<&str> = paras.iter().map(String::as_str).collect();
        let doc = layout(&refs);
        assert!(doc.index_pages >= 2);
        assert!(doc.pages[1].texts().any(|t| t.starts_with("Chapter")));
    }
}
