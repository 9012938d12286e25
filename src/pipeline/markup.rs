//! Paragraph markup grammar and classifier.
//!
//! Three literal, case-sensitive markers are recognised inside the trimmed
//! text of a paragraph:
//!
//! | Marker            | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `<m>` … `</m>`    | main heading (numbered 1, 2, 3 …)         |
//! | `<s>` … `</s>`    | subheading under the latest main heading  |
//! | `<b></b>`         | synthetic page break for the index        |
//!
//! Markers never nest and are matched with first-occurrence semantics: the
//! heading text is whatever lies between the FIRST open marker and the FIRST
//! close marker. The main pair is tested before the subheading pair, and the
//! page-break marker is checked independently of both.
//!
//! Both the index pass and the content pass go through [`classify`], so the
//! two can never disagree about what a paragraph is.

use crate::error::MarkupWarning;

pub const MAIN_OPEN: &str = "<m>";
pub const MAIN_CLOSE: &str = "</m>";
pub const SUB_OPEN: &str = "<s>";
pub const SUB_CLOSE: &str = "</s>";
pub const PAGE_BREAK: &str = "<b></b>";

/// The two heading tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Main,
    Sub,
}

impl Marker {
    pub fn open(self) -> &'static str {
        match self {
            Marker::Main => MAIN_OPEN,
            Marker::Sub => SUB_OPEN,
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            Marker::Main => MAIN_CLOSE,
            Marker::Sub => SUB_CLOSE,
        }
    }
}

/// Result of looking for one marker pair in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Neither marker of the pair is present.
    Absent,
    /// Open and close present, close follows open.
    Found(String),
    /// Open present, close missing. The pair does not match.
    Unclosed,
    /// Both present, but the first close starts before the first open ends.
    /// The pair matches and yields empty text.
    Misordered,
}

/// Look for `marker` in `text` using first-occurrence semantics.
///
/// A lone close marker is reported as [`Extraction::Absent`]: it cannot
/// turn a paragraph into a heading and is rendered verbatim.
pub fn extract(text: &str, marker: Marker) -> Extraction {
    let open = text.find(marker.open());
    let close = text.find(marker.close());
    match (open, close) {
        (Some(o), Some(c)) => {
            let start = o + marker.open().len();
            if c >= start {
                Extraction::Found(text[start..c].to_string())
            } else {
                Extraction::Misordered
            }
        }
        (Some(_), None) => Extraction::Unclosed,
        (None, _) => Extraction::Absent,
    }
}

/// `true` if `text` carries the synthetic page-break marker.
pub fn has_page_break(text: &str) -> bool {
    text.contains(PAGE_BREAK)
}

/// What a paragraph renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Text between `<m>` and `</m>`.
    MainHeading(String),
    /// Text between `<s>` and `</s>`.
    SubHeading(String),
    /// Ordinary paragraph text, page-break markers removed.
    Body(String),
    /// Nothing to render.
    Empty,
}

/// One classified source paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// 1-indexed position in the source document.
    pub paragraph: usize,
    pub kind: BlockKind,
    /// The paragraph advances the synthetic page counter. Applied after the
    /// paragraph's own heading, if any.
    pub page_break: bool,
}

/// Classify a single paragraph.
///
/// `paragraph` is the 1-indexed position used in warnings; `raw` is the
/// untrimmed paragraph text as read from the document.
pub fn classify(paragraph: usize, raw: &str) -> (Block, Vec<MarkupWarning>) {
    let text = raw.trim();
    let mut warnings = Vec::new();

    let kind = match heading(paragraph, text, Marker::Main, &mut warnings) {
        Some(t) => BlockKind::MainHeading(t),
        None => match heading(paragraph, text, Marker::Sub, &mut warnings) {
            Some(t) => BlockKind::SubHeading(t),
            None => body(text),
        },
    };

    let block = Block {
        paragraph,
        kind,
        page_break: has_page_break(text),
    };
    (block, warnings)
}

fn heading(
    paragraph: usize,
    text: &str,
    marker: Marker,
    warnings: &mut Vec<MarkupWarning>,
) -> Option<String> {
    match extract(text, marker) {
        Extraction::Found(t) => Some(t),
        Extraction::Misordered => {
            warnings.push(MarkupWarning::MisorderedMarkers {
                paragraph,
                open: marker.open().to_string(),
                close: marker.close().to_string(),
            });
            Some(String::new())
        }
        Extraction::Unclosed => {
            warnings.push(MarkupWarning::UnclosedMarker {
                paragraph,
                open: marker.open().to_string(),
                close: marker.close().to_string(),
            });
            None
        }
        Extraction::Absent => None,
    }
}

fn body(text: &str) -> BlockKind {
    let stripped = text.replace(PAGE_BREAK, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        BlockKind::Empty
    } else {
        BlockKind::Body(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(raw: &str) -> BlockKind {
        classify(1, raw).0.kind
    }

    #[test]
    fn main_heading_is_extracted() {
        assert_eq!(kind("<m>Intro</m>"), BlockKind::MainHeading("Intro".into()));
    }

    #[test]
    fn inner_whitespace_is_kept() {
        // Only the paragraph is trimmed, not the text between markers.
        assert_eq!(
            kind("  <m> Intro </m>  "),
            BlockKind::MainHeading(" Intro ".into())
        );
    }

    #[test]
    fn text_around_markers_is_dropped() {
        assert_eq!(
            kind("Chapter: <s>Scope</s> (draft)"),
            BlockKind::SubHeading("Scope".into())
        );
    }

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(
            kind("<m>One</m><m>Two</m>"),
            BlockKind::MainHeading("One".into())
        );
    }

    #[test]
    fn main_takes_precedence_over_sub() {
        assert_eq!(
            kind("<s>Sub</s><m>Main</m>"),
            BlockKind::MainHeading("Main".into())
        );
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(kind("<M>Loud</M>"), BlockKind::Body("<M>Loud</M>".into()));
    }

    #[test]
    fn page_break_alone_is_empty() {
        let (block, warnings) = classify(3, "  <b></b> ");
        assert_eq!(block.kind, BlockKind::Empty);
        assert!(block.page_break);
        assert!(warnings.is_empty());
    }

    #[test]
    fn page_break_is_stripped_from_body() {
        let (block, _) = classify(1, "End of part one.<b></b>");
        assert_eq!(block.kind, BlockKind::Body("End of part one.".into()));
        assert!(block.page_break);
    }

    #[test]
    fn heading_and_break_on_same_paragraph() {
        let (block, _) = classify(1, "<m>Closing</m><b></b>");
        assert_eq!(block.kind, BlockKind::MainHeading("Closing".into()));
        assert!(block.page_break);
    }

    #[test]
    fn blank_paragraph_is_empty() {
        assert_eq!(kind("   "), BlockKind::Empty);
    }

    // Regression: an unclosed open marker never becomes a heading. The text
    // is rendered verbatim and a warning is recorded.
    #[test]
    fn unclosed_main_marker_is_body_text() {
        let (block, warnings) = classify(7, "<m>Unclosed");
        assert_eq!(block.kind, BlockKind::Body("<m>Unclosed".into()));
        assert_eq!(
            warnings,
            vec![MarkupWarning::UnclosedMarker {
                paragraph: 7,
                open: "<m>".into(),
                close: "</m>".into(),
            }]
        );
    }

    #[test]
    fn unclosed_main_falls_through_to_sub() {
        let (block, warnings) = classify(2, "<m>broken <s>Point</s>");
        assert_eq!(block.kind, BlockKind::SubHeading("Point".into()));
        assert_eq!(warnings.len(), 1);
    }

    // Regression: a close marker ahead of the open marker still counts as a
    // heading, with empty text.
    #[test]
    fn misordered_markers_yield_empty_heading() {
        let (block, warnings) = classify(5, "</m>Backwards<m>");
        assert_eq!(block.kind, BlockKind::MainHeading(String::new()));
        assert!(matches!(
            warnings.as_slice(),
            [MarkupWarning::MisorderedMarkers { paragraph: 5, .. }]
        ));
    }

    #[test]
    fn stray_close_marker_is_plain_text() {
        let (block, warnings) = classify(1, "see </s> here");
        assert_eq!(block.kind, BlockKind::Body("see </s> here".into()));
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_heading_between_adjacent_markers() {
        assert_eq!(extract("<s></s>", Marker::Sub), Extraction::Found(String::new()));
    }
}
