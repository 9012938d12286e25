//! Input resolution and DOCX paragraph extraction.
//!
//! A DOCX file is a ZIP package; the body lives in `word/document.xml` and
//! the core properties (title, author …) in `docProps/core.xml`. We validate
//! the ZIP magic bytes (`PK\x03\x04`) before opening the archive so callers
//! get a meaningful error for a renamed PDF or a truncated upload rather than
//! a generic ZIP failure.
//!
//! ## What counts as a paragraph
//!
//! Only top-level body paragraphs (`w:body/w:p`) are returned, in document
//! order. Paragraphs inside tables and text boxes are skipped. A paragraph's
//! text is the concatenation of its runs, with `w:tab` as `\t` and
//! `w:br`/`w:cr` as `\n`. Deleted text (`w:delText`) is ignored.

use crate::error::Docx2PdfError;
use crate::output::DocumentMetadata;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
const DOCUMENT_PART: &str = "word/document.xml";
const CORE_PART: &str = "docProps/core.xml";

/// Paragraph texts plus package metadata.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    pub paragraphs: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// Validate that `path` is an existing, readable DOCX package.
pub fn resolve_local(path: &Path) -> Result<PathBuf, Docx2PdfError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Docx2PdfError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if magic == ZIP_MAGIC => {}
                Ok(()) => return Err(Docx2PdfError::NotADocx { path, magic }),
                Err(_) => {
                    return Err(Docx2PdfError::NotADocx {
                        path,
                        magic: [0; 4],
                    })
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Docx2PdfError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Docx2PdfError::FileNotFound { path });
        }
    }

    debug!("Resolved local DOCX: {}", path.display());
    Ok(path)
}

/// Open a DOCX file and read its paragraphs and metadata.
///
/// Every call re-opens the file; nothing is cached between passes.
pub fn read_document(path: &Path) -> Result<SourceDocument, Docx2PdfError> {
    let path = resolve_local(path)?;
    let file = std::fs::File::open(&path).map_err(|e| corrupt(&path, e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| corrupt(&path, format!("cannot open ZIP archive: {e}")))?;

    let xml = read_part(&mut archive, DOCUMENT_PART)
        .map_err(|e| corrupt(&path, e))?
        .ok_or_else(|| corrupt(&path, format!("missing {DOCUMENT_PART}")))?;
    let paragraphs = parse_paragraphs(&xml).map_err(|e| corrupt(&path, e))?;

    let mut metadata = match read_part(&mut archive, CORE_PART) {
        Ok(Some(core)) => parse_core_properties(&core),
        Ok(None) => DocumentMetadata::default(),
        Err(e) => {
            debug!("Ignoring unreadable {}: {}", CORE_PART, e);
            DocumentMetadata::default()
        }
    };
    metadata.paragraph_count = paragraphs.len();

    debug!(
        "Read {} paragraphs from {}",
        paragraphs.len(),
        path.display()
    );

    Ok(SourceDocument {
        paragraphs,
        metadata,
    })
}

/// Read a package part as UTF-8, `Ok(None)` if it does not exist.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, String> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(format!("cannot open {name}: {e}")),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("cannot read {name}: {e}"))?;
    Ok(Some(content))
}

fn corrupt(path: &Path, detail: impl ToString) -> Docx2PdfError {
    Docx2PdfError::CorruptDocument {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Extract top-level paragraph texts from `word/document.xml`.
pub fn parse_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // Stack depth at which the current top-level paragraph was opened.
    let mut para_depth: Option<usize> = None;
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && para_depth.is_none() && parent_is(&stack, b"body") {
                    para_depth = Some(stack.len());
                    current.clear();
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                if let Some(depth) = para_depth {
                    if in_own_run(&stack, depth) {
                        match name.as_ref() {
                            b"tab" => current.push('\t'),
                            b"br" if is_layout_break(e) => {}
                            b"br" | b"cr" => current.push('\n'),
                            _ => {}
                        }
                    }
                } else if name.as_ref() == b"p" && parent_is(&stack, b"body") {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                if para_depth == Some(stack.len()) {
                    para_depth = None;
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(depth) = para_depth {
                    if stack.last().map(Vec::as_slice) == Some(b"t".as_slice())
                        && in_own_run(&stack[..stack.len() - 1], depth)
                    {
                        let text = e.unescape().map_err(|e| format!("XML parse error: {e}"))?;
                        current.push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// `w:br` with `w:type="page"` or `"column"` moves text without adding a line.
fn is_layout_break(e: &BytesStart) -> bool {
    e.attributes().flatten().any(|a| {
        a.key.local_name().as_ref() == b"type"
            && matches!(a.value.as_ref(), b"page" | b"column")
    })
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().map(Vec::as_slice) == Some(name)
}

/// `stack` ends in a `w:r` that belongs to the paragraph opened at `depth`
/// (directly or through `w:hyperlink`, `w:ins`, `w:smartTag` …), not to a
/// nested text box or paragraph.
fn in_own_run(stack: &[Vec<u8>], depth: usize) -> bool {
    if !parent_is(stack, b"r") || stack.len() <= depth {
        return false;
    }
    let inner = &stack[depth + 1..stack.len() - 1];
    !inner
        .iter()
        .any(|n| n.as_slice() == b"r" || n.as_slice() == b"p" || n.as_slice() == b"txbxContent")
}

/// Pull title/creator/subject out of `docProps/core.xml`.
///
/// Errors are swallowed: metadata is decorative and must never fail a
/// conversion.
pub fn parse_core_properties(xml: &str) -> DocumentMetadata {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut meta = DocumentMetadata::default();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                current = Some(e.local_name().as_ref().to_vec());
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(e)) => {
                let Some(ref tag) = current else {
                    buf.clear();
                    continue;
                };
                let value = e.unescape().map(|v| v.to_string()).unwrap_or_default();
                if value.is_empty() {
                    buf.clear();
                    continue;
                }
                match tag.as_slice() {
                    b"title" => meta.title = Some(value),
                    b"creator" => meta.author = Some(value),
                    b"subject" => meta.subject = Some(value),
                    b"lastModifiedBy" => meta.last_modified_by = Some(value),
                    b"created" => meta.creation_date = Some(value),
                    b"modified" => meta.modification_date = Some(value),
                    _ => {}
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}<w:sectPr/></w:body></w:document>"#
        )
    }

    #[test]
    fn runs_are_concatenated_with_whitespace_preserved() {
        let xml = body(
            r#"<w:p><w:r><w:t xml:space="preserve">&lt;m&gt;Intro </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>part&lt;/m&gt;</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["<m>Intro part</m>"]);
    }

    #[test]
    fn tabs_and_breaks_become_control_chars() {
        let xml = body(r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#);
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["a\tb\nc"]);
    }

    #[test]
    fn page_and_column_breaks_add_no_text() {
        let xml = body(
            r#"<w:p><w:r><w:t>&lt;m&gt;Intro</w:t><w:br w:type="page"/><w:t>duction&lt;/m&gt;</w:t></w:r></w:p><w:p><w:r><w:t>a</w:t><w:br w:type="column"/><w:t>b</w:t><w:br w:type="textWrapping"/><w:t>c</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            parse_paragraphs(&xml).unwrap(),
            vec!["<m>Introduction</m>", "ab\nc"]
        );
    }

    #[test]
    fn empty_paragraphs_are_kept_in_order() {
        let xml = body(r#"<w:p><w:r><w:t>one</w:t></w:r></w:p><w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t>two</w:t></w:r></w:p>"#);
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["one", "", "", "two"]);
    }

    #[test]
    fn table_paragraphs_are_skipped() {
        let xml = body(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn hyperlink_runs_are_included() {
        let xml = body(r#"<w:p><w:r><w:t>see </w:t></w:r><w:hyperlink><w:r><w:t>docs</w:t></w:r></w:hyperlink></w:p>"#);
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["see docs"]);
    }

    #[test]
    fn text_box_content_is_excluded() {
        let xml = body(
            r#"<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:pict><v:shape><v:textbox><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></v:textbox></v:shape></w:pict></w:r></w:p>"#,
        );
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["outer"]);
    }

    #[test]
    fn deleted_text_is_ignored() {
        let xml = body(r#"<w:p><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:r><w:t>kept</w:t></w:r></w:p>"#);
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["kept"]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_paragraphs("<w:document><w:body><w:p></w:body>").is_err());
    }

    #[test]
    fn core_properties_are_read() {
        let xml = r#"<?xml version="1.0"?><cp:coreProperties xmlns:cp="x" xmlns:dc="y"><dc:title>Handbook</dc:title><dc:creator>Ops Team</dc:creator><dc:subject></dc:subject></cp:coreProperties>"#;
        let meta = parse_core_properties(xml);
        assert_eq!(meta.title.as_deref(), Some("Handbook"));
        assert_eq!(meta.author.as_deref(), Some("Ops Team"));
        assert_eq!(meta.subject, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, Docx2PdfError::FileNotFound { .. }));
    }

    #[test]
    fn non_zip_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"%PDF-1.7 not a docx").unwrap();
        let err = resolve_local(&path).unwrap_err();
        assert!(matches!(err, Docx2PdfError::NotADocx { magic, .. } if &magic == b"%PDF"));
    }
}
