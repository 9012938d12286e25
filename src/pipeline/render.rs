//! PDF serialisation: write laid-out pages to disk with `lopdf`.
//!
//! The document uses the two base-14 Helvetica faces with WinAnsiEncoding,
//! so no font files are embedded. Characters outside WinAnsi are replaced
//! by `?`.
//!
//! The file is first written next to the destination as `<name>.pdf.tmp`
//! and then renamed, so a failed write never leaves a truncated PDF at the
//! final path.

use crate::error::Docx2PdfError;
use crate::output::DocumentMetadata;
use crate::pipeline::layout::{DrawOp, FontFace, LaidOutDocument, LaidOutPage};
use crate::progress::ProgressCallback;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::Path;
use tracing::{debug, info};

/// Build the PDF in memory and write it to `output_path`.
pub fn write_pdf(
    doc: &LaidOutDocument,
    page_size: (f32, f32),
    info: &DocumentMetadata,
    output_path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<(), Docx2PdfError> {
    let bytes = encode_pdf(doc, page_size, info, progress).map_err(|e| {
        Docx2PdfError::PdfEncodeFailed {
            path: output_path.to_path_buf(),
            detail: e.to_string(),
        }
    })?;
    write_atomic(output_path, &bytes)?;
    info!(
        "Wrote {} pages ({} bytes) to {}",
        doc.pages.len(),
        bytes.len(),
        output_path.display()
    );
    Ok(())
}

/// Serialise the laid-out pages to PDF bytes.
///
/// Title, author and subject of the source are copied to the Info dictionary.
pub fn encode_pdf(
    doc: &LaidOutDocument,
    (width, height): (f32, f32),
    info: &DocumentMetadata,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<u8>, lopdf::Error> {
    let mut document = Document::with_version("1.7");
    let pages_id = document.new_object_id();

    let mut fonts = Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource(), font_id);
    }
    let resources_id = document.add_object(dictionary! { "Font" => fonts });

    let total = doc.pages.len();
    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(total);
    for (i, page) in doc.pages.iter().enumerate() {
        let content = page_content(page);
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
        debug!("Encoded page {}/{} ({} ops)", i + 1, total, page.ops.len());
        if let Some(cb) = progress {
            cb.on_page_rendered(i + 1, total);
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
        }),
    );

    let catalog_id =
        document.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    document.trailer.set("Root", catalog_id);

    let mut info_dict = dictionary! {
        "Producer" => pdf_string(concat!("edgequake-docx2pdf ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(ref t) = info.title {
        info_dict.set("Title", pdf_string(t));
    }
    if let Some(ref a) = info.author {
        info_dict.set("Author", pdf_string(a));
    }
    if let Some(ref s) = info.subject {
        info_dict.set("Subject", pdf_string(s));
    }
    let info_id = document.add_object(info_dict);
    document.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;
    Ok(bytes)
}

fn page_content(page: &LaidOutPage) -> Content {
    let mut ops = Vec::with_capacity(page.ops.len() * 5);
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                face,
                size,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(face.resource().as_bytes().to_vec()), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new("Tj", vec![pdf_string(text)]));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let rect = || {
                    Operation::new(
                        "re",
                        vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()],
                    )
                };
                ops.push(Operation::new("q", vec![]));
                if let Some(gray) = fill {
                    ops.push(Operation::new("g", vec![(*gray).into()]));
                    ops.push(rect());
                    ops.push(Operation::new("f", vec![]));
                }
                if let Some(w) = stroke {
                    ops.push(Operation::new("w", vec![(*w).into()]));
                    ops.push(Operation::new("G", vec![0.into()]));
                    ops.push(rect());
                    ops.push(Operation::new("S", vec![]));
                }
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    Content { operations: ops }
}

fn pdf_string(s: &str) -> Object {
    Object::String(to_win_ansi(s), StringFormat::Literal)
}

/// Encode text as WinAnsi (CP-1252) bytes.
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\u{20ac}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            _ => b'?',
        })
        .collect()
}

/// Write to `<path>.pdf.tmp`, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Docx2PdfError> {
    let write_err = |source| Docx2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, bytes).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_page(text: &str) -> LaidOutDocument {
        LaidOutDocument {
            pages: vec![LaidOutPage {
                ops: vec![
                    DrawOp::Rect {
                        x: 72.0,
                        y: 700.0,
                        width: 72.0,
                        height: 18.0,
                        fill: Some(0.827),
                        stroke: Some(1.0),
                    },
                    DrawOp::Text {
                        x: 78.0,
                        y: 705.0,
                        face: FontFace::Bold,
                        size: 10.0,
                        text: text.to_string(),
                    },
                ],
            }],
            index_pages: 1,
        }
    }

    #[test]
    fn win_ansi_maps_bullet_and_latin1() {
        assert_eq!(to_win_ansi("\u{2022} é"), vec![0x95, b' ', 0xe9]);
        assert_eq!(to_win_ansi("\t2.1"), b" 2.1".to_vec());
        assert_eq!(to_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn encoded_pdf_loads_back() {
        let meta = DocumentMetadata::default();
        let bytes = encode_pdf(&one_page("Hello (world)"), (595.28, 841.89), &meta, None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(s, _)) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![b"Hello (world)".to_vec()]);
    }

    #[test]
    fn atomic_write_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.pdf");
        let meta = DocumentMetadata::default();
        write_pdf(&one_page("x"), (612.0, 792.0), &meta, &out, None).unwrap();
        assert!(out.exists());
        assert!(!out.with_extension("pdf.tmp").exists());
    }

    #[test]
    fn unwritable_destination_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        // A regular file cannot act as a parent directory.
        let out = blocker.join("out.pdf");
        let meta = DocumentMetadata::default();
        let err = write_pdf(&one_page("x"), (612.0, 792.0), &meta, &out, None).unwrap_err();
        assert!(err.is_output_write(), "got {err:?}");
    }
}
