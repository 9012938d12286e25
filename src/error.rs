//! Error types for the edgequake-docx2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Docx2PdfError`] is **fatal**: the conversion cannot proceed at all
//!   (missing or corrupt DOCX, unwritable output, bad configuration).
//!   Returned as `Err(Docx2PdfError)` from every public entry point.
//!
//! * [`MarkupWarning`] is **non-fatal**: a paragraph carries a marker the
//!   scanner cannot pair up. The conversion continues with best-effort text
//!   and the warning is logged and returned in
//!   [`crate::output::ConversionOutput::warnings`].
//!
//! Callers that only care about the coarse category (the upload layer maps
//! read failures to HTTP 400 and write failures to HTTP 500, for instance)
//! can match on [`Docx2PdfError::kind`] instead of individual variants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Docx2PdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The source document is missing, unreadable or corrupt.
    DocumentRead,
    /// The PDF could not be produced at the output path.
    OutputWrite,
    /// The configuration was rejected by the builder.
    Config,
    /// Unexpected internal failure.
    Internal,
}

/// All fatal errors returned by the edgequake-docx2pdf library.
#[derive(Debug, Error)]
pub enum Docx2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("DOCX file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a ZIP-based DOCX package.
    #[error("File is not a valid DOCX package: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    /// The package opened but `word/document.xml` is missing or malformed.
    #[error("DOCX '{path}' is corrupt: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// lopdf refused to serialise the document.
    #[error("Failed to encode PDF for '{path}': {detail}")]
    PdfEncodeFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Docx2PdfError {
    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Docx2PdfError::FileNotFound { .. }
            | Docx2PdfError::PermissionDenied { .. }
            | Docx2PdfError::NotADocx { .. }
            | Docx2PdfError::CorruptDocument { .. } => ErrorKind::DocumentRead,
            Docx2PdfError::OutputWriteFailed { .. } | Docx2PdfError::PdfEncodeFailed { .. } => {
                ErrorKind::OutputWrite
            }
            Docx2PdfError::InvalidConfig(_) => ErrorKind::Config,
            Docx2PdfError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` when the source document could not be read.
    pub fn is_document_read(&self) -> bool {
        self.kind() == ErrorKind::DocumentRead
    }

    /// `true` when the output PDF could not be written.
    pub fn is_output_write(&self) -> bool {
        self.kind() == ErrorKind::OutputWrite
    }
}

/// A non-fatal markup problem in a single paragraph.
///
/// `paragraph` is the 1-indexed position of the paragraph in the document.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MarkupWarning {
    /// An open marker has no close marker anywhere in the paragraph.
    /// The paragraph is rendered as plain body text and produces no entry.
    #[error("Paragraph {paragraph}: '{open}' has no matching '{close}'; treated as body text")]
    UnclosedMarker {
        paragraph: usize,
        open: String,
        close: String,
    },

    /// Both markers are present but the first close marker does not follow
    /// the first open marker. The entry is kept with empty text.
    #[error("Paragraph {paragraph}: '{close}' appears before the end of '{open}'; heading text is empty")]
    MisorderedMarkers {
        paragraph: usize,
        open: String,
        close: String,
    },
}

impl MarkupWarning {
    /// 1-indexed paragraph the warning refers to.
    pub fn paragraph(&self) -> usize {
        match self {
            MarkupWarning::UnclosedMarker { paragraph, .. }
            | MarkupWarning::MisorderedMarkers { paragraph, .. } => *paragraph,
        }
    }
}
