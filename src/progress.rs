//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline scans the document and writes PDF pages.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docx2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     rendered: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for PageCounter {
//!     fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} written", page_num, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { rendered: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::MarkupWarning;
use std::sync::Arc;

/// Called by the conversion pipeline at each stage.
///
/// Implementations must be `Send + Sync` so a config can be moved onto a
/// blocking thread by [`crate::convert::convert_to_file_async`]. Events for
/// one conversion are always delivered from a single thread, in order. All
/// methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the DOCX has been read.
    fn on_conversion_start(&self, total_paragraphs: usize) {
        let _ = total_paragraphs;
    }

    /// Called for every malformed marker the scanner finds.
    fn on_markup_warning(&self, warning: &MarkupWarning) {
        let _ = warning;
    }

    /// Called when the index pass is done.
    fn on_index_built(&self, entries: usize) {
        let _ = entries;
    }

    /// Called once the layout engine knows how many PDF pages there will be.
    fn on_layout_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each PDF page is emitted.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed physical page number
    /// * `total_pages`: total physical pages
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once the PDF has been written to its final path.
    fn on_conversion_complete(&self, total_pages: usize, entries: usize) {
        let _ = (total_pages, entries);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
