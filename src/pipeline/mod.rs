//! Pipeline stages for DOCX-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ markup ──▶ scan ──▶ layout ──▶ render
//! (DOCX)   (classify) (index)  (pages)    (lopdf)
//! ```
//!
//! 1. [`input`]: validate the path and pull paragraph texts and core
//!    properties out of the DOCX package
//! 2. [`markup`]: classify one paragraph as main heading, subheading, body
//!    or empty; the only place that knows the marker grammar
//! 3. [`scan`]: run the classifier over every paragraph and number the
//!    index entries
//! 4. [`layout`]: turn entries and blocks into flow instructions, then into
//!    positioned text and rectangles on fixed-size pages
//! 5. [`render`]: serialise the positioned pages with lopdf and write the
//!    file atomically

pub mod input;
pub mod layout;
pub mod markup;
pub mod render;
pub mod scan;
