//! Configuration types for DOCX-to-PDF conversion.
//!
//! All presentation knobs live in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. None of them affect the markup grammar or the
//! index numbering; they only change how the PDF looks.
//!
//! Defaults reproduce the classic layout: A4 paper, one-inch margins, an
//! "Index" title, and a 1in / 4in / 1in index table.

use crate::error::Docx2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per inch.
pub const INCH: f32 = 72.0;

/// Configuration for a DOCX-to-PDF conversion.
///
/// # Example
/// ```rust
/// use edgequake_docx2pdf::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .page_size(PageSize::Letter)
///     .index_title("Contents")
///     .build()
///     .unwrap();
/// assert_eq!(config.index_title, "Contents");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Paper size of every page. Default: A4.
    pub page_size: PageSize,

    /// Margin on all four sides, in points. Default: 72 (one inch).
    pub margin: f32,

    /// Heading printed above the index table. Default: "Index".
    pub index_title: String,

    /// Widths of the "Ch. No", "Title" and "Page Number" columns in points.
    /// Default: 72 / 288 / 72.
    pub column_widths: [f32; 3],

    /// Font size of the index title. Default: 18.
    pub title_font_size: f32,

    /// Font size of main headings in the body. Default: 18.
    pub heading1_font_size: f32,

    /// Font size of subheadings in the body. Default: 14.
    pub heading2_font_size: f32,

    /// Font size of body paragraphs and table cells. Default: 10.
    pub body_font_size: f32,

    /// Line height as a multiple of the font size. Default: 1.2.
    pub line_spacing: f32,

    /// Receives pipeline events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin: INCH,
            index_title: "Index".to_string(),
            column_widths: [INCH, 4.0 * INCH, INCH],
            title_font_size: 18.0,
            heading1_font_size: 18.0,
            heading2_font_size: 14.0,
            body_font_size: 10.0,
            line_spacing: 1.2,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("page_size", &self.page_size)
            .field("margin", &self.margin)
            .field("index_title", &self.index_title)
            .field("column_widths", &self.column_widths)
            .field("title_font_size", &self.title_font_size)
            .field("heading1_font_size", &self.heading1_font_size)
            .field("heading2_font_size", &self.heading2_font_size)
            .field("body_font_size", &self.body_font_size)
            .field("line_spacing", &self.line_spacing)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Width available between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_size.dimensions().0 - 2.0 * self.margin
    }

    /// Height available between the top and bottom margins.
    pub fn content_height(&self) -> f32 {
        self.page_size.dimensions().1 - 2.0 * self.margin
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin(mut self, points: f32) -> Self {
        self.config.margin = points.max(0.0);
        self
    }

    pub fn index_title(mut self, title: impl Into<String>) -> Self {
        self.config.index_title = title.into();
        self
    }

    pub fn column_widths(mut self, widths: [f32; 3]) -> Self {
        self.config.column_widths = widths;
        self
    }

    pub fn title_font_size(mut self, size: f32) -> Self {
        self.config.title_font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn heading1_font_size(mut self, size: f32) -> Self {
        self.config.heading1_font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn heading2_font_size(mut self, size: f32) -> Self {
        self.config.heading2_font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn body_font_size(mut self, size: f32) -> Self {
        self.config.body_font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn line_spacing(mut self, factor: f32) -> Self {
        self.config.line_spacing = factor.clamp(1.0, 3.0);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Docx2PdfError> {
        let c = &self.config;
        let (width, height) = c.page_size.dimensions();
        if width < 144.0 || height < 144.0 {
            return Err(Docx2PdfError::InvalidConfig(format!(
                "Page must be at least 144×144 pt, got {width}×{height}"
            )));
        }
        if c.content_width() <= 0.0 || c.content_height() <= 0.0 {
            return Err(Docx2PdfError::InvalidConfig(format!(
                "Margin {} leaves no room on a {width}×{height} pt page",
                c.margin
            )));
        }
        if c.column_widths.iter().any(|w| *w <= 0.0) {
            return Err(Docx2PdfError::InvalidConfig(
                "Column widths must be > 0".into(),
            ));
        }
        let table_width: f32 = c.column_widths.iter().sum();
        if table_width > c.content_width() {
            return Err(Docx2PdfError::InvalidConfig(format!(
                "Index table is {table_width} pt wide but only {} pt fit between the margins",
                c.content_width()
            )));
        }
        if c.index_title.trim().is_empty() {
            return Err(Docx2PdfError::InvalidConfig(
                "Index title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size of the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
    /// Width and height in points.
    Custom { width: f32, height: f32 },
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}
