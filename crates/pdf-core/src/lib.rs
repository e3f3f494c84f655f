//! PDF Core - Low-level PDF page manipulation
//!
//! This crate provides functionality for:
//! - Opening, creating and saving PDF documents
//! - Reading page sizes (with MediaBox inheritance)
//! - Copying pages between documents
//! - Drawing images, filled rectangles and Helvetica text at PDF coordinates
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument};
//!
//! let mut doc = PdfDocument::open("input.pdf")?;
//! doc.draw_rectangle(1, 72.0, 600.0, 200.0, 24.0, Color::black())?;
//! doc.draw_image(&signature_png, 1, 350.0, 80.0, 150.0, 50.0)?;
//! doc.save("redacted.pdf")?;
//! ```

mod document;
mod image;
mod text;

pub use document::{Color, PdfDocument};
pub use image::{get_dimensions, ImageDimensions};
pub use text::{encode_win_ansi, generate_text_operators, STANDARD_FONT_RESOURCE};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// A4 page size in points, used when a page carries no usable MediaBox
pub const A4_SIZE: (f64, f64) = (595.28, 841.89);
