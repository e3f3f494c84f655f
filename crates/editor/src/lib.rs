//! Page Editor - visual editing core for PDF documents
//!
//! This crate provides:
//! - A page layout table mapping the stacked page previews ("scroll space")
//!   to each page's own coordinate system
//! - Overlay items (text, image, signature) and redaction rectangles placed
//!   by pointer drags
//! - A page organizer for reordering and deleting pages
//! - A finalization pass that writes all edits into the document
//!
//! Document access and page rendering are injected through the
//! [`DocumentLibrary`] and [`Rasterizer`] traits. [`LopdfLibrary`] and
//! [`BlankRasterizer`] provide a pure-Rust implementation of both.
//!
//! # Example
//!
//! ```ignore
//! use page_editor::{BlankRasterizer, EditorConfig, EditorSession, LopdfLibrary, Point, Tool};
//!
//! let mut session = EditorSession::new(LopdfLibrary, BlankRasterizer, EditorConfig::default());
//! session.select_tool(Tool::Redact);
//! session.load("report.pdf", pdf_bytes, |_| {})?;
//! session.pointer_down(Point::new(40.0, 60.0));
//! session.pointer_move(Point::new(240.0, 90.0))?;
//! session.pointer_up();
//! let redacted = session.process(|p| println!("{}% {}", p.percentage, p.status))?;
//! ```

mod config;
mod drag;
mod finalize;
mod geometry;
mod library;
mod organizer;
mod overlay;
mod raster;
mod redaction;
mod session;
mod tools;

pub use config::{EditorConfig, LayoutConfig, RgbColor};
pub use drag::{DragController, DragOutcome, DragState, PointerTarget};
pub use finalize::{Finalizer, Progress};
pub use geometry::{
    document_rect_to_scroll, page_index_for_scroll_y, scroll_point_to_document,
    scroll_rect_to_document, DocRect, PageBox, PageLayout, Point, Rect, Size, Viewport,
};
pub use library::{BlankRasterizer, DocumentLibrary, LopdfLibrary, PageSize, TextRun};
pub use organizer::{PageEntry, PageOrganizer};
pub use overlay::{initial_overlay_size, ItemId, OverlayContent, OverlayItem, OverlayKind, OverlayStore, TextOverlay};
pub use raster::{PageRaster, RasterPageCache, Rasterizer};
pub use redaction::{AreaId, RedactionArea, RedactionList};
pub use session::{EditorSession, ProcessingState};
pub use tools::{merge, split, SplitPart, Tool};

use thiserror::Error;

/// Errors that can occur while editing or finalizing a document
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to load document: {0}")]
    LoadError(String),

    #[error("Failed to render page {0}: {1}")]
    RenderError(usize, String),

    #[error("{0}")]
    EmptyInput(String),

    #[error("Page index {0} is out of range (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("No overlay item with id {0}")]
    UnknownItem(ItemId),

    #[error("No redaction area with id {0}")]
    UnknownArea(AreaId),

    #[error("No document loaded")]
    NoDocument,

    #[error("Operation not available in the {0} tool")]
    WrongTool(&'static str),

    #[error("Document library error: {0}")]
    LibraryError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EditorError {
    /// Message shown to the user when a `process` or `load` call fails
    pub fn user_message(&self) -> String {
        match self {
            EditorError::LoadError(_) | EditorError::RenderError(..) => {
                "Failed to load PDF. The file might be corrupt or protected.".to_string()
            }
            EditorError::EmptyInput(msg) => msg.clone(),
            other => format!("An error occurred during processing: {other}"),
        }
    }
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
