//! Finalization: writing the session's edits into a fresh copy of the document
//!
//! Every pass starts from the source bytes, so running it twice on the same
//! state produces the same output, and a failed pass leaves nothing behind.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RgbColor;
use crate::geometry::{scroll_rect_to_document, DocRect, PageLayout, Rect};
use crate::library::{DocumentLibrary, TextRun};
use crate::overlay::{OverlayContent, OverlayItem};
use crate::redaction::RedactionArea;
use crate::{EditorError, Result};

pub(crate) const NO_OVERLAYS: &str =
    "Please upload a PDF and add at least one item (text, image, or signature).";
pub(crate) const NO_REDACTIONS: &str = "Please draw at least one redaction area.";
pub(crate) const NO_PAGES: &str = "Please upload a file and ensure pages are loaded.";

/// Distance from the baseline to the middle of Helvetica's glyph body, in ems
const TEXT_MIDLINE: f64 = 0.255;

/// Progress update for long-running operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub percentage: u8,
    pub status: String,
}

impl Progress {
    pub fn new(percentage: u8, status: impl Into<String>) -> Self {
        Self {
            percentage,
            status: status.into(),
        }
    }
}

/// Per-item percentage: items share the 20-90 % range
fn item_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 90;
    }
    20 + ((done as f64 / total as f64) * 70.0).round().min(70.0) as u8
}

/// Applies overlays, redactions or a page order to a document
pub struct Finalizer<'a, L: DocumentLibrary> {
    library: &'a L,
    layout: &'a PageLayout,
}

impl<'a, L: DocumentLibrary> Finalizer<'a, L> {
    pub fn new(library: &'a L, layout: &'a PageLayout) -> Self {
        Self { library, layout }
    }

    /// Draw every overlay item, in insertion order
    pub fn apply_overlays<F: FnMut(Progress)>(
        &self,
        source: &[u8],
        items: &[OverlayItem],
        mut on_progress: F,
    ) -> Result<Vec<u8>> {
        if items.is_empty() {
            return Err(EditorError::EmptyInput(NO_OVERLAYS.to_string()));
        }
        info!(items = items.len(), "applying overlays");

        let mut document = self.library.load_document(source)?;
        on_progress(Progress::new(20, "Applying edits..."));

        for (i, item) in items.iter().enumerate() {
            on_progress(Progress::new(
                item_percent(i, items.len()),
                format!("Applying item {}", i + 1),
            ));
            self.draw_overlay(&mut document, item)?;
        }

        on_progress(Progress::new(100, "Saving document..."));
        let bytes = self.library.save(&mut document)?;
        info!(bytes = bytes.len(), "overlays applied");
        Ok(bytes)
    }

    /// Fill every redaction area with `color`, in drawing order
    pub fn apply_redactions<F: FnMut(Progress)>(
        &self,
        source: &[u8],
        areas: &[RedactionArea],
        color: RgbColor,
        mut on_progress: F,
    ) -> Result<Vec<u8>> {
        if areas.is_empty() {
            return Err(EditorError::EmptyInput(NO_REDACTIONS.to_string()));
        }
        info!(areas = areas.len(), "applying redactions");

        let mut document = self.library.load_document(source)?;
        on_progress(Progress::new(20, "Applying redactions..."));

        for (i, area) in areas.iter().enumerate() {
            on_progress(Progress::new(
                item_percent(i, areas.len()),
                format!("Redacting area {}", i + 1),
            ));
            let (rect, _) = self.document_rect(&document, area.page_index, &area.rect)?;
            self.library
                .draw_rectangle(&mut document, area.page_index, rect, color)?;
        }

        on_progress(Progress::new(100, "Saving document..."));
        let bytes = self.library.save(&mut document)?;
        info!(bytes = bytes.len(), "redactions applied");
        Ok(bytes)
    }

    /// Build a new document from source pages in `order`
    pub fn assemble_pages<F: FnMut(Progress)>(
        &self,
        source: &[u8],
        order: &[usize],
        mut on_progress: F,
    ) -> Result<Vec<u8>> {
        if order.is_empty() {
            return Err(EditorError::EmptyInput(NO_PAGES.to_string()));
        }
        info!(?order, "assembling pages");

        let source = self.library.load_document(source)?;
        let mut output = self.library.create_document()?;

        on_progress(Progress::new(20, "Copying pages..."));
        self.library.copy_pages(&mut output, &source, order)?;

        on_progress(Progress::new(70, "Assembling new PDF..."));
        let bytes = self.library.save(&mut output)?;
        info!(pages = order.len(), bytes = bytes.len(), "pages assembled");
        Ok(bytes)
    }

    fn draw_overlay(&self, document: &mut L::Document, item: &OverlayItem) -> Result<()> {
        let (rect, scale) = self.document_rect(document, item.page_index, &item.rect)?;
        debug!(id = item.id, page = item.page_index, x = rect.x, y = rect.y, "drawing overlay");

        match &item.content {
            OverlayContent::Bitmap { data } => {
                self.library
                    .draw_image(document, item.page_index, data, rect)
            }
            OverlayContent::Text(text) => {
                let font_size = text.font_size / scale;
                let run = TextRun {
                    text: &text.text,
                    x: rect.x,
                    y: rect.y + rect.height / 2.0 - font_size * TEXT_MIDLINE,
                    font_size,
                    color: text.color,
                };
                self.library.draw_text(document, item.page_index, &run)
            }
        }
    }

    /// Document-space rectangle for a scroll-space rectangle on `page_index`,
    /// with that page's scale
    fn document_rect(
        &self,
        document: &L::Document,
        page_index: usize,
        rect: &Rect,
    ) -> Result<(DocRect, f64)> {
        let page_box = self
            .layout
            .page(page_index)
            .ok_or(EditorError::InvalidPage(page_index, self.layout.len()))?;
        let size = self.library.page_size(document, page_index)?;
        Ok((scroll_rect_to_document(rect, page_box, size.height), page_box.scale))
    }
}
