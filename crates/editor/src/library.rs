//! Document library seam and its lopdf-backed implementation
//!
//! The editor never touches PDF objects directly. Everything it needs from a
//! document goes through [`DocumentLibrary`], using 0-indexed pages.

use image::{Rgba, RgbaImage};
use pdf_core::{PdfDocument, PdfError};
use serde::{Deserialize, Serialize};

use crate::config::RgbColor;
use crate::geometry::DocRect;
use crate::raster::Rasterizer;
use crate::{EditorError, Result};

/// Largest bitmap edge [`BlankRasterizer`] will allocate (px)
const MAX_RASTER_EDGE: f64 = 16384.0;

/// Page size in document points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// One line of text to draw, positioned by its baseline start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub color: RgbColor,
}

/// Operations the editor needs from a PDF library
pub trait DocumentLibrary {
    type Document;

    fn load_document(&self, bytes: &[u8]) -> Result<Self::Document>;

    /// A new document without pages
    fn create_document(&self) -> Result<Self::Document>;

    fn page_count(&self, document: &Self::Document) -> usize;

    fn page_size(&self, document: &Self::Document, page_index: usize) -> Result<PageSize>;

    /// Append copies of `source` pages to `target`, in the order given
    fn copy_pages(
        &self,
        target: &mut Self::Document,
        source: &Self::Document,
        page_indices: &[usize],
    ) -> Result<()>;

    /// Place an encoded image (PNG or JPEG) on a page
    fn draw_image(
        &self,
        document: &mut Self::Document,
        page_index: usize,
        image: &[u8],
        rect: DocRect,
    ) -> Result<()>;

    fn draw_text(
        &self,
        document: &mut Self::Document,
        page_index: usize,
        run: &TextRun<'_>,
    ) -> Result<()>;

    fn draw_rectangle(
        &self,
        document: &mut Self::Document,
        page_index: usize,
        rect: DocRect,
        color: RgbColor,
    ) -> Result<()>;

    fn save(&self, document: &mut Self::Document) -> Result<Vec<u8>>;
}

/// [`DocumentLibrary`] over `pdf_core::PdfDocument`
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfLibrary;

/// pdf-core numbers pages from 1
fn page_number(page_index: usize) -> usize {
    page_index + 1
}

fn page_error(err: PdfError) -> EditorError {
    match err {
        PdfError::InvalidPage(page, count) => EditorError::InvalidPage(page.saturating_sub(1), count),
        other => EditorError::PdfError(other),
    }
}

impl DocumentLibrary for LopdfLibrary {
    type Document = PdfDocument;

    fn load_document(&self, bytes: &[u8]) -> Result<PdfDocument> {
        PdfDocument::open_from_bytes(bytes).map_err(|e| EditorError::LoadError(e.to_string()))
    }

    fn create_document(&self) -> Result<PdfDocument> {
        Ok(PdfDocument::new())
    }

    fn page_count(&self, document: &PdfDocument) -> usize {
        document.page_count()
    }

    fn page_size(&self, document: &PdfDocument, page_index: usize) -> Result<PageSize> {
        let (width, height) = document
            .page_size(page_number(page_index))
            .map_err(page_error)?;
        Ok(PageSize { width, height })
    }

    fn copy_pages(
        &self,
        target: &mut PdfDocument,
        source: &PdfDocument,
        page_indices: &[usize],
    ) -> Result<()> {
        let pages: Vec<usize> = page_indices.iter().copied().map(page_number).collect();
        target.import_pages(source, &pages).map_err(page_error)
    }

    fn draw_image(
        &self,
        document: &mut PdfDocument,
        page_index: usize,
        image: &[u8],
        rect: DocRect,
    ) -> Result<()> {
        document
            .draw_image(
                image,
                page_number(page_index),
                rect.x,
                rect.y,
                rect.width,
                rect.height,
            )
            .map_err(page_error)
    }

    fn draw_text(
        &self,
        document: &mut PdfDocument,
        page_index: usize,
        run: &TextRun<'_>,
    ) -> Result<()> {
        document
            .draw_text(
                run.text,
                page_number(page_index),
                run.x,
                run.y,
                run.font_size,
                run.color.to_pdf(),
            )
            .map_err(page_error)
    }

    fn draw_rectangle(
        &self,
        document: &mut PdfDocument,
        page_index: usize,
        rect: DocRect,
        color: RgbColor,
    ) -> Result<()> {
        document
            .draw_rectangle(
                page_number(page_index),
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                color.to_pdf(),
            )
            .map_err(page_error)
    }

    fn save(&self, document: &mut PdfDocument) -> Result<Vec<u8>> {
        Ok(document.to_bytes()?)
    }
}

/// Renders every page as a white canvas of the page's size
///
/// For headless use, and for hosts that paint the real page images
/// themselves and only need the layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRasterizer;

impl Rasterizer<PdfDocument> for BlankRasterizer {
    fn render_page(&self, document: &PdfDocument, page_index: usize, scale: f64) -> Result<RgbaImage> {
        let size = LopdfLibrary.page_size(document, page_index)?;
        let width = (size.width * scale).round().max(1.0);
        let height = (size.height * scale).round().max(1.0);

        if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
            return Err(EditorError::RenderError(
                page_index,
                format!("{width}x{height} px exceeds the raster limit"),
            ));
        }

        Ok(RgbaImage::from_pixel(
            width as u32,
            height as u32,
            Rgba([255, 255, 255, 255]),
        ))
    }
}
