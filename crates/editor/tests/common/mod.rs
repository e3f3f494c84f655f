//! Shared fixtures for the editor integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use image::{ImageBuffer, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{dictionary, Object};
use page_editor::{
    DocRect, DocumentLibrary, EditorError, PageSize, Rasterizer, Result, RgbColor, TextRun,
};

/// Route editor logs to the test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("page_editor=debug")
        .try_init();
}

/// Build a PDF whose pages have the given sizes
pub fn pdf_with_sizes(sizes: &[(f64, f64)]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for (width, height) in sizes {
        let contents_id = doc.add_object(lopdf::Stream::new(dictionary! {}, b"0 g\n".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width as f32).into(), (*height as f32).into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// US Letter pages
pub fn letter_pdf(pages: usize) -> Vec<u8> {
    pdf_with_sizes(&vec![(612.0, 792.0); pages])
}

/// A small opaque PNG, 200x100
pub fn signature_png() -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_fn(200, 100, |x, _| {
        if x % 2 == 0 {
            Rgba([0, 0, 128, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Width of every page of a saved PDF, in order
pub fn page_widths(bytes: &[u8]) -> Vec<f64> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            number(&media_box[2])
        })
        .collect()
}

/// Decoded content operations of one page (1-indexed)
pub fn page_operations(bytes: &[u8], page: u32) -> Vec<(String, Vec<f64>)> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content
        .operations
        .into_iter()
        .map(|op| {
            let operands = op
                .operands
                .iter()
                .filter_map(|o| match o {
                    Object::Integer(_) | Object::Real(_) => Some(number(o)),
                    _ => None,
                })
                .collect();
            (op.operator, operands)
        })
        .collect()
}

/// Operands of every use of `operator` on a page
pub fn operator_uses(bytes: &[u8], page: u32, operator: &str) -> Vec<Vec<f64>> {
    page_operations(bytes, page)
        .into_iter()
        .filter(|(op, _)| op == operator)
        .map(|(_, operands)| operands)
        .collect()
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {other:?}"),
    }
}

pub fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} is not within {tolerance} of {expected}"
    );
}

/// A library call observed by [`RecordingLibrary`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load,
    Create,
    CopyPages(Vec<usize>),
    DrawImage { page: usize, rect: DocRect },
    DrawText { page: usize, text: String },
    DrawRectangle { page: usize, rect: DocRect },
    Save,
}

/// In-memory stand-in for a PDF document
#[derive(Debug, Clone)]
pub struct FakeDocument {
    pub pages: Vec<PageSize>,
}

/// Document library that records every call
///
/// Documents are encoded as `FAKE:<page count>`; every page is US Letter.
#[derive(Debug, Default)]
pub struct RecordingLibrary {
    calls: RefCell<Vec<Call>>,
    /// Fail the n-th draw call (0-based)
    pub fail_on_draw: Option<usize>,
    draws: Cell<usize>,
}

impl RecordingLibrary {
    pub fn failing_on_draw(n: usize) -> Self {
        Self {
            fail_on_draw: Some(n),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn draw(&self, call: Call) -> Result<()> {
        let n = self.draws.get();
        self.draws.set(n + 1);
        if self.fail_on_draw == Some(n) {
            return Err(EditorError::LibraryError(format!("draw {n} failed")));
        }
        self.record(call);
        Ok(())
    }

    fn check_page(document: &FakeDocument, page_index: usize) -> Result<()> {
        if page_index >= document.pages.len() {
            return Err(EditorError::InvalidPage(page_index, document.pages.len()));
        }
        Ok(())
    }
}

pub fn fake_pdf(pages: usize) -> Vec<u8> {
    format!("FAKE:{pages}").into_bytes()
}

impl DocumentLibrary for RecordingLibrary {
    type Document = FakeDocument;

    fn load_document(&self, bytes: &[u8]) -> Result<FakeDocument> {
        self.record(Call::Load);
        let pages: usize = std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.strip_prefix("FAKE:"))
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| EditorError::LoadError("not a fake document".into()))?;
        Ok(FakeDocument {
            pages: vec![
                PageSize {
                    width: 612.0,
                    height: 792.0
                };
                pages
            ],
        })
    }

    fn create_document(&self) -> Result<FakeDocument> {
        self.record(Call::Create);
        Ok(FakeDocument { pages: Vec::new() })
    }

    fn page_count(&self, document: &FakeDocument) -> usize {
        document.pages.len()
    }

    fn page_size(&self, document: &FakeDocument, page_index: usize) -> Result<PageSize> {
        Self::check_page(document, page_index)?;
        Ok(document.pages[page_index])
    }

    fn copy_pages(
        &self,
        target: &mut FakeDocument,
        source: &FakeDocument,
        page_indices: &[usize],
    ) -> Result<()> {
        for &index in page_indices {
            Self::check_page(source, index)?;
            target.pages.push(source.pages[index]);
        }
        self.record(Call::CopyPages(page_indices.to_vec()));
        Ok(())
    }

    fn draw_image(
        &self,
        document: &mut FakeDocument,
        page_index: usize,
        _image: &[u8],
        rect: DocRect,
    ) -> Result<()> {
        Self::check_page(document, page_index)?;
        self.draw(Call::DrawImage {
            page: page_index,
            rect,
        })
    }

    fn draw_text(
        &self,
        document: &mut FakeDocument,
        page_index: usize,
        run: &TextRun<'_>,
    ) -> Result<()> {
        Self::check_page(document, page_index)?;
        self.draw(Call::DrawText {
            page: page_index,
            text: run.text.to_string(),
        })
    }

    fn draw_rectangle(
        &self,
        document: &mut FakeDocument,
        page_index: usize,
        rect: DocRect,
        _color: RgbColor,
    ) -> Result<()> {
        Self::check_page(document, page_index)?;
        self.draw(Call::DrawRectangle {
            page: page_index,
            rect,
        })
    }

    fn save(&self, document: &mut FakeDocument) -> Result<Vec<u8>> {
        self.record(Call::Save);
        Ok(fake_pdf(document.pages.len()))
    }
}

/// Renders fake pages as blank bitmaps of the page size times the scale
#[derive(Debug, Default)]
pub struct FakeRasterizer;

impl Rasterizer<FakeDocument> for FakeRasterizer {
    fn render_page(&self, document: &FakeDocument, page_index: usize, scale: f64) -> Result<RgbaImage> {
        let size = document
            .pages
            .get(page_index)
            .ok_or(EditorError::InvalidPage(page_index, document.pages.len()))?;
        Ok(RgbaImage::new(
            (size.width * scale).round() as u32,
            (size.height * scale).round() as u32,
        ))
    }
}
