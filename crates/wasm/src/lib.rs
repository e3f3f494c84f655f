//! WASM bindings for the page editor
//!
//! This crate provides a JavaScript-friendly API for:
//! - Loading a PDF and laying out its page previews
//! - Placing text, image and signature overlays or drawing redactions
//! - Reordering and deleting pages
//! - Writing the edits into a new PDF, plus merge and split helpers
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { PdfEditor } from 'page-editor-wasm';
//!
//! await init();
//!
//! // Render previews with pdf.js; returns an ImageData-like object
//! const editor = new PdfEditor('sign-pdf', (pageIndex, scale) => renderPage(pageIndex, scale));
//! editor.load(file.name, bytes, (p) => console.log(p.percentage, p.status));
//!
//! editor.setViewport(el.scrollLeft, el.scrollTop, el.clientWidth, el.clientHeight);
//! editor.addImage('signature', signatureBytes);
//!
//! const output = editor.process();
//! download(output, editor.outputFilename());
//! ```

use image::RgbaImage;
use js_sys::{Array, Function, Reflect, Uint8Array};
use page_editor::{
    AreaId, BlankRasterizer, DragOutcome, EditorConfig, EditorError, EditorSession, ItemId,
    LopdfLibrary, OverlayContent, OverlayKind, PageBox, Point, Progress, Rasterizer, Rect,
    RgbColor, TextOverlay, Tool, Viewport,
};
use pdf_core::PdfDocument;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: EditorError) -> JsValue {
    JsValue::from_str(&e.user_message())
}

/// Forward progress to an optional JS callback `(progress) => void`
fn report(callback: Option<&Function>) -> impl FnMut(Progress) + '_ {
    move |progress| {
        let Some(callback) = callback else {
            return;
        };
        let value = match serde_wasm_bindgen::to_value(&progress) {
            Ok(value) => value,
            Err(_) => return,
        };
        if let Err(e) = callback.call1(&JsValue::NULL, &value) {
            web_sys::console::warn_2(&JsValue::from_str("progress callback failed"), &e);
        }
    }
}

/// Page previews drawn by a JS renderer, or blank pages without one
///
/// The JS renderer is called as `(pageIndex, scale)` and must return an
/// object with `width`, `height` and RGBA `data`, such as `ImageData`.
enum PreviewRenderer {
    Blank,
    Js(Function),
}

impl PreviewRenderer {
    fn render_js(callback: &Function, page_index: usize, scale: f64) -> Result<RgbaImage, String> {
        let result = callback
            .call2(
                &JsValue::NULL,
                &JsValue::from_f64(page_index as f64),
                &JsValue::from_f64(scale),
            )
            .map_err(|e| e.as_string().unwrap_or_else(|| "renderer threw".to_string()))?;

        let field = |name: &str| {
            Reflect::get(&result, &JsValue::from_str(name))
                .map_err(|_| format!("renderer result has no `{name}`"))
        };
        let width = field("width")?.as_f64().ok_or("`width` is not a number")? as u32;
        let height = field("height")?.as_f64().ok_or("`height` is not a number")? as u32;
        let data = Uint8Array::new(&field("data")?).to_vec();

        RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| format!("{width}x{height} RGBA bitmap has the wrong length"))
    }
}

impl Rasterizer<PdfDocument> for PreviewRenderer {
    fn render_page(
        &self,
        document: &PdfDocument,
        page_index: usize,
        scale: f64,
    ) -> page_editor::Result<RgbaImage> {
        match self {
            PreviewRenderer::Blank => BlankRasterizer.render_page(document, page_index, scale),
            PreviewRenderer::Js(callback) => Self::render_js(callback, page_index, scale)
                .map_err(|e| EditorError::RenderError(page_index, e)),
        }
    }
}

/// Lightweight view of an overlay item, without its bitmap
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlayView {
    id: ItemId,
    kind: OverlayKind,
    page_index: usize,
    rect: Rect,
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView {
    original_index: usize,
    width: u32,
    height: u32,
}

fn outcome_name(outcome: DragOutcome) -> &'static str {
    match outcome {
        DragOutcome::Ignored => "ignored",
        DragOutcome::ItemGrabbed(_) => "itemGrabbed",
        DragOutcome::ItemMoved(_) => "itemMoved",
        DragOutcome::ItemReleased(_) => "itemReleased",
        DragOutcome::DrawingStarted => "drawingStarted",
        DragOutcome::DrawingUpdated(_) => "drawingUpdated",
        DragOutcome::RedactionCommitted(_) => "redactionCommitted",
        DragOutcome::RedactionDiscarded => "redactionDiscarded",
        DragOutcome::Cancelled => "cancelled",
    }
}

fn point_or_center(x: Option<f64>, y: Option<f64>) -> Option<Point> {
    match (x, y) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    }
}

/// One editing session over one PDF
#[wasm_bindgen]
pub struct PdfEditor {
    session: EditorSession<LopdfLibrary, PreviewRenderer>,
}

#[wasm_bindgen]
impl PdfEditor {
    /// Create an editor for a tool
    ///
    /// @param tool - "sign-pdf", "edit-pdf", "redact-pdf" or "organize-pdf"
    /// @param renderer - Optional `(pageIndex, scale) => ImageData`
    /// @param configJson - Optional JSON editor configuration
    #[wasm_bindgen(constructor)]
    pub fn new(
        tool: &str,
        renderer: Option<Function>,
        config_json: Option<String>,
    ) -> Result<PdfEditor, JsValue> {
        let tool: Tool = tool.parse().map_err(js_error)?;
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(js_error)?,
            None => EditorConfig::default(),
        };
        let renderer = renderer.map_or(PreviewRenderer::Blank, PreviewRenderer::Js);

        let mut session = EditorSession::new(LopdfLibrary, renderer, config);
        session.select_tool(tool);
        Ok(PdfEditor { session })
    }

    /// Current tool id
    pub fn tool(&self) -> String {
        self.session.tool().id().to_string()
    }

    /// Switch tool; discards the document and every edit
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool: Tool = tool.parse().map_err(js_error)?;
        self.session.select_tool(tool);
        Ok(())
    }

    /// Load a PDF and render its page previews
    ///
    /// @param fileName - Name of the uploaded file
    /// @param bytes - PDF bytes (Uint8Array)
    /// @param onProgress - Optional `({ percentage, status }) => void`
    pub fn load(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        on_progress: Option<Function>,
    ) -> Result<(), JsValue> {
        self.session
            .load(file_name, bytes, report(on_progress.as_ref()))
            .map_err(js_error)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.session.page_count()
    }

    /// Where every page preview sits in the scroll container
    ///
    /// @returns Array of { top, left, width, height, scale }
    #[wasm_bindgen(js_name = pageBoxes)]
    pub fn page_boxes(&self) -> Result<JsValue, JsValue> {
        let boxes: &[PageBox] = self.session.layout().boxes();
        Ok(serde_wasm_bindgen::to_value(boxes)?)
    }

    /// Total height of the stacked previews
    #[wasm_bindgen(js_name = contentHeight)]
    pub fn content_height(&self) -> f64 {
        self.session
            .layout()
            .content_height(&self.session.config().layout)
    }

    /// RGBA pixels of one page preview
    #[wasm_bindgen(js_name = pageImage)]
    pub fn page_image(&self, page_index: usize) -> Result<Vec<u8>, JsValue> {
        self.session
            .rasters()
            .get(page_index)
            .map(|raster| raster.image.as_raw().clone())
            .ok_or_else(|| js_error(EditorError::InvalidPage(page_index, self.session.page_count())))
    }

    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&mut self, scroll_left: f64, scroll_top: f64, width: f64, height: f64) {
        self.session.set_viewport(Viewport {
            scroll_left,
            scroll_top,
            width,
            height,
        });
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), JsValue> {
        self.session.set_zoom(zoom).map_err(js_error)
    }

    /// Add a text overlay
    ///
    /// Without `x`/`y` the text is centered in the viewport.
    ///
    /// @returns Item id
    #[wasm_bindgen(js_name = addText)]
    #[allow(clippy::too_many_arguments)]
    pub fn add_text(
        &mut self,
        text: String,
        font_size: f64,
        r: f64,
        g: f64,
        b: f64,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<f64, JsValue> {
        let content = OverlayContent::Text(TextOverlay {
            text,
            font_size,
            color: RgbColor::rgb(r, g, b),
        });
        self.session
            .add_overlay(OverlayKind::Text, content, point_or_center(x, y))
            .map(|id| id as f64)
            .map_err(js_error)
    }

    /// Add an image or signature overlay
    ///
    /// @param kind - "image" or "signature"
    /// @param data - PNG or JPEG bytes
    /// @returns Item id
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        kind: &str,
        data: Vec<u8>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<f64, JsValue> {
        let kind = match kind {
            "image" => OverlayKind::Image,
            "signature" => OverlayKind::Signature,
            other => return Err(JsValue::from_str(&format!("Unknown overlay kind: {other}"))),
        };
        self.session
            .add_overlay(kind, OverlayContent::Bitmap { data }, point_or_center(x, y))
            .map(|id| id as f64)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = moveOverlay)]
    pub fn move_overlay(&mut self, id: f64, x: f64, y: f64) -> Result<(), JsValue> {
        self.session
            .move_overlay(id as ItemId, Point::new(x, y))
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeOverlay)]
    pub fn remove_overlay(&mut self, id: f64) -> Result<(), JsValue> {
        self.session
            .remove_overlay(id as ItemId)
            .map(|_| ())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeRedaction)]
    pub fn remove_redaction(&mut self, id: f64) -> Result<(), JsValue> {
        self.session
            .remove_redaction_area(id as AreaId)
            .map(|_| ())
            .map_err(js_error)
    }

    /// Remove every overlay and redaction
    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) {
        self.session.clear_all();
    }

    /// @returns Array of { id, kind, pageIndex, rect, text }
    pub fn overlays(&self) -> Result<JsValue, JsValue> {
        let views: Vec<OverlayView> = self
            .session
            .overlays()
            .iter()
            .map(|item| OverlayView {
                id: item.id,
                kind: item.kind,
                page_index: item.page_index,
                rect: item.rect,
                text: match &item.content {
                    OverlayContent::Text(text) => Some(text.text.clone()),
                    OverlayContent::Bitmap { .. } => None,
                },
            })
            .collect();
        Ok(serde_wasm_bindgen::to_value(&views)?)
    }

    /// @returns Array of { id, page_index, rect }
    #[wasm_bindgen(js_name = redactionAreas)]
    pub fn redaction_areas(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.session.redaction_areas())?)
    }

    /// Rectangle being drawn, if any
    #[wasm_bindgen(js_name = redactionPreview)]
    pub fn redaction_preview(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.session.redaction_preview())?)
    }

    /// @returns Name of the resulting drag outcome
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> String {
        outcome_name(self.session.pointer_down(Point::new(x, y))).to_string()
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        self.session
            .pointer_move(Point::new(x, y))
            .map(|outcome| outcome_name(outcome).to_string())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> String {
        outcome_name(self.session.pointer_up()).to_string()
    }

    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&mut self) -> String {
        outcome_name(self.session.cancel_drag()).to_string()
    }

    /// Page thumbnails in their current order
    ///
    /// @returns Array of { originalIndex, width, height }
    pub fn pages(&self) -> Result<JsValue, JsValue> {
        let views: Vec<PageView> = self
            .session
            .pages()
            .iter()
            .map(|entry| PageView {
                original_index: entry.original_index,
                width: entry.thumbnail.image.width(),
                height: entry.thumbnail.image.height(),
            })
            .collect();
        Ok(serde_wasm_bindgen::to_value(&views)?)
    }

    /// RGBA pixels of the thumbnail at a list position
    #[wasm_bindgen(js_name = pageThumbnail)]
    pub fn page_thumbnail(&self, position: usize) -> Result<Vec<u8>, JsValue> {
        let pages = self.session.pages();
        pages
            .get(position)
            .map(|entry| entry.thumbnail.image.as_raw().clone())
            .ok_or_else(|| js_error(EditorError::InvalidPage(position, pages.len())))
    }

    #[wasm_bindgen(js_name = reorderPages)]
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        self.session.reorder_pages(from, to).map_err(js_error)
    }

    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&mut self, position: usize) -> Result<(), JsValue> {
        self.session
            .delete_page(position)
            .map(|_| ())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = beginPageDrag)]
    pub fn begin_page_drag(&mut self, position: usize) -> Result<(), JsValue> {
        self.session.begin_page_drag(position).map_err(js_error)
    }

    /// @returns true if the page list changed
    #[wasm_bindgen(js_name = dropPageOn)]
    pub fn drop_page_on(&mut self, position: usize) -> Result<bool, JsValue> {
        self.session.drop_page_on(position).map_err(js_error)
    }

    /// Write every edit into a new PDF
    ///
    /// @param onProgress - Optional `({ percentage, status }) => void`
    /// @returns PDF bytes (Uint8Array)
    pub fn process(&mut self, on_progress: Option<Function>) -> Result<Vec<u8>, JsValue> {
        self.session
            .process(report(on_progress.as_ref()))
            .map(<[u8]>::to_vec)
            .map_err(js_error)
    }

    /// @returns { state, message }
    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.session.state())?)
    }

    #[wasm_bindgen(js_name = outputFilename)]
    pub fn output_filename(&self) -> Option<String> {
        self.session.output_filename()
    }
}

/// Combine PDFs into one, in the order given
///
/// @param files - Array of Uint8Array
/// @returns PDF bytes (Uint8Array)
#[wasm_bindgen(js_name = mergePdfs)]
pub fn merge_pdfs(files: Array) -> Result<Vec<u8>, JsValue> {
    let buffers: Vec<Vec<u8>> = files
        .iter()
        .map(|file| Uint8Array::new(&file).to_vec())
        .collect();
    let documents: Vec<&[u8]> = buffers.iter().map(Vec::as_slice).collect();
    page_editor::merge(&LopdfLibrary, &documents).map_err(js_error)
}

/// Split a PDF into one file per page
///
/// @returns Array of { name, bytes }
#[wasm_bindgen(js_name = splitPdf)]
pub fn split_pdf(bytes: Vec<u8>, on_progress: Option<Function>) -> Result<Array, JsValue> {
    let parts =
        page_editor::split(&LopdfLibrary, &bytes, report(on_progress.as_ref())).map_err(js_error)?;

    let result = Array::new();
    for part in parts {
        let entry = js_sys::Object::new();
        Reflect::set(&entry, &"name".into(), &part.name.into())?;
        Reflect::set(&entry, &"bytes".into(), &Uint8Array::from(part.bytes.as_slice()))?;
        result.push(&entry);
    }
    Ok(result)
}

/// Ids of every tool
#[wasm_bindgen(js_name = toolIds)]
pub fn tool_ids() -> Vec<String> {
    Tool::ALL.iter().map(|tool| tool.id().to_string()).collect()
}
