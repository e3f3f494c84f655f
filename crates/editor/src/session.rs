//! The editor session: all state of one editing tool over one document

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::drag::{DragController, DragOutcome, DragState, PointerTarget};
use crate::finalize::{Finalizer, Progress, NO_OVERLAYS, NO_PAGES};
use crate::geometry::{PageLayout, Point, Rect, Size, Viewport};
use crate::library::DocumentLibrary;
use crate::organizer::{PageEntry, PageOrganizer};
use crate::overlay::{initial_overlay_size, ItemId, OverlayContent, OverlayItem, OverlayKind, OverlayStore};
use crate::raster::{PageRaster, RasterPageCache, Rasterizer};
use crate::redaction::{AreaId, RedactionArea, RedactionList};
use crate::tools::Tool;
use crate::{EditorError, Result};

const NO_REDACT_SOURCE: &str = "Please select one PDF file to redact.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ProcessingState {
    #[default]
    Idle,
    Processing,
    Done,
    /// User-facing description of the failure
    Error(String),
}

struct Source<D> {
    file_name: String,
    bytes: Vec<u8>,
    document: D,
}

/// One editing session
///
/// Owns the document, its page previews and every pending edit. The
/// document library and the rasterizer are injected at construction.
pub struct EditorSession<L: DocumentLibrary, R> {
    library: L,
    rasterizer: R,
    config: EditorConfig,
    tool: Tool,
    source: Option<Source<L::Document>>,
    rasters: Vec<PageRaster>,
    layout: PageLayout,
    viewport: Viewport,
    overlays: OverlayStore,
    redactions: RedactionList,
    drag: DragController,
    organizer: PageOrganizer,
    state: ProcessingState,
    output: Option<Vec<u8>>,
}

impl<L, R> EditorSession<L, R>
where
    L: DocumentLibrary,
    R: Rasterizer<L::Document>,
{
    pub fn new(library: L, rasterizer: R, config: EditorConfig) -> Self {
        let drag = DragController::new(config.min_redaction_size);
        Self {
            library,
            rasterizer,
            config,
            tool: Tool::default(),
            source: None,
            rasters: Vec::new(),
            layout: PageLayout::default(),
            viewport: Viewport::default(),
            overlays: OverlayStore::new(),
            redactions: RedactionList::new(),
            drag,
            organizer: PageOrganizer::default(),
            state: ProcessingState::Idle,
            output: None,
        }
    }

    /// Switch tools. Like opening a different tool page, this starts over.
    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.reset();
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Drop the document and every edit
    pub fn reset(&mut self) {
        self.source = None;
        self.rasters.clear();
        self.layout = PageLayout::default();
        self.overlays = OverlayStore::new();
        self.redactions = RedactionList::new();
        self.drag = DragController::new(self.config.min_redaction_size);
        self.organizer = PageOrganizer::default();
        self.state = ProcessingState::Idle;
        self.output = None;
    }

    /// Load a document and render its page previews for the current tool
    ///
    /// Any previous document and its edits are discarded first. On failure
    /// the session is left empty in the `Error` state.
    pub fn load<F: FnMut(Progress)>(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        mut on_progress: F,
    ) -> Result<()> {
        self.reset();
        on_progress(Progress::new(0, "Loading document..."));

        let scale = self.tool.render_scale(&self.config);
        let loaded = self.library.load_document(&bytes).and_then(|document| {
            RasterPageCache::render(&self.library, &self.rasterizer, &document, scale, &mut on_progress)
                .map(|cache| (document, cache))
        });
        let (document, cache) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => return Err(self.fail(e)),
        };

        info!(file_name, tool = %self.tool, pages = cache.len(), "document loaded");
        if self.tool == Tool::Organize {
            self.organizer = PageOrganizer::new(cache.into_rasters());
        } else {
            self.rasters = cache.into_rasters();
            self.layout = PageLayout::stack(&self.rasters, &self.config.layout);
        }
        self.source = Some(Source {
            file_name: file_name.to_string(),
            bytes,
            document,
        });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.source
            .as_ref()
            .map_or(0, |source| self.library.page_count(&source.document))
    }

    pub fn rasters(&self) -> &[PageRaster] {
        &self.rasters
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Record the visible part of the editing surface
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Change the display zoom, keeping every edit at its spot on its page
    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(EditorError::ConfigError(format!(
                "layout.zoom must be a positive number, got {zoom}"
            )));
        }
        self.drag.cancel(&mut self.overlays, &self.layout);
        self.config.layout.zoom = zoom;

        let old = std::mem::replace(
            &mut self.layout,
            PageLayout::stack(&self.rasters, &self.config.layout),
        );
        let layout = &self.layout;
        let transfer = |page_index: usize, rect: &Rect| match (old.page(page_index), layout.page(page_index)) {
            (Some(from), Some(to)) => from.transfer_rect(rect, to),
            _ => *rect,
        };
        self.overlays.relayout(layout, &transfer);
        self.redactions.relayout(layout, &transfer);
        debug!(zoom, "layout rebuilt");
        Ok(())
    }

    /// Add an overlay item
    ///
    /// Without a position the item is centered in the viewport (or on the
    /// first page when no viewport was set).
    pub fn add_overlay(
        &mut self,
        kind: OverlayKind,
        content: OverlayContent,
        position: Option<Point>,
    ) -> Result<ItemId> {
        if !self.tool.uses_overlays() {
            return Err(EditorError::WrongTool(self.tool.title()));
        }
        if self.source.is_none() {
            return Err(EditorError::NoDocument);
        }
        if let OverlayContent::Text(text) = &content {
            if !(text.font_size.is_finite() && text.font_size > 0.0) {
                return Err(EditorError::ConfigError(format!(
                    "font size must be a positive number, got {}",
                    text.font_size
                )));
            }
        }

        let natural = match &content {
            OverlayContent::Bitmap { data } => {
                let dims = pdf_core::get_dimensions(data)
                    .map_err(|e| EditorError::ImageError(e.to_string()))?;
                Size::new(f64::from(dims.width), f64::from(dims.height))
            }
            OverlayContent::Text(_) => Size::default(),
        };
        let size = initial_overlay_size(kind, &content, natural, &self.config);
        let origin = position.unwrap_or_else(|| {
            let center = self.placement_center();
            Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0)
        });

        Ok(self
            .overlays
            .add(kind, content, Rect::from_origin_size(origin, size), &self.layout))
    }

    fn placement_center(&self) -> Point {
        if self.viewport.width > 0.0 && self.viewport.height > 0.0 {
            return self.viewport.center();
        }
        self.layout
            .page(0)
            .map_or_else(Point::default, |page| page.rect().center())
    }

    /// Move an overlay item's top-left corner
    pub fn move_overlay(&mut self, id: ItemId, position: Point) -> Result<()> {
        self.overlays.move_item(id, position, &self.layout)
    }

    pub fn remove_overlay(&mut self, id: ItemId) -> Result<OverlayItem> {
        if matches!(self.drag.state(), DragState::DraggingItem { id: dragged, .. } if dragged == id) {
            self.drag.cancel(&mut self.overlays, &self.layout);
        }
        self.overlays.remove(id)
    }

    pub fn remove_redaction_area(&mut self, id: AreaId) -> Result<RedactionArea> {
        self.redactions.remove(id)
    }

    /// Remove every overlay item and redaction area
    pub fn clear_all(&mut self) {
        self.drag.cancel(&mut self.overlays, &self.layout);
        self.overlays.clear();
        self.redactions.clear();
    }

    pub fn overlays(&self) -> &[OverlayItem] {
        self.overlays.items()
    }

    pub fn redaction_areas(&self) -> &[RedactionArea] {
        self.redactions.areas()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn redaction_preview(&self) -> Option<Rect> {
        self.drag.preview()
    }

    /// Pointer pressed at a scroll-space point
    pub fn pointer_down(&mut self, point: Point) -> DragOutcome {
        if self.source.is_none() || self.tool == Tool::Organize {
            return DragOutcome::Ignored;
        }
        let target = match self.overlays.item_at(point) {
            Some(id) if self.tool.uses_overlays() => PointerTarget::Item(id),
            _ => PointerTarget::Surface,
        };
        self.drag
            .pointer_down(point, target, self.tool == Tool::Redact, &self.overlays)
    }

    pub fn pointer_move(&mut self, point: Point) -> Result<DragOutcome> {
        self.drag.pointer_move(point, &mut self.overlays, &self.layout)
    }

    pub fn pointer_up(&mut self) -> DragOutcome {
        self.drag.pointer_up(&mut self.redactions, &self.layout)
    }

    pub fn cancel_drag(&mut self) -> DragOutcome {
        self.drag.cancel(&mut self.overlays, &self.layout)
    }

    pub fn pages(&self) -> &[PageEntry] {
        self.organizer.entries()
    }

    pub fn page_order(&self) -> Vec<usize> {
        self.organizer.final_order()
    }

    pub fn reorder_pages(&mut self, from: usize, to: usize) -> Result<()> {
        self.organizer.reorder(from, to)
    }

    pub fn delete_page(&mut self, index: usize) -> Result<PageEntry> {
        self.organizer.delete_page(index)
    }

    pub fn begin_page_drag(&mut self, index: usize) -> Result<()> {
        self.organizer.begin_drag(index)
    }

    pub fn drop_page_on(&mut self, index: usize) -> Result<bool> {
        self.organizer.drop_on(index)
    }

    /// Write all edits into a new copy of the document
    ///
    /// Errors are turned into the `Error` state with a user-facing message;
    /// the edits themselves are kept so the user can retry.
    pub fn process<F: FnMut(Progress)>(&mut self, on_progress: F) -> Result<&[u8]> {
        self.output = None;
        self.state = ProcessingState::Processing;

        match self.run(on_progress) {
            Ok(bytes) => {
                self.state = ProcessingState::Done;
                Ok(self.output.insert(bytes).as_slice())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn run<F: FnMut(Progress)>(&self, mut on_progress: F) -> Result<Vec<u8>> {
        on_progress(Progress::new(0, "Starting process..."));
        let finalizer = Finalizer::new(&self.library, &self.layout);

        let Some(source) = &self.source else {
            let message = match self.tool {
                Tool::Sign | Tool::Edit => NO_OVERLAYS,
                Tool::Redact => NO_REDACT_SOURCE,
                Tool::Organize => NO_PAGES,
            };
            return Err(EditorError::EmptyInput(message.to_string()));
        };

        info!(tool = %self.tool, file_name = %source.file_name, "processing");
        match self.tool {
            Tool::Sign | Tool::Edit => {
                finalizer.apply_overlays(&source.bytes, self.overlays.items(), on_progress)
            }
            Tool::Redact => finalizer.apply_redactions(
                &source.bytes,
                self.redactions.areas(),
                self.config.redaction_color,
                on_progress,
            ),
            Tool::Organize => {
                finalizer.assemble_pages(&source.bytes, &self.organizer.final_order(), on_progress)
            }
        }
    }

    fn fail(&mut self, error: EditorError) -> EditorError {
        warn!(tool = %self.tool, %error, "operation failed");
        self.state = ProcessingState::Error(error.user_message());
        error
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Bytes produced by the last successful `process`
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    /// Suggested download name for the output
    pub fn output_filename(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|source| self.tool.output_filename(&source.file_name))
    }
}
