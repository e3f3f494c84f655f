//! Overlay items placed on top of the page previews

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EditorConfig, RgbColor};
use crate::geometry::{PageLayout, Point, Rect, Size};
use crate::{EditorError, Result};

/// Overlay item identifier, unique within a session
pub type ItemId = u64;

/// Helvetica's average advance width, in ems, used to size text boxes
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;
/// Text box height in ems
const LINE_HEIGHT: f64 = 1.2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Text,
    Image,
    Signature,
}

/// Text drawn with the built-in Helvetica font
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    /// Font size in scroll-space pixels
    pub font_size: f64,
    #[serde(default)]
    pub color: RgbColor,
}

impl TextOverlay {
    /// Approximate on-screen size of the text box
    pub fn natural_size(&self) -> Size {
        let chars = self.text.chars().count().max(1) as f64;
        Size::new(
            chars * self.font_size * AVERAGE_GLYPH_WIDTH,
            self.font_size * LINE_HEIGHT,
        )
    }
}

/// What an overlay draws
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayContent {
    /// Encoded PNG or JPEG bytes
    Bitmap { data: Vec<u8> },
    Text(TextOverlay),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayItem {
    pub id: ItemId,
    pub kind: OverlayKind,
    pub content: OverlayContent,
    /// Page containing the item's vertical center
    pub page_index: usize,
    /// Position and size in scroll space
    pub rect: Rect,
}

/// Size an overlay starts with
///
/// Pre-rendered text bitmaps come in at a multiple of their display size and
/// are shrunk by `text_overlay_ratio`. Images and signatures start at a fixed
/// width. Both keep the aspect ratio. Text descriptors use their own metrics.
pub fn initial_overlay_size(kind: OverlayKind, content: &OverlayContent, natural: Size, config: &EditorConfig) -> Size {
    if let OverlayContent::Text(text) = content {
        return text.natural_size();
    }
    if natural.width <= 0.0 || natural.height <= 0.0 {
        return natural;
    }

    let width = match kind {
        OverlayKind::Text => natural.width * config.text_overlay_ratio,
        OverlayKind::Image | OverlayKind::Signature => config.image_overlay_width,
    };
    Size::new(width, natural.height * width / natural.width)
}

/// Ordered collection of overlay items
///
/// Insertion order is paint order: later items sit on top.
#[derive(Debug, Clone, Default)]
pub struct OverlayStore {
    items: Vec<OverlayItem>,
    next_id: ItemId,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item; its page is derived from `rect`
    pub fn add(
        &mut self,
        kind: OverlayKind,
        content: OverlayContent,
        rect: Rect,
        layout: &PageLayout,
    ) -> ItemId {
        self.next_id += 1;
        let id = self.next_id;
        let page_index = layout.page_index_for_rect(&rect);

        debug!(id, ?kind, page_index, "overlay added");
        self.items.push(OverlayItem {
            id,
            kind,
            content,
            page_index,
            rect,
        });
        id
    }

    /// Move an item's top-left corner and re-derive its page
    pub fn move_item(&mut self, id: ItemId, position: Point, layout: &PageLayout) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(EditorError::UnknownItem(id))?;

        item.rect = item.rect.moved_to(position);
        item.page_index = layout.page_index_for_rect(&item.rect);
        Ok(())
    }

    pub fn remove(&mut self, id: ItemId) -> Result<OverlayItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(EditorError::UnknownItem(id))?;
        Ok(self.items.remove(index))
    }

    /// Remove every item. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Move every item onto a new layout
    ///
    /// `transfer` maps a rectangle on a page to its place in the new layout;
    /// page indices are re-derived afterwards.
    pub fn relayout<F>(&mut self, layout: &PageLayout, transfer: F)
    where
        F: Fn(usize, &Rect) -> Rect,
    {
        for item in &mut self.items {
            item.rect = transfer(item.page_index, &item.rect);
            item.page_index = layout.page_index_for_rect(&item.rect);
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&OverlayItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Topmost item under `point`
    pub fn item_at(&self, point: Point) -> Option<ItemId> {
        self.items
            .iter()
            .rev()
            .find(|item| item.rect.contains(point))
            .map(|item| item.id)
    }

    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
