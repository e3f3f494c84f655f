//! Redaction rectangles

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{PageLayout, Rect};
use crate::{EditorError, Result};

pub type AreaId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RedactionArea {
    pub id: AreaId,
    pub page_index: usize,
    /// Scroll-space bounds
    pub rect: Rect,
}

/// Committed redaction rectangles in drawing order
#[derive(Debug, Clone, Default)]
pub struct RedactionList {
    areas: Vec<RedactionArea>,
    next_id: AreaId,
}

impl RedactionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rect: Rect, layout: &PageLayout) -> AreaId {
        self.next_id += 1;
        let id = self.next_id;
        let page_index = layout.page_index_for_rect(&rect);

        debug!(id, page_index, width = rect.width, height = rect.height, "redaction committed");
        self.areas.push(RedactionArea {
            id,
            page_index,
            rect,
        });
        id
    }

    pub fn remove(&mut self, id: AreaId) -> Result<RedactionArea> {
        let index = self
            .areas
            .iter()
            .position(|area| area.id == id)
            .ok_or(EditorError::UnknownArea(id))?;
        Ok(self.areas.remove(index))
    }

    pub fn clear(&mut self) {
        self.areas.clear();
    }

    /// Move every area onto a new layout
    ///
    /// `transfer` maps a rectangle on a page to its place in the new layout;
    /// page indices are re-derived afterwards.
    pub fn relayout<F>(&mut self, layout: &PageLayout, transfer: F)
    where
        F: Fn(usize, &Rect) -> Rect,
    {
        for area in &mut self.areas {
            area.rect = transfer(area.page_index, &area.rect);
            area.page_index = layout.page_index_for_rect(&area.rect);
        }
    }

    pub fn areas(&self) -> &[RedactionArea] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
