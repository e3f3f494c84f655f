//! Page reordering and deletion

use tracing::debug;

use crate::raster::PageRaster;
use crate::{EditorError, Result};

/// One page in the organizer list
#[derive(Debug, Clone)]
pub struct PageEntry {
    /// Page index in the source document. Never changes.
    pub original_index: usize,
    pub thumbnail: PageRaster,
}

/// Ordered page list; list position decides the output order
#[derive(Debug, Clone, Default)]
pub struct PageOrganizer {
    entries: Vec<PageEntry>,
    dragged: Option<usize>,
}

impl PageOrganizer {
    pub fn new(thumbnails: Vec<PageRaster>) -> Self {
        let entries = thumbnails
            .into_iter()
            .map(|thumbnail| PageEntry {
                original_index: thumbnail.page_index,
                thumbnail,
            })
            .collect();
        Self {
            entries,
            dragged: None,
        }
    }

    /// Move the entry at `from` so it ends up at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.entries.len();
        if from >= len {
            return Err(EditorError::InvalidPage(from, len));
        }
        if to >= len {
            return Err(EditorError::InvalidPage(to, len));
        }
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            debug!(from, to, "page moved");
        }
        Ok(())
    }

    pub fn delete_page(&mut self, index: usize) -> Result<PageEntry> {
        if index >= self.entries.len() {
            return Err(EditorError::InvalidPage(index, self.entries.len()));
        }
        self.dragged = None;
        let entry = self.entries.remove(index);
        debug!(index, original_index = entry.original_index, "page deleted");
        Ok(entry)
    }

    /// Source page indices in output order
    pub fn final_order(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.original_index).collect()
    }

    /// Remember which entry is being dragged
    pub fn begin_drag(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(EditorError::InvalidPage(index, self.entries.len()));
        }
        self.dragged = Some(index);
        Ok(())
    }

    /// Drop the dragged entry on `index`
    ///
    /// Returns whether the order changed. Without an active drag, or when
    /// dropped on its own slot, nothing happens.
    pub fn drop_on(&mut self, index: usize) -> Result<bool> {
        let Some(from) = self.dragged.take() else {
            return Ok(false);
        };
        if from == index {
            return Ok(false);
        }
        self.reorder(from, index)?;
        Ok(true)
    }

    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
