//! Pointer drag state machine
//!
//! At most one drag runs at a time. A pointer-down while a drag is active is
//! ignored until the pointer is released or the drag is cancelled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{PageLayout, Point, Rect};
use crate::overlay::{ItemId, OverlayStore};
use crate::redaction::{AreaId, RedactionList};
use crate::Result;

/// What the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Item(ItemId),
    Surface,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    DraggingItem {
        id: ItemId,
        /// Pointer position relative to the item's top-left corner
        offset: Point,
        /// Where the item was when the drag started
        origin: Point,
    },
    DrawingRedaction {
        start: Point,
        current: Point,
    },
}

/// Result of feeding one pointer event to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    Ignored,
    ItemGrabbed(ItemId),
    ItemMoved(ItemId),
    ItemReleased(ItemId),
    DrawingStarted,
    DrawingUpdated(Rect),
    RedactionCommitted(AreaId),
    RedactionDiscarded,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    min_redaction_size: f64,
}

impl DragController {
    pub fn new(min_redaction_size: f64) -> Self {
        Self {
            state: DragState::Idle,
            min_redaction_size,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Rectangle being drawn, normalized, if a redaction drag is running
    pub fn preview(&self) -> Option<Rect> {
        match self.state {
            DragState::DrawingRedaction { start, current } => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    pub fn pointer_down(
        &mut self,
        point: Point,
        target: PointerTarget,
        redact_enabled: bool,
        overlays: &OverlayStore,
    ) -> DragOutcome {
        if self.is_active() {
            return DragOutcome::Ignored;
        }

        match target {
            PointerTarget::Item(id) => {
                let Some(item) = overlays.get(id) else {
                    return DragOutcome::Ignored;
                };
                let origin = item.rect.origin();
                self.state = DragState::DraggingItem {
                    id,
                    offset: Point::new(point.x - origin.x, point.y - origin.y),
                    origin,
                };
                DragOutcome::ItemGrabbed(id)
            }
            PointerTarget::Surface if redact_enabled => {
                self.state = DragState::DrawingRedaction {
                    start: point,
                    current: point,
                };
                DragOutcome::DrawingStarted
            }
            PointerTarget::Surface => DragOutcome::Ignored,
        }
    }

    pub fn pointer_move(
        &mut self,
        point: Point,
        overlays: &mut OverlayStore,
        layout: &PageLayout,
    ) -> Result<DragOutcome> {
        match self.state {
            DragState::Idle => Ok(DragOutcome::Ignored),
            DragState::DraggingItem { id, offset, .. } => {
                let position = Point::new(point.x - offset.x, point.y - offset.y);
                if let Err(e) = overlays.move_item(id, position, layout) {
                    // the item went away under the pointer
                    self.state = DragState::Idle;
                    return Err(e);
                }
                Ok(DragOutcome::ItemMoved(id))
            }
            DragState::DrawingRedaction { start, .. } => {
                self.state = DragState::DrawingRedaction {
                    start,
                    current: point,
                };
                Ok(DragOutcome::DrawingUpdated(Rect::from_corners(start, point)))
            }
        }
    }

    /// Finish the drag
    ///
    /// A redaction is kept only when both sides reach the minimum size.
    pub fn pointer_up(&mut self, redactions: &mut RedactionList, layout: &PageLayout) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::Ignored,
            DragState::DraggingItem { id, .. } => DragOutcome::ItemReleased(id),
            DragState::DrawingRedaction { start, current } => {
                let rect = Rect::from_corners(start, current);
                if rect.width < self.min_redaction_size || rect.height < self.min_redaction_size {
                    debug!(width = rect.width, height = rect.height, "redaction below minimum size, discarded");
                    return DragOutcome::RedactionDiscarded;
                }
                DragOutcome::RedactionCommitted(redactions.add(rect, layout))
            }
        }
    }

    /// Abort the drag without committing
    ///
    /// A dragged item returns to where it was picked up.
    pub fn cancel(&mut self, overlays: &mut OverlayStore, layout: &PageLayout) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::Ignored,
            DragState::DraggingItem { id, origin, .. } => {
                // nothing to restore if the item was removed meanwhile
                let _ = overlays.move_item(id, origin, layout);
                DragOutcome::Cancelled
            }
            DragState::DrawingRedaction { .. } => DragOutcome::Cancelled,
        }
    }
}
