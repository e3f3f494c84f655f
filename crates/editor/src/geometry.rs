//! Scroll-space geometry and the page layout table
//!
//! The editing surface stacks every page preview vertically in one scrollable
//! container. Positions there ("scroll space") are in pixels with the origin
//! at the container's top-left and Y growing downward. Each page's document
//! space is in points with the origin at the page's bottom-left and Y growing
//! upward. [`PageLayout`] records where every page sits so the two can be
//! converted without looking at a live UI tree.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::raster::PageRaster;

/// A point in scroll space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in scroll space (top-left origin)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Normalized rectangle spanning two corners in any drag direction
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, new top-left corner
    pub fn moved_to(&self, origin: Point) -> Self {
        Self::from_origin_size(origin, self.size())
    }

    /// Inclusive of the top/left edges, exclusive of the bottom/right ones
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// A rectangle in a page's document space (bottom-left origin, points)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where one page preview sits in scroll space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Scroll-space pixels per document point
    pub scale: f64,
}

impl PageBox {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Re-express a rectangle on this page in the coordinates of `to`,
    /// the same page laid out differently
    pub fn transfer_rect(&self, rect: &Rect, to: &PageBox) -> Rect {
        let ratio = to.scale / self.scale;
        Rect::new(
            to.left + (rect.x - self.left) * ratio,
            to.top + (rect.y - self.top) * ratio,
            rect.width * ratio,
            rect.height * ratio,
        )
    }
}

/// The visible part of the scroll container
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(
            self.scroll_left + self.width / 2.0,
            self.scroll_top + self.height / 2.0,
        )
    }
}

/// Table of page boxes, one per page in document order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageLayout {
    boxes: Vec<PageBox>,
}

impl PageLayout {
    /// Stack page rasters top to bottom
    pub fn stack(rasters: &[PageRaster], config: &LayoutConfig) -> Self {
        let mut boxes = Vec::with_capacity(rasters.len());
        let mut top = config.padding;

        for raster in rasters {
            let width = f64::from(raster.image.width()) * config.zoom;
            let height = f64::from(raster.image.height()) * config.zoom;
            boxes.push(PageBox {
                top,
                left: config.padding,
                width,
                height,
                scale: raster.render_scale * config.zoom,
            });
            top += height + config.page_gap;
        }

        Self { boxes }
    }

    /// Build a layout from boxes measured by the host
    pub fn from_boxes(boxes: Vec<PageBox>) -> Self {
        Self { boxes }
    }

    pub fn boxes(&self) -> &[PageBox] {
        &self.boxes
    }

    pub fn page(&self, index: usize) -> Option<&PageBox> {
        self.boxes.get(index)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Page whose band contains `y`
    pub fn page_index_for_y(&self, y: f64) -> usize {
        page_index_for_scroll_y(y, &self.boxes)
    }

    /// Page an item belongs to, decided by its vertical center
    pub fn page_index_for_rect(&self, rect: &Rect) -> usize {
        self.page_index_for_y(rect.center().y)
    }

    /// Height of the whole surface including the bottom padding
    pub fn content_height(&self, config: &LayoutConfig) -> f64 {
        match self.boxes.last() {
            Some(last) => last.bottom() + config.padding,
            None => 0.0,
        }
    }
}

/// Index of the page whose vertical band contains `y`
///
/// A page's band runs from its top to the next page's top, so a `y` inside
/// the gap between two pages belongs to the earlier one and a `y` exactly on
/// a page's top belongs to that page. Values above the first page map to 0
/// and values past the last page map to the last index.
pub fn page_index_for_scroll_y(y: f64, boxes: &[PageBox]) -> usize {
    for (index, next) in boxes.iter().enumerate().skip(1) {
        if y < next.top {
            return index - 1;
        }
    }
    boxes.len().saturating_sub(1)
}

/// Convert a scroll-space point to document coordinates of the given page
pub fn scroll_point_to_document(point: Point, page: &PageBox, page_height: f64) -> (f64, f64) {
    let x = (point.x - page.left) / page.scale;
    let y = page_height - (point.y - page.top) / page.scale;
    (x, y)
}

/// Convert a scroll-space rectangle to a document-space rectangle
///
/// The scroll rectangle's top-left corner becomes the document rectangle's
/// top-left, so the document `y` is the flipped top minus the height.
pub fn scroll_rect_to_document(rect: &Rect, page: &PageBox, page_height: f64) -> DocRect {
    let width = rect.width / page.scale;
    let height = rect.height / page.scale;
    let (x, top) = scroll_point_to_document(rect.origin(), page, page_height);
    DocRect {
        x,
        y: top - height,
        width,
        height,
    }
}

/// Inverse of [`scroll_rect_to_document`]
pub fn document_rect_to_scroll(rect: &DocRect, page: &PageBox, page_height: f64) -> Rect {
    Rect::new(
        page.left + rect.x * page.scale,
        page.top + (page_height - rect.y - rect.height) * page.scale,
        rect.width * page.scale,
        rect.height * page.scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn raster(index: usize, width: u32, height: u32, scale: f64) -> PageRaster {
        PageRaster {
            page_index: index,
            image: RgbaImage::new(width, height),
            render_scale: scale,
        }
    }

    fn three_page_layout() -> PageLayout {
        let rasters = vec![
            raster(0, 300, 400, 1.5),
            raster(1, 300, 400, 1.5),
            raster(2, 300, 400, 1.5),
        ];
        PageLayout::stack(&rasters, &LayoutConfig::default())
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_stack_offsets() {
        let layout = three_page_layout();
        let tops: Vec<f64> = layout.boxes().iter().map(|b| b.top).collect();
        assert_eq!(tops, vec![16.0, 418.0, 820.0]);
        assert!(layout.boxes().iter().all(|b| b.left == 16.0));
        assert_eq!(layout.content_height(&LayoutConfig::default()), 1236.0);
    }

    #[test]
    fn test_stack_applies_zoom_to_size_and_scale() {
        let config = LayoutConfig {
            padding: 0.0,
            page_gap: 10.0,
            zoom: 2.0,
        };
        let layout = PageLayout::stack(&[raster(0, 100, 50, 0.5), raster(1, 100, 50, 0.5)], &config);
        let first = layout.page(0).unwrap();
        assert_eq!(first.width, 200.0);
        assert_eq!(first.height, 100.0);
        assert_eq!(first.scale, 1.0);
        assert_eq!(layout.page(1).unwrap().top, 110.0);
    }

    #[test]
    fn test_page_index_bands() {
        let layout = three_page_layout();
        let boxes = layout.boxes();

        assert_eq!(page_index_for_scroll_y(-50.0, boxes), 0);
        assert_eq!(page_index_for_scroll_y(0.0, boxes), 0);
        assert_eq!(page_index_for_scroll_y(200.0, boxes), 0);
        // gap between page 0 (ends at 416) and page 1 (starts at 418)
        assert_eq!(page_index_for_scroll_y(417.0, boxes), 0);
        // exactly on the next top
        assert_eq!(page_index_for_scroll_y(418.0, boxes), 1);
        assert_eq!(page_index_for_scroll_y(819.999, boxes), 1);
        assert_eq!(page_index_for_scroll_y(820.0, boxes), 2);
        assert_eq!(page_index_for_scroll_y(1e9, boxes), 2);
    }

    #[test]
    fn test_page_index_empty_layout() {
        assert_eq!(page_index_for_scroll_y(100.0, &[]), 0);
    }

    #[test]
    fn test_scroll_to_document_flips_y() {
        let page = PageBox {
            top: 16.0,
            left: 16.0,
            width: 918.0,
            height: 1188.0,
            scale: 1.5,
        };
        // 150x30 px box whose top-left is 30 px from the page's top-left
        let rect = Rect::new(46.0, 46.0, 150.0, 30.0);
        let doc = scroll_rect_to_document(&rect, &page, 792.0);

        assert_close(doc.x, 20.0);
        assert_close(doc.width, 100.0);
        assert_close(doc.height, 20.0);
        // top edge at 792 - 20, bottom edge 20 lower
        assert_close(doc.y, 752.0);
    }

    #[test]
    fn test_document_round_trip() {
        let page = PageBox {
            top: 418.0,
            left: 16.0,
            width: 300.0,
            height: 400.0,
            scale: 0.75,
        };
        let page_height = 533.3;
        let samples = [
            DocRect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            DocRect { x: 123.4, y: 321.9, width: 55.5, height: 0.25 },
            DocRect { x: 399.0, y: 500.0, width: 1.0, height: 33.3 },
        ];

        for doc in samples {
            let scroll = document_rect_to_scroll(&doc, &page, page_height);
            let back = scroll_rect_to_document(&scroll, &page, page_height);
            assert_close(back.x, doc.x);
            assert_close(back.y, doc.y);
            assert_close(back.width, doc.width);
            assert_close(back.height, doc.height);
        }
    }

    #[test]
    fn test_transfer_rect_keeps_document_position() {
        let before = PageBox {
            top: 16.0,
            left: 16.0,
            width: 300.0,
            height: 400.0,
            scale: 1.5,
        };
        let after = PageBox {
            top: 32.0,
            left: 16.0,
            width: 600.0,
            height: 800.0,
            scale: 3.0,
        };
        let rect = Rect::new(46.0, 76.0, 30.0, 15.0);
        let moved = before.transfer_rect(&rect, &after);

        assert_eq!(moved, Rect::new(76.0, 152.0, 60.0, 30.0));
        let a = scroll_rect_to_document(&rect, &before, 266.0);
        let b = scroll_rect_to_document(&moved, &after, 266.0);
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
        assert_close(a.width, b.width);
    }

    #[test]
    fn test_rect_from_corners_any_direction() {
        let expected = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(Rect::from_corners(Point::new(10.0, 20.0), Point::new(40.0, 60.0)), expected);
        assert_eq!(Rect::from_corners(Point::new(40.0, 60.0), Point::new(10.0, 20.0)), expected);
        assert_eq!(Rect::from_corners(Point::new(40.0, 20.0), Point::new(10.0, 60.0)), expected);
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(9.9, 9.9)));
        assert!(!rect.contains(Point::new(10.0, 5.0)));
    }

    #[test]
    fn test_viewport_center() {
        let viewport = Viewport {
            scroll_left: 0.0,
            scroll_top: 400.0,
            width: 800.0,
            height: 600.0,
        };
        assert_eq!(viewport.center(), Point::new(400.0, 700.0));
    }
}
