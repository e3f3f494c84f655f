//! Page rasterization and the per-document raster cache

use image::RgbaImage;
use tracing::{debug, info};

use crate::finalize::Progress;
use crate::library::DocumentLibrary;
use crate::{EditorError, Result};

/// Renders one page of a document to a bitmap
pub trait Rasterizer<D> {
    /// Render page `page_index` (0-indexed) at `scale` pixels per point
    fn render_page(&self, document: &D, page_index: usize, scale: f64) -> Result<RgbaImage>;
}

impl<D, R: Rasterizer<D> + ?Sized> Rasterizer<D> for &R {
    fn render_page(&self, document: &D, page_index: usize, scale: f64) -> Result<RgbaImage> {
        (**self).render_page(document, page_index, scale)
    }
}

/// A rendered page preview
#[derive(Debug, Clone)]
pub struct PageRaster {
    pub page_index: usize,
    pub image: RgbaImage,
    /// Pixels per document point used for `image`
    pub render_scale: f64,
}

/// The rasters of every page of one document, in page order
#[derive(Debug, Clone, Default)]
pub struct RasterPageCache {
    rasters: Vec<PageRaster>,
}

impl RasterPageCache {
    /// Render every page of `document`
    ///
    /// Fails as a whole if any page fails; no partial cache is returned.
    pub fn render<L, R, F>(
        library: &L,
        rasterizer: &R,
        document: &L::Document,
        scale: f64,
        mut on_progress: F,
    ) -> Result<Self>
    where
        L: DocumentLibrary,
        R: Rasterizer<L::Document>,
        F: FnMut(Progress),
    {
        let page_count = library.page_count(document);
        info!(page_count, scale, "extracting page previews");

        let mut rasters = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let number = index + 1;
            on_progress(Progress::new(
                percent(number, page_count),
                format!("Extracting page {number}"),
            ));

            let image = rasterizer
                .render_page(document, index, scale)
                .map_err(|e| match e {
                    EditorError::RenderError(..) => e,
                    other => EditorError::RenderError(index, other.to_string()),
                })?;
            debug!(page = index, width = image.width(), height = image.height(), "page rendered");

            rasters.push(PageRaster {
                page_index: index,
                image,
                render_scale: scale,
            });
        }

        Ok(Self { rasters })
    }

    pub fn rasters(&self) -> &[PageRaster] {
        &self.rasters
    }

    pub fn into_rasters(self) -> Vec<PageRaster> {
        self.rasters
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

/// `round(done / total * 100)` clamped to a percentage
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}
