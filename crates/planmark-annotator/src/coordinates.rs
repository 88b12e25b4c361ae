//! Coordinate mapping between document space and layout space.
//!
//! Conversions normalize against the page's natural point size and scale by
//! the rendering surface's *layout* box, so the result already reflects the
//! current zoom and container width. Browser or OS zoom only changes the
//! surface's visual client rectangle, which is used solely to map pointer
//! client positions into layout space.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use planmark_core::GeometryError;

use crate::geometry::{
    ClientRect, DocGeometry, DocPoint, DocRect, LayoutPoint, LayoutRect, NormalizedPoint,
    NormalizedRect, PageDimensions, SurfaceSize,
};

/// The element a page is rendered into.
pub trait RenderSurface: Send + Sync {
    /// Untransformed layout box of the rendered page, `None` before first render.
    fn layout_size(&self) -> Option<SurfaceSize>;

    /// Visual bounding rectangle in client coordinates.
    fn client_rect(&self) -> Option<ClientRect>;
}

/// A surface with fixed metrics, for headless use and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSurface {
    pub layout: SurfaceSize,
    pub client: ClientRect,
}

impl StaticSurface {
    /// A surface whose client rectangle matches its layout box at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            layout: SurfaceSize::new(width, height),
            client: ClientRect::new(0.0, 0.0, width, height),
        }
    }
}

impl RenderSurface for StaticSurface {
    fn layout_size(&self) -> Option<SurfaceSize> {
        self.layout.is_valid().then_some(self.layout)
    }

    fn client_rect(&self) -> Option<ClientRect> {
        Some(self.client)
    }
}

/// Zoom range and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 3.0,
            step: 0.25,
        }
    }
}

/// Configuration for [`CoordinateSpace`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateConfig {
    /// How long a surface client rectangle stays valid.
    pub rect_cache_ttl: Duration,
    pub zoom: ZoomLimits,
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        Self {
            rect_cache_ttl: Duration::from_millis(100),
            zoom: ZoomLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedRect {
    rect: ClientRect,
    captured_at: Instant,
}

/// Maps geometry between PDF points and layout pixels for the current page.
pub struct CoordinateSpace {
    page: Option<PageDimensions>,
    surface: Option<Arc<dyn RenderSurface>>,
    zoom: f64,
    config: CoordinateConfig,
    rect_cache: Option<CachedRect>,
}

impl CoordinateSpace {
    pub fn new(config: CoordinateConfig) -> Self {
        Self {
            page: None,
            surface: None,
            zoom: 1.0,
            config,
            rect_cache: None,
        }
    }

    /// Natural size of the current page, if one is loaded.
    pub fn page(&self) -> Option<PageDimensions> {
        self.page
    }

    /// Sets the current page size. Invalid sizes are treated as absent.
    pub fn set_page(&mut self, page: Option<PageDimensions>) {
        self.page = page.filter(PageDimensions::is_valid);
        self.invalidate();
    }

    /// Attaches the surface the page is rendered into.
    pub fn attach_surface(&mut self, surface: Arc<dyn RenderSurface>) {
        self.surface = Some(surface);
        self.invalidate();
    }

    pub fn detach_surface(&mut self) {
        self.surface = None;
        self.invalidate();
    }

    /// Current layout box of the rendering surface.
    pub fn layout_size(&self) -> Option<SurfaceSize> {
        self.surface
            .as_ref()
            .and_then(|surface| surface.layout_size())
            .filter(SurfaceSize::is_valid)
    }

    /// Drops the cached client rectangle so the next read queries the surface.
    ///
    /// Must be called after any zoom, resize or re-render.
    pub fn invalidate(&mut self) {
        self.rect_cache = None;
    }

    /// Surface client rectangle, served from cache within the TTL.
    pub fn client_rect(&mut self) -> Option<ClientRect> {
        self.client_rect_at(Instant::now())
    }

    /// Like [`client_rect`](Self::client_rect) with an explicit clock reading.
    pub fn client_rect_at(&mut self, now: Instant) -> Option<ClientRect> {
        if let Some(cached) = self.rect_cache {
            if now.saturating_duration_since(cached.captured_at) < self.config.rect_cache_ttl {
                return Some(cached.rect);
            }
        }

        let rect = self.surface.as_ref()?.client_rect()?;
        self.rect_cache = Some(CachedRect {
            rect,
            captured_at: now,
        });
        Some(rect)
    }

    /// Converts a document rectangle into layout space.
    ///
    /// Formula:
    /// ```text
    /// layout_x = doc_x / page_width * layout_width
    /// layout_y = (page_height - doc_y) / page_height * layout_height  // Flip Y-axis
    /// layout_w = doc_w / page_width * layout_width
    /// layout_h = doc_h / page_height * layout_height
    /// ```
    pub fn try_doc_to_layout(&self, doc: DocRect) -> Result<LayoutRect, GeometryError> {
        let page = self.page.ok_or(GeometryError::MissingPageDimensions)?;
        let layout = self.layout_size().ok_or(GeometryError::MissingSurface)?;

        let normalized = NormalizedRect::from_doc(doc, page);
        Ok(LayoutRect {
            x: normalized.x * layout.width,
            y: normalized.y * layout.height,
            width: normalized.width * layout.width,
            height: normalized.height * layout.height,
        })
    }

    /// Converts a document rectangle into layout space, zeroed when the page
    /// or surface is unavailable.
    pub fn doc_to_layout(&self, x: f64, y: f64, width: f64, height: f64) -> LayoutRect {
        self.try_doc_to_layout(DocRect::new(x, y, width, height))
            .unwrap_or_else(|err| {
                tracing::debug!("doc_to_layout degraded: {}", err);
                LayoutRect::default()
            })
    }

    /// Converts normalized page geometry into layout space.
    pub fn normalized_to_layout(&self, normalized: NormalizedRect) -> LayoutRect {
        match self.page {
            Some(page) => {
                let doc = normalized.to_doc(page);
                self.doc_to_layout(doc.x, doc.y, doc.width, doc.height)
            }
            None => LayoutRect::default(),
        }
    }

    /// Converts a layout point into document space.
    ///
    /// Formula:
    /// ```text
    /// norm_x = layout_x / layout_width
    /// norm_y = layout_y / layout_height
    /// doc_x  = norm_x * page_width
    /// doc_y  = page_height - norm_y * page_height  // Flip Y-axis
    /// ```
    pub fn try_layout_to_doc(&self, point: LayoutPoint) -> Result<DocPoint, GeometryError> {
        let page = self.page.ok_or(GeometryError::MissingPageDimensions)?;
        let layout = self.layout_size().ok_or(GeometryError::MissingSurface)?;

        let normalized = NormalizedPoint {
            x: point.x / layout.width,
            y: point.y / layout.height,
        };
        Ok(DocPoint {
            x: normalized.x * page.width,
            y: page.height - normalized.y * page.height,
            normalized,
        })
    }

    /// Converts a layout point into document space, zeroed when unavailable.
    pub fn layout_to_doc(&self, x: f64, y: f64) -> DocPoint {
        self.try_layout_to_doc(LayoutPoint::new(x, y))
            .unwrap_or_else(|err| {
                tracing::debug!("layout_to_doc degraded: {}", err);
                DocPoint::default()
            })
    }

    /// Converts a layout rectangle into document and normalized geometry.
    ///
    /// Both corners go through the point conversion; sizes are absolute
    /// differences and normalization is anchored at the top-left corner.
    pub fn try_layout_rect_to_doc(&self, rect: LayoutRect) -> Result<DocGeometry, GeometryError> {
        let page = self.page.ok_or(GeometryError::MissingPageDimensions)?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(GeometryError::DegenerateRect {
                width: rect.width,
                height: rect.height,
            });
        }
        let top_left = self.try_layout_to_doc(rect.top_left())?;
        let bottom_right = self.try_layout_to_doc(rect.bottom_right())?;

        let width = (bottom_right.x - top_left.x).abs();
        let height = (top_left.y - bottom_right.y).abs();

        Ok(DocGeometry {
            doc: DocRect::new(top_left.x, top_left.y, width, height),
            normalized: NormalizedRect::new(
                top_left.normalized.x,
                top_left.normalized.y,
                width / page.width,
                height / page.height,
            ),
        })
    }

    /// Maps a pointer's client position into layout space.
    ///
    /// Uses the ratio between layout box and visual client rectangle so the
    /// mapping stays correct under browser or OS zoom.
    pub fn client_to_layout(&mut self, client_x: f64, client_y: f64) -> Option<LayoutPoint> {
        let layout = self.layout_size()?;
        let rect = self.client_rect()?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return None;
        }

        Some(LayoutPoint::new(
            (client_x - rect.left) * layout.width / rect.width,
            (client_y - rect.top) * layout.height / rect.height,
        ))
    }

    /// Gets the current zoom level (1.0 = 100%).
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Zoom as a whole percentage.
    pub fn zoom_percentage(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        self.config.zoom
    }

    /// Sets the zoom level clamped to the configured range and returns the
    /// applied value. Invalidates the rect cache.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let limits = self.config.zoom;
        if zoom.is_finite() {
            self.zoom = zoom.clamp(limits.min, limits.max);
        }
        self.invalidate();
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + self.config.zoom.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - self.config.zoom.step)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(1.0)
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.config.zoom.max
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.config.zoom.min
    }

    /// Computes and applies the zoom at which `rect` fills `container`.
    ///
    /// # Arguments
    /// * `rect` - Target region in layout pixels at the current zoom
    /// * `container` - Visible viewport size in layout pixels
    /// * `padding` - Fraction of the container the region may occupy (0.0 - 1.0)
    ///
    /// Leaves the zoom untouched for an empty region or container.
    pub fn zoom_to_fit(&mut self, rect: LayoutRect, container: SurfaceSize, padding: f64) -> f64 {
        if rect.is_empty() || !container.is_valid() {
            return self.zoom;
        }

        // Size of the region at 100%
        let base_width = rect.width / self.zoom;
        let base_height = rect.height / self.zoom;

        let zoom_x = container.width * padding / base_width;
        let zoom_y = container.height * padding / base_height;
        self.set_zoom(zoom_x.min(zoom_y))
    }
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self::new(CoordinateConfig::default())
    }
}

impl fmt::Debug for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateSpace")
            .field("page", &self.page)
            .field("layout", &self.layout_size())
            .field("zoom", &self.zoom)
            .field("cached", &self.rect_cache.is_some())
            .finish()
    }
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.page, self.layout_size()) {
            (Some(page), Some(layout)) => write!(
                f,
                "Page: {:.0}x{:.0}pt, Layout: {:.0}x{:.0}px, Zoom: {}%",
                page.width,
                page.height,
                layout.width,
                layout.height,
                self.zoom_percentage()
            ),
            _ => write!(f, "Unmapped, Zoom: {}%", self.zoom_percentage()),
        }
    }
}
