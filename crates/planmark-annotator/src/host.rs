//! Traits for the UI that hosts an annotation session.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::time::Duration;

use crate::coordinates::RenderSurface;
use crate::geometry::{ClientRect, SurfaceSize};
use crate::hierarchy::EntityDefaults;
use crate::model::Annotation;

/// The form used to edit an annotation's fields.
///
/// Opened with a fully populated annotation whenever a draw completes or an
/// existing annotation is opened.
pub trait EditSurface: Send + Sync {
    fn open(&self, annotation: &Annotation, defaults: Option<&EntityDefaults>);
}

/// The scrollable viewport around the rendering surface.
#[async_trait]
pub trait ViewportHost: Send + Sync {
    /// Visible container size in layout pixels.
    fn container_size(&self) -> SurfaceSize;

    /// Applies a zoom level; the surface resizes asynchronously.
    async fn apply_zoom(&self, zoom: f64);

    /// Resolves once the surface has finished resizing and re-rendering.
    async fn settle(&self);
}

/// Edit surface that records what it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingEditSurface {
    opened: Mutex<Vec<(Annotation, Option<EntityDefaults>)>>,
}

impl RecordingEditSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<(Annotation, Option<EntityDefaults>)> {
        self.opened.lock().clone()
    }

    pub fn last(&self) -> Option<Annotation> {
        self.opened.lock().last().map(|(a, _)| a.clone())
    }
}

impl EditSurface for RecordingEditSurface {
    fn open(&self, annotation: &Annotation, defaults: Option<&EntityDefaults>) {
        tracing::debug!("Edit surface opened for {}", annotation.id);
        self.opened
            .lock()
            .push((annotation.clone(), defaults.cloned()));
    }
}

/// A viewport whose page surface scales with zoom, for headless sessions.
///
/// At zoom 1.0 the page is laid out at `page_layout`; every zoom scales both
/// the layout box and the client rectangle.
#[derive(Debug)]
pub struct HeadlessViewport {
    container: SurfaceSize,
    page_layout: SurfaceSize,
    zoom: RwLock<f64>,
    settle_delay: Duration,
}

impl HeadlessViewport {
    pub fn new(container: SurfaceSize, page_layout: SurfaceSize) -> Self {
        Self {
            container,
            page_layout,
            zoom: RwLock::new(1.0),
            settle_delay: Duration::ZERO,
        }
    }

    /// Simulates a surface that needs `delay` to finish re-rendering.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn zoom(&self) -> f64 {
        *self.zoom.read()
    }
}

impl RenderSurface for HeadlessViewport {
    fn layout_size(&self) -> Option<SurfaceSize> {
        let zoom = self.zoom();
        let size = SurfaceSize::new(self.page_layout.width * zoom, self.page_layout.height * zoom);
        size.is_valid().then_some(size)
    }

    fn client_rect(&self) -> Option<ClientRect> {
        self.layout_size()
            .map(|size| ClientRect::new(0.0, 0.0, size.width, size.height))
    }
}

#[async_trait]
impl ViewportHost for HeadlessViewport {
    fn container_size(&self) -> SurfaceSize {
        self.container
    }

    async fn apply_zoom(&self, zoom: f64) {
        *self.zoom.write() = zoom;
    }

    async fn settle(&self) {
        if self.settle_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.settle_delay).await;
        }
    }
}
