//! Isolation mode, zoom and geometry recompute.

use std::fmt;
use std::time::Duration;

use planmark_core::{AnnotationId, AppEvent, IsolationEvent, Result, ValidationError};

use crate::model::AnnotationType;
use crate::tree::{NodeKey, TreeNodeKind};
use crate::visibility::{mask_cutouts, IsolationContext, IsolationState, MaskStyle};

use super::AnnotatorSession;

#[derive(Debug, Clone, PartialEq)]
pub struct IsolationConfig {
    /// Margin around each mask cutout, in layout pixels.
    pub mask_padding: f64,
    pub mask_corner_radius: f64,
    /// Share of the viewport the focused annotation may fill when fitted.
    pub fit_padding: f64,
    /// Extra wait for a deferred page re-render after the viewport settles.
    pub settle: Duration,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            mask_padding: 15.0,
            mask_corner_radius: 8.0,
            fit_padding: 0.9,
            settle: Duration::from_millis(150),
        }
    }
}

impl IsolationConfig {
    pub fn mask_style(&self) -> MaskStyle {
        MaskStyle {
            padding: self.mask_padding,
            corner_radius: self.mask_corner_radius,
        }
    }
}

/// Steps of the isolation entry pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationStep {
    FitViewport,
    AwaitRender,
    RecomputeGeometry,
    RebuildMask,
}

impl fmt::Display for IsolationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IsolationStep::FitViewport => "fit viewport",
            IsolationStep::AwaitRender => "await render",
            IsolationStep::RecomputeGeometry => "recompute geometry",
            IsolationStep::RebuildMask => "rebuild mask",
        };
        f.write_str(name)
    }
}

impl AnnotatorSession {
    /// Focuses the view on one annotation's branch of the hierarchy.
    ///
    /// The mask is rebuilt only after the viewport has been fitted and the
    /// surface has settled. Returns the pipeline steps that ran; re-entering
    /// the current focus runs none.
    pub async fn enter_isolation(&mut self, id: AnnotationId) -> Result<Vec<IsolationStep>> {
        self.check_lockout("enter isolation")?;

        let focus = self
            .store
            .get(id)
            .ok_or(ValidationError::UnknownAnnotation { id })?;
        let ctx = IsolationContext::for_annotation(focus, &self.store, &self.tree, Some(self.view));

        if self.isolation.context().map(|c| c.focus) == Some(ctx.focus) {
            return Ok(Vec::new());
        }
        if !self.isolation.is_isolated() {
            self.stashed = Some((self.context.clone(), self.view));
        }

        if let Some(focused) = self.store.get(ctx.focus) {
            self.context.select_annotation(focused, &self.tree);
        }
        if let Some(entity) = ctx.focus_entity {
            let kind = match ctx.level.annotation_type() {
                AnnotationType::Room => TreeNodeKind::Room,
                AnnotationType::Location => TreeNodeKind::RoomLocation,
                _ => TreeNodeKind::CabinetRun,
            };
            let key = NodeKey::new(kind, entity);
            self.tree.expand_path(key);
            self.tree.select(Some(key));
        }

        let level = ctx.level;
        let focus_id = ctx.focus;
        tracing::info!(
            "Isolating {} {}",
            level,
            ctx.focus_name.as_deref().unwrap_or("")
        );
        self.isolation = IsolationState::Isolated(ctx);
        self.recompute_hidden();
        self.context_changed();
        self.publish(AppEvent::Isolation(IsolationEvent::Entered {
            level: level.to_string(),
            focus: focus_id,
        }));

        let mut steps = Vec::with_capacity(4);
        if let Some(viewport) = self.viewport.clone() {
            let rect = self
                .store
                .get(focus_id)
                .map(|a| a.layout)
                .unwrap_or_default();
            let zoom = self.coords.zoom_to_fit(
                rect,
                viewport.container_size(),
                self.config.isolation.fit_padding,
            );
            viewport.apply_zoom(zoom).await;
            steps.push(IsolationStep::FitViewport);

            viewport.settle().await;
            if !self.config.isolation.settle.is_zero() {
                tokio::time::sleep(self.config.isolation.settle).await;
            }
            steps.push(IsolationStep::AwaitRender);
        }

        self.coords.invalidate();
        self.store.refresh_layout(&self.coords);
        steps.push(IsolationStep::RecomputeGeometry);

        self.rebuild_mask();
        steps.push(IsolationStep::RebuildMask);
        Ok(steps)
    }

    /// Leaves isolation, restoring the context and view captured on entry.
    ///
    /// Returns `false` when not isolated.
    pub async fn exit_isolation(&mut self) -> Result<bool> {
        self.check_lockout("exit isolation")?;
        if !self.isolation.is_isolated() {
            return Ok(false);
        }

        self.isolation = IsolationState::Normal;
        match self.stashed.take() {
            Some((context, view)) => {
                self.context = context;
                self.view = view;
            }
            None => self.context.clear(),
        }
        self.hidden.clear();
        self.mask.clear();

        self.coords.reset_zoom();
        if let Some(viewport) = self.viewport.clone() {
            viewport.apply_zoom(self.coords.zoom()).await;
            viewport.settle().await;
        }
        self.coords.invalidate();
        self.store.refresh_layout(&self.coords);

        tracing::info!("Isolation exited");
        self.context_changed();
        self.publish(AppEvent::Isolation(IsolationEvent::Exited));
        Ok(true)
    }

    /// Sets the zoom, waits for the surface to settle and recomputes layout.
    pub async fn set_zoom(&mut self, zoom: f64) -> f64 {
        let applied = self.coords.set_zoom(zoom);
        if let Some(viewport) = self.viewport.clone() {
            viewport.apply_zoom(applied).await;
            viewport.settle().await;
        }
        self.recompute_positions();
        applied
    }

    pub async fn zoom_in(&mut self) -> f64 {
        let step = self.coords.zoom_limits().step;
        self.set_zoom(self.coords.zoom() + step).await
    }

    pub async fn zoom_out(&mut self) -> f64 {
        let step = self.coords.zoom_limits().step;
        self.set_zoom(self.coords.zoom() - step).await
    }

    pub async fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(1.0).await
    }

    /// Recomputes every layout cache and, while isolated, the mask.
    ///
    /// Suppressed while the lockout is held so an external recompute cannot
    /// overwrite geometry that a gesture is editing. Returns whether it ran.
    pub fn recompute_positions(&mut self) -> bool {
        if self.lockout.is_held() {
            tracing::debug!("Position recompute suppressed: lockout held");
            return false;
        }
        self.coords.invalidate();
        self.store.refresh_layout(&self.coords);
        if self.isolation.is_isolated() {
            self.rebuild_mask();
        }
        true
    }

    pub(super) fn rebuild_mask(&mut self) {
        self.mask = mask_cutouts(
            self.store.as_slice(),
            &self.isolation,
            self.config.isolation.mask_style(),
        );
        tracing::debug!("Mask rebuilt with {} cutouts", self.mask.len());
        self.publish(AppEvent::Isolation(IsolationEvent::MaskRebuilt {
            cutouts: self.mask.len(),
        }));
    }
}
