//! Pointer gestures and draw modes.

use planmark_core::{
    AnnotationEvent, AnnotationId, AppEvent, Error, GeometryError, Result, StatusLevel,
    ValidationError,
};

use crate::geometry::{LayoutPoint, LayoutRect};
use crate::interaction::{AdjustKind, GestureOutcome, PointerUpdate, ResizeHandle};
use crate::lockout::HoldReason;
use crate::model::{Annotation, AnnotationType, HIGHLIGHT_COLOR};

use super::AnnotatorSession;

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// Empty page area.
    Canvas,
    /// The body of an annotation; starts a move.
    Body(AnnotationId),
    /// A resize handle of an annotation.
    Handle(AnnotationId, ResizeHandle),
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureResult {
    /// A new annotation was created.
    Drawn(AnnotationId),
    /// A resize or move was committed.
    Committed(AnnotationId),
    /// The gesture was below its threshold and had no effect.
    Cancelled(ValidationError),
    /// Nothing was in progress, or geometry was unavailable.
    None,
}

fn hold_reason(kind: AdjustKind) -> HoldReason {
    match kind {
        AdjustKind::Resize(_) => HoldReason::Resize,
        AdjustKind::Move => HoldReason::Move,
    }
}

impl AnnotatorSession {
    /// Selects a draw mode, or turns it off when `kind` is already active.
    ///
    /// Refused when the context is not deep enough, or when the active
    /// context's entity already has an annotation of `kind` on this page.
    /// In the latter case the existing annotation is highlighted instead.
    pub fn set_draw_mode(&mut self, kind: AnnotationType) -> Result<Option<AnnotationType>> {
        if self.interaction.draw_mode() == Some(kind) {
            return Ok(self.interaction.toggle_draw_mode(kind));
        }

        if !self.can_draw(kind) {
            let required = match kind {
                AnnotationType::Location => "room",
                _ => "room and location",
            };
            return Err(ValidationError::MissingContext {
                required: required.to_string(),
            }
            .into());
        }

        if let Some(existing) = self
            .store
            .find_duplicate(kind, &self.context, self.page_number)
        {
            let id = existing.id;
            let label = existing.label.clone();
            tracing::warn!("{} already annotated on this page by {}", kind, label);
            self.publish(AppEvent::Annotation(AnnotationEvent::DuplicateHighlighted {
                id,
                color: HIGHLIGHT_COLOR.to_string(),
                duration_ms: self.config.interaction.duplicate_highlight.as_millis() as u64,
            }));
            self.status(
                StatusLevel::Warning,
                format!("{} is already annotated on this page", label),
            );
            return Err(ValidationError::DuplicateEntity {
                kind: kind.to_string(),
                existing: id,
            }
            .into());
        }

        Ok(self.interaction.toggle_draw_mode(kind))
    }

    pub fn draw_mode(&self) -> Option<AnnotationType> {
        self.interaction.draw_mode()
    }

    /// Starts a gesture.
    ///
    /// Resize and move acquire the lockout immediately and pause any pending
    /// debounced save.
    pub fn pointer_down(&mut self, point: LayoutPoint, target: PointerTarget) -> Result<()> {
        let (id, kind) = match target {
            PointerTarget::Canvas => {
                if self.interaction.draw_mode().is_some() {
                    self.interaction.begin_draw(point)?;
                }
                return Ok(());
            }
            PointerTarget::Body(id) => (id, AdjustKind::Move),
            PointerTarget::Handle(id, handle) => (id, AdjustKind::Resize(handle)),
        };

        let annotation = self
            .store
            .get(id)
            .ok_or(ValidationError::UnknownAnnotation { id })?;
        if annotation.locked {
            return Err(ValidationError::AnnotationLocked { id }.into());
        }
        let origin = annotation.layout;

        self.interaction.begin_adjust(id, kind, point, origin)?;
        self.lockout.acquire(hold_reason(kind));
        self.debouncer.pause();
        Ok(())
    }

    pub fn pointer_move(&mut self, point: LayoutPoint) -> PointerUpdate {
        self.interaction.pointer_move(point)
    }

    /// Applies the coalesced pointer update for this animation frame.
    pub fn animation_frame(&mut self) -> Option<LayoutRect> {
        let (id, rect) = self.interaction.animation_frame()?;
        let annotation = self.store.get_mut(id)?;
        annotation.layout = rect;
        Some(rect)
    }

    /// Live preview of the rectangle being drawn.
    pub fn draw_preview(&self) -> Option<LayoutRect> {
        self.interaction.preview()
    }

    /// Ends the gesture at `point`.
    pub fn pointer_up(&mut self, point: LayoutPoint) -> Result<GestureResult> {
        match self.interaction.pointer_up(point) {
            GestureOutcome::Idle => Ok(GestureResult::None),
            GestureOutcome::Drawn { kind, rect } => self.complete_draw(kind, rect),
            GestureOutcome::Committed { id, kind, rect, .. } => {
                Ok(self.commit_adjustment(id, kind, rect))
            }
            GestureOutcome::Cancelled {
                id,
                restore,
                reason,
            } => {
                let gesture = match (id, restore) {
                    (Some(id), Some(origin)) => {
                        self.restore_layout(id, origin);
                        self.release_gesture();
                        "adjust"
                    }
                    _ => "draw",
                };
                self.publish(AppEvent::Annotation(AnnotationEvent::GestureCancelled {
                    id,
                    gesture: gesture.to_string(),
                }));
                Ok(GestureResult::Cancelled(reason))
            }
        }
    }

    /// Abandons the active gesture, restoring captured geometry.
    pub fn cancel_gesture(&mut self) {
        if let Some((id, origin)) = self.interaction.cancel() {
            self.restore_layout(id, origin);
            self.release_gesture();
        }
    }

    fn restore_layout(&mut self, id: AnnotationId, origin: LayoutRect) {
        if let Some(annotation) = self.store.get_mut(id) {
            annotation.layout = origin;
        }
    }

    /// Drops the gesture holds; queued saves resume their timer.
    fn release_gesture(&mut self) {
        self.lockout.release(HoldReason::Resize);
        self.lockout.release(HoldReason::Move);
        self.debouncer.rearm();
    }

    fn complete_draw(&mut self, kind: AnnotationType, rect: LayoutRect) -> Result<GestureResult> {
        let (geometry, page) = match (self.coords.try_layout_rect_to_doc(rect), self.coords.page())
        {
            (Ok(geometry), Some(page)) => (geometry, page),
            (Err(err), _) => {
                tracing::warn!("Draw discarded: {}", err);
                return Ok(GestureResult::None);
            }
            (Ok(_), None) => {
                tracing::warn!("Draw discarded: {}", GeometryError::MissingPageDimensions);
                return Ok(GestureResult::None);
            }
        };

        let mut annotation = Annotation::new(kind, self.page_number);
        annotation.set_doc_geometry(geometry.doc, page);
        annotation.refs.set_room_id(self.context.room_id());
        annotation.refs.set_location_id(self.context.location_id());
        annotation.refs.set_cabinet_run_id(self.context.cabinet_run_id());
        annotation.view_type = Some(self.view.view_type);
        if self.view.view_type.uses_orientation() {
            annotation.orientation = self.view.orientation;
        }
        annotation.parent_id = self.infer_parent(&annotation);
        annotation.label = self.auto_label(kind);
        annotation.refresh_layout(&self.coords);

        let defaults = self.detector.entity_defaults(
            kind.into(),
            Some(&annotation.label),
            &self.context,
            self.view,
        );
        if let Some(surface) = &self.edit_surface {
            surface.open(&annotation, Some(&defaults));
        }

        let id = self.store.add(annotation);
        self.recompute_hidden();
        if self.isolation.is_isolated() {
            self.rebuild_mask();
        }
        self.record_history(format!("Draw {}", kind));
        tracing::info!("Drew {} {}", kind, id);
        self.publish(AppEvent::Annotation(AnnotationEvent::Drawn {
            id,
            kind: kind.to_string(),
        }));
        Ok(GestureResult::Drawn(id))
    }

    /// Parent annotation for a new annotation: the annotation of the next
    /// level up standing for the referenced entity, else the isolation focus
    /// when it sits above `annotation`.
    fn infer_parent(&self, annotation: &Annotation) -> Option<AnnotationId> {
        let refs = &annotation.refs;
        let by_entity = match annotation.kind() {
            AnnotationType::Room => None,
            AnnotationType::Location => refs
                .room_id()
                .and_then(|id| self.store.find_by_entity(AnnotationType::Room, id)),
            AnnotationType::CabinetRun => refs
                .location_id()
                .and_then(|id| self.store.find_by_entity(AnnotationType::Location, id)),
            AnnotationType::Cabinet => refs
                .cabinet_run_id()
                .and_then(|id| self.store.find_by_entity(AnnotationType::CabinetRun, id))
                .or_else(|| {
                    refs.location_id()
                        .and_then(|id| self.store.find_by_entity(AnnotationType::Location, id))
                }),
        };

        by_entity.map(|a| a.id).or_else(|| {
            let ctx = self.isolation.context()?;
            (ctx.level.annotation_type() < annotation.kind()).then_some(ctx.focus)
        })
    }

    fn auto_label(&self, kind: AnnotationType) -> String {
        match kind {
            AnnotationType::Room => self.context.room_name().unwrap_or("Room").to_string(),
            AnnotationType::Location => format!(
                "Location {}",
                self.store.next_label_number(kind, self.context.room_id())
            ),
            AnnotationType::CabinetRun => format!(
                "Run {}",
                self.store.next_label_number(kind, self.context.location_id())
            ),
            AnnotationType::Cabinet => format!(
                "Cabinet {}",
                self.store.next_label_number(kind, self.context.location_id())
            ),
        }
    }

    /// Converts the final layout geometry back to document space and queues
    /// the debounced save. Temporary annotations are only updated locally.
    fn commit_adjustment(
        &mut self,
        id: AnnotationId,
        kind: AdjustKind,
        rect: LayoutRect,
    ) -> GestureResult {
        let converted = self.coords.try_layout_rect_to_doc(rect);
        let page = self.coords.page();
        let (geometry, page) = match (converted, page) {
            (Ok(geometry), Some(page)) => (geometry, page),
            _ => {
                tracing::warn!("{} of {} discarded: geometry unavailable", kind, id);
                self.cancel_adjustment_in_place(id);
                return GestureResult::None;
            }
        };

        let Some(annotation) = self.store.get_mut(id) else {
            self.release_gesture();
            return GestureResult::None;
        };
        annotation.set_doc_geometry(geometry.doc, page);
        annotation.refresh_layout(&self.coords);
        let normalized = annotation.normalized;
        let label = format!("{} {}", capitalized(&kind.to_string()), annotation.label);

        if let Some(stable) = id.stable() {
            self.lockout.acquire(HoldReason::PendingSave);
            self.debouncer.schedule(stable, normalized);
        }
        self.release_gesture();

        self.record_history(label);
        if self.isolation.is_isolated() {
            self.rebuild_mask();
        }
        tracing::info!("Committed {} of {}", kind, id);
        self.publish(AppEvent::Annotation(AnnotationEvent::GestureCommitted {
            id,
            gesture: kind.to_string(),
        }));
        GestureResult::Committed(id)
    }

    fn cancel_adjustment_in_place(&mut self, id: AnnotationId) {
        if let Some(annotation) = self.store.get_mut(id) {
            annotation.refresh_layout(&self.coords);
        }
        self.release_gesture();
    }

    /// Toggles an annotation's lock flag. Returns the new state.
    pub fn toggle_lock(&mut self, id: AnnotationId) -> Result<bool> {
        self.check_lockout("toggle lock")?;
        let annotation = self
            .store
            .get_mut(id)
            .ok_or(ValidationError::UnknownAnnotation { id })?;
        annotation.locked = !annotation.locked;
        let locked = annotation.locked;
        let label = format!(
            "{} {}",
            if locked { "Lock" } else { "Unlock" },
            annotation.label
        );
        self.record_history(label);
        Ok(locked)
    }

    /// Creates the missing ancestors of `kind` in order, filling the active
    /// context from each created entity.
    pub async fn create_missing_ancestors(
        &mut self,
        kind: AnnotationType,
        label: Option<&str>,
    ) -> Result<Vec<crate::persistence::EntityRecord>> {
        use crate::context::ContextEntity;
        use crate::hierarchy::EntityKind;

        self.check_lockout("create ancestors")?;
        let missing = self.detector.missing_ancestors(kind, &self.context);
        let mut created = Vec::with_capacity(missing.len());

        for ancestor in missing {
            let defaults =
                self.detector
                    .entity_defaults(ancestor.kind, label, &self.context, self.view);
            let record = match self.entities_api.create_entity(defaults).await {
                Ok(record) => record,
                Err(err) => {
                    let err = Error::from(err);
                    self.report_failure(&format!("Create {}", ancestor.kind.display_name()), &err);
                    return Err(err);
                }
            };
            tracing::info!(
                "Created {} {} ({})",
                ancestor.kind.display_name(),
                record.name,
                record.id
            );

            let entity = ContextEntity::new(record.id, Some(record.name.clone()));
            match ancestor.kind {
                EntityKind::Room => self.context.set_room(Some(entity)),
                EntityKind::RoomLocation => self.context.set_location(Some(entity)),
                EntityKind::CabinetRun => self.context.set_cabinet_run(Some(entity)),
                EntityKind::Cabinet => self.context.set_cabinet(Some(record.id)),
            }
            created.push(record);
        }

        if !created.is_empty() {
            self.context_changed();
            if let Err(err) = self.refresh_tree().await {
                tracing::warn!("Tree refresh after entity creation failed: {}", err);
            }
        }
        Ok(created)
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
