//! Hierarchy visibility and isolation mode.
//!
//! Outside isolation only rooms and locations are drawn. Inside isolation the
//! visible set is the focused annotation, its ancestor chain and its direct
//! children, further narrowed by the view-type filter captured on entry.
//!
//! The focused level stores both an annotation id (to identify the focused
//! frame) and an entity id (to match children, which reference entities).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use planmark_core::{AnnotationId, EntityId};

use crate::geometry::LayoutRect;
use crate::model::{Annotation, AnnotationType, ViewContext};
use crate::store::AnnotationStore;
use crate::tree::ProjectTree;

/// Level at which isolation is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    Room,
    Location,
    CabinetRun,
}

impl IsolationLevel {
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            IsolationLevel::Room => AnnotationType::Room,
            IsolationLevel::Location => AnnotationType::Location,
            IsolationLevel::CabinetRun => AnnotationType::CabinetRun,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            IsolationLevel::Room => "🏠",
            IsolationLevel::Location => "📍",
            IsolationLevel::CabinetRun => "🗄️",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation_type().as_str())
    }
}

/// One level of the isolation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedLevel {
    pub annotation_id: Option<AnnotationId>,
    pub entity_id: Option<EntityId>,
    pub name: Option<String>,
}

/// Everything isolation mode needs to filter and label the view.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationContext {
    pub level: IsolationLevel,
    /// The focused annotation.
    pub focus: AnnotationId,
    /// The entity the focused annotation stands for.
    pub focus_entity: Option<EntityId>,
    pub focus_name: Option<String>,
    pub room: Option<IsolatedLevel>,
    pub location: Option<IsolatedLevel>,
    /// View captured on entry; `None` disables the view filter.
    pub view: Option<ViewContext>,
}

impl IsolationContext {
    /// Builds the context for focusing on `focus`.
    ///
    /// A cabinet cannot be isolated on its own; its room is isolated instead,
    /// using the room's annotation when one exists.
    pub fn for_annotation(
        focus: &Annotation,
        store: &AnnotationStore,
        tree: &ProjectTree,
        view: Option<ViewContext>,
    ) -> Self {
        let refs = &focus.refs;
        let level = match focus.kind() {
            AnnotationType::Room => IsolationLevel::Room,
            AnnotationType::Location => IsolationLevel::Location,
            AnnotationType::CabinetRun => IsolationLevel::CabinetRun,
            AnnotationType::Cabinet => {
                let room_annotation = refs
                    .room_id()
                    .and_then(|id| store.find_by_entity(AnnotationType::Room, id));
                if let Some(room) = room_annotation {
                    return Self::for_annotation(room, store, tree, view);
                }
                IsolationLevel::Room
            }
        };

        let room_entity = refs.room_id();
        let room_name = room_entity.and_then(|id| tree.room_name(id).map(str::to_string));
        let location_entity = refs.location_id();
        let location_name =
            location_entity.and_then(|id| tree.location_name(id).map(str::to_string));

        let (focus_entity, focus_name) = match level {
            IsolationLevel::Room => (room_entity, room_name.clone()),
            IsolationLevel::Location => (location_entity, location_name.clone()),
            IsolationLevel::CabinetRun => {
                let run = refs.cabinet_run_id();
                (run, run.and_then(|id| tree.cabinet_run_name(id).map(str::to_string)))
            }
        };
        let focus_name = focus_name.or_else(|| Some(focus.label.clone()));

        let room = (level != IsolationLevel::Room).then(|| IsolatedLevel {
            annotation_id: ancestor_annotation(focus, store, AnnotationType::Room, room_entity),
            entity_id: room_entity,
            name: room_name,
        });
        let location = (level == IsolationLevel::CabinetRun).then(|| IsolatedLevel {
            annotation_id: ancestor_annotation(
                focus,
                store,
                AnnotationType::Location,
                location_entity,
            ),
            entity_id: location_entity,
            name: location_name,
        });

        Self {
            level,
            focus: focus.id,
            focus_entity,
            focus_name,
            room,
            location,
            view,
        }
    }

    fn is_ancestor(&self, id: AnnotationId) -> bool {
        [&self.room, &self.location]
            .into_iter()
            .flatten()
            .any(|level| level.annotation_id == Some(id))
    }

    /// Hierarchy part of the visibility predicate.
    pub fn admits(&self, annotation: &Annotation) -> bool {
        if annotation.id == self.focus || self.is_ancestor(annotation.id) {
            return true;
        }
        let Some(entity) = self.focus_entity else {
            return false;
        };

        let refs = &annotation.refs;
        match self.level {
            IsolationLevel::Room => {
                matches!(
                    annotation.kind(),
                    AnnotationType::Location | AnnotationType::CabinetRun
                ) && refs.room_id() == Some(entity)
            }
            IsolationLevel::Location => {
                matches!(
                    annotation.kind(),
                    AnnotationType::CabinetRun | AnnotationType::Cabinet
                ) && refs.location_id() == Some(entity)
            }
            IsolationLevel::CabinetRun => {
                annotation.kind() == AnnotationType::Cabinet
                    && refs.cabinet_run_id() == Some(entity)
            }
        }
    }

    /// Breadcrumb trail from the room down to the focused level.
    ///
    /// Levels without a known name are omitted.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::new();
        let mut push = |level: IsolationLevel, name: &Option<String>| {
            if let Some(name) = name {
                crumbs.push(Breadcrumb {
                    level,
                    icon: level.icon(),
                    name: name.clone(),
                });
            }
        };

        if let Some(room) = &self.room {
            push(IsolationLevel::Room, &room.name);
        }
        if let Some(location) = &self.location {
            push(IsolationLevel::Location, &location.name);
        }
        push(self.level, &self.focus_name);
        crumbs
    }
}

/// Nearest ancestor of `kind` by parent pointers, falling back to an entity
/// lookup when the chain does not reach it.
fn ancestor_annotation(
    focus: &Annotation,
    store: &AnnotationStore,
    kind: AnnotationType,
    entity: Option<EntityId>,
) -> Option<AnnotationId> {
    let mut seen = HashSet::new();
    let mut current = focus.parent_id;
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let Some(parent) = store.get(id) else {
            break;
        };
        if parent.kind() == kind {
            return Some(parent.id);
        }
        current = parent.parent_id;
    }

    entity
        .and_then(|id| store.find_by_entity(kind, id))
        .map(|a| a.id)
}

/// One entry of the isolation breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub level: IsolationLevel,
    pub icon: &'static str,
    pub name: String,
}

/// Isolation mode state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IsolationState {
    #[default]
    Normal,
    Isolated(IsolationContext),
}

impl IsolationState {
    pub fn is_isolated(&self) -> bool {
        matches!(self, IsolationState::Isolated(_))
    }

    pub fn level(&self) -> Option<IsolationLevel> {
        self.context().map(|ctx| ctx.level)
    }

    pub fn context(&self) -> Option<&IsolationContext> {
        match self {
            IsolationState::Normal => None,
            IsolationState::Isolated(ctx) => Some(ctx),
        }
    }
}

/// View-type and orientation part of the visibility predicate.
///
/// Annotations without a view type always pass. In elevation and section
/// views with an orientation, the annotation's orientation must match.
pub fn passes_view_filter(annotation: &Annotation, view: Option<&ViewContext>) -> bool {
    let Some(view) = view else {
        return true;
    };
    let Some(view_type) = annotation.view_type else {
        return true;
    };
    if view_type != view.view_type {
        return false;
    }
    match view.orientation {
        Some(orientation) if view.view_type.uses_orientation() => {
            annotation.orientation == Some(orientation)
        }
        _ => true,
    }
}

/// Whether `annotation` is drawn under `state`.
pub fn is_visible(annotation: &Annotation, state: &IsolationState) -> bool {
    match state {
        IsolationState::Normal => matches!(
            annotation.kind(),
            AnnotationType::Room | AnnotationType::Location
        ),
        IsolationState::Isolated(ctx) => {
            passes_view_filter(annotation, ctx.view.as_ref()) && ctx.admits(annotation)
        }
    }
}

/// Ids hidden by isolation. Empty outside isolation.
pub fn hidden_set(annotations: &[Annotation], state: &IsolationState) -> HashSet<AnnotationId> {
    if !state.is_isolated() {
        return HashSet::new();
    }
    annotations
        .iter()
        .filter(|a| !is_visible(a, state))
        .map(|a| a.id)
        .collect()
}

/// A rounded cutout in the isolation dimming overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskCutout {
    pub rect: LayoutRect,
    pub corner_radius: f64,
}

/// Mask geometry options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskStyle {
    pub padding: f64,
    pub corner_radius: f64,
}

impl Default for MaskStyle {
    fn default() -> Self {
        Self {
            padding: 15.0,
            corner_radius: 8.0,
        }
    }
}

/// Rebuilds the cutout list from current layout geometry.
///
/// The focused annotation is always cut out; every other visible annotation
/// is cut out when it has a visible area. Must run after layout recompute.
pub fn mask_cutouts(
    annotations: &[Annotation],
    state: &IsolationState,
    style: MaskStyle,
) -> Vec<MaskCutout> {
    let Some(ctx) = state.context() else {
        return Vec::new();
    };

    let cutout = |a: &Annotation| MaskCutout {
        rect: a.layout.padded(style.padding),
        corner_radius: style.corner_radius,
    };

    let mut cutouts: Vec<MaskCutout> = annotations
        .iter()
        .filter(|a| a.id == ctx.focus)
        .map(cutout)
        .collect();

    cutouts.extend(
        annotations
            .iter()
            .filter(|a| a.id != ctx.focus && a.has_layout() && is_visible(a, state))
            .map(cutout),
    );
    cutouts
}
