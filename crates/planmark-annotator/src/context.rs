//! The active room, location and cabinet-run context that drawing works in.

use planmark_core::EntityId;

use crate::model::{Annotation, AnnotationType};
use crate::tree::{ProjectTree, TreeNode, TreeNodeKind};

/// An entity chosen as part of the active context, with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntity {
    pub id: EntityId,
    pub name: Option<String>,
}

impl ContextEntity {
    pub fn new(id: EntityId, name: Option<String>) -> Self {
        Self { id, name }
    }
}

/// The room / location / cabinet run the user is currently working in.
///
/// `ActiveContext` is responsible for:
/// - Tracking the selected entity at each hierarchy level
/// - Deriving which draw tool is enabled (one level below the deepest selection)
/// - Producing the context label shown in the toolbar
///
/// # Context Model
///
/// Setting a level clears every level beneath it, so the context is always a
/// consistent path from a room downward. Lockout checks are the caller's
/// concern; this type only holds state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveContext {
    room: Option<ContextEntity>,
    location: Option<ContextEntity>,
    cabinet_run: Option<ContextEntity>,
    cabinet: Option<EntityId>,
}

impl ActiveContext {
    /// Creates an empty context.
    ///
    /// # Examples
    ///
    /// ```
    /// use planmark_annotator::context::ActiveContext;
    /// use planmark_annotator::model::AnnotationType;
    ///
    /// let context = ActiveContext::new();
    /// assert!(context.is_empty());
    /// assert_eq!(context.enabled_draw_tool(), AnnotationType::Room);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.room.is_none()
            && self.location.is_none()
            && self.cabinet_run.is_none()
            && self.cabinet.is_none()
    }

    pub fn room_id(&self) -> Option<EntityId> {
        self.room.as_ref().map(|e| e.id)
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room.as_ref().and_then(|e| e.name.as_deref())
    }

    pub fn location_id(&self) -> Option<EntityId> {
        self.location.as_ref().map(|e| e.id)
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(|e| e.name.as_deref())
    }

    pub fn cabinet_run_id(&self) -> Option<EntityId> {
        self.cabinet_run.as_ref().map(|e| e.id)
    }

    pub fn cabinet_run_name(&self) -> Option<&str> {
        self.cabinet_run.as_ref().and_then(|e| e.name.as_deref())
    }

    pub fn cabinet_id(&self) -> Option<EntityId> {
        self.cabinet
    }

    /// Sets the active room and clears all deeper levels.
    pub fn set_room(&mut self, room: Option<ContextEntity>) {
        self.room = room;
        self.location = None;
        self.cabinet_run = None;
        self.cabinet = None;
    }

    /// Sets the active location and clears all deeper levels.
    pub fn set_location(&mut self, location: Option<ContextEntity>) {
        self.location = location;
        self.cabinet_run = None;
        self.cabinet = None;
    }

    /// Sets the active cabinet run and clears the active cabinet.
    pub fn set_cabinet_run(&mut self, cabinet_run: Option<ContextEntity>) {
        self.cabinet_run = cabinet_run;
        self.cabinet = None;
    }

    pub fn set_cabinet(&mut self, cabinet: Option<EntityId>) {
        self.cabinet = cabinet;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Active entity at the level of `kind`.
    ///
    /// # Returns
    ///
    /// The entity a new annotation of `kind` would stand for, if one is selected.
    pub fn entity_for(&self, kind: AnnotationType) -> Option<EntityId> {
        match kind {
            AnnotationType::Room => self.room_id(),
            AnnotationType::Location => self.location_id(),
            AnnotationType::CabinetRun => self.cabinet_run_id(),
            AnnotationType::Cabinet => self.cabinet_id(),
        }
    }

    /// Deepest selected level, if any.
    pub fn deepest(&self) -> Option<AnnotationType> {
        if self.cabinet.is_some() {
            Some(AnnotationType::Cabinet)
        } else if self.cabinet_run.is_some() {
            Some(AnnotationType::CabinetRun)
        } else if self.location.is_some() {
            Some(AnnotationType::Location)
        } else if self.room.is_some() {
            Some(AnnotationType::Room)
        } else {
            None
        }
    }

    /// The draw tool enabled by this context: one level below the deepest
    /// selection, or rooms when nothing is selected.
    pub fn enabled_draw_tool(&self) -> AnnotationType {
        match self.deepest() {
            None => AnnotationType::Room,
            Some(level) => level.child().unwrap_or(AnnotationType::Cabinet),
        }
    }

    /// Selects the context implied by an annotation's entity references.
    ///
    /// # Arguments
    ///
    /// * `annotation` - The annotation whose references are walked upward
    /// * `tree` - Source of display names; may be empty
    pub fn select_annotation(&mut self, annotation: &Annotation, tree: &ProjectTree) {
        let refs = &annotation.refs;

        self.set_room(refs.room_id().map(|id| {
            ContextEntity::new(id, tree.room_name(id).map(str::to_string))
        }));
        if annotation.kind() == AnnotationType::Room {
            return;
        }

        self.set_location(refs.location_id().map(|id| {
            ContextEntity::new(id, tree.location_name(id).map(str::to_string))
        }));
        if annotation.kind() == AnnotationType::Location {
            return;
        }

        self.set_cabinet_run(refs.cabinet_run_id().map(|id| {
            ContextEntity::new(id, tree.cabinet_run_name(id).map(str::to_string))
        }));
    }

    /// Selects the context along a tree path (root first).
    ///
    /// Selecting a cabinet node also records the active cabinet.
    pub fn select_tree_path(&mut self, path: &[&TreeNode]) {
        self.clear();
        for node in path {
            let entity = ContextEntity::new(node.id, Some(node.name.clone()));
            match node.kind {
                TreeNodeKind::Room => self.set_room(Some(entity)),
                TreeNodeKind::RoomLocation => self.set_location(Some(entity)),
                TreeNodeKind::CabinetRun => self.set_cabinet_run(Some(entity)),
                TreeNodeKind::Cabinet => self.set_cabinet(Some(node.id)),
            }
        }
    }

    /// Toolbar label for the current context.
    pub fn label(&self) -> String {
        let room = self
            .room
            .as_ref()
            .map(|e| e.name.clone().unwrap_or_else(|| format!("Room {}", e.id)));
        let location = self
            .location
            .as_ref()
            .map(|e| e.name.clone().unwrap_or_else(|| format!("Location {}", e.id)));

        match (room, location) {
            (None, None) => "No context selected".to_string(),
            (Some(room), None) => room,
            (None, Some(location)) => location,
            (Some(room), Some(location)) => format!("{} → {}", room, location),
        }
    }
}
