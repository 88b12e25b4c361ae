//! Missing-ancestor detection for the room → location → run → cabinet chain.

use serde::{Deserialize, Serialize};
use std::fmt;

use planmark_core::EntityId;

use crate::context::ActiveContext;
use crate::model::{AnnotationType, ViewContext, ViewType};

/// Backend entity kinds, ordered by hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Room,
    RoomLocation,
    CabinetRun,
    Cabinet,
}

impl EntityKind {
    pub fn level(&self) -> u8 {
        match self {
            EntityKind::Room => 0,
            EntityKind::RoomLocation => 1,
            EntityKind::CabinetRun => 2,
            EntityKind::Cabinet => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Room => "Room",
            EntityKind::RoomLocation => "Room Location",
            EntityKind::CabinetRun => "Cabinet Run",
            EntityKind::Cabinet => "Cabinet",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Room => "room",
            EntityKind::RoomLocation => "room_location",
            EntityKind::CabinetRun => "cabinet_run",
            EntityKind::Cabinet => "cabinet",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<AnnotationType> for EntityKind {
    fn from(kind: AnnotationType) -> Self {
        match kind {
            AnnotationType::Room => EntityKind::Room,
            AnnotationType::Location => EntityKind::RoomLocation,
            AnnotationType::CabinetRun => EntityKind::CabinetRun,
            AnnotationType::Cabinet => EntityKind::Cabinet,
        }
    }
}

/// An ancestor that has to exist before an annotation can be saved directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAncestor {
    pub kind: EntityKind,
    pub level: u8,
    pub required: bool,
}

impl MissingAncestor {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            level: kind.level(),
            required: true,
        }
    }
}

/// Field values used to auto-create an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityDefaults {
    Room {
        project_id: u64,
        name: String,
        room_type: String,
        floor_number: u32,
    },
    RoomLocation {
        name: String,
        location_type: String,
        room_id: Option<EntityId>,
    },
    CabinetRun {
        name: String,
        run_type: String,
        room_id: Option<EntityId>,
        room_location_id: Option<EntityId>,
        position_in_location: u32,
    },
    Cabinet {
        name: String,
        room_id: Option<EntityId>,
        cabinet_run_id: Option<EntityId>,
        product_variant_id: u64,
        position_in_run: u32,
        length_inches: f64,
        depth_inches: f64,
        height_inches: f64,
        quantity: u32,
    },
}

impl EntityDefaults {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDefaults::Room { .. } => EntityKind::Room,
            EntityDefaults::RoomLocation { .. } => EntityKind::RoomLocation,
            EntityDefaults::CabinetRun { .. } => EntityKind::CabinetRun,
            EntityDefaults::Cabinet { .. } => EntityKind::Cabinet,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EntityDefaults::Room { name, .. }
            | EntityDefaults::RoomLocation { name, .. }
            | EntityDefaults::CabinetRun { name, .. }
            | EntityDefaults::Cabinet { name, .. } => name,
        }
    }
}

/// Works out which ancestors are missing for a draw and how to create them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyDetector {
    project_id: u64,
}

impl HierarchyDetector {
    pub fn new(project_id: u64) -> Self {
        Self { project_id }
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    /// Ancestors of `kind` absent from the active context, outermost first.
    ///
    /// Each level is checked on its own, so an active location without an
    /// active room still reports the room as missing.
    pub fn missing_ancestors(
        &self,
        kind: AnnotationType,
        context: &ActiveContext,
    ) -> Vec<MissingAncestor> {
        let mut missing = Vec::new();
        let level = kind.level();

        if level >= 1 && context.room_id().is_none() {
            missing.push(MissingAncestor::new(EntityKind::Room));
        }
        if level >= 2 && context.location_id().is_none() {
            missing.push(MissingAncestor::new(EntityKind::RoomLocation));
        }
        if level >= 3 && context.cabinet_run_id().is_none() {
            missing.push(MissingAncestor::new(EntityKind::CabinetRun));
        }
        missing
    }

    pub fn can_save_directly(&self, kind: AnnotationType, context: &ActiveContext) -> bool {
        self.missing_ancestors(kind, context).is_empty()
    }

    /// Default fields for creating an entity of `kind`.
    ///
    /// `label` is the drawn annotation's label; parent ids come from the
    /// active context.
    pub fn entity_defaults(
        &self,
        kind: EntityKind,
        label: Option<&str>,
        context: &ActiveContext,
        view: ViewContext,
    ) -> EntityDefaults {
        let label = label.filter(|l| !l.trim().is_empty());
        match kind {
            EntityKind::Room => EntityDefaults::Room {
                project_id: self.project_id,
                name: label.unwrap_or("Untitled").to_string(),
                room_type: "general".to_string(),
                floor_number: 1,
            },
            EntityKind::RoomLocation => EntityDefaults::RoomLocation {
                name: label.unwrap_or("Location").to_string(),
                location_type: "wall".to_string(),
                room_id: context.room_id(),
            },
            EntityKind::CabinetRun => {
                let wall = view.view_type == ViewType::Elevation;
                EntityDefaults::CabinetRun {
                    name: label
                        .unwrap_or(if wall { "Wall Cabinet" } else { "Base Cabinet" })
                        .to_string(),
                    run_type: if wall { "wall" } else { "base" }.to_string(),
                    room_id: context.room_id(),
                    room_location_id: context.location_id(),
                    position_in_location: 0,
                }
            }
            EntityKind::Cabinet => EntityDefaults::Cabinet {
                name: label.unwrap_or("Cabinet").to_string(),
                room_id: context.room_id(),
                cabinet_run_id: context.cabinet_run_id(),
                product_variant_id: 1,
                position_in_run: 0,
                length_inches: 24.0,
                depth_inches: 24.0,
                height_inches: 30.0,
                quantity: 1,
            },
        }
    }
}
