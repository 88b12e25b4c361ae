//! Annotation data model.
//!
//! An annotation's entity references are a closed enum with one variant per
//! hierarchy level, each carrying only the foreign keys that level has.

use serde::{Deserialize, Serialize};
use std::fmt;

use planmark_core::{AnnotationId, EntityId};

use crate::coordinates::CoordinateSpace;
use crate::geometry::{DocRect, LayoutRect, NormalizedRect, PageDimensions};

/// Fallback color for annotations without a type color.
pub const FALLBACK_COLOR: &str = "#6b7280";

/// Color used to flash an existing annotation when a duplicate draw is refused.
pub const HIGHLIGHT_COLOR: &str = "#ff0000";

/// Hierarchy level of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Room,
    #[serde(alias = "room_location")]
    Location,
    CabinetRun,
    Cabinet,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 4] = [
        AnnotationType::Room,
        AnnotationType::Location,
        AnnotationType::CabinetRun,
        AnnotationType::Cabinet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Room => "room",
            AnnotationType::Location => "location",
            AnnotationType::CabinetRun => "cabinet_run",
            AnnotationType::Cabinet => "cabinet",
        }
    }

    /// Depth in the hierarchy, room = 0.
    pub fn level(&self) -> u8 {
        match self {
            AnnotationType::Room => 0,
            AnnotationType::Location => 1,
            AnnotationType::CabinetRun => 2,
            AnnotationType::Cabinet => 3,
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            AnnotationType::Room => "#3b82f6",
            AnnotationType::Location => "#10b981",
            AnnotationType::CabinetRun => "#f59e0b",
            AnnotationType::Cabinet => "#8b5cf6",
        }
    }

    /// The level drawn beneath this one.
    pub fn child(&self) -> Option<AnnotationType> {
        match self {
            AnnotationType::Room => Some(AnnotationType::Location),
            AnnotationType::Location => Some(AnnotationType::CabinetRun),
            AnnotationType::CabinetRun => Some(AnnotationType::Cabinet),
            AnnotationType::Cabinet => None,
        }
    }

    /// Whether a context entity may have at most one annotation per page.
    pub fn is_singular_per_context(&self) -> bool {
        !matches!(self, AnnotationType::Cabinet)
    }

    /// Parses a type name, accepting `room_location` for locations.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "room" => Some(AnnotationType::Room),
            "location" | "room_location" => Some(AnnotationType::Location),
            "cabinet_run" => Some(AnnotationType::CabinetRun),
            "cabinet" => Some(AnnotationType::Cabinet),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color for an annotation type name, falling back to grey for unknown names.
pub fn color_for(type_name: &str) -> &'static str {
    AnnotationType::parse(type_name)
        .map(|kind| kind.default_color())
        .unwrap_or(FALLBACK_COLOR)
}

/// Entity foreign keys, one variant per hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityRefs {
    Room {
        room_id: Option<EntityId>,
    },
    Location {
        room_id: Option<EntityId>,
        room_location_id: Option<EntityId>,
    },
    CabinetRun {
        room_id: Option<EntityId>,
        location_id: Option<EntityId>,
        cabinet_run_id: Option<EntityId>,
    },
    Cabinet {
        room_id: Option<EntityId>,
        location_id: Option<EntityId>,
        cabinet_run_id: Option<EntityId>,
        cabinet_spec_id: Option<EntityId>,
    },
}

impl EntityRefs {
    /// Unlinked references for the given level.
    pub fn empty(kind: AnnotationType) -> Self {
        match kind {
            AnnotationType::Room => EntityRefs::Room { room_id: None },
            AnnotationType::Location => EntityRefs::Location {
                room_id: None,
                room_location_id: None,
            },
            AnnotationType::CabinetRun => EntityRefs::CabinetRun {
                room_id: None,
                location_id: None,
                cabinet_run_id: None,
            },
            AnnotationType::Cabinet => EntityRefs::Cabinet {
                room_id: None,
                location_id: None,
                cabinet_run_id: None,
                cabinet_spec_id: None,
            },
        }
    }

    pub fn kind(&self) -> AnnotationType {
        match self {
            EntityRefs::Room { .. } => AnnotationType::Room,
            EntityRefs::Location { .. } => AnnotationType::Location,
            EntityRefs::CabinetRun { .. } => AnnotationType::CabinetRun,
            EntityRefs::Cabinet { .. } => AnnotationType::Cabinet,
        }
    }

    pub fn room_id(&self) -> Option<EntityId> {
        match *self {
            EntityRefs::Room { room_id }
            | EntityRefs::Location { room_id, .. }
            | EntityRefs::CabinetRun { room_id, .. }
            | EntityRefs::Cabinet { room_id, .. } => room_id,
        }
    }

    /// The room location this annotation belongs to. A location annotation
    /// reports the location it represents.
    pub fn location_id(&self) -> Option<EntityId> {
        match *self {
            EntityRefs::Room { .. } => None,
            EntityRefs::Location {
                room_location_id, ..
            } => room_location_id,
            EntityRefs::CabinetRun { location_id, .. }
            | EntityRefs::Cabinet { location_id, .. } => location_id,
        }
    }

    /// The cabinet run this annotation belongs to or represents.
    pub fn cabinet_run_id(&self) -> Option<EntityId> {
        match *self {
            EntityRefs::Room { .. } | EntityRefs::Location { .. } => None,
            EntityRefs::CabinetRun { cabinet_run_id, .. }
            | EntityRefs::Cabinet { cabinet_run_id, .. } => cabinet_run_id,
        }
    }

    pub fn cabinet_spec_id(&self) -> Option<EntityId> {
        match *self {
            EntityRefs::Cabinet {
                cabinet_spec_id, ..
            } => cabinet_spec_id,
            _ => None,
        }
    }

    /// The entity this annotation itself stands for.
    pub fn own_entity(&self) -> Option<EntityId> {
        match self.kind() {
            AnnotationType::Room => self.room_id(),
            AnnotationType::Location => self.location_id(),
            AnnotationType::CabinetRun => self.cabinet_run_id(),
            AnnotationType::Cabinet => self.cabinet_spec_id(),
        }
    }

    pub fn set_room_id(&mut self, id: Option<EntityId>) {
        match self {
            EntityRefs::Room { room_id }
            | EntityRefs::Location { room_id, .. }
            | EntityRefs::CabinetRun { room_id, .. }
            | EntityRefs::Cabinet { room_id, .. } => *room_id = id,
        }
    }

    /// Sets the location reference. No-op for rooms.
    pub fn set_location_id(&mut self, id: Option<EntityId>) {
        match self {
            EntityRefs::Room { .. } => {}
            EntityRefs::Location {
                room_location_id, ..
            } => *room_location_id = id,
            EntityRefs::CabinetRun { location_id, .. }
            | EntityRefs::Cabinet { location_id, .. } => *location_id = id,
        }
    }

    /// Sets the cabinet run reference. No-op above the cabinet-run level.
    pub fn set_cabinet_run_id(&mut self, id: Option<EntityId>) {
        match self {
            EntityRefs::Room { .. } | EntityRefs::Location { .. } => {}
            EntityRefs::CabinetRun { cabinet_run_id, .. }
            | EntityRefs::Cabinet { cabinet_run_id, .. } => *cabinet_run_id = id,
        }
    }

    pub fn set_cabinet_spec_id(&mut self, id: Option<EntityId>) {
        if let EntityRefs::Cabinet {
            cabinet_spec_id, ..
        } = self
        {
            *cabinet_spec_id = id;
        }
    }

    /// Copies ancestor references from a parent annotation.
    ///
    /// Only levels strictly above this annotation's own level are touched,
    /// and only when the parent actually carries a value. Returns whether
    /// anything changed.
    pub fn inherit_from(&mut self, parent: &EntityRefs) -> bool {
        let before = *self;
        let level = self.kind().level();

        if level > 0 && parent.room_id().is_some() {
            self.set_room_id(parent.room_id());
        }
        if level > 1 && parent.location_id().is_some() {
            self.set_location_id(parent.location_id());
        }
        if level > 2 && parent.cabinet_run_id().is_some() {
            self.set_cabinet_run_id(parent.cabinet_run_id());
        }

        *self != before
    }

    /// Whether the annotation references any room, location or run.
    pub fn is_linked(&self) -> bool {
        self.room_id().is_some() || self.location_id().is_some() || self.cabinet_run_id().is_some()
    }
}

/// Drawing sheet kind a page or annotation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Plan,
    Elevation,
    Section,
    Detail,
}

impl ViewType {
    /// Whether annotations in this view are additionally keyed by orientation.
    pub fn uses_orientation(&self) -> bool {
        matches!(self, ViewType::Elevation | ViewType::Section)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewType::Plan => write!(f, "plan"),
            ViewType::Elevation => write!(f, "elevation"),
            ViewType::Section => write!(f, "section"),
            ViewType::Detail => write!(f, "detail"),
        }
    }
}

/// Wall orientation for elevation and section views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    South,
    East,
    West,
}

/// The view a user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewContext {
    pub view_type: ViewType,
    pub orientation: Option<Orientation>,
}

impl ViewContext {
    pub fn plan() -> Self {
        Self::default()
    }

    pub fn new(view_type: ViewType, orientation: Option<Orientation>) -> Self {
        Self {
            view_type,
            orientation,
        }
    }
}

/// A rectangular region on one PDF page.
///
/// `normalized` is authoritative. `doc` and `layout` are derived caches:
/// `doc` follows the last committed geometry and `layout` is recomputed from
/// `normalized` whenever zoom or layout changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub parent_id: Option<AnnotationId>,
    pub refs: EntityRefs,
    pub page_number: u32,
    pub normalized: NormalizedRect,
    pub doc: DocRect,
    pub layout: LayoutRect,
    pub view_type: Option<ViewType>,
    pub orientation: Option<Orientation>,
    pub label: String,
    pub color: String,
    pub notes: Option<String>,
    pub locked: bool,
}

impl Annotation {
    /// Creates an unlinked annotation with a temporary id.
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            id: AnnotationId::temporary(),
            parent_id: None,
            refs: EntityRefs::empty(kind),
            page_number,
            normalized: NormalizedRect::default(),
            doc: DocRect::default(),
            layout: LayoutRect::default(),
            view_type: None,
            orientation: None,
            label: "Annotation".to_string(),
            color: kind.default_color().to_string(),
            notes: None,
            locked: false,
        }
    }

    pub fn kind(&self) -> AnnotationType {
        self.refs.kind()
    }

    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }

    /// Commits document geometry and recomputes the normalized form from it.
    pub fn set_doc_geometry(&mut self, doc: DocRect, page: PageDimensions) {
        self.doc = doc;
        self.normalized = NormalizedRect::from_doc(doc, page);
    }

    /// Recomputes the layout cache from normalized geometry.
    pub fn refresh_layout(&mut self, coords: &CoordinateSpace) {
        self.layout = coords.normalized_to_layout(self.normalized);
    }

    /// Whether the layout cache has a visible area.
    pub fn has_layout(&self) -> bool {
        !self.layout.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_colors() {
        assert_eq!(AnnotationType::Room.default_color(), "#3b82f6");
        assert_eq!(AnnotationType::Location.default_color(), "#10b981");
        assert_eq!(AnnotationType::CabinetRun.default_color(), "#f59e0b");
        assert_eq!(AnnotationType::Cabinet.default_color(), "#8b5cf6");
        assert_eq!(color_for("room_location"), "#10b981");
        assert_eq!(color_for("unknown"), FALLBACK_COLOR);
    }

    #[test]
    fn test_type_serde_names() {
        let json = serde_json::to_string(&AnnotationType::CabinetRun).unwrap();
        assert_eq!(json, "\"cabinet_run\"");
        let parsed: AnnotationType = serde_json::from_str("\"room_location\"").unwrap();
        assert_eq!(parsed, AnnotationType::Location);
    }

    #[test]
    fn test_location_reports_own_entity_as_location() {
        let refs = EntityRefs::Location {
            room_id: Some(EntityId(1)),
            room_location_id: Some(EntityId(5)),
        };
        assert_eq!(refs.location_id(), Some(EntityId(5)));
        assert_eq!(refs.own_entity(), Some(EntityId(5)));
        assert_eq!(refs.cabinet_run_id(), None);
    }

    #[test]
    fn test_setters_ignore_foreign_levels() {
        let mut refs = EntityRefs::empty(AnnotationType::Room);
        refs.set_location_id(Some(EntityId(3)));
        refs.set_cabinet_run_id(Some(EntityId(4)));
        assert_eq!(refs, EntityRefs::Room { room_id: None });
    }

    #[test]
    fn test_inherit_from_location_parent() {
        let parent = EntityRefs::Location {
            room_id: Some(EntityId(10)),
            room_location_id: Some(EntityId(20)),
        };
        let mut child = EntityRefs::empty(AnnotationType::CabinetRun);
        assert!(child.inherit_from(&parent));
        assert_eq!(child.room_id(), Some(EntityId(10)));
        assert_eq!(child.location_id(), Some(EntityId(20)));
        assert_eq!(child.cabinet_run_id(), None);
        assert!(!child.inherit_from(&parent));
    }

    #[test]
    fn test_inherit_never_overwrites_own_level() {
        let parent = EntityRefs::Location {
            room_id: Some(EntityId(10)),
            room_location_id: Some(EntityId(20)),
        };
        let mut sibling = EntityRefs::Location {
            room_id: None,
            room_location_id: Some(EntityId(21)),
        };
        sibling.inherit_from(&parent);
        assert_eq!(sibling.room_id(), Some(EntityId(10)));
        assert_eq!(sibling.location_id(), Some(EntityId(21)));
    }

    #[test]
    fn test_new_annotation_defaults() {
        let annotation = Annotation::new(AnnotationType::Cabinet, 2);
        assert!(annotation.is_temporary());
        assert_eq!(annotation.label, "Annotation");
        assert_eq!(annotation.color, "#8b5cf6");
        assert!(!annotation.has_layout());
        assert!(!annotation.refs.is_linked());
    }

    #[test]
    fn test_view_type_orientation_rule() {
        assert!(ViewType::Elevation.uses_orientation());
        assert!(ViewType::Section.uses_orientation());
        assert!(!ViewType::Plan.uses_orientation());
    }
}
