//! Boundary to the annotation, entity and tree backends.
//!
//! Records mirror the JSON the backend speaks. Geometry crosses the boundary
//! in normalized page fractions only.

mod debounce;
mod memory;

pub use debounce::SaveDebouncer;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use planmark_core::{AnnotationId, EntityId, PageId, PersistenceError};

use crate::context::ActiveContext;
use crate::geometry::{NormalizedRect, PageDimensions};
use crate::hierarchy::EntityDefaults;
use crate::model::{color_for, Annotation, AnnotationType, EntityRefs, Orientation, ViewType};
use crate::tree::TreeNode;

/// An annotation as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: u64,
    pub annotation_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub view_type: Option<ViewType>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub room_id: Option<EntityId>,
    #[serde(default)]
    pub room_location_id: Option<EntityId>,
    #[serde(default)]
    pub cabinet_run_id: Option<EntityId>,
    #[serde(default)]
    pub cabinet_specification_id: Option<EntityId>,
    #[serde(default)]
    pub parent_annotation_id: Option<u64>,
    #[serde(default)]
    pub page_number: Option<u32>,
}

impl AnnotationRecord {
    /// Converts the record into an annotation on a page of the given size.
    ///
    /// Unknown annotation types are rejected with a decode error.
    pub fn into_annotation(
        self,
        page: PageDimensions,
        page_number: u32,
    ) -> Result<Annotation, PersistenceError> {
        let kind =
            AnnotationType::parse(&self.annotation_type).ok_or_else(|| PersistenceError::Decode {
                message: format!("unknown annotation type '{}'", self.annotation_type),
            })?;

        let mut refs = EntityRefs::empty(kind);
        refs.set_room_id(self.room_id);
        refs.set_location_id(self.room_location_id);
        refs.set_cabinet_run_id(self.cabinet_run_id);
        refs.set_cabinet_spec_id(self.cabinet_specification_id);

        let normalized = NormalizedRect::new(self.x, self.y, self.width, self.height);
        let color = self
            .color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| color_for(&self.annotation_type).to_string());

        Ok(Annotation {
            id: AnnotationId::Stable(self.id),
            parent_id: self.parent_annotation_id.map(AnnotationId::Stable),
            refs,
            page_number: self.page_number.unwrap_or(page_number),
            normalized,
            doc: normalized.to_doc(page),
            layout: Default::default(),
            view_type: self.view_type,
            orientation: self.orientation,
            label: self
                .text
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Annotation".to_string()),
            color,
            notes: self.notes,
            locked: false,
        })
    }
}

/// Fields the backend uses when it creates entities alongside a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityContext {
    pub location_type: String,
    pub run_type: String,
    pub position_in_run: u32,
    pub product_variant_id: u64,
}

impl Default for EntityContext {
    fn default() -> Self {
        Self {
            location_type: "wall".to_string(),
            run_type: "base".to_string(),
            position_in_run: 0,
            product_variant_id: 1,
        }
    }
}

/// One annotation in a bulk save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub annotation_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
    pub view_type: ViewType,
    pub orientation: Option<Orientation>,
    pub notes: Option<String>,
    pub room_id: Option<EntityId>,
    pub room_location_id: Option<EntityId>,
    pub cabinet_run_id: Option<EntityId>,
    pub cabinet_specification_id: Option<EntityId>,
    pub parent_annotation_id: Option<u64>,
    pub context: EntityContext,
}

impl AnnotationPayload {
    /// Builds the payload, filling missing entity ids from the active context.
    pub fn from_annotation(annotation: &Annotation, context: &ActiveContext) -> Self {
        let refs = &annotation.refs;
        let kind = annotation.kind();
        let location_id = match kind {
            AnnotationType::Room => None,
            _ => refs.location_id().or(context.location_id()),
        };
        let cabinet_run_id = match kind {
            AnnotationType::CabinetRun | AnnotationType::Cabinet => {
                refs.cabinet_run_id().or(context.cabinet_run_id())
            }
            _ => None,
        };

        Self {
            annotation_type: kind.as_str().to_string(),
            x: annotation.normalized.x,
            y: annotation.normalized.y,
            width: annotation.normalized.width,
            height: annotation.normalized.height,
            text: annotation.label.clone(),
            color: annotation.color.clone(),
            view_type: annotation.view_type.unwrap_or_default(),
            orientation: annotation.orientation,
            notes: annotation.notes.clone(),
            room_id: refs.room_id().or(context.room_id()),
            room_location_id: location_id,
            cabinet_run_id,
            cabinet_specification_id: refs.cabinet_spec_id(),
            parent_annotation_id: annotation.parent_id.and_then(|id| id.stable()),
            context: EntityContext::default(),
        }
    }
}

/// Result of a bulk save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub success: bool,
    pub count: usize,
}

/// An entity returned by the entity API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
}

/// Annotation storage for one project.
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    async fn load_annotations(
        &self,
        page: PageId,
    ) -> Result<Vec<AnnotationRecord>, PersistenceError>;

    async fn save_annotations(
        &self,
        page: PageId,
        annotations: Vec<AnnotationPayload>,
        create_entities: bool,
    ) -> Result<SaveSummary, PersistenceError>;

    /// Updates the geometry of one stored annotation.
    async fn patch_annotation(
        &self,
        id: u64,
        geometry: NormalizedRect,
    ) -> Result<(), PersistenceError>;

    async fn delete_annotation(&self, id: u64) -> Result<(), PersistenceError>;
}

/// Entity CRUD and the project tree.
#[async_trait]
pub trait EntityBackend: Send + Sync {
    async fn create_entity(
        &self,
        defaults: EntityDefaults,
    ) -> Result<EntityRecord, PersistenceError>;

    async fn load_tree(&self, project_id: u64) -> Result<Vec<TreeNode>, PersistenceError>;
}
