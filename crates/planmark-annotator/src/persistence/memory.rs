//! In-process backend used by the binary and by tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use planmark_core::{EntityId, PageId, PersistenceError};

use super::{
    AnnotationBackend, AnnotationPayload, AnnotationRecord, EntityBackend, EntityRecord,
    SaveSummary,
};
use crate::geometry::NormalizedRect;
use crate::hierarchy::EntityDefaults;
use crate::tree::TreeNode;

#[derive(Debug, Default)]
struct State {
    pages: HashMap<PageId, Vec<AnnotationRecord>>,
    tree: Vec<TreeNode>,
    entities: Vec<EntityDefaults>,
    patches: Vec<(u64, NormalizedRect)>,
    deletes: Vec<u64>,
    next_id: u64,
    fail_next: Option<Failure>,
}

#[derive(Debug)]
enum Failure {
    Request(String),
    Rejected(u16),
}

/// Thread-safe in-memory annotation, entity and tree store.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Seeds a page with stored records.
    pub fn with_page(self, page: PageId, records: Vec<AnnotationRecord>) -> Self {
        {
            let mut state = self.state.lock();
            let highest = records.iter().map(|r| r.id).max().unwrap_or(0);
            state.next_id = state.next_id.max(highest + 1);
            state.pages.insert(page, records);
        }
        self
    }

    pub fn with_tree(self, tree: Vec<TreeNode>) -> Self {
        self.state.lock().tree = tree;
        self
    }

    /// Replaces the tree served by later `load_tree` calls.
    pub fn set_tree(&self, tree: Vec<TreeNode>) {
        self.state.lock().tree = tree;
    }

    /// Makes the next backend call fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(Failure::Request(message.into()));
    }

    /// Makes the next backend call answer with a rejection `status`.
    pub fn reject_next(&self, status: u16) {
        self.state.lock().fail_next = Some(Failure::Rejected(status));
    }

    pub fn records(&self, page: PageId) -> Vec<AnnotationRecord> {
        self.state.lock().pages.get(&page).cloned().unwrap_or_default()
    }

    pub fn patches(&self) -> Vec<(u64, NormalizedRect)> {
        self.state.lock().patches.clone()
    }

    pub fn deletes(&self) -> Vec<u64> {
        self.state.lock().deletes.clone()
    }

    pub fn created_entities(&self) -> Vec<EntityDefaults> {
        self.state.lock().entities.clone()
    }

    fn take_failure(state: &mut State, operation: &str) -> Result<(), PersistenceError> {
        match state.fail_next.take() {
            Some(Failure::Request(message)) => Err(PersistenceError::request(operation, message)),
            Some(Failure::Rejected(status)) => Err(PersistenceError::Rejected {
                operation: operation.to_string(),
                status,
            }),
            None => Ok(()),
        }
    }

    fn allocate(state: &mut State) -> u64 {
        let id = state.next_id;
        state.next_id += 1;
        id
    }
}

#[async_trait]
impl AnnotationBackend for MemoryBackend {
    async fn load_annotations(
        &self,
        page: PageId,
    ) -> Result<Vec<AnnotationRecord>, PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "load annotations")?;
        Ok(state.pages.get(&page).cloned().unwrap_or_default())
    }

    async fn save_annotations(
        &self,
        page: PageId,
        annotations: Vec<AnnotationPayload>,
        _create_entities: bool,
    ) -> Result<SaveSummary, PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "save annotations")?;

        let count = annotations.len();
        for payload in annotations {
            let id = Self::allocate(&mut state);
            let record = AnnotationRecord {
                id,
                annotation_type: payload.annotation_type,
                x: payload.x,
                y: payload.y,
                width: payload.width,
                height: payload.height,
                text: Some(payload.text),
                color: Some(payload.color),
                view_type: Some(payload.view_type),
                orientation: payload.orientation,
                notes: payload.notes,
                room_id: payload.room_id,
                room_location_id: payload.room_location_id,
                cabinet_run_id: payload.cabinet_run_id,
                cabinet_specification_id: payload.cabinet_specification_id,
                parent_annotation_id: payload.parent_annotation_id,
                page_number: None,
            };
            state.pages.entry(page).or_default().push(record);
        }
        Ok(SaveSummary {
            success: true,
            count,
        })
    }

    async fn patch_annotation(
        &self,
        id: u64,
        geometry: NormalizedRect,
    ) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "patch annotation")?;

        let record = state
            .pages
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == id)
            .ok_or_else(|| PersistenceError::NotFound { id: id.to_string() })?;
        record.x = geometry.x;
        record.y = geometry.y;
        record.width = geometry.width;
        record.height = geometry.height;
        state.patches.push((id, geometry));
        Ok(())
    }

    async fn delete_annotation(&self, id: u64) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "delete annotation")?;

        let mut found = false;
        for records in state.pages.values_mut() {
            let before = records.len();
            records.retain(|r| r.id != id);
            found |= records.len() != before;
        }
        if !found {
            return Err(PersistenceError::NotFound { id: id.to_string() });
        }
        state.deletes.push(id);
        Ok(())
    }
}

#[async_trait]
impl EntityBackend for MemoryBackend {
    async fn create_entity(
        &self,
        defaults: EntityDefaults,
    ) -> Result<EntityRecord, PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "create entity")?;

        let id = EntityId(Self::allocate(&mut state));
        let name = defaults.name().to_string();
        state.entities.push(defaults);
        Ok(EntityRecord { id, name })
    }

    async fn load_tree(&self, _project_id: u64) -> Result<Vec<TreeNode>, PersistenceError> {
        let mut state = self.state.lock();
        Self::take_failure(&mut state, "load tree")?;
        Ok(state.tree.clone())
    }
}
