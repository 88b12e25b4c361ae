//! Annotation store for the current page.
//!
//! Holds the annotation list, answers entity lookups and builds the
//! parent/child forest used by the sidebar tree.

use std::collections::{BTreeMap, HashMap, HashSet};

use planmark_core::{AnnotationId, EntityId};

use crate::context::ActiveContext;
use crate::coordinates::CoordinateSpace;
use crate::model::{Annotation, AnnotationType};

/// A node of the annotation forest.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode<'a> {
    pub annotation: &'a Annotation,
    pub children: Vec<AnnotationNode<'a>>,
}

impl AnnotationNode<'_> {
    /// Number of nodes in this subtree, including the root.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(AnnotationNode::size).sum::<usize>()
    }
}

/// Ordered annotation list with lookup helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Adds an annotation, replacing any existing record with the same id.
    pub fn add(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.id;
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(existing) => {
                tracing::warn!("Replacing annotation {} already in store", id);
                *existing = annotation;
            }
            None => self.annotations.push(annotation),
        }
        id
    }

    /// Removes an annotation. Children keep their parent pointer and become
    /// roots of the forest.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }

    /// Replaces the whole list.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Deep copy of the list for history snapshots.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    /// Finds the annotation standing for an entity.
    ///
    /// Rooms match on room id, locations on their room location id and
    /// cabinet runs on their cabinet run id. Cabinets are never matched.
    pub fn find_by_entity(&self, kind: AnnotationType, entity: EntityId) -> Option<&Annotation> {
        if kind == AnnotationType::Cabinet {
            return None;
        }
        self.annotations
            .iter()
            .find(|a| a.kind() == kind && a.refs.own_entity() == Some(entity))
    }

    /// Annotation already covering the active context's entity of `kind` on
    /// `page`, if any. Cabinets are exempt.
    pub fn find_duplicate(
        &self,
        kind: AnnotationType,
        context: &ActiveContext,
        page: u32,
    ) -> Option<&Annotation> {
        if !kind.is_singular_per_context() {
            return None;
        }
        let entity = context.entity_for(kind)?;
        self.annotations.iter().find(|a| {
            a.page_number == page && a.kind() == kind && a.refs.own_entity() == Some(entity)
        })
    }

    /// Direct children of an annotation.
    pub fn children_of(&self, id: AnnotationId) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.parent_id == Some(id))
            .collect()
    }

    /// Builds the parent/child forest.
    ///
    /// Annotations whose parent is missing from the store (including parents
    /// on other pages) become roots. Insertion order is preserved.
    pub fn forest(&self) -> Vec<AnnotationNode<'_>> {
        build_forest(self.annotations.iter().collect())
    }

    /// Forest per page number, for the sidebar's page-grouped view.
    pub fn page_groups(&self) -> BTreeMap<u32, Vec<AnnotationNode<'_>>> {
        let mut pages: BTreeMap<u32, Vec<&Annotation>> = BTreeMap::new();
        for annotation in &self.annotations {
            pages
                .entry(annotation.page_number)
                .or_default()
                .push(annotation);
        }
        pages
            .into_iter()
            .map(|(page, annotations)| (page, build_forest(annotations)))
            .collect()
    }

    /// Propagates entity references down parent chains.
    ///
    /// Runs to a fixed point bounded by the list length, so cycles in
    /// `parent_id` cannot loop forever.
    pub fn inherit_parent_refs(&mut self) -> usize {
        let mut updated = 0;
        for _ in 0..self.annotations.len() {
            let refs: HashMap<AnnotationId, _> =
                self.annotations.iter().map(|a| (a.id, a.refs)).collect();

            let mut changed = false;
            for annotation in &mut self.annotations {
                let parent = match annotation.parent_id.and_then(|id| refs.get(&id)) {
                    Some(parent) => parent,
                    None => continue,
                };
                if annotation.refs.inherit_from(parent) {
                    changed = true;
                    updated += 1;
                }
            }
            if !changed {
                break;
            }
        }
        updated
    }

    /// Next auto-label number for `kind` within a scope.
    ///
    /// Locations are counted per room; cabinet runs and cabinets per
    /// location. Rooms are counted globally.
    pub fn next_label_number(&self, kind: AnnotationType, scope: Option<EntityId>) -> usize {
        let count = self
            .annotations
            .iter()
            .filter(|a| a.kind() == kind)
            .filter(|a| match kind {
                AnnotationType::Room => true,
                AnnotationType::Location => a.refs.room_id() == scope,
                AnnotationType::CabinetRun | AnnotationType::Cabinet => {
                    a.refs.location_id() == scope
                }
            })
            .count();
        count + 1
    }

    /// Recomputes every layout cache from normalized geometry.
    pub fn refresh_layout(&mut self, coords: &CoordinateSpace) {
        for annotation in &mut self.annotations {
            annotation.refresh_layout(coords);
        }
    }
}

fn build_forest(annotations: Vec<&Annotation>) -> Vec<AnnotationNode<'_>> {
    let present: HashSet<AnnotationId> = annotations.iter().map(|a| a.id).collect();
    let mut children: HashMap<AnnotationId, Vec<&Annotation>> = HashMap::new();
    let mut roots = Vec::new();

    for annotation in &annotations {
        match annotation.parent_id {
            Some(parent) if parent != annotation.id && present.contains(&parent) => {
                children.entry(parent).or_default().push(*annotation);
            }
            _ => roots.push(*annotation),
        }
    }

    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| attach(root, &children, &mut visited))
        .collect()
}

fn attach<'a>(
    annotation: &'a Annotation,
    children: &HashMap<AnnotationId, Vec<&'a Annotation>>,
    visited: &mut HashSet<AnnotationId>,
) -> Option<AnnotationNode<'a>> {
    if !visited.insert(annotation.id) {
        return None;
    }
    let nodes = children
        .get(&annotation.id)
        .map(|list| {
            list.iter()
                .filter_map(|child| attach(*child, children, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(AnnotationNode {
        annotation,
        children: nodes,
    })
}
