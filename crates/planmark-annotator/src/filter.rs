//! Sidebar filtering of the annotation list.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use planmark_core::EntityId;

use crate::model::{Annotation, AnnotationType, ViewType};

/// Criteria combined with AND; empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationFilter {
    pub page: Option<u32>,
    pub types: HashSet<AnnotationType>,
    pub rooms: HashSet<EntityId>,
    pub locations: HashSet<EntityId>,
    pub view_types: HashSet<ViewType>,
    pub unlinked_only: bool,
    pub page_range: Option<RangeInclusive<u32>>,
}

impl AnnotationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_type(mut self, kind: AnnotationType) -> Self {
        self.types.insert(kind);
        self
    }

    pub fn with_room(mut self, room: EntityId) -> Self {
        self.rooms.insert(room);
        self
    }

    pub fn with_location(mut self, location: EntityId) -> Self {
        self.locations.insert(location);
        self
    }

    pub fn with_view_type(mut self, view: ViewType) -> Self {
        self.view_types.insert(view);
        self
    }

    pub fn unlinked(mut self) -> Self {
        self.unlinked_only = true;
        self
    }

    pub fn pages(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_range = Some(range);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        if self.page.is_some_and(|page| annotation.page_number != page) {
            return false;
        }
        if let Some(range) = &self.page_range {
            if !range.contains(&annotation.page_number) {
                return false;
            }
        }
        if !self.types.is_empty() && !self.types.contains(&annotation.kind()) {
            return false;
        }
        if !self.rooms.is_empty()
            && !annotation
                .refs
                .room_id()
                .is_some_and(|room| self.rooms.contains(&room))
        {
            return false;
        }
        if !self.locations.is_empty()
            && !annotation
                .refs
                .location_id()
                .is_some_and(|location| self.locations.contains(&location))
        {
            return false;
        }
        if !self.view_types.is_empty() {
            let view = annotation.view_type.unwrap_or_default();
            if !self.view_types.contains(&view) {
                return false;
            }
        }
        if self.unlinked_only && annotation.refs.is_linked() {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, annotations: &'a [Annotation]) -> Vec<&'a Annotation> {
        annotations.iter().filter(|a| self.matches(a)).collect()
    }
}
