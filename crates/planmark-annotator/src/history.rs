//! Snapshot-based linear undo/redo over the annotation list.
//!
//! One stack covers every page the session has touched.

use chrono::{DateTime, Utc};

use crate::model::Annotation;
use crate::store::AnnotationStore;

/// A deep copy of the annotation list at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub annotations: Vec<Annotation>,
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept; the oldest is dropped first.
    pub max_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_size: 50 }
    }
}

/// Summary of the stack for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryInfo {
    pub position: Option<usize>,
    pub len: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub current_label: Option<String>,
}

/// Linear history of annotation-list snapshots.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    stack: Vec<HistorySnapshot>,
    index: Option<usize>,
    max_size: usize,
    replaying: bool,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    pub fn new(config: HistoryConfig) -> Self {
        let max_size = config.max_size.max(1);
        Self {
            stack: Vec::with_capacity(max_size),
            index: None,
            max_size,
            replaying: false,
        }
    }

    /// Records a snapshot of `annotations`.
    ///
    /// Discards anything beyond the current index first. Returns `false`
    /// without recording while a snapshot is being replayed.
    pub fn push(&mut self, annotations: &[Annotation], label: impl Into<String>) -> bool {
        if self.replaying {
            return false;
        }

        let keep = self.index.map_or(0, |i| i + 1);
        self.stack.truncate(keep);

        self.stack.push(HistorySnapshot {
            annotations: annotations.to_vec(),
            timestamp: Utc::now(),
            label: label.into(),
        });

        while self.stack.len() > self.max_size {
            self.stack.remove(0);
        }
        let index = self.stack.len() - 1;
        self.index = Some(index);

        if let Some(snapshot) = self.stack.last() {
            tracing::debug!(
                "History: {} ({}/{})",
                snapshot.label,
                index + 1,
                self.stack.len()
            );
        }
        true
    }

    /// Steps back one snapshot and loads it into `store`.
    ///
    /// Returns the label of the snapshot that was undone.
    pub fn undo(&mut self, store: &mut AnnotationStore) -> Option<String> {
        let index = match self.index {
            Some(index) if index > 0 => index,
            _ => {
                tracing::debug!("Nothing to undo");
                return None;
            }
        };
        let undone = self.stack[index].label.clone();
        self.index = Some(index - 1);
        self.replay(index - 1, store);
        tracing::info!("Undo: {}", undone);
        Some(undone)
    }

    /// Steps forward one snapshot and loads it into `store`.
    pub fn redo(&mut self, store: &mut AnnotationStore) -> Option<String> {
        let next = match self.index {
            Some(index) if index + 1 < self.stack.len() => index + 1,
            _ => {
                tracing::debug!("Nothing to redo");
                return None;
            }
        };
        self.index = Some(next);
        self.replay(next, store);
        let label = self.stack[next].label.clone();
        tracing::info!("Redo: {}", label);
        Some(label)
    }

    fn replay(&mut self, index: usize, store: &mut AnnotationStore) {
        let annotations = self.stack[index].annotations.clone();
        self.begin_replay();
        store.replace_all(annotations);
        self.end_replay();
    }

    /// Marks the start of an externally driven replay; pushes are ignored
    /// until `end_replay`.
    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(index) if index + 1 < self.stack.len())
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.stack
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.index.and_then(|index| self.stack.get(index))
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.index = None;
    }

    /// Replaces the whole stack with a single baseline snapshot.
    ///
    /// Used once the list has been persisted, so undo cannot bring back
    /// temporary annotations the backend already holds.
    pub fn rebase(&mut self, annotations: &[Annotation], label: impl Into<String>) {
        self.clear();
        self.push(annotations, label);
    }

    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            position: self.index,
            len: self.stack.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            current_label: self.current().map(|s| s.label.clone()),
        }
    }
}
