//! Debounced geometry saves.
//!
//! A burst of committed gestures produces one write per touched annotation,
//! carrying its latest geometry, once the timer has been quiet for the full
//! delay. Starting a new gesture pauses the timer.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::geometry::NormalizedRect;

#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    pending: BTreeMap<u64, NormalizedRect>,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queues `geometry` for `id` and restarts the timer.
    ///
    /// A later schedule for the same id replaces the queued geometry.
    pub fn schedule(&mut self, id: u64, geometry: NormalizedRect) {
        self.pending.insert(id, geometry);
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Stops the timer without dropping queued work.
    pub fn pause(&mut self) {
        self.deadline = None;
    }

    /// Restarts the timer if work is queued. Returns whether it was armed.
    pub fn rearm(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.deadline = Some(Instant::now() + self.delay);
        true
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> &BTreeMap<u64, NormalizedRect> {
        &self.pending
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Takes the queued batch if the timer has fired.
    pub fn take_due(&mut self, now: Instant) -> Option<BTreeMap<u64, NormalizedRect>> {
        if !self.is_due(now) {
            return None;
        }
        self.deadline = None;
        Some(std::mem::take(&mut self.pending))
    }

    /// Takes the queued batch regardless of the timer.
    pub fn take_all(&mut self) -> BTreeMap<u64, NormalizedRect> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }

    /// Drops queued work for an annotation, e.g. after it was deleted.
    pub fn forget(&mut self, id: u64) {
        self.pending.remove(&id);
        if self.pending.is_empty() {
            self.deadline = None;
        }
    }
}
