//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so hosts can log or forward them.

use serde::{Deserialize, Serialize};

use crate::ids::{AnnotationId, PageId};

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Annotation drawing, editing and context changes
    Annotation(AnnotationEvent),
    /// Isolation mode transitions
    Isolation(IsolationEvent),
    /// Backend load and save activity
    Persistence(PersistenceEvent),
    /// Messages meant for a status bar or toast
    Status(StatusEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Annotation(_) => EventCategory::Annotation,
            AppEvent::Isolation(_) => EventCategory::Isolation,
            AppEvent::Persistence(_) => EventCategory::Persistence,
            AppEvent::Status(_) => EventCategory::Status,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Annotation(e) => e.description(),
            AppEvent::Isolation(e) => e.description(),
            AppEvent::Persistence(e) => e.description(),
            AppEvent::Status(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Annotation events.
    Annotation,
    /// Isolation mode events.
    Isolation,
    /// Persistence events.
    Persistence,
    /// Status messages.
    Status,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Annotation => write!(f, "Annotation"),
            EventCategory::Isolation => write!(f, "Isolation"),
            EventCategory::Persistence => write!(f, "Persistence"),
            EventCategory::Status => write!(f, "Status"),
        }
    }
}

/// Annotation-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnnotationEvent {
    /// A new annotation was drawn and handed to the edit surface.
    Drawn {
        /// Temporary id of the new annotation.
        id: AnnotationId,
        /// Annotation type name.
        kind: String,
    },
    /// A resize or move was committed.
    GestureCommitted {
        /// The adjusted annotation.
        id: AnnotationId,
        /// Gesture name (`resize` or `move`).
        gesture: String,
    },
    /// A gesture fell below its threshold and was reverted.
    GestureCancelled {
        /// The annotation involved, if any.
        id: Option<AnnotationId>,
        /// Gesture name (`draw`, `resize` or `move`).
        gesture: String,
    },
    /// An annotation was removed.
    Deleted {
        /// The removed annotation.
        id: AnnotationId,
    },
    /// An existing annotation is flashed instead of drawing a duplicate.
    DuplicateHighlighted {
        /// The annotation being highlighted.
        id: AnnotationId,
        /// Highlight color.
        color: String,
        /// How long the highlight lasts.
        duration_ms: u64,
    },
    /// The active context changed.
    ContextChanged {
        /// Human readable context label.
        label: String,
        /// Annotation type of the draw tool the context enables.
        draw_tool: String,
    },
    /// A context change was refused while the lockout was held.
    ContextRefused {
        /// The refused operation.
        operation: String,
    },
}

impl AnnotationEvent {
    fn description(&self) -> String {
        match self {
            AnnotationEvent::Drawn { id, kind } => format!("Drawn {} {}", kind, id),
            AnnotationEvent::GestureCommitted { id, gesture } => {
                format!("Committed {} of {}", gesture, id)
            }
            AnnotationEvent::GestureCancelled { id, gesture } => match id {
                Some(id) => format!("Cancelled {} of {}", gesture, id),
                None => format!("Cancelled {}", gesture),
            },
            AnnotationEvent::Deleted { id } => format!("Deleted {}", id),
            AnnotationEvent::DuplicateHighlighted { id, .. } => format!("Highlighted {}", id),
            AnnotationEvent::ContextChanged { label, .. } => format!("Context: {}", label),
            AnnotationEvent::ContextRefused { operation } => {
                format!("Context change refused: {}", operation)
            }
        }
    }
}

/// Isolation mode events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IsolationEvent {
    /// Isolation mode was entered.
    Entered {
        /// Isolation level name.
        level: String,
        /// The focused annotation.
        focus: AnnotationId,
    },
    /// Isolation mode was exited.
    Exited,
    /// The cutout mask was rebuilt.
    MaskRebuilt {
        /// Number of cutouts in the mask.
        cutouts: usize,
    },
}

impl IsolationEvent {
    fn description(&self) -> String {
        match self {
            IsolationEvent::Entered { level, focus } => {
                format!("Isolated {} {}", level, focus)
            }
            IsolationEvent::Exited => "Isolation exited".to_string(),
            IsolationEvent::MaskRebuilt { cutouts } => format!("Mask: {} cutouts", cutouts),
        }
    }
}

/// Persistence events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PersistenceEvent {
    /// Annotations were loaded for a page.
    Loaded {
        /// The page that was loaded.
        page: PageId,
        /// Number of annotations loaded.
        count: usize,
    },
    /// A save was started.
    SaveStarted {
        /// Number of records being written.
        count: usize,
    },
    /// A save finished successfully.
    SaveSucceeded {
        /// Number of records written.
        count: usize,
    },
    /// A save or load failed. Local state was kept.
    SaveFailed {
        /// The backend operation.
        operation: String,
        /// Failure message.
        message: String,
    },
}

impl PersistenceEvent {
    fn description(&self) -> String {
        match self {
            PersistenceEvent::Loaded { page, count } => {
                format!("Loaded {} annotations for {}", count, page)
            }
            PersistenceEvent::SaveStarted { count } => format!("Saving {} records", count),
            PersistenceEvent::SaveSucceeded { count } => format!("Saved {} records", count),
            PersistenceEvent::SaveFailed { operation, message } => {
                format!("{} failed: {}", operation, message)
            }
        }
    }
}

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    /// Informational.
    Info,
    /// Something was skipped or deferred.
    Warning,
    /// An operation failed; a retry is available.
    Error,
}

/// Status bar messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatusEvent {
    /// A message to show to the user.
    Message {
        /// Message severity.
        level: StatusLevel,
        /// Message text.
        text: String,
    },
}

impl StatusEvent {
    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            StatusEvent::Message { level, text } => format!("[{:?}] {}", level, text),
        }
    }
}
