//! Error handling for Planmark
//!
//! Errors fall into four families:
//! - Geometry errors (page dimensions or rendering surface unavailable)
//! - Persistence errors (backend request failures)
//! - Concurrency conflicts (mutation attempted while the lockout is held)
//! - Validation errors (gestures or draws that cannot be committed)
//!
//! Local computations never surface geometry errors to callers; they degrade
//! to zeroed results. The typed variants exist for the fallible `try_*` paths
//! and for diagnostics.

use thiserror::Error;

use crate::ids::AnnotationId;

/// Geometry error type
///
/// Raised when a coordinate conversion has nothing to convert against.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// No page has been loaded, or its natural size is not positive
    #[error("Page dimensions are not available")]
    MissingPageDimensions,

    /// No rendering surface is attached, or it has no layout box yet
    #[error("Rendering surface is not available")]
    MissingSurface,

    /// A rectangle with a non-positive side was supplied
    #[error("Degenerate rectangle {width}x{height}")]
    DegenerateRect {
        /// The rectangle width.
        width: f64,
        /// The rectangle height.
        height: f64,
    },
}

/// Persistence error type
///
/// Represents failures talking to the annotation, entity or tree backends.
/// Local state is always retained when one of these occurs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The request could not be completed
    #[error("{operation} failed: {message}")]
    Request {
        /// The backend operation that was attempted.
        operation: String,
        /// A message describing the failure.
        message: String,
    },

    /// The backend answered with a rejection
    #[error("{operation} rejected with status {status}")]
    Rejected {
        /// The backend operation that was attempted.
        operation: String,
        /// The status code returned by the backend.
        status: u16,
    },

    /// The backend response could not be decoded
    #[error("Malformed response: {message}")]
    Decode {
        /// A message describing the decode failure.
        message: String,
    },

    /// The referenced record does not exist on the backend
    #[error("Record {id} not found")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },
}

impl PersistenceError {
    /// Create a request failure for the named operation
    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Concurrency conflict
///
/// A mutation was attempted while the cooperative lockout was held. These
/// are deferred or retried by callers and never shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConcurrencyConflict {
    /// The lockout is held for the listed reasons
    #[error("{operation} deferred: lockout held ({reasons})")]
    LockoutHeld {
        /// The operation that was refused.
        operation: String,
        /// Comma separated hold reasons.
        reasons: String,
    },
}

/// Validation error type
///
/// Gestures and draw requests that cannot be committed. Sub-threshold
/// gestures are cancelled silently; the others are reported to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A drawn rectangle is smaller than the minimum size
    #[error("Drawn region {width:.1}x{height:.1} is below the {minimum}px minimum")]
    BelowMinimumSize {
        /// The drawn width in layout pixels.
        width: f64,
        /// The drawn height in layout pixels.
        height: f64,
        /// The configured minimum side length.
        minimum: f64,
    },

    /// A resize or move changed the geometry by less than the minimum delta
    #[error("Change of {delta:.1}px is below the {minimum}px minimum")]
    BelowMinimumDelta {
        /// The largest absolute change observed.
        delta: f64,
        /// The configured minimum delta.
        minimum: f64,
    },

    /// The active context entity already has an annotation on this page
    #[error("{kind} already annotated on this page by {existing}")]
    DuplicateEntity {
        /// The annotation type being drawn.
        kind: String,
        /// The annotation that already covers the entity.
        existing: AnnotationId,
    },

    /// The active context is not deep enough for the requested draw mode
    #[error("Select a {required} before drawing")]
    MissingContext {
        /// The context level that must be selected first.
        required: String,
    },

    /// No annotation with the given id exists
    #[error("Unknown annotation {id}")]
    UnknownAnnotation {
        /// The id that was looked up.
        id: AnnotationId,
    },

    /// The annotation is locked against edits
    #[error("Annotation {id} is locked")]
    AnnotationLocked {
        /// The locked annotation.
        id: AnnotationId,
    },

    /// A pointer gesture was requested while another one is active
    #[error("A {active} gesture is already in progress")]
    GestureInProgress {
        /// The name of the active gesture.
        active: String,
    },
}

/// Main error type for Planmark
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Concurrency conflict
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyConflict),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a persistence error
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }

    /// Check if this mutation was refused because the lockout is held
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Error::Concurrency(_))
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Whether the error should be shown to the user.
    ///
    /// Concurrency conflicts and sub-threshold gestures are silent.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Error::Concurrency(_) => false,
            Error::Validation(ValidationError::BelowMinimumSize { .. })
            | Error::Validation(ValidationError::BelowMinimumDelta { .. }) => false,
            _ => true,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
