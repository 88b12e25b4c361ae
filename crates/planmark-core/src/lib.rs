//! # Planmark Core
//!
//! Identifiers, the error taxonomy and the application event bus shared by
//! every Planmark crate.

pub mod error;
pub mod event_bus;
pub mod ids;

pub use error::{
    ConcurrencyConflict, Error, GeometryError, PersistenceError, Result, ValidationError,
};

pub use event_bus::{
    AnnotationEvent, AppEvent, EventBus, EventBusConfig, EventBusError, EventCategory,
    EventFilter, IsolationEvent, PersistenceEvent, StatusEvent, StatusLevel, SubscriptionId,
};

pub use ids::{AnnotationId, EntityId, PageId};
