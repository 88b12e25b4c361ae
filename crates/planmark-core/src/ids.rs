//! Identifiers for annotations, backend entities and PDF pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an annotation record.
///
/// Freshly drawn annotations carry a temporary id until the first successful
/// save; annotations loaded from the backend carry its stable numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationId {
    /// Client-side id assigned on draw-commit.
    Temporary(Uuid),
    /// Backend id assigned by persistence.
    Stable(u64),
}

impl AnnotationId {
    /// Allocate a new temporary id.
    pub fn temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    /// Whether this id has not been persisted yet.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The backend id, if persisted.
    pub fn stable(&self) -> Option<u64> {
        match self {
            Self::Stable(id) => Some(*id),
            Self::Temporary(_) => None,
        }
    }
}

impl From<u64> for AnnotationId {
    fn from(id: u64) -> Self {
        Self::Stable(id)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(uuid) => write!(f, "temp_{}", &uuid.simple().to_string()[..8]),
            Self::Stable(id) => write!(f, "{}", id),
        }
    }
}

/// Identifier of a backend business entity (room, location, cabinet run,
/// cabinet specification). Entities are shared across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored PDF page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}
