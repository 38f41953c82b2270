//! Error taxonomy shared by every `gp-*` crate.
//!
//! Sub-crates return [`GeoResult`] directly rather than wrapping this enum,
//! so a caller matching on a failure sees the same variants whether it came
//! from graph construction, routing, perception, or persistence.

use thiserror::Error;

/// What kind of entity a [`GeoError::Conflict`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Edge,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
        })
    }
}

/// The top-level error type for all `gp-*` crates.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Malformed coordinate, observer, entity, or configuration parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Insertion of an id that is already present.
    #[error("{kind} {id:?} already exists")]
    Conflict { kind: EntityKind, id: String },

    #[error("node {0:?} not found")]
    NodeNotFound(String),

    #[error("edge {0:?} not found")]
    EdgeNotFound(String),

    #[error("no path from {from:?} to {to:?}")]
    NoPath { from: String, to: String },

    /// Malformed persisted data (GeoJSON, CSV, JSON configuration).
    #[error("format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GeoError::Validation(msg.into())
    }
}

/// Shorthand result type for all `gp-*` crates.
pub type GeoResult<T> = Result<T, GeoError>;
