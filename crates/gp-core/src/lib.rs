//! `gp-core`: foundational types for the `geoperceive` road-network toolkit.
//!
//! This crate is a dependency of every other `gp-*` crate.  It has no `gp-*`
//! dependencies and minimal external ones (only `thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`geo`]    | `Coordinate`, haversine/bearing/destination, `LocalFrame`  |
//! | [`entity`] | `Poi`, `Road`                                              |
//! | [`ids`]    | `NodeIdx`, `EdgeIdx` arena slots                           |
//! | [`config`] | `SpeedTable`, `RoutingConfig`, `PerceptionConfig`, `EngineConfig` |
//! | [`error`]  | `GeoError`, `GeoResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the configuration records. |

pub mod config;
pub mod entity;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EngineConfig, PerceptionConfig, RoutingConfig, SpeedTable};
pub use entity::{Poi, Road};
pub use error::{EntityKind, GeoError, GeoResult};
pub use geo::{angle_diff_deg, normalize_bearing, signed_turn_deg, Coordinate, LocalFrame};
pub use ids::{EdgeIdx, NodeIdx};
