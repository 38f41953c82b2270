//! `gp-spatial`: location graph, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`graph`]  | `LocationGraph` (arenas + adjacency + R-tree), `Adjacency` |
//! | [`router`] | `PathFinder`, `PathResult`                                 |
//!
//! Errors are [`gp_core::GeoError`].

pub mod graph;
pub mod router;


pub use graph::{Adjacency, LocationGraph};
pub use router::{PathFinder, PathResult};
