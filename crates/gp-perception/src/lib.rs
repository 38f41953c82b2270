//! `gp-perception`: what an observer can see, and where a moving observer
//! goes.
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`observer`]   | `Observer`: validated location, heading, FOV, range        |
//! | [`visibility`] | `ViewCone`: range + angle tests for points and segments    |
//! | [`matching`]   | `RoadMatch`, nearest-road projection                       |
//! | [`trajectory`] | Turn, junction, and road-change events                     |
//! | [`engine`]     | `PerceptionEngine`, `PerceptionResult`                     |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Per-point trajectory matching runs on Rayon's thread pool.  |

pub mod engine;
pub mod matching;
pub mod observer;
pub mod trajectory;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use engine::{PerceptionEngine, PerceptionResult};
pub use matching::RoadMatch;
pub use observer::Observer;
pub use trajectory::{JunctionCrossing, RoadChange, TrajectoryAnalysis, TurnDirection, TurnEvent};
pub use visibility::ViewCone;
