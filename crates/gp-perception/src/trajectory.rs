//! Trajectory analysis: per-point matches plus turn, junction, and road-change
//! events.
//!
//! Events come from one forward scan over the matched points.  The three
//! event lists are independent; a single index may appear in several.

use std::fmt;

use gp_core::{angle_diff_deg, signed_turn_deg, Coordinate, PerceptionConfig, Poi};
use gp_spatial::LocationGraph;

use crate::matching::RoadMatch;

/// Consecutive points closer than this define no bearing.
const COINCIDENT_M: f64 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TurnDirection::Left => "left",
            TurnDirection::Right => "right",
        })
    }
}

/// A change of heading larger than the configured threshold at `index`.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnEvent {
    pub index:       usize,
    pub location:    Coordinate,
    /// Unsigned turn magnitude in degrees, `(threshold, 180]`.
    pub turn_deg:    f64,
    pub direction:   TurnDirection,
    pub bearing_in:  f64,
    pub bearing_out: f64,
}

/// The point at `index` passed close to a branching node.
#[derive(Clone, Debug)]
pub struct JunctionCrossing<'g> {
    pub index:      usize,
    pub location:   Coordinate,
    pub node:       &'g Poi,
    pub distance_m: f64,
}

/// The matched road differs from the previous point's.  `None` means the
/// point matched no road.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadChange<'g> {
    pub index:     usize,
    pub location:  Coordinate,
    pub from_road: Option<&'g str>,
    pub to_road:   Option<&'g str>,
}

/// Result of [`PerceptionEngine::analyze_trajectory`](crate::PerceptionEngine::analyze_trajectory).
#[derive(Clone, Debug)]
pub struct TrajectoryAnalysis<'g> {
    pub points:             Vec<Coordinate>,
    /// Element `i` is the match for `points[i]`.
    pub matched_trajectory: Vec<Option<RoadMatch<'g>>>,
    pub turn_events:        Vec<TurnEvent>,
    pub junction_crossings: Vec<JunctionCrossing<'g>>,
    pub road_changes:       Vec<RoadChange<'g>>,
}

impl<'g> TrajectoryAnalysis<'g> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Matched road id per point.
    pub fn road_ids(&self) -> impl Iterator<Item = Option<&'g str>> + '_ {
        self.matched_trajectory.iter().map(|m| m.as_ref().map(|m| m.road.id()))
    }
}

pub(crate) fn scan<'g>(
    graph: &'g LocationGraph,
    config: &PerceptionConfig,
    points: &[Coordinate],
    matched_trajectory: Vec<Option<RoadMatch<'g>>>,
) -> TrajectoryAnalysis<'g> {
    let mut turn_events = Vec::new();
    let mut junction_crossings = Vec::new();
    let mut road_changes = Vec::new();

    for (i, &here) in points.iter().enumerate() {
        if i >= 1 && i + 1 < points.len() {
            if let Some(ev) = turn_at(i, points, config.turn_angle_threshold_deg) {
                turn_events.push(ev);
            }
        }

        if let Some(m) = &matched_trajectory[i] {
            if let Some((node, distance_m)) = junction_near(graph, config, here, m) {
                junction_crossings.push(JunctionCrossing { index: i, location: here, node, distance_m });
            }
        }

        if i >= 1 {
            let from_road = matched_trajectory[i - 1].as_ref().map(|m| m.road.id());
            let to_road = matched_trajectory[i].as_ref().map(|m| m.road.id());
            if from_road != to_road {
                road_changes.push(RoadChange { index: i, location: here, from_road, to_road });
            }
        }
    }

    TrajectoryAnalysis {
        points: points.to_vec(),
        matched_trajectory,
        turn_events,
        junction_crossings,
        road_changes,
    }
}

fn turn_at(i: usize, points: &[Coordinate], threshold_deg: f64) -> Option<TurnEvent> {
    let (prev, here, next) = (points[i - 1], points[i], points[i + 1]);
    if prev.distance_m(here) <= COINCIDENT_M || here.distance_m(next) <= COINCIDENT_M {
        return None;
    }
    let bearing_in = prev.bearing_to(here);
    let bearing_out = here.bearing_to(next);
    let turn_deg = angle_diff_deg(bearing_in, bearing_out);
    if turn_deg <= threshold_deg {
        return None;
    }
    let direction = if signed_turn_deg(bearing_in, bearing_out) < 0.0 {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    };
    Some(TurnEvent { index: i, location: here, turn_deg, direction, bearing_in, bearing_out })
}

/// The matched road's nearer endpoint, if it branches and lies within the
/// configured proximity.  Equidistant endpoints resolve to `from`.
fn junction_near<'g>(
    graph: &'g LocationGraph,
    config: &PerceptionConfig,
    here: Coordinate,
    m: &RoadMatch<'g>,
) -> Option<(&'g Poi, f64)> {
    let (from, to) = graph.edge_ends(m.edge);
    let a = graph.poi_at(from)?;
    let b = graph.poi_at(to)?;
    let (da, db) = (here.distance_m(a.coordinate()), here.distance_m(b.coordinate()));
    let (idx, node, d) = if da <= db { (from, a, da) } else { (to, b, db) };

    (d <= config.junction_proximity_m && graph.adjacent(idx).len() >= config.junction_min_degree)
        .then_some((node, d))
}
