//! Perception queries over a borrowed [`LocationGraph`].
//!
//! The engine holds no state between calls beyond its configuration; every
//! query reads the graph and an [`Observer`] snapshot.

use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use gp_core::{Coordinate, GeoError, GeoResult, PerceptionConfig, Poi, Road};
use gp_spatial::LocationGraph;

use crate::matching::{nearest_road, RoadMatch};
use crate::trajectory::{scan, TrajectoryAnalysis};
use crate::visibility::ViewCone;
use crate::Observer;

/// What an observer sees from one position.
#[derive(Clone, Debug)]
pub struct PerceptionResult<'g> {
    /// Visible POIs in graph insertion order.
    pub visible_pois:  Vec<&'g Poi>,
    /// Roads with any visible part, in graph insertion order.
    pub visible_roads: Vec<&'g Road>,
    pub matched_road:  Option<RoadMatch<'g>>,
}

pub struct PerceptionEngine<'g> {
    graph:  &'g LocationGraph,
    config: PerceptionConfig,
}

impl<'g> PerceptionEngine<'g> {
    /// Engine with default thresholds.
    pub fn new(graph: &'g LocationGraph) -> Self {
        Self { graph, config: PerceptionConfig::default() }
    }

    /// # Errors
    ///
    /// [`GeoError::Validation`] if `config` fails validation.
    pub fn with_config(graph: &'g LocationGraph, config: PerceptionConfig) -> GeoResult<Self> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g LocationGraph {
        self.graph
    }

    /// Visible POIs, visible roads, and the matched road for `observer`.
    pub fn update_observer(&self, observer: &Observer) -> PerceptionResult<'g> {
        let cone = ViewCone::new(observer);
        let visible_pois: Vec<&'g Poi> =
            self.graph.nodes().filter(|p| cone.contains(p.coordinate())).collect();
        let visible_roads: Vec<&'g Road> =
            self.graph.roads().filter(|r| cone.intersects_polyline(r.polyline())).collect();
        let matched_road = self.match_point(observer.location());

        debug!(
            "observer at {} sees {} POIs, {} roads; matched {:?}",
            observer.location(),
            visible_pois.len(),
            visible_roads.len(),
            matched_road.as_ref().map(RoadMatch::road_id)
        );
        PerceptionResult { visible_pois, visible_roads, matched_road }
    }

    /// Nearest road to `point` within the matching threshold.
    pub fn match_point(&self, point: Coordinate) -> Option<RoadMatch<'g>> {
        nearest_road(self.graph, point, self.config.matching_threshold_m)
    }

    /// Match every point independently, then scan for events.
    ///
    /// # Errors
    ///
    /// [`GeoError::Validation`] if `points` is empty.
    pub fn analyze_trajectory(&self, points: &[Coordinate]) -> GeoResult<TrajectoryAnalysis<'g>> {
        if points.is_empty() {
            return Err(GeoError::validation("trajectory must contain at least one point"));
        }

        #[cfg(feature = "parallel")]
        let matched: Vec<Option<RoadMatch<'g>>> =
            points.par_iter().map(|&p| self.match_point(p)).collect();
        #[cfg(not(feature = "parallel"))]
        let matched: Vec<Option<RoadMatch<'g>>> =
            points.iter().map(|&p| self.match_point(p)).collect();

        let analysis = scan(self.graph, &self.config, points, matched);
        debug!(
            "trajectory of {} points: {} turns, {} junctions, {} road changes",
            points.len(),
            analysis.turn_events.len(),
            analysis.junction_crossings.len(),
            analysis.road_changes.len()
        );
        Ok(analysis)
    }
}
