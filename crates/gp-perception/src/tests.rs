//! Unit tests for gp-perception.
//!
//! Fixtures sit on the equator so that planar offsets in metres convert to
//! degrees with a single constant.

#[cfg(test)]
mod helpers {
    use gp_core::{Coordinate, Poi, Road};
    use gp_spatial::LocationGraph;

    use crate::Observer;

    /// Metres per degree on the mean-radius sphere.
    pub const M_PER_DEG: f64 = 111_194.926_644_558_7;

    pub fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// Planar offset in metres (`x` east, `y` north) from (0, 0).
    pub fn at(x: f64, y: f64) -> Coordinate {
        c(y / M_PER_DEG, x / M_PER_DEG)
    }

    pub fn observer(heading: f64, fov: f64, range: f64) -> Observer {
        Observer::new(c(0.0, 0.0), heading, fov, range).unwrap()
    }

    pub fn poi(g: &mut LocationGraph, id: &str, at: Coordinate) {
        g.add_node(Poi::new(id, id, "landmark", at).unwrap()).unwrap();
    }

    pub fn road(g: &mut LocationGraph, id: &str, from: &str, to: &str) {
        let a = g.node(from).unwrap().coordinate();
        let b = g.node(to).unwrap().coordinate();
        g.add_edge(Road::new(id, id, "residential", from, to, vec![a, b]).unwrap()).unwrap();
    }

    /// ```text
    ///            n
    ///            │ b-north
    ///   w ────── o ────── e
    ///   a-west       c-east
    /// ```
    ///
    /// `o` has degree 3.  Roads are inserted in reverse id order.
    pub fn cross() -> LocationGraph {
        let mut g = LocationGraph::new();
        poi(&mut g, "w", c(0.0, -0.001));
        poi(&mut g, "o", c(0.0, 0.0));
        poi(&mut g, "e", c(0.0, 0.001));
        poi(&mut g, "n", c(0.001, 0.0));
        road(&mut g, "c-east", "o", "e");
        road(&mut g, "b-north", "o", "n");
        road(&mut g, "a-west", "w", "o");
        g
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use gp_core::{GeoError, PerceptionConfig};

    use super::helpers::{c, observer};
    use crate::Observer;

    #[test]
    fn construction_validates() {
        let here = c(0.0, 0.0);
        assert!(matches!(Observer::new(here, 0.0, 0.0, 100.0), Err(GeoError::Validation(_))));
        assert!(matches!(Observer::new(here, 0.0, 360.1, 100.0), Err(GeoError::Validation(_))));
        assert!(matches!(Observer::new(here, 0.0, 90.0, 0.0), Err(GeoError::Validation(_))));
        assert!(matches!(Observer::new(here, f64::NAN, 90.0, 10.0), Err(GeoError::Validation(_))));
        assert!(Observer::new(here, 0.0, 360.0, 1.0).is_ok());
    }

    #[test]
    fn heading_is_normalized() {
        let o = observer(-90.0, 90.0, 100.0);
        assert_eq!(o.heading_deg(), 270.0);
        let o = observer(720.0, 90.0, 100.0);
        assert_eq!(o.heading_deg(), 0.0);
    }

    #[test]
    fn failed_update_leaves_state() {
        let mut o = observer(10.0, 90.0, 100.0);
        assert!(o.set_fov(-5.0).is_err());
        assert!(o.set_perception_range(f64::INFINITY).is_err());
        assert!(o.set_heading(f64::NAN).is_err());
        assert_eq!(o, observer(10.0, 90.0, 100.0));
    }

    #[test]
    fn defaults_from_config() {
        let cfg = PerceptionConfig::default();
        let o = Observer::with_defaults(c(1.0, 1.0), 45.0, &cfg).unwrap();
        assert_eq!(o.fov_deg(), cfg.default_fov_deg);
        assert_eq!(o.perception_range_m(), cfg.default_perception_range_m);
    }

    #[test]
    fn move_forward_follows_heading() {
        let mut o = observer(90.0, 90.0, 100.0);
        o.move_forward(100.0).unwrap();
        let start = c(0.0, 0.0);
        assert!((start.distance_m(o.location()) - 100.0).abs() < 1e-6);
        assert!((start.bearing_to(o.location()) - 90.0).abs() < 1e-6);
        assert_eq!(o.heading_deg(), 90.0);
        assert!(o.move_forward(f64::NAN).is_err());
    }

    #[test]
    fn turning_and_facing() {
        let mut o = observer(30.0, 90.0, 100.0);
        o.turn_by(-100.0).unwrap();
        assert_eq!(o.heading_deg(), 290.0);

        o.face_towards(c(-0.001, 0.0));
        assert!((o.heading_deg() - 180.0).abs() < 1e-9);
        o.face_towards(o.location());
        assert!((o.heading_deg() - 180.0).abs() < 1e-9);

        o.move_to(c(5.0, 5.0));
        assert_eq!(o.location(), c(5.0, 5.0));
    }
}

// ── Visibility ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod visibility {
    use super::helpers::{at, c, observer};
    use crate::ViewCone;

    #[test]
    fn half_angle_scenario() {
        let cone = ViewCone::new(&observer(0.0, 90.0, 100.0));
        let origin = c(0.0, 0.0);
        assert!(cone.contains(origin.destination(40.0, 50.0)));
        assert!(!cone.contains(origin.destination(50.0, 50.0)));
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let cone = ViewCone::new(&observer(0.0, 90.0, 100.0));
        let origin = c(0.0, 0.0);
        assert!(cone.contains(origin.destination(0.0, 100.0)));
        assert!(!cone.contains(origin.destination(0.0, 100.01)));
    }

    #[test]
    fn angle_boundary_is_inclusive() {
        let cone = ViewCone::new(&observer(10.0, 90.0, 100.0));
        let origin = c(0.0, 0.0);
        assert!(cone.contains(origin.destination(55.0, 50.0)));
        assert!(cone.contains(origin.destination(325.0, 50.0)));
        assert!(!cone.contains(origin.destination(55.01, 50.0)));
        assert!(!cone.contains(origin.destination(324.99, 50.0)));
    }

    #[test]
    fn cone_wraps_through_north() {
        let cone = ViewCone::new(&observer(350.0, 90.0, 100.0));
        let origin = c(0.0, 0.0);
        assert!(cone.contains(origin.destination(30.0, 50.0)));
        assert!(cone.contains(origin.destination(310.0, 50.0)));
        assert!(!cone.contains(origin.destination(300.0, 50.0)));
        assert!(!cone.contains(origin.destination(40.0, 50.0)));
    }

    #[test]
    fn own_location_is_visible() {
        let cone = ViewCone::new(&observer(180.0, 10.0, 5.0));
        assert!(cone.contains(c(0.0, 0.0)));
    }

    #[test]
    fn full_circle_sees_behind() {
        let cone = ViewCone::new(&observer(0.0, 360.0, 100.0));
        assert!(cone.contains(c(0.0, 0.0).destination(180.0, 99.0)));
        assert!(cone.intersects_segment(at(-150.0, -50.0), at(150.0, -50.0)));
    }

    #[test]
    fn segment_crossing_the_cone_is_visible() {
        // Both endpoints are out of range; the middle passes in front.
        let cone = ViewCone::new(&observer(0.0, 90.0, 100.0));
        assert!(cone.intersects_segment(at(-222.0, 55.6), at(222.0, 55.6)));
    }

    #[test]
    fn chord_through_the_arc_is_visible() {
        // Enters and leaves through the arc without touching a radial edge.
        let cone = ViewCone::new(&observer(0.0, 90.0, 100.0));
        assert!(cone.intersects_segment(at(-70.0, 80.0), at(70.0, 80.0)));
    }

    #[test]
    fn segment_beside_the_cone_is_not_visible() {
        let cone = ViewCone::new(&observer(0.0, 60.0, 100.0));
        assert!(!cone.intersects_segment(at(60.0, 55.0), at(300.0, 55.0)));
    }

    #[test]
    fn segment_behind_is_not_visible() {
        let cone = ViewCone::new(&observer(0.0, 90.0, 100.0));
        assert!(!cone.intersects_segment(at(-150.0, -50.0), at(150.0, -50.0)));
    }

    #[test]
    fn polyline_visible_through_middle_vertex() {
        let cone = ViewCone::new(&observer(0.0, 30.0, 100.0));
        let line = [at(-300.0, 50.0), at(0.0, 60.0), at(300.0, 50.0)];
        assert!(cone.intersects_polyline(&line));
        assert!(!cone.intersects_polyline(&[]));
        assert!(cone.intersects_polyline(&[at(0.0, 10.0)]));
    }
}

// ── Map matching ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod matching {
    use gp_core::{PerceptionConfig, Poi, Road};
    use gp_spatial::LocationGraph;

    use super::helpers::{c, cross};
    use crate::matching::project_onto_segment;
    use crate::PerceptionEngine;

    #[test]
    fn projection_is_clamped() {
        let a = c(0.0, 0.0);
        let b = c(0.0, 0.001);
        let (q, t) = project_onto_segment(c(0.0005, 0.0005), a, b);
        assert!((t - 0.5).abs() < 1e-6);
        assert!(q.approx_eq(c(0.0, 0.0005), 1e-9));

        let (q, t) = project_onto_segment(c(0.0, -0.01), a, b);
        assert_eq!((q, t), (a, 0.0));
        let (q, t) = project_onto_segment(c(0.001, 0.005), a, b);
        assert_eq!((q, t), (b, 1.0));
    }

    #[test]
    fn projection_across_antimeridian() {
        let a = c(0.0, 179.9);
        let b = c(0.0, -179.9);
        let p = c(0.0005, 180.0);
        let (q, t) = project_onto_segment(p, a, b);
        assert!((t - 0.5).abs() < 1e-6, "t = {t}");
        assert!((q.lon().abs() - 180.0).abs() < 1e-6, "foot = {q}");
        let d = p.distance_m(q);
        assert!((d - 55.6).abs() < 0.5, "distance {d}");
    }

    #[test]
    fn vertex_matches_with_zero_distance() {
        let mut g = LocationGraph::new();
        g.add_node(Poi::new("a", "A", "junction", c(0.0, 0.0)).unwrap()).unwrap();
        g.add_node(Poi::new("b", "B", "junction", c(0.001, 0.002)).unwrap()).unwrap();
        let bend = c(0.0005, 0.0015);
        let pts = vec![c(0.0, 0.0), bend, c(0.001, 0.002)];
        g.add_edge(Road::new("r", "Bend", "tertiary", "a", "b", pts).unwrap()).unwrap();

        let engine = PerceptionEngine::new(&g);
        let m = engine.match_point(bend).unwrap();
        assert_eq!(m.road_id(), "r");
        assert_eq!(m.distance_m, 0.0);
        assert_eq!(m.projected, bend);
    }

    #[test]
    fn beyond_threshold_is_unmatched() {
        let g = cross();
        // ≈100 m south of the east–west line, far from `b-north`.
        let p = c(-0.0009, 0.0005);
        assert!(PerceptionEngine::new(&g).match_point(p).is_none());

        let cfg = PerceptionConfig { matching_threshold_m: 150.0, ..PerceptionConfig::default() };
        let m = PerceptionEngine::with_config(&g, cfg).unwrap().match_point(p).unwrap();
        assert_eq!(m.road_id(), "c-east");
        assert!((m.distance_m - 100.075).abs() < 0.01, "got {}", m.distance_m);
        assert_eq!(m.segment_index, 0);
    }

    #[test]
    fn equidistant_roads_resolve_to_smallest_id() {
        let g = cross();
        let m = PerceptionEngine::new(&g).match_point(c(0.0, 0.0)).unwrap();
        assert_eq!(m.road_id(), "a-west");
        assert_eq!(m.distance_m, 0.0);
    }

    #[test]
    fn empty_graph_matches_nothing() {
        let g = LocationGraph::new();
        assert!(PerceptionEngine::new(&g).match_point(c(0.0, 0.0)).is_none());
    }
}

// ── update_observer ───────────────────────────────────────────────────────────

#[cfg(test)]
mod perception {
    use gp_spatial::LocationGraph;

    use super::helpers::{c, cross, observer, poi};
    use crate::{Observer, PerceptionEngine};

    #[test]
    fn scenario_from_origin() {
        let mut g = LocationGraph::new();
        let origin = c(0.0, 0.0);
        poi(&mut g, "in-view", origin.destination(40.0, 50.0));
        poi(&mut g, "outside", origin.destination(50.0, 50.0));

        let engine = PerceptionEngine::new(&g);
        let seen = engine.update_observer(&observer(0.0, 90.0, 100.0));
        let ids: Vec<_> = seen.visible_pois.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["in-view"]);
        assert!(seen.visible_roads.is_empty());
        assert!(seen.matched_road.is_none());
    }

    #[test]
    fn walking_east_into_the_cross() {
        let g = cross();
        let engine = PerceptionEngine::new(&g);
        let obs = Observer::new(c(0.0, -0.0003), 90.0, 90.0, 100.0).unwrap();
        let seen = engine.update_observer(&obs);

        let pois: Vec<_> = seen.visible_pois.iter().map(|p| p.id()).collect();
        assert_eq!(pois, vec!["o"]);
        // Every road touches `o`; insertion order is kept.
        let roads: Vec<_> = seen.visible_roads.iter().map(|r| r.id()).collect();
        assert_eq!(roads, vec!["c-east", "b-north", "a-west"]);

        let m = seen.matched_road.unwrap();
        assert_eq!(m.road_id(), "a-west");
        assert!(m.distance_m < 1e-6);
    }

    #[test]
    fn facing_away_sees_only_the_road_underfoot() {
        let g = cross();
        let engine = PerceptionEngine::new(&g);
        let obs = Observer::new(c(0.0, -0.0003), 270.0, 60.0, 50.0).unwrap();
        let seen = engine.update_observer(&obs);
        assert!(seen.visible_pois.is_empty());
        let roads: Vec<_> = seen.visible_roads.iter().map(|r| r.id()).collect();
        assert_eq!(roads, vec!["a-west"]);
    }
}

// ── Trajectory analysis ───────────────────────────────────────────────────────

#[cfg(test)]
mod trajectory {
    use gp_core::GeoError;

    use super::helpers::{c, cross};
    use crate::{PerceptionEngine, TurnDirection};

    #[test]
    fn empty_trajectory_rejected() {
        let g = cross();
        let err = PerceptionEngine::new(&g).analyze_trajectory(&[]).unwrap_err();
        assert!(matches!(err, GeoError::Validation(_)));
    }

    #[test]
    fn single_point_has_no_events() {
        let g = cross();
        let a = PerceptionEngine::new(&g).analyze_trajectory(&[c(0.0, 0.0005)]).unwrap();
        assert_eq!(a.len(), 1);
        assert!(a.turn_events.is_empty());
        assert!(a.road_changes.is_empty());
        assert_eq!(a.road_ids().collect::<Vec<_>>(), vec![Some("c-east")]);
    }

    #[test]
    fn straight_run_along_one_road() {
        let g = cross();
        let pts: Vec<_> = [0.0002, 0.0004, 0.0006, 0.0008].iter().map(|&lon| c(0.0, lon)).collect();
        let a = PerceptionEngine::new(&g).analyze_trajectory(&pts).unwrap();
        assert!(a.turn_events.is_empty());
        assert!(a.road_changes.is_empty());
        assert!(a.junction_crossings.is_empty());
        assert!(a.road_ids().all(|id| id == Some("c-east")));
    }

    #[test]
    fn turning_north_at_the_junction() {
        let g = cross();
        let pts = vec![
            c(0.0, -0.0009),
            c(0.0, -0.0006),
            c(0.0, -0.0003),
            c(0.0, 0.0),
            c(0.0003, 0.0),
            c(0.0006, 0.0),
        ];
        let a = PerceptionEngine::new(&g).analyze_trajectory(&pts).unwrap();

        assert_eq!(a.matched_trajectory.len(), pts.len());
        let ids: Vec<_> = a.road_ids().collect();
        assert_eq!(
            ids,
            vec![
                Some("a-west"),
                Some("a-west"),
                Some("a-west"),
                Some("a-west"),
                Some("b-north"),
                Some("b-north"),
            ]
        );

        assert_eq!(a.road_changes.len(), 1);
        let change = &a.road_changes[0];
        assert_eq!(change.index, 4);
        assert_eq!(change.from_road, Some("a-west"));
        assert_eq!(change.to_road, Some("b-north"));
        assert_eq!(change.location, pts[4]);

        assert_eq!(a.turn_events.len(), 1);
        let turn = &a.turn_events[0];
        assert_eq!(turn.index, 3);
        assert_eq!(turn.direction, TurnDirection::Left);
        assert!((turn.turn_deg - 90.0).abs() < 1e-9);

        assert_eq!(a.junction_crossings.len(), 1);
        let j = &a.junction_crossings[0];
        assert_eq!(j.index, 3);
        assert_eq!(j.node.id(), "o");
        assert_eq!(j.distance_m, 0.0);
    }

    #[test]
    fn right_turn_is_signed() {
        let g = cross();
        let pts = vec![c(0.0, -0.0006), c(0.0, -0.0003), c(0.0, 0.0), c(-0.0003, 0.0)];
        let a = PerceptionEngine::new(&g).analyze_trajectory(&pts).unwrap();
        assert_eq!(a.turn_events.len(), 1);
        assert_eq!(a.turn_events[0].direction, TurnDirection::Right);
        assert_eq!(a.turn_events[0].index, 2);
    }

    #[test]
    fn leaving_and_rejoining_the_network() {
        let g = cross();
        let pts = vec![c(0.0, 0.0005), c(0.01, 0.01), c(0.0, 0.0005)];
        let a = PerceptionEngine::new(&g).analyze_trajectory(&pts).unwrap();
        let changes: Vec<_> =
            a.road_changes.iter().map(|ch| (ch.index, ch.from_road, ch.to_road)).collect();
        assert_eq!(changes, vec![(1, Some("c-east"), None), (2, None, Some("c-east"))]);
    }

    #[test]
    fn pauses_produce_no_turns() {
        let g = cross();
        let p = c(0.0, 0.0002);
        let pts = vec![c(0.0, 0.0001), p, p, c(0.0003, 0.0002)];
        let a = PerceptionEngine::new(&g).analyze_trajectory(&pts).unwrap();
        assert!(a.turn_events.is_empty());
    }
}
