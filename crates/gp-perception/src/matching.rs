//! Point-to-road map matching.
//!
//! Each polyline segment is projected into a [`LocalFrame`] centred on the
//! query point, the foot of the perpendicular is clamped to the segment, and
//! the clamped point is mapped back by interpolating latitude and longitude.
//! Reported distances are geodesic.

use log::trace;

use gp_core::{Coordinate, EdgeIdx, LocalFrame, Road};
use gp_spatial::LocationGraph;

/// The nearest road to a point.
#[derive(Clone, Debug)]
pub struct RoadMatch<'g> {
    pub road:          &'g Road,
    pub edge:          EdgeIdx,
    /// Geodesic distance from the query point to `projected`, in metres.
    pub distance_m:    f64,
    /// Closest point on the road.
    pub projected:     Coordinate,
    /// Index of the polyline segment containing `projected`.
    pub segment_index: usize,
}

impl RoadMatch<'_> {
    pub fn road_id(&self) -> &str {
        self.road.id()
    }
}

/// Closest point to `p` on segment `a–b`, and its segment parameter in
/// `[0, 1]`.  A degenerate segment projects onto `a`.
pub fn project_onto_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> (Coordinate, f64) {
    let frame = LocalFrame::new(p);
    let [ax, ay] = frame.project(a);
    let [bx, by] = frame.project(b);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-18 {
        return (a, 0.0);
    }
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    (a.lerp(b, t), t)
}

/// Nearest point on `road` to `p`: `(distance_m, projected, segment_index)`.
pub fn nearest_on_road(p: Coordinate, road: &Road) -> (f64, Coordinate, usize) {
    let mut best = (f64::INFINITY, p, 0);
    for (i, (a, b)) in road.segments().enumerate() {
        let (q, _) = project_onto_segment(p, a, b);
        let d = p.distance_m(q);
        if d < best.0 {
            best = (d, q, i);
        }
    }
    best
}

/// Nearest road to `p` across the whole graph, or `None` when the graph has
/// no roads or the nearest lies farther than `threshold_m`.  Equal distances
/// go to the smaller road id.
pub fn nearest_road<'g>(
    graph: &'g LocationGraph,
    p: Coordinate,
    threshold_m: f64,
) -> Option<RoadMatch<'g>> {
    let mut best: Option<RoadMatch<'g>> = None;
    for (edge, road) in graph.indexed_roads() {
        let (distance_m, projected, segment_index) = nearest_on_road(p, road);
        let better = match &best {
            None => true,
            Some(cur) => {
                distance_m < cur.distance_m
                    || (distance_m == cur.distance_m && road.id() < cur.road.id())
            }
        };
        if better {
            best = Some(RoadMatch { road, edge, distance_m, projected, segment_index });
        }
    }

    match best {
        Some(m) if m.distance_m <= threshold_m => {
            trace!("matched {p} to road {} at {:.2} m", m.road.id(), m.distance_m);
            Some(m)
        }
        Some(m) => {
            trace!("nearest road {} to {p} is {:.2} m away, beyond threshold", m.road.id(), m.distance_m);
            None
        }
        None => None,
    }
}
