//! Range + angle visibility tests.
//!
//! The visible region is a circular sector: every point within
//! `perception_range_m` of the observer whose bearing lies within
//! `heading ± fov/2`.  Both bounds are inclusive.  No occlusion is modelled.
//!
//! Point tests use geodesic distance and bearing.  Segment tests first try
//! both endpoints, then solve the segment against the sector boundary (two
//! radial edges and the arc) in a [`LocalFrame`] centred on the observer: a
//! segment whose endpoints are both outside the sector reaches its interior
//! only by crossing that boundary.

use gp_core::geo::planar_bearing;
use gp_core::{angle_diff_deg, Coordinate, LocalFrame};

use crate::Observer;

/// Slack for the inclusive range bound, in metres.
pub const RANGE_EPSILON_M: f64 = 1e-6;

/// Slack for the inclusive angle bound, in degrees.
pub const ANGLE_EPSILON_DEG: f64 = 1e-7;

/// An observer's visible sector, prepared for repeated queries.
#[derive(Clone, Debug)]
pub struct ViewCone {
    origin:      Coordinate,
    frame:       LocalFrame,
    heading_deg: f64,
    half_fov:    f64,
    range_m:     f64,
}

impl ViewCone {
    pub fn new(observer: &Observer) -> Self {
        Self {
            origin:      observer.location(),
            frame:       LocalFrame::new(observer.location()),
            heading_deg: observer.heading_deg(),
            half_fov:    observer.fov_deg() / 2.0,
            range_m:     observer.perception_range_m(),
        }
    }

    fn is_full_circle(&self) -> bool {
        self.half_fov >= 180.0
    }

    fn bearing_in_cone(&self, bearing_deg: f64) -> bool {
        self.is_full_circle()
            || angle_diff_deg(bearing_deg, self.heading_deg) <= self.half_fov + ANGLE_EPSILON_DEG
    }

    /// Whether a single point is visible.  A point at the observer's own
    /// location has no bearing and counts as visible.
    pub fn contains(&self, p: Coordinate) -> bool {
        let d = self.origin.distance_m(p);
        if d > self.range_m + RANGE_EPSILON_M {
            return false;
        }
        d <= RANGE_EPSILON_M || self.bearing_in_cone(self.origin.bearing_to(p))
    }

    /// Whether any point of the segment `a–b` is visible.
    pub fn intersects_segment(&self, a: Coordinate, b: Coordinate) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }

        let pa = self.frame.project(a);
        let pb = self.frame.project(b);
        if closest_to_origin(pa, pb) > self.range_m + RANGE_EPSILON_M {
            return false;
        }
        if self.is_full_circle() {
            return true;
        }

        // Radial edges of the sector.
        for edge in [self.heading_deg - self.half_fov, self.heading_deg + self.half_fov] {
            let rad = edge.to_radians();
            let tip = [self.range_m * rad.sin(), self.range_m * rad.cos()];
            if segments_intersect([0.0, 0.0], tip, pa, pb) {
                return true;
            }
        }

        // Arc: points of the segment at exactly `range_m`.
        circle_crossings(pa, pb, self.range_m)
            .into_iter()
            .flatten()
            .any(|q| self.bearing_in_cone(planar_bearing(q)))
    }

    /// Whether any part of a polyline is visible.
    pub fn intersects_polyline(&self, polyline: &[Coordinate]) -> bool {
        match polyline {
            [] => false,
            [only] => self.contains(*only),
            _ => polyline.windows(2).any(|w| self.intersects_segment(w[0], w[1])),
        }
    }
}

// ── Planar helpers ────────────────────────────────────────────────────────────

fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

fn cross(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Distance from the origin to the closest point of segment `a–b`.
fn closest_to_origin(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d = sub(b, a);
    let len_sq = dot(d, d);
    let t = if len_sq < 1e-18 { 0.0 } else { (-dot(a, d) / len_sq).clamp(0.0, 1.0) };
    let q = [a[0] + t * d[0], a[1] + t * d[1]];
    dot(q, q).sqrt()
}

/// Closed-segment intersection, including touching and collinear overlap.
fn segments_intersect(p1: [f64; 2], p2: [f64; 2], q1: [f64; 2], q2: [f64; 2]) -> bool {
    const EPS: f64 = 1e-9;
    let r = sub(p2, p1);
    let s = sub(q2, q1);
    let denom = cross(r, s);
    let qp = sub(q1, p1);

    if denom.abs() < EPS {
        if cross(qp, r).abs() > EPS {
            return false; // parallel, not collinear
        }
        // Collinear: compare projections onto r.
        let rr = dot(r, r);
        if rr < EPS {
            return dot(qp, qp) < EPS;
        }
        let t0 = dot(qp, r) / rr;
        let t1 = t0 + dot(s, r) / rr;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        return hi >= -EPS && lo <= 1.0 + EPS;
    }

    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    (-EPS..=1.0 + EPS).contains(&t) && (-EPS..=1.0 + EPS).contains(&u)
}

/// Points where segment `a–b` crosses the circle of radius `r` about the
/// origin.
fn circle_crossings(a: [f64; 2], b: [f64; 2], r: f64) -> [Option<[f64; 2]>; 2] {
    let d = sub(b, a);
    let qa = dot(d, d);
    if qa < 1e-18 {
        return [None, None];
    }
    let qb = 2.0 * dot(a, d);
    let qc = dot(a, a) - r * r;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < -1e-9 {
        return [None, None];
    }
    let root = disc.max(0.0).sqrt();
    let at = |t: f64| (0.0..=1.0).contains(&t).then(|| [a[0] + t * d[0], a[1] + t * d[1]]);
    [at((-qb - root) / (2.0 * qa)), at((-qb + root) / (2.0 * qa))]
}
