//! Geographic coordinate type and geodesic utilities.
//!
//! `Coordinate` uses `f64` latitude/longitude.  Perception boundaries are
//! inclusive and tested to sub-millimetre precision, which single-precision
//! floats cannot represent at city-scale offsets.

use crate::{GeoError, GeoResult};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate in degrees.
///
/// Always within `lat ∈ [-90, 90]`, `lon ∈ [-180, 180]`; the only public
/// constructor validates both.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// # Errors
    ///
    /// [`GeoError::Validation`] if either component is non-finite or out of
    /// range.
    pub fn new(lat: f64, lon: f64) -> GeoResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::validation(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::validation(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    #[inline]
    pub fn lat(self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(self) -> f64 {
        self.lon
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: Coordinate) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        // Rounding can push `a` a hair above 1 for antipodal points.
        let a = a.clamp(0.0, 1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial great-circle bearing towards `other`, in degrees clockwise from
    /// north, normalised to `[0, 360)`.
    ///
    /// Returns `0.0` when both points coincide.
    pub fn bearing_to(self, other: Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        if x == 0.0 && y == 0.0 {
            return 0.0;
        }
        normalize_bearing(y.atan2(x).to_degrees())
    }

    /// The point reached by travelling `distance_m` along the great circle
    /// starting at `bearing_deg`.
    pub fn destination(self, bearing_deg: f64, distance_m: f64) -> Coordinate {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();

        let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
        let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos())
                .atan2(delta.cos() - lat1.sin() * lat2.sin());

        Coordinate {
            lat: lat2.to_degrees().clamp(-90.0, 90.0),
            lon: normalize_longitude(lon2.to_degrees()),
        }
    }

    /// Linear interpolation in degree space; `t` is clamped to `[0, 1]` and
    /// the endpoints are returned exactly at `t == 0` and `t == 1`.
    ///
    /// Longitude follows the shorter way round, so a pair straddling the
    /// antimeridian interpolates across it rather than through 0°.
    pub fn lerp(self, other: Coordinate, t: f64) -> Coordinate {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        let d_lon = normalize_longitude(other.lon - self.lon);
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: normalize_longitude(self.lon + d_lon * t),
        }
    }

    /// Component-wise comparison within `tol_deg` degrees.
    #[inline]
    pub fn approx_eq(self, other: Coordinate, tol_deg: f64) -> bool {
        (self.lat - other.lat).abs() <= tol_deg && (self.lon - other.lon).abs() <= tol_deg
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── Angle helpers ─────────────────────────────────────────────────────────────

/// Normalise any finite angle to `[0, 360)`.
#[inline]
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to exactly 360.0.
    if b >= 360.0 { 0.0 } else { b }
}

/// Wrap a longitude into `[-180, 180]`.
#[inline]
fn normalize_longitude(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        return deg;
    }
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Minimal circular distance between two bearings, in `[0, 180]`.
#[inline]
pub fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Signed turn from bearing `from` to bearing `to`, in `(-180, 180]`.
/// Positive values turn clockwise (right).
#[inline]
pub fn signed_turn_deg(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

// ── Local planar frame ────────────────────────────────────────────────────────

/// Equirectangular projection centred on an origin, in metres
/// (`x` east, `y` north).
///
/// Accurate to well under 0.1 % within a few kilometres of the origin, which
/// covers perception ranges and map-matching thresholds.  Segment geometry
/// (clamped projection, sector intersection) is solved in this frame.
#[derive(Copy, Clone, Debug)]
pub struct LocalFrame {
    origin: Coordinate,
    cos_lat: f64,
}

impl LocalFrame {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            cos_lat: origin.lat.to_radians().cos(),
        }
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Planar `[x, y]` position of `c` relative to the origin.
    pub fn project(&self, c: Coordinate) -> [f64; 2] {
        let d_lon = normalize_longitude(c.lon - self.origin.lon);
        let x = d_lon.to_radians() * EARTH_RADIUS_M * self.cos_lat;
        let y = (c.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M;
        [x, y]
    }
}

/// Bearing of a planar offset, clockwise from north (`+y`), in `[0, 360)`.
#[inline]
pub fn planar_bearing(p: [f64; 2]) -> f64 {
    normalize_bearing(p[0].atan2(p[1]).to_degrees())
}
