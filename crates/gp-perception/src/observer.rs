//! Observer viewpoint state.
//!
//! An `Observer` holds no reference to any graph; engines read it per query.
//! Every mutation re-validates, so an observer can never hold a heading that
//! is not finite, a field of view outside `(0, 360]`, or a non-positive range.

use gp_core::{normalize_bearing, Coordinate, GeoError, GeoResult, PerceptionConfig};

/// A mutable viewpoint: where the observer stands, which way it faces, and
/// how far and wide it can see.
#[derive(Clone, Debug, PartialEq)]
pub struct Observer {
    location:           Coordinate,
    heading_deg:        f64,
    fov_deg:            f64,
    perception_range_m: f64,
}

impl Observer {
    /// # Errors
    ///
    /// [`GeoError::Validation`] if `heading_deg` is not finite, `fov_deg` is
    /// outside `(0, 360]`, or `perception_range_m` is not finite and positive.
    pub fn new(
        location: Coordinate,
        heading_deg: f64,
        fov_deg: f64,
        perception_range_m: f64,
    ) -> GeoResult<Self> {
        Ok(Self {
            location,
            heading_deg:        checked_heading(heading_deg)?,
            fov_deg:            checked_fov(fov_deg)?,
            perception_range_m: checked_range(perception_range_m)?,
        })
    }

    /// An observer using the configured default field of view and range.
    pub fn with_defaults(
        location: Coordinate,
        heading_deg: f64,
        config: &PerceptionConfig,
    ) -> GeoResult<Self> {
        Self::new(location, heading_deg, config.default_fov_deg, config.default_perception_range_m)
    }

    pub fn location(&self) -> Coordinate { self.location }
    /// Heading in degrees clockwise from north, in `[0, 360)`.
    pub fn heading_deg(&self) -> f64 { self.heading_deg }
    /// Full cone angle in degrees.
    pub fn fov_deg(&self) -> f64 { self.fov_deg }
    pub fn perception_range_m(&self) -> f64 { self.perception_range_m }

    // ── Setters ───────────────────────────────────────────────────────────

    pub fn set_location(&mut self, location: Coordinate) {
        self.location = location;
    }

    pub fn set_heading(&mut self, heading_deg: f64) -> GeoResult<()> {
        self.heading_deg = checked_heading(heading_deg)?;
        Ok(())
    }

    pub fn set_fov(&mut self, fov_deg: f64) -> GeoResult<()> {
        self.fov_deg = checked_fov(fov_deg)?;
        Ok(())
    }

    pub fn set_perception_range(&mut self, range_m: f64) -> GeoResult<()> {
        self.perception_range_m = checked_range(range_m)?;
        Ok(())
    }

    // ── Motion ────────────────────────────────────────────────────────────

    /// Rotate by `delta_deg` (positive is clockwise).
    pub fn turn_by(&mut self, delta_deg: f64) -> GeoResult<()> {
        self.set_heading(self.heading_deg + delta_deg)
    }

    /// Walk `distance_m` along the current heading.  Negative distances walk
    /// backwards without changing the heading.
    pub fn move_forward(&mut self, distance_m: f64) -> GeoResult<()> {
        if !distance_m.is_finite() {
            return Err(GeoError::validation(format!("move distance {distance_m} is not finite")));
        }
        self.location = self.location.destination(self.heading_deg, distance_m);
        Ok(())
    }

    /// Jump to `location`, keeping the heading.
    pub fn move_to(&mut self, location: Coordinate) {
        self.location = location;
    }

    /// Turn to face `target`.  Facing one's own location leaves the heading
    /// unchanged.
    pub fn face_towards(&mut self, target: Coordinate) {
        if target != self.location {
            self.heading_deg = self.location.bearing_to(target);
        }
    }
}

fn checked_heading(heading_deg: f64) -> GeoResult<f64> {
    if !heading_deg.is_finite() {
        return Err(GeoError::validation(format!("heading {heading_deg} is not finite")));
    }
    Ok(normalize_bearing(heading_deg))
}

fn checked_fov(fov_deg: f64) -> GeoResult<f64> {
    if !fov_deg.is_finite() || fov_deg <= 0.0 || fov_deg > 360.0 {
        return Err(GeoError::validation(format!("field of view {fov_deg} outside (0, 360]")));
    }
    Ok(fov_deg)
}

fn checked_range(range_m: f64) -> GeoResult<f64> {
    if !range_m.is_finite() || range_m <= 0.0 {
        return Err(GeoError::validation(format!("perception range {range_m} must be finite and > 0")));
    }
    Ok(range_m)
}
