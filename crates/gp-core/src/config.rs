//! Tunable thresholds and lookup tables.
//!
//! All records have public fields and `Default` impls holding the reference
//! values.  With the `serde` feature every record deserialises with
//! `#[serde(default)]`, so a JSON file only needs the fields it overrides.
//! Call [`EngineConfig::validate`] (or the per-section `validate`) after
//! building a config by hand; the engines validate on construction.

use std::collections::BTreeMap;

use crate::{GeoError, GeoResult};

fn require_positive(name: &str, value: f64) -> GeoResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GeoError::validation(format!("{name} must be finite and > 0, got {value}")));
    }
    Ok(())
}

// ── SpeedTable ────────────────────────────────────────────────────────────────

/// Road-type tag → assumed travel speed in metres per second.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeedTable {
    pub speeds_mps:   BTreeMap<String, f64>,
    /// Used for any tag missing from `speeds_mps`.
    pub fallback_mps: f64,
}

impl SpeedTable {
    /// Speed for `kind`, falling back to [`fallback_mps`](Self::fallback_mps).
    pub fn speed_mps(&self, kind: &str) -> f64 {
        self.speeds_mps.get(kind).copied().unwrap_or(self.fallback_mps)
    }

    /// Whether `kind` has an explicit entry.
    pub fn contains(&self, kind: &str) -> bool {
        self.speeds_mps.contains_key(kind)
    }

    pub fn validate(&self) -> GeoResult<()> {
        require_positive("fallback speed", self.fallback_mps)?;
        for (kind, &mps) in &self.speeds_mps {
            require_positive(&format!("speed for {kind:?}"), mps)?;
        }
        Ok(())
    }
}

impl Default for SpeedTable {
    /// Conservative urban defaults by OSM-style road class.
    fn default() -> Self {
        let speeds_mps = [
            ("motorway",      29.1), // ~65 mph
            ("trunk",         24.6), // ~55 mph
            ("primary",       20.1), // ~45 mph
            ("secondary",     17.9), // ~40 mph
            ("tertiary",      13.4), // ~30 mph
            ("residential",    8.9), // ~20 mph
            ("living_street",  8.9),
            ("service",        6.7), // ~15 mph
            ("unclassified",   6.7),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { speeds_mps, fallback_mps: 8.9 }
    }
}

// ── RoutingConfig ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingConfig {
    pub speeds: SpeedTable,
    /// Multiplier applied to the weight of every edge used by an already
    /// found route during alternative-path search.  Must be > 1.
    pub alternative_penalty: f64,
    /// Alternative-path search gives up after `k * alternative_iteration_factor`
    /// penalised searches.
    pub alternative_iteration_factor: usize,
}

impl RoutingConfig {
    pub fn validate(&self) -> GeoResult<()> {
        self.speeds.validate()?;
        if !self.alternative_penalty.is_finite() || self.alternative_penalty <= 1.0 {
            return Err(GeoError::validation(format!(
                "alternative penalty must be finite and > 1, got {}",
                self.alternative_penalty
            )));
        }
        if self.alternative_iteration_factor == 0 {
            return Err(GeoError::validation("alternative iteration factor must be >= 1"));
        }
        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            speeds: SpeedTable::default(),
            alternative_penalty: 2.0,
            alternative_iteration_factor: 5,
        }
    }
}

// ── PerceptionConfig ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerceptionConfig {
    /// Range given to observers built with `Observer::with_defaults`.
    pub default_perception_range_m: f64,
    /// Full cone angle given to observers built with `Observer::with_defaults`.
    pub default_fov_deg: f64,
    /// A point farther than this from every road matches nothing.
    pub matching_threshold_m: f64,
    /// Bearing changes strictly above this are reported as turns.
    pub turn_angle_threshold_deg: f64,
    /// How close a point must be to a junction node to count as crossing it.
    pub junction_proximity_m: f64,
    /// Minimum adjacency degree for a node to count as a junction.
    pub junction_min_degree: usize,
}

impl PerceptionConfig {
    pub fn validate(&self) -> GeoResult<()> {
        require_positive("default perception range", self.default_perception_range_m)?;
        require_positive("default field of view", self.default_fov_deg)?;
        if self.default_fov_deg > 360.0 {
            return Err(GeoError::validation(format!(
                "default field of view must be <= 360, got {}",
                self.default_fov_deg
            )));
        }
        require_positive("matching threshold", self.matching_threshold_m)?;
        require_positive("turn angle threshold", self.turn_angle_threshold_deg)?;
        require_positive("junction proximity", self.junction_proximity_m)?;
        if self.junction_min_degree == 0 {
            return Err(GeoError::validation("junction minimum degree must be >= 1"));
        }
        Ok(())
    }
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            default_perception_range_m: 100.0,
            default_fov_deg: 120.0,
            matching_threshold_m: 50.0,
            turn_angle_threshold_deg: 30.0,
            junction_proximity_m: 20.0,
            junction_min_degree: 3,
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level configuration grouping both engines' settings.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub routing:    RoutingConfig,
    pub perception: PerceptionConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> GeoResult<()> {
        self.routing.validate()?;
        self.perception.validate()
    }
}
