//! JSON configuration files.
//!
//! ```json
//! {
//!   "routing": { "alternative_penalty": 1.5 },
//!   "perception": { "turn_angle_threshold_deg": 45.0 }
//! }
//! ```
//!
//! Absent sections and fields take their defaults.  The parsed config is
//! validated before it is returned.

use std::path::Path;

use log::info;

use gp_core::{EngineConfig, GeoResult};

use crate::json_error;

pub fn load_config(path: &Path) -> GeoResult<EngineConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = config_from_str(&text)?;
    info!("loaded engine config from {}", path.display());
    Ok(config)
}

/// # Errors
///
/// - [`GeoError::Format`](gp_core::GeoError::Format) if `json` does not parse.
/// - [`GeoError::Validation`](gp_core::GeoError::Validation) if a value is out
///   of range.
pub fn config_from_str(json: &str) -> GeoResult<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(json).map_err(json_error)?;
    config.validate()?;
    Ok(config)
}

/// Pretty-printed JSON with every field present.
pub fn config_to_string(config: &EngineConfig) -> GeoResult<String> {
    serde_json::to_string_pretty(config).map_err(json_error)
}
