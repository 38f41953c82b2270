//! `gp-io`: file formats around the geoperceive core.
//!
//! | Module             | Format                                                  |
//! |--------------------|---------------------------------------------------------|
//! | [`graph_geojson`]  | `LocationGraph` ⇄ GeoJSON `FeatureCollection`           |
//! | [`trajectory_csv`] | `lat,lon` trajectories in, per-point analysis rows out  |
//! | [`config_json`]    | `EngineConfig` from JSON, missing fields defaulted      |
//!
//! Every function returns [`GeoResult`](gp_core::GeoResult): malformed input
//! surfaces as [`GeoError::Format`](gp_core::GeoError::Format), file-system
//! failures as [`GeoError::Io`](gp_core::GeoError::Io).  Loaders never hand
//! back partially built values.

pub mod config_json;
pub mod graph_geojson;
pub mod trajectory_csv;


pub use config_json::{config_from_str, config_to_string, load_config};
pub use graph_geojson::{graph_from_geojson, graph_to_geojson, load_graph, save_graph};
pub use trajectory_csv::{
    load_trajectory_csv, load_trajectory_reader, write_trajectory_csv, write_trajectory_writer,
};

use gp_core::GeoError;

pub(crate) fn json_error(e: serde_json::Error) -> GeoError {
    if e.is_io() {
        GeoError::Io(e.into())
    } else {
        GeoError::Format(e.to_string())
    }
}
