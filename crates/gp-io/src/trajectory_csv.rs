//! Trajectory CSV files.
//!
//! # Input
//!
//! One row per observed position, in travel order.  Only `lat` and `lon` are
//! read; other columns are ignored.
//!
//! ```csv
//! lat,lon
//! 0.0,-0.0009
//! 0.0,-0.0006
//! ```
//!
//! # Output
//!
//! One row per analysed point:
//!
//! | Column          | Contents                                            |
//! |-----------------|-----------------------------------------------------|
//! | `index`         | position in the trajectory                          |
//! | `lat`, `lon`    | the point                                           |
//! | `road_id`       | matched road, empty when unmatched                  |
//! | `distance_m`    | distance to the matched road, empty when unmatched  |
//! | `turn_deg`      | signed turn at this point (negative = left), or empty |
//! | `junction_node` | node id of a junction crossing, or empty            |
//! | `road_change`   | `1` if the matched road changed here, else `0`      |

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::Writer;
use log::info;
use serde::Deserialize;

use gp_core::{Coordinate, GeoError, GeoResult};
use gp_perception::{TrajectoryAnalysis, TurnDirection};

#[derive(Deserialize)]
struct PointRecord {
    lat: f64,
    lon: f64,
}

/// Load a trajectory from a CSV file.
pub fn load_trajectory_csv(path: &Path) -> GeoResult<Vec<Coordinate>> {
    let file = File::open(path)?;
    let points = load_trajectory_reader(file)?;
    info!("loaded {} trajectory points from {}", points.len(), path.display());
    Ok(points)
}

/// Like [`load_trajectory_csv`] but accepts any `Read` source.
pub fn load_trajectory_reader<R: Read>(reader: R) -> GeoResult<Vec<Coordinate>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();
    for (row, result) in csv_reader.deserialize::<PointRecord>().enumerate() {
        let rec = result.map_err(csv_error)?;
        let c = Coordinate::new(rec.lat, rec.lon)
            .map_err(|e| GeoError::Format(format!("row {}: {e}", row + 1)))?;
        points.push(c);
    }
    Ok(points)
}

/// Write the per-point analysis rows to `path`.
pub fn write_trajectory_csv(path: &Path, analysis: &TrajectoryAnalysis<'_>) -> GeoResult<()> {
    let file = File::create(path)?;
    write_trajectory_writer(file, analysis)?;
    info!("wrote {} trajectory rows to {}", analysis.len(), path.display());
    Ok(())
}

/// Like [`write_trajectory_csv`] but accepts any `Write` sink.
pub fn write_trajectory_writer<W: Write>(sink: W, analysis: &TrajectoryAnalysis<'_>) -> GeoResult<()> {
    let n = analysis.len();
    if analysis.matched_trajectory.len() != n {
        return Err(GeoError::Format(format!(
            "{} matches for a trajectory of {n} points",
            analysis.matched_trajectory.len()
        )));
    }
    let mut turns = vec![None; n];
    for t in &analysis.turn_events {
        *row_slot(&mut turns, t.index, "turn event")? = Some(match t.direction {
            TurnDirection::Left => -t.turn_deg,
            TurnDirection::Right => t.turn_deg,
        });
    }
    let mut junctions = vec![None; n];
    for j in &analysis.junction_crossings {
        *row_slot(&mut junctions, j.index, "junction crossing")? = Some(j.node.id());
    }
    let mut changed = vec![false; n];
    for ch in &analysis.road_changes {
        *row_slot(&mut changed, ch.index, "road change")? = true;
    }

    let mut writer = Writer::from_writer(sink);
    writer
        .write_record(["index", "lat", "lon", "road_id", "distance_m", "turn_deg", "junction_node", "road_change"])
        .map_err(csv_error)?;

    for (i, (point, matched)) in analysis.points.iter().zip(&analysis.matched_trajectory).enumerate() {
        writer
            .write_record(&[
                i.to_string(),
                format!("{:.7}", point.lat()),
                format!("{:.7}", point.lon()),
                matched.as_ref().map(|m| m.road.id().to_string()).unwrap_or_default(),
                matched.as_ref().map(|m| format!("{:.3}", m.distance_m)).unwrap_or_default(),
                turns[i].map(|t: f64| format!("{t:.3}")).unwrap_or_default(),
                junctions[i].unwrap_or_default().to_string(),
                (changed[i] as u8).to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Per-row slot for an event, or a format error when the event points past
/// the end of the trajectory.
fn row_slot<'a, T>(rows: &'a mut [T], index: usize, what: &str) -> GeoResult<&'a mut T> {
    let n = rows.len();
    rows.get_mut(index)
        .ok_or_else(|| GeoError::Format(format!("{what} index {index} outside trajectory of {n} points")))
}

fn csv_error(e: csv::Error) -> GeoError {
    if !e.is_io_error() {
        return GeoError::Format(e.to_string());
    }
    match e.into_kind() {
        csv::ErrorKind::Io(io) => GeoError::Io(io),
        other => GeoError::Format(format!("{other:?}")),
    }
}
