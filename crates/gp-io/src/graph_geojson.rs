//! GeoJSON persistence for [`LocationGraph`].
//!
//! # Layout
//!
//! A single `FeatureCollection`:
//!
//! | Entity | Geometry     | Properties                                        |
//! |--------|--------------|---------------------------------------------------|
//! | POI    | `Point`      | `feature_kind = "poi"`, `id`, `name`, `type`      |
//! | Road   | `LineString` | `feature_kind = "road"`, `id`, `name`, `type`, `from`, `to`, `oneway` |
//!
//! A road with a one-point polyline is written with that position repeated
//! and `single_point = true`; only the marker makes the loader collapse it.
//!
//! Positions are `[lon, lat]` as GeoJSON requires.  POIs are written before
//! roads, each group in graph insertion order.
//!
//! On load, a feature without `feature_kind` is classified by its geometry
//! type and a missing `oneway` reads as `false`.  All POIs are inserted
//! before any road, so roads may precede their endpoints in the file.  The
//! first bad feature aborts the load.

use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};
use log::info;
use serde_json::{json, Map, Value};

use gp_core::{Coordinate, GeoError, GeoResult, Poi, Road};
use gp_spatial::LocationGraph;

use crate::json_error;

/// Road property marking a one-point polyline padded to two positions.
const SINGLE_POINT: &str = "single_point";

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write `graph` to `path` as GeoJSON, replacing any existing file.
pub fn save_graph(graph: &LocationGraph, path: &Path) -> GeoResult<()> {
    let text = graph_to_geojson(graph)?;
    std::fs::write(path, text)?;
    info!(
        "saved graph ({} nodes, {} roads) to {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

pub fn graph_to_geojson(graph: &LocationGraph) -> GeoResult<String> {
    serde_json::to_string_pretty(&to_feature_collection(graph)?).map_err(json_error)
}

pub fn to_feature_collection(graph: &LocationGraph) -> GeoResult<FeatureCollection> {
    let mut features = Vec::with_capacity(graph.node_count() + graph.edge_count());
    for poi in graph.nodes() {
        features.push(poi_feature(poi)?);
    }
    for road in graph.roads() {
        features.push(road_feature(road)?);
    }
    Ok(FeatureCollection { features, bbox: None, foreign_members: None })
}

fn position(c: Coordinate) -> Value {
    json!([c.lon(), c.lat()])
}

fn poi_feature(poi: &Poi) -> GeoResult<Feature> {
    let value = json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": position(poi.coordinate()) },
        "properties": {
            "feature_kind": "poi",
            "id": poi.id(),
            "name": poi.name(),
            "type": poi.kind(),
        }
    });
    serde_json::from_value::<Feature>(value).map_err(json_error)
}

fn road_feature(road: &Road) -> GeoResult<Feature> {
    let mut coordinates: Vec<Value> = road.polyline().iter().map(|&c| position(c)).collect();
    let mut properties = json!({
        "feature_kind": "road",
        "id": road.id(),
        "name": road.name(),
        "type": road.kind(),
        "from": road.from_node(),
        "to": road.to_node(),
        "oneway": road.is_oneway(),
    });
    // GeoJSON line strings need two positions; a single-point road repeats it
    // and carries a marker so the loader can tell padding from real geometry.
    if coordinates.len() == 1 {
        coordinates.push(coordinates[0].clone());
        properties[SINGLE_POINT] = Value::Bool(true);
    }
    let value = json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": properties,
    });
    serde_json::from_value::<Feature>(value).map_err(json_error)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read a graph previously written by [`save_graph`] (or any GeoJSON file
/// following the same layout).
pub fn load_graph(path: &Path) -> GeoResult<LocationGraph> {
    let text = std::fs::read_to_string(path)?;
    let graph = graph_from_geojson(&text)?;
    info!(
        "loaded graph ({} nodes, {} roads) from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// # Errors
///
/// - [`GeoError::Format`] for unparsable text, a top-level object other than
///   a `FeatureCollection`, or a feature with missing or ill-typed fields.
/// - Any insertion error of [`LocationGraph`] (duplicate ids, roads whose
///   endpoints are absent or do not match their polyline).
pub fn graph_from_geojson(text: &str) -> GeoResult<LocationGraph> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| GeoError::Format(e.to_string()))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::Format("top-level GeoJSON object must be a FeatureCollection".into()));
    };

    let mut pois = Vec::new();
    let mut roads = Vec::new();
    for (i, feature) in collection.features.iter().enumerate() {
        match parse_feature(feature).map_err(|e| with_feature_index(i, e))? {
            Parsed::Poi(poi) => pois.push(poi),
            Parsed::Road(road) => roads.push(road),
        }
    }

    let mut graph = LocationGraph::new();
    for poi in pois {
        graph.add_node(poi)?;
    }
    for road in roads {
        graph.add_edge(road)?;
    }
    Ok(graph)
}

enum Parsed {
    Poi(Poi),
    Road(Road),
}

/// Feature-level failures are format errors whatever their origin.
fn with_feature_index(i: usize, e: GeoError) -> GeoError {
    match e {
        GeoError::Format(msg) | GeoError::Validation(msg) => GeoError::Format(format!("feature {i}: {msg}")),
        other => other,
    }
}

fn parse_feature(feature: &Feature) -> GeoResult<Parsed> {
    let props = feature
        .properties
        .as_ref()
        .ok_or_else(|| GeoError::Format("missing properties".into()))?;
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| GeoError::Format("missing geometry".into()))?;
    let geometry = serde_json::to_value(geometry).map_err(json_error)?;
    let geometry_type = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
    let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);

    let kind = match optional_str(props, "feature_kind")? {
        Some(kind) => kind,
        None => match geometry_type {
            "Point" => "poi",
            "LineString" => "road",
            other => return Err(GeoError::Format(format!("unsupported geometry type {other:?}"))),
        },
    };

    match (kind, geometry_type) {
        ("poi", "Point") => {
            let poi = Poi::new(
                required_str(props, "id")?,
                optional_str(props, "name")?.unwrap_or_default(),
                optional_str(props, "type")?.unwrap_or_default(),
                parse_position(coordinates)?,
            )?;
            Ok(Parsed::Poi(poi))
        }
        ("road", "LineString") => {
            let line = coordinates
                .as_array()
                .ok_or_else(|| GeoError::Format("LineString coordinates must be an array".into()))?;
            let mut polyline = line.iter().map(parse_position).collect::<GeoResult<Vec<_>>>()?;
            let single_point = match props.get(SINGLE_POINT) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(GeoError::Format(format!(
                        "property {SINGLE_POINT:?} must be a boolean, got {other}"
                    )));
                }
            };
            if single_point {
                if polyline.len() != 2 || polyline[0] != polyline[1] {
                    return Err(GeoError::Format(format!(
                        "{SINGLE_POINT:?} road must repeat one position twice"
                    )));
                }
                polyline.truncate(1);
            }
            let oneway = match props.get("oneway") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(GeoError::Format(format!("property \"oneway\" must be a boolean, got {other}")));
                }
            };
            let road = Road::new(
                required_str(props, "id")?,
                optional_str(props, "name")?.unwrap_or_default(),
                optional_str(props, "type")?.unwrap_or_default(),
                required_str(props, "from")?,
                required_str(props, "to")?,
                polyline,
            )?
            .with_oneway(oneway);
            Ok(Parsed::Road(road))
        }
        (kind, geometry_type) => Err(GeoError::Format(format!(
            "feature_kind {kind:?} does not fit geometry type {geometry_type:?}"
        ))),
    }
}

fn optional_str<'a>(props: &'a Map<String, Value>, key: &str) -> GeoResult<Option<&'a str>> {
    match props.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(GeoError::Format(format!("property {key:?} must be a string, got {other}"))),
    }
}

fn required_str<'a>(props: &'a Map<String, Value>, key: &str) -> GeoResult<&'a str> {
    optional_str(props, key)?.ok_or_else(|| GeoError::Format(format!("missing property {key:?}")))
}

/// `[lon, lat, ...]` → `Coordinate`.  Extra members (altitude) are ignored.
fn parse_position(value: &Value) -> GeoResult<Coordinate> {
    let (lon, lat) = match value.as_array().map(Vec::as_slice) {
        Some([lon, lat, ..]) => (lon.as_f64(), lat.as_f64()),
        _ => (None, None),
    };
    let (Some(lon), Some(lat)) = (lon, lat) else {
        return Err(GeoError::Format(format!("invalid position {value}")));
    };
    Coordinate::new(lat, lon).map_err(|e| GeoError::Format(e.to_string()))
}
