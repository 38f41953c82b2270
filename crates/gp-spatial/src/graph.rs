//! Location graph: POI/road arenas, adjacency, and a spatial node index.
//!
//! # Data layout
//!
//! POIs and roads live in dense arenas addressed by [`NodeIdx`] / [`EdgeIdx`].
//! The string ids used at the API boundary map to slots through hash indices.
//! Adjacency is a per-node list of `(edge slot, neighbour slot)` pairs, so
//! nodes and edges never hold references to each other.
//!
//! Removed entities leave a tombstone (`None`) in their arena slot; slots are
//! never reused, so indices handed out earlier stay meaningful.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over `[lat, lon]` backs nearest-node snapping and
//! radius queries.  Candidates are gathered in degree space and then ranked
//! by haversine distance, so results are exact in metres.
//!
//! # Concurrency
//!
//! Insertion and removal take `&mut self`; every query takes `&self`.  Within
//! one process the borrow checker therefore enforces the reader/writer
//! discipline: any number of path-finding or perception queries may share a
//! graph, but none can run while it is being mutated.  Callers that share a
//! graph across threads with interior mutability (e.g. `RwLock`) must keep
//! the same discipline.

use log::debug;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use gp_core::{Coordinate, EdgeIdx, EntityKind, GeoError, GeoResult, NodeIdx, Poi, Road};

/// Endpoint POIs and the first/last polyline vertices must agree this closely.
pub const ENDPOINT_TOLERANCE_DEG: f64 = 1e-6;

/// Metres per degree of latitude on the mean-radius sphere.
const METRES_PER_DEG: f64 = gp_core::geo::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    idx:   NodeIdx,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space; only used to seed the
    /// exact haversine search.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Adjacency ─────────────────────────────────────────────────────────────────

/// One entry of a node's adjacency list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Adjacency {
    pub edge:     EdgeIdx,
    pub neighbor: NodeIdx,
    /// `false` when the edge is one-way towards this node.
    pub traversable: bool,
}

// ── LocationGraph ─────────────────────────────────────────────────────────────

/// Node/edge store for a road network.
///
/// Build incrementally with [`add_node`](Self::add_node) and
/// [`add_edge`](Self::add_edge); every road's endpoints must already be
/// present.  Iteration order is insertion order.
#[derive(Debug, Default)]
pub struct LocationGraph {
    nodes:      Vec<Option<Poi>>,
    edges:      Vec<Option<Road>>,
    /// `(from, to)` slots of each edge, parallel to `edges`.
    edge_ends:  Vec<(NodeIdx, NodeIdx)>,
    adjacency:  Vec<Vec<Adjacency>>,
    node_index: FxHashMap<String, NodeIdx>,
    edge_index: FxHashMap<String, EdgeIdx>,
    spatial_idx: RTree<NodeEntry>,
}

impl LocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert a POI.
    ///
    /// # Errors
    ///
    /// [`GeoError::Conflict`] if a node with the same id exists.
    pub fn add_node(&mut self, poi: Poi) -> GeoResult<NodeIdx> {
        if self.node_index.contains_key(poi.id()) {
            return Err(GeoError::Conflict { kind: EntityKind::Node, id: poi.id().to_string() });
        }
        let idx = NodeIdx::try_from(self.nodes.len())
            .map_err(|_| GeoError::validation("node arena is full"))?;

        let pos = poi.coordinate();
        self.spatial_idx.insert(NodeEntry { point: [pos.lat(), pos.lon()], idx });
        self.node_index.insert(poi.id().to_string(), idx);
        debug!("add_node {} at {} as {idx}", poi.id(), pos);
        self.nodes.push(Some(poi));
        self.adjacency.push(Vec::new());
        Ok(idx)
    }

    /// Insert a road and register it in both endpoints' adjacency lists.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NodeNotFound`] if either endpoint id is absent.
    /// - [`GeoError::Conflict`] if a road with the same id exists.
    /// - [`GeoError::Validation`] if the polyline does not start and end at
    ///   the endpoint POIs' coordinates.
    pub fn add_edge(&mut self, road: Road) -> GeoResult<EdgeIdx> {
        let from = self.require_node(road.from_node())?;
        let to = self.require_node(road.to_node())?;
        if self.edge_index.contains_key(road.id()) {
            return Err(GeoError::Conflict { kind: EntityKind::Edge, id: road.id().to_string() });
        }
        self.check_endpoints(&road, from, to)?;

        let idx = EdgeIdx::try_from(self.edges.len())
            .map_err(|_| GeoError::validation("edge arena is full"))?;

        self.adjacency[from.index()].push(Adjacency { edge: idx, neighbor: to, traversable: true });
        self.adjacency[to.index()].push(Adjacency {
            edge: idx,
            neighbor: from,
            traversable: !road.is_oneway(),
        });
        self.edge_index.insert(road.id().to_string(), idx);
        debug!(
            "add_edge {} ({} → {}, {:.1} m) as {idx}",
            road.id(),
            road.from_node(),
            road.to_node(),
            road.length_m()
        );
        self.edges.push(Some(road));
        self.edge_ends.push((from, to));
        Ok(idx)
    }

    /// Remove a road, pruning it from both endpoints' adjacency lists.
    /// Returns `None` if no such road exists.
    pub fn remove_edge(&mut self, edge_id: &str) -> Option<Road> {
        let idx = self.edge_index.remove(edge_id)?;
        let (from, to) = self.edge_ends[idx.index()];
        self.adjacency[from.index()].retain(|a| a.edge != idx);
        self.adjacency[to.index()].retain(|a| a.edge != idx);
        debug!("remove_edge {edge_id}");
        self.edges[idx.index()].take()
    }

    /// Remove a POI together with every road incident to it.
    /// Returns `None` if no such node exists.
    pub fn remove_node(&mut self, node_id: &str) -> Option<Poi> {
        let idx = *self.node_index.get(node_id)?;
        let incident: Vec<String> = self.adjacency[idx.index()]
            .iter()
            .filter_map(|a| self.road_at(a.edge).map(|r| r.id().to_string()))
            .collect();
        for edge_id in incident {
            self.remove_edge(&edge_id);
        }

        self.node_index.remove(node_id);
        let poi = self.nodes[idx.index()].take()?;
        let pos = poi.coordinate();
        self.spatial_idx.remove(&NodeEntry { point: [pos.lat(), pos.lon()], idx });
        debug!("remove_node {node_id}");
        Some(poi)
    }

    fn require_node(&self, node_id: &str) -> GeoResult<NodeIdx> {
        self.node_idx(node_id)
            .ok_or_else(|| GeoError::NodeNotFound(node_id.to_string()))
    }

    fn check_endpoints(&self, road: &Road, from: NodeIdx, to: NodeIdx) -> GeoResult<()> {
        let line = road.polyline();
        let (first, last) = (line[0], line[line.len() - 1]);
        let ends = [(from, first, "first"), (to, last, "last")];
        for (node, vertex, which) in ends {
            let Some(poi) = self.poi_at(node) else {
                return Err(GeoError::NodeNotFound(node.to_string()));
            };
            if !poi.coordinate().approx_eq(vertex, ENDPOINT_TOLERANCE_DEG) {
                return Err(GeoError::validation(format!(
                    "road {:?}: {which} polyline point {vertex} does not coincide with node {:?} at {}",
                    road.id(),
                    poi.id(),
                    poi.coordinate()
                )));
            }
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn node(&self, node_id: &str) -> Option<&Poi> {
        self.node_idx(node_id).and_then(|i| self.poi_at(i))
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Road> {
        self.edge_idx(edge_id).and_then(|i| self.road_at(i))
    }

    pub fn node_idx(&self, node_id: &str) -> Option<NodeIdx> {
        self.node_index.get(node_id).copied()
    }

    pub fn edge_idx(&self, edge_id: &str) -> Option<EdgeIdx> {
        self.edge_index.get(edge_id).copied()
    }

    /// POI in slot `idx`, or `None` for an invalid or removed slot.
    #[inline]
    pub fn poi_at(&self, idx: NodeIdx) -> Option<&Poi> {
        self.nodes.get(idx.index()).and_then(Option::as_ref)
    }

    /// Road in slot `idx`, or `None` for an invalid or removed slot.
    #[inline]
    pub fn road_at(&self, idx: EdgeIdx) -> Option<&Road> {
        self.edges.get(idx.index()).and_then(Option::as_ref)
    }

    /// `(from, to)` node slots of an edge slot.
    #[inline]
    pub fn edge_ends(&self, idx: EdgeIdx) -> (NodeIdx, NodeIdx) {
        self.edge_ends[idx.index()]
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_index.is_empty()
    }

    /// Arena length including tombstones; the size for per-node scratch
    /// arrays indexed by [`NodeIdx`].
    pub fn node_slots(&self) -> usize {
        self.nodes.len()
    }

    /// Arena length including tombstones, for per-edge scratch arrays.
    pub fn edge_slots(&self) -> usize {
        self.edges.len()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Adjacency list of a node as `(edge id, neighbour id)` pairs.
    ///
    /// # Errors
    ///
    /// [`GeoError::NodeNotFound`] if the node does not exist.
    pub fn neighbors(&self, node_id: &str) -> GeoResult<Vec<(&str, &str)>> {
        let idx = self.require_node(node_id)?;
        Ok(self.adjacency[idx.index()]
            .iter()
            .filter_map(|a| Some((self.road_at(a.edge)?.id(), self.poi_at(a.neighbor)?.id())))
            .collect())
    }

    /// Number of road ends incident to a node (a self-loop counts twice).
    ///
    /// # Errors
    ///
    /// [`GeoError::NodeNotFound`] if the node does not exist.
    pub fn degree(&self, node_id: &str) -> GeoResult<usize> {
        let idx = self.require_node(node_id)?;
        Ok(self.adjacency[idx.index()].len())
    }

    /// Raw adjacency of a node slot; empty for invalid or removed slots.
    #[inline]
    pub fn adjacent(&self, idx: NodeIdx) -> &[Adjacency] {
        self.adjacency.get(idx.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live POIs in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Poi> + '_ {
        self.nodes.iter().flatten()
    }

    /// Live roads in insertion order.
    pub fn roads(&self) -> impl Iterator<Item = &Road> + '_ {
        self.edges.iter().flatten()
    }

    /// Live roads with their slots, in insertion order.
    pub fn indexed_roads(&self) -> impl Iterator<Item = (EdgeIdx, &Road)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (EdgeIdx(i as u32), r)))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// All nodes within `radius_m` metres of `pos`, nearest first (ties by
    /// node id).
    pub fn nodes_within(&self, pos: Coordinate, radius_m: f64) -> Vec<(&Poi, f64)> {
        if !(radius_m >= 0.0) {
            return Vec::new();
        }
        // Degree-space bounding box that contains the metric disc.  The
        // longitude span widens with the highest latitude the box reaches.
        let lat_pad = radius_m / METRES_PER_DEG * 1.01 + 1e-9;
        let max_lat = (pos.lat().abs() + lat_pad).min(90.0);
        let cos_lat = max_lat.to_radians().cos();
        let lon_pad = if cos_lat < 1e-9 {
            360.0
        } else {
            (radius_m / (METRES_PER_DEG * cos_lat) * 1.01 + 1e-9).min(360.0)
        };
        let envelope = AABB::from_corners(
            [pos.lat() - lat_pad, pos.lon() - lon_pad],
            [pos.lat() + lat_pad, pos.lon() + lon_pad],
        );

        // Boxes spilling over the antimeridian are handled by the wrap-around
        // queries below.
        let mut candidates: Vec<NodeIdx> = self
            .spatial_idx
            .locate_in_envelope(&envelope)
            .map(|e| e.idx)
            .collect();
        for shift in [-360.0, 360.0] {
            let lo_lon = pos.lon() - lon_pad + shift;
            let hi_lon = pos.lon() + lon_pad + shift;
            if hi_lon < -180.0 || lo_lon > 180.0 {
                continue;
            }
            let wrapped = AABB::from_corners(
                [pos.lat() - lat_pad, lo_lon],
                [pos.lat() + lat_pad, hi_lon],
            );
            candidates.extend(self.spatial_idx.locate_in_envelope(&wrapped).map(|e| e.idx));
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut hits: Vec<(&Poi, f64)> = candidates
            .into_iter()
            .filter_map(|idx| self.poi_at(idx))
            .map(|poi| (poi, pos.distance_m(poi.coordinate())))
            .filter(|&(_, d)| d <= radius_m)
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id().cmp(b.0.id())));
        hits
    }

    /// The node nearest to `pos` by geodesic distance (ties by node id).
    ///
    /// Returns `None` only if the graph has no nodes.
    pub fn nearest_node(&self, pos: Coordinate) -> Option<&Poi> {
        // Degree-space nearest neighbour bounds the true nearest distance.
        let seed = self.spatial_idx.nearest_neighbor(&[pos.lat(), pos.lon()])?;
        let seed_poi = self.poi_at(seed.idx)?;
        let bound = pos.distance_m(seed_poi.coordinate());
        self.nodes_within(pos, bound)
            .into_iter()
            .next()
            .map(|(poi, _)| poi)
            .or(Some(seed_poi))
    }
}
