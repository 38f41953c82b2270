//! Shortest and alternative route search over a [`LocationGraph`].
//!
//! # Cost units
//!
//! Dijkstra runs on road length in **metres**.  `PathResult` reports the
//! total distance in metres and the total travel time in **seconds**, where
//! each road contributes `length / speed(road type)` from the configured
//! [`SpeedTable`](gp_core::SpeedTable).
//!
//! # Determinism
//!
//! When several routes share the minimum distance, each node keeps the
//! predecessor whose edge-id chain from the start is lexicographically
//! smallest.  Results therefore do not depend on insertion order or hash
//! seeds.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use log::{debug, trace, warn};

use gp_core::{Coordinate, EdgeIdx, GeoError, GeoResult, NodeIdx, Poi, Road, RoutingConfig};

use crate::graph::LocationGraph;

// ── PathResult ────────────────────────────────────────────────────────────────

/// A route between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Node ids from start to end, inclusive.
    pub nodes: Vec<String>,
    /// Road ids in travel order; one fewer than `nodes`.
    pub edges: Vec<String>,
    /// Stitched polyline in travel order, without duplicated junction points.
    pub coordinates: Vec<Coordinate>,
    /// Sum of traversed road lengths, in metres.
    pub total_distance_m: f64,
    /// Sum of per-road travel times, in seconds.
    pub total_time_secs: f64,
}

impl PathResult {
    pub fn total_time_hours(&self) -> f64 {
        self.total_time_secs / 3_600.0
    }

    /// `true` if the start and end are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── PathFinder ────────────────────────────────────────────────────────────────

/// Single-shot route queries over an immutable graph borrow.
pub struct PathFinder<'g> {
    graph:  &'g LocationGraph,
    config: RoutingConfig,
}

impl<'g> PathFinder<'g> {
    /// A path finder with [`RoutingConfig::default`].
    pub fn new(graph: &'g LocationGraph) -> Self {
        Self { graph, config: RoutingConfig::default() }
    }

    /// # Errors
    ///
    /// [`GeoError::Validation`] if `config` fails [`RoutingConfig::validate`].
    pub fn with_config(graph: &'g LocationGraph, config: RoutingConfig) -> GeoResult<Self> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Travel time for one road at its type's configured speed, in seconds.
    pub fn travel_time_secs(&self, road: &Road) -> f64 {
        let speeds = &self.config.speeds;
        if !speeds.contains(road.kind()) {
            trace!("road {} has unlisted type {:?}; using fallback speed", road.id(), road.kind());
        }
        road.length_m() / speeds.speed_mps(road.kind())
    }

    /// Dijkstra shortest path by road length.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NodeNotFound`] if either id is absent.
    /// - [`GeoError::NoPath`] if the nodes are disconnected.
    pub fn find_shortest_path(&self, start_id: &str, end_id: &str) -> GeoResult<PathResult> {
        let (from, to) = self.resolve(start_id, end_id)?;
        let edges = self
            .search(from, to, |road, _| road.length_m())
            .ok_or_else(|| no_path(start_id, end_id))?;
        self.build_result(from, &edges)
    }

    /// Up to `k` routes with pairwise distinct edge sets, strictly ascending
    /// by distance, the shortest path first.
    ///
    /// Each round multiplies the weight of every edge on the previously found
    /// route by the configured penalty and searches again.  The search stops
    /// once `k` routes are collected or after
    /// `k * alternative_iteration_factor` rounds, so fewer than `k` routes is
    /// a normal outcome on graphs with little route diversity.  A candidate
    /// whose distance ties an already-collected route is skipped and the
    /// search carries on.
    ///
    /// # Errors
    ///
    /// Same as [`find_shortest_path`](Self::find_shortest_path).
    pub fn find_alternative_paths(
        &self,
        start_id: &str,
        end_id: &str,
        k: usize,
    ) -> GeoResult<Vec<PathResult>> {
        let (from, to) = self.resolve(start_id, end_id)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let shortest = self
            .search(from, to, |road, _| road.length_m())
            .ok_or_else(|| no_path(start_id, end_id))?;

        let mut multipliers = vec![1.0_f64; self.graph.edge_slots()];
        let mut seen: HashSet<Vec<EdgeIdx>> = HashSet::new();
        seen.insert(edge_set(&shortest));
        let mut results = vec![self.build_result(from, &shortest)?];
        let mut last = shortest;

        let max_rounds = k.saturating_mul(self.config.alternative_iteration_factor);
        let mut rounds = 0;
        while results.len() < k && rounds < max_rounds {
            rounds += 1;

            // Penalise the route found in the previous round, whether or not
            // it was new, so repeated rounds keep pushing the search away.
            for e in &last {
                multipliers[e.index()] *= self.config.alternative_penalty;
            }

            let Some(candidate) =
                self.search(from, to, |road, e| road.length_m() * multipliers[e.index()])
            else {
                break;
            };

            if !seen.insert(edge_set(&candidate)) {
                debug!("alternative {start_id} → {end_id}: round {rounds} repeated a known route");
            } else {
                let result = self.build_result(from, &candidate)?;
                let d = result.total_distance_m;
                if results.iter().any(|r| (r.total_distance_m - d).abs() <= tie_epsilon(d)) {
                    debug!(
                        "alternative {start_id} → {end_id}: round {rounds} route ties a known distance ({d:.3} m)"
                    );
                } else {
                    debug!(
                        "alternative {start_id} → {end_id}: round {rounds} found route #{} ({} edges)",
                        results.len() + 1,
                        candidate.len()
                    );
                    results.push(result);
                }
            }
            last = candidate;
        }

        if results.len() < k {
            warn!(
                "alternative {start_id} → {end_id}: {} of {k} routes after {rounds} rounds",
                results.len()
            );
        }

        results.sort_by(|a, b| a.total_distance_m.total_cmp(&b.total_distance_m));
        Ok(results)
    }

    /// Snap both coordinates to their nearest graph nodes and route between
    /// them.
    ///
    /// # Errors
    ///
    /// [`GeoError::NodeNotFound`] on an empty graph, otherwise as
    /// [`find_shortest_path`](Self::find_shortest_path).
    pub fn find_path_between(&self, from: Coordinate, to: Coordinate) -> GeoResult<PathResult> {
        let snap = |pos: Coordinate| {
            self.graph
                .nearest_node(pos)
                .map(Poi::id)
                .ok_or_else(|| GeoError::NodeNotFound(pos.to_string()))
        };
        let (start, end) = (snap(from)?, snap(to)?);
        debug!("find_path_between {from} → {to} snapped to {start} → {end}");
        self.find_shortest_path(start, end)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn resolve(&self, start_id: &str, end_id: &str) -> GeoResult<(NodeIdx, NodeIdx)> {
        let lookup = |id: &str| {
            self.graph
                .node_idx(id)
                .ok_or_else(|| GeoError::NodeNotFound(id.to_string()))
        };
        Ok((lookup(start_id)?, lookup(end_id)?))
    }

    /// Dijkstra from `from` to `to` under `weight`.  Returns the traversed
    /// edge slots in order, or `None` if `to` is unreachable.
    fn search<W>(&self, from: NodeIdx, to: NodeIdx, weight: W) -> Option<Vec<EdgeIdx>>
    where
        W: Fn(&Road, EdgeIdx) -> f64,
    {
        let graph = self.graph;
        if from == to {
            return Some(Vec::new());
        }

        let n = graph.node_slots();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev_edge = vec![EdgeIdx::INVALID; n];
        let mut settled = vec![false; n];

        dist[from.index()] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(State { cost: 0.0, node: from });

        while let Some(State { cost, node }) = heap.pop() {
            if settled[node.index()] {
                continue;
            }
            settled[node.index()] = true;
            if node == to {
                return Some(self.trace_back(&prev_edge, to));
            }

            for adj in graph.adjacent(node) {
                if !adj.traversable || settled[adj.neighbor.index()] {
                    continue;
                }
                let Some(road) = graph.road_at(adj.edge) else { continue };
                let v = adj.neighbor.index();
                let new_cost = cost + weight(road, adj.edge);
                let old = dist[v];

                let improves = if new_cost < old - tie_epsilon(old) {
                    true
                } else if new_cost <= old + tie_epsilon(old) {
                    // Equal within rounding: keep the smaller edge-id chain.
                    self.chain_cmp(&prev_edge, node, adj.edge, adj.neighbor) == Ordering::Less
                } else {
                    false
                };

                if improves {
                    dist[v] = new_cost.min(old);
                    prev_edge[v] = adj.edge;
                    heap.push(State { cost: dist[v], node: adj.neighbor });
                }
            }
        }

        None
    }

    /// The node reached from `at` by travelling backwards along `edge`.
    fn predecessor(&self, edge: EdgeIdx, at: NodeIdx) -> NodeIdx {
        let (a, b) = self.graph.edge_ends(edge);
        if b == at { a } else { b }
    }

    fn trace_back(&self, prev_edge: &[EdgeIdx], to: NodeIdx) -> Vec<EdgeIdx> {
        let mut edges = Vec::new();
        let mut cur = to;
        while prev_edge[cur.index()].is_valid() {
            let e = prev_edge[cur.index()];
            edges.push(e);
            cur = self.predecessor(e, cur);
        }
        edges.reverse();
        edges
    }

    fn edge_id_chain(&self, prev_edge: &[EdgeIdx], node: NodeIdx) -> Vec<&'g str> {
        self.trace_back(prev_edge, node)
            .into_iter()
            .filter_map(|e| self.graph.road_at(e).map(Road::id))
            .collect()
    }

    /// Compare the chain `start → via → (edge) → target` against the chain
    /// currently recorded for `target`.
    fn chain_cmp(&self, prev_edge: &[EdgeIdx], via: NodeIdx, edge: EdgeIdx, target: NodeIdx) -> Ordering {
        let mut candidate = self.edge_id_chain(prev_edge, via);
        candidate.extend(self.graph.road_at(edge).map(Road::id));
        let current = self.edge_id_chain(prev_edge, target);
        candidate.cmp(&current)
    }

    fn build_result(&self, from: NodeIdx, edges: &[EdgeIdx]) -> GeoResult<PathResult> {
        let graph = self.graph;
        let start = graph
            .poi_at(from)
            .ok_or_else(|| GeoError::NodeNotFound(from.to_string()))?;

        let mut nodes = vec![start.id().to_string()];
        let mut edge_ids = Vec::with_capacity(edges.len());
        let mut coordinates = vec![start.coordinate()];
        let mut total_distance_m = 0.0;
        let mut total_time_secs = 0.0;
        let mut cur = from;

        for &e in edges {
            let road = graph
                .road_at(e)
                .ok_or_else(|| GeoError::EdgeNotFound(e.to_string()))?;
            let cur_id = graph
                .poi_at(cur)
                .map(Poi::id)
                .ok_or_else(|| GeoError::NodeNotFound(cur.to_string()))?;

            // The first vertex of each oriented polyline is the junction we
            // are already standing on.
            coordinates.extend(road.oriented_from(cur_id).skip(1));
            total_distance_m += road.length_m();
            total_time_secs += self.travel_time_secs(road);
            edge_ids.push(road.id().to_string());

            cur = self.predecessor(e, cur);
            let next = graph
                .poi_at(cur)
                .ok_or_else(|| GeoError::NodeNotFound(cur.to_string()))?;
            nodes.push(next.id().to_string());
        }

        Ok(PathResult {
            nodes,
            edges: edge_ids,
            coordinates,
            total_distance_m,
            total_time_secs,
        })
    }
}

fn no_path(from: &str, to: &str) -> GeoError {
    GeoError::NoPath { from: from.to_string(), to: to.to_string() }
}

fn edge_set(edges: &[EdgeIdx]) -> Vec<EdgeIdx> {
    let mut set = edges.to_vec();
    set.sort_unstable();
    set.dedup();
    set
}

#[inline]
fn tie_epsilon(d: f64) -> f64 {
    if d.is_finite() { 1e-9 * d.max(1.0) } else { 0.0 }
}

// ── Heap state ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct State {
    cost: f64,
    node: NodeIdx,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap), then by
        // node slot for a deterministic pop order.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
