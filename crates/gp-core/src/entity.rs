//! Graph entities: points of interest (nodes) and roads (edges).
//!
//! Both are immutable once built.  The type tag is an open string
//! (`"landmark"`, `"junction"`, `"primary"`, …) rather than an enum so that
//! loaders can carry through whatever classification the source data uses;
//! consumers that need behaviour per tag look it up in a table such as
//! [`SpeedTable`](crate::SpeedTable).

use crate::{Coordinate, GeoError, GeoResult};

fn require_id(what: &str, id: &str) -> GeoResult<()> {
    if id.trim().is_empty() {
        return Err(GeoError::validation(format!("{what} id must not be empty")));
    }
    Ok(())
}

// ── Poi ───────────────────────────────────────────────────────────────────────

/// A named, typed location anchored at one coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    id:         String,
    name:       String,
    kind:       String,
    coordinate: Coordinate,
}

impl Poi {
    /// # Errors
    ///
    /// [`GeoError::Validation`] if `id` is blank.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        coordinate: Coordinate,
    ) -> GeoResult<Self> {
        let id = id.into();
        require_id("POI", &id)?;
        Ok(Self { id, name: name.into(), kind: kind.into(), coordinate })
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> &str { &self.kind }
    pub fn coordinate(&self) -> Coordinate { self.coordinate }
}

// ── Road ──────────────────────────────────────────────────────────────────────

/// A named, typed edge between two node ids with explicit polyline geometry.
///
/// The polyline runs from `from_node` to `to_node`.  Roads are traversable in
/// both directions unless built with [`Road::with_oneway`].
#[derive(Clone, Debug, PartialEq)]
pub struct Road {
    id:        String,
    name:      String,
    kind:      String,
    from_node: String,
    to_node:   String,
    polyline:  Vec<Coordinate>,
    length_m:  f64,
    oneway:    bool,
}

impl Road {
    /// Build a road; the length is derived from the polyline.
    ///
    /// # Errors
    ///
    /// [`GeoError::Validation`] if any id is blank or the polyline is empty.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        from_node: impl Into<String>,
        to_node: impl Into<String>,
        polyline: Vec<Coordinate>,
    ) -> GeoResult<Self> {
        let id = id.into();
        let from_node = from_node.into();
        let to_node = to_node.into();
        require_id("road", &id)?;
        require_id("road endpoint", &from_node)?;
        require_id("road endpoint", &to_node)?;
        if polyline.is_empty() {
            return Err(GeoError::validation(format!("road {id:?} has an empty polyline")));
        }

        let length_m = polyline
            .windows(2)
            .map(|w| w[0].distance_m(w[1]))
            .sum();

        Ok(Self {
            id,
            name: name.into(),
            kind: kind.into(),
            from_node,
            to_node,
            polyline,
            length_m,
            oneway: false,
        })
    }

    /// Restrict travel to the `from_node → to_node` direction.
    pub fn with_oneway(mut self, oneway: bool) -> Self {
        self.oneway = oneway;
        self
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> &str { &self.kind }
    pub fn from_node(&self) -> &str { &self.from_node }
    pub fn to_node(&self) -> &str { &self.to_node }
    pub fn polyline(&self) -> &[Coordinate] { &self.polyline }
    pub fn is_oneway(&self) -> bool { self.oneway }

    /// Sum of consecutive-point geodesic distances, in metres.
    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    /// Consecutive vertex pairs.  A single-point polyline yields one
    /// degenerate segment so that it can still be matched against.
    pub fn segments(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        let degenerate = (self.polyline.len() == 1).then(|| (self.polyline[0], self.polyline[0]));
        self.polyline
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(degenerate)
    }

    /// The endpoint opposite `node_id`, or `None` if `node_id` is not an
    /// endpoint of this road.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if node_id == self.from_node {
            Some(&self.to_node)
        } else if node_id == self.to_node {
            Some(&self.from_node)
        } else {
            None
        }
    }

    /// Polyline vertices in travel order when entering at `from_node`.
    pub fn oriented_from<'a>(&'a self, node_id: &str) -> Box<dyn Iterator<Item = Coordinate> + 'a> {
        if node_id == self.from_node {
            Box::new(self.polyline.iter().copied())
        } else {
            Box::new(self.polyline.iter().rev().copied())
        }
    }
}
