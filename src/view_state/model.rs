//! Viewport data shared by the fetcher, the cache and the layout adapter.

use std::collections::{HashMap, HashSet};

/// Map of arbitrary node attributes carried through from the graph service.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Request key of a viewport: the center node and the traversal depth.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewKey {
	pub center_id: String,
	pub depth: u32,
}

impl ViewKey {
	pub fn new(center_id: impl Into<String>, depth: u32) -> Self {
		Self {
			center_id: center_id.into(),
			depth,
		}
	}
}

impl std::fmt::Display for ViewKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}@{}", self.center_id, self.depth)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub display_label: String,
	pub category: String,
	/// Service `kind` as received, before it was mapped to `category`.
	pub kind: Option<String>,
	pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: String,
	pub source_id: String,
	pub target_id: String,
	pub relation_label: Option<String>,
	pub weight: Option<f64>,
}

impl Edge {
	/// Edge ids are derived from the endpoints and the position in the source list.
	pub fn derive_id(source_id: &str, target_id: &str, index: usize) -> String {
		format!("{source_id}->{target_id}:{index}")
	}
}

/// Subgraph around a center node. Never mutated once stored in the cache.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportSnapshot {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
	pub center_id: String,
	pub depth: u32,
}

impl ViewportSnapshot {
	/// Builds a snapshot for `key`, dropping nodes whose id was already seen.
	pub fn new(key: &ViewKey, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		Self {
			nodes: dedup_nodes(nodes),
			edges,
			center_id: key.center_id.clone(),
			depth: key.depth,
		}
	}

	pub fn key(&self) -> ViewKey {
		ViewKey::new(self.center_id.clone(), self.depth)
	}

	pub fn matches(&self, key: &ViewKey) -> bool {
		self.center_id == key.center_id && self.depth == key.depth
	}

	pub fn contains_node(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	/// Edges with at least one endpoint missing from `nodes`.
	pub fn dangling_edges(&self) -> Vec<&Edge> {
		let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		self.edges
			.iter()
			.filter(|e| !ids.contains(e.source_id.as_str()) || !ids.contains(e.target_id.as_str()))
			.collect()
	}
}

/// Keeps the first node for every id, preserving order.
pub fn dedup_nodes(nodes: Vec<Node>) -> Vec<Node> {
	let mut seen = HashSet::with_capacity(nodes.len());
	nodes
		.into_iter()
		.filter(|n| seen.insert(n.id.clone()))
		.collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;

/// Pan/zoom of the rendering viewport. `position` is the graph-space point
/// shown at the middle of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransform {
	pub position: Point,
	pub scale: f64,
}

impl CameraTransform {
	pub fn new(position: Point, scale: f64) -> Self {
		Self {
			position,
			scale: clamp_scale(scale),
		}
	}
}

impl Default for CameraTransform {
	fn default() -> Self {
		Self::new(Point::default(), 1.0)
	}
}

/// Clamps a zoom factor into the supported range; non-finite or non-positive
/// values collapse to 1.
pub fn clamp_scale(scale: f64) -> f64 {
	if !scale.is_finite() || scale <= 0.0 {
		return 1.0;
	}
	scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Node coordinates captured from a running layout engine.
pub type LayoutPositions = HashMap<String, Point>;
