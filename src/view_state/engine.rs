//! Seam between the view-state engine and a force-directed renderer.

use super::model::{CameraTransform, LayoutPositions, Point};

/// Events in the renderer's own vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
	Click { node: Option<String> },
	DoubleClick { node: Option<String> },
	HoverNode { node: String },
	BlurNode,
	/// A node or the background finished being dragged.
	DragEnd,
	Zoom,
	Stabilized { iterations: u32 },
	/// A programmatic camera move completed.
	AnimationFinished,
}

impl EngineEvent {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Click { .. } => "click",
			Self::DoubleClick { .. } => "doubleClick",
			Self::HoverNode { .. } => "hoverNode",
			Self::BlurNode => "blurNode",
			Self::DragEnd => "dragEnd",
			Self::Zoom => "zoom",
			Self::Stabilized { .. } => "stabilized",
			Self::AnimationFinished => "animationFinished",
		}
	}
}

/// Domain events the rest of the explorer reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	Selected(String),
	DoubleClicked(String),
	Hovered(Option<String>),
	CameraChanged(CameraTransform),
	Stabilized(CameraTransform),
}

/// How the engine should place nodes when it is constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum StartMode {
	/// Default placement, physics runs for at most `iterations` ticks.
	Cold { iterations: u32 },
	/// Seeded placement, physics stays frozen.
	Warm,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedNode {
	pub id: String,
	pub label: String,
	pub category: String,
	pub kind: Option<String>,
	/// Cached coordinate, only present on a warm start.
	pub seed: Option<Point>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub label: Option<String>,
	pub weight: Option<f64>,
}

/// Everything needed to construct an engine instance.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
	pub nodes: Vec<PlannedNode>,
	pub edges: Vec<PlannedEdge>,
	pub start: StartMode,
}

impl LayoutPlan {
	pub fn is_warm(&self) -> bool {
		self.start == StartMode::Warm
	}
}

/// A running layout instance. Dropping it destroys it.
pub trait LayoutEngine {
	fn camera(&self) -> CameraTransform;
	/// Moves the camera; completes with [`EngineEvent::AnimationFinished`].
	fn move_to(&mut self, camera: CameraTransform);
	/// Centers the camera on a node at the given zoom.
	fn focus(&mut self, node_id: &str, scale: f64);
	fn positions(&self) -> LayoutPositions;
	fn drain_events(&mut self) -> Vec<EngineEvent>;
}
