use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::types::{EdgeInfo, NodeInfo, node_color};
use crate::view_state::model::clamp_scale;
use crate::view_state::{
	CameraTransform, EngineEvent, LayoutEngine, LayoutPlan, LayoutPositions, Point, StartMode,
};

pub const NODE_RADIUS: f64 = 6.0;
pub const HIT_RADIUS: f64 = 12.0;
/// Pointer travel (px) below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;
const DEFAULT_RING: f64 = 100.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// Physics budget of a cold start.
#[derive(Clone, Debug, Default)]
pub struct Stabilization {
	pub remaining: u32,
	pub iterations: u32,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	pub stabilization: Stabilization,
	pub edges: Vec<EdgeInfo>,
	ids: HashMap<String, DefaultNodeIdx>,
	follow: Option<DefaultNodeIdx>,
	events: Vec<EngineEvent>,
}

impl ForceGraphState {
	pub fn new(plan: LayoutPlan, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut ids = HashMap::with_capacity(plan.nodes.len());
		let count = plan.nodes.len().max(1);

		for (i, node) in plan.nodes.into_iter().enumerate() {
			if ids.contains_key(&node.id) {
				continue;
			}
			let (x, y) = match node.seed {
				Some(p) => (p.x as f32, p.y as f32),
				None => {
					let angle = (i as f64) * 2.0 * PI / count as f64;
					(
						(DEFAULT_RING * angle.cos()) as f32,
						(DEFAULT_RING * angle.sin()) as f32,
					)
				}
			};

			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					color: node_color(node.kind.as_deref(), &node.category).to_string(),
					id: node.id.clone(),
					label: node.label,
					category: node.category,
				},
			});
			ids.insert(node.id, idx);
		}

		let mut edges = Vec::with_capacity(plan.edges.len());
		for edge in plan.edges {
			if let (Some(&src), Some(&tgt)) = (ids.get(&edge.source), ids.get(&edge.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
				edges.push(EdgeInfo {
					source: src,
					target: tgt,
					label: edge.label,
				});
			}
		}

		let stabilization = match plan.start {
			StartMode::Cold { iterations } => Stabilization {
				remaining: iterations,
				iterations: 0,
			},
			StartMode::Warm => Stabilization::default(),
		};

		Self {
			graph,
			edges,
			ids,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: stabilization.remaining > 0,
			flow_time: 0.0,
			stabilization,
			follow: None,
			events: Vec::new(),
		}
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<&str> {
		self.ids
			.iter()
			.find_map(|(id, &i)| (i == idx).then_some(id.as_str()))
	}

	fn node_position(&self, idx: DefaultNodeIdx) -> Option<(f64, f64)> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		match node.and_then(|idx| self.node_id(idx).map(str::to_owned)) {
			Some(id) => self.events.push(EngineEvent::HoverNode { node: id }),
			None => self.events.push(EngineEvent::BlurNode),
		}

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in &self.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let (nx, ny) = self.node_position(idx).unwrap_or_default();
			self.drag = DragState {
				active: true,
				moved: false,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start_x: nx as f32,
				node_start_y: ny as f32,
			};
		} else {
			self.pan = PanState {
				active: true,
				moved: false,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		// Update hover state when not dragging
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let travelled = (x - self.drag.start_x).hypot(y - self.drag.start_y);
			self.drag.moved |= travelled > CLICK_SLOP;
			if !self.drag.moved {
				return;
			}
			if let Some(idx) = self.drag.node_idx {
				let (dx, dy) = (
					(x - self.drag.start_x) / self.transform.k,
					(y - self.drag.start_y) / self.transform.k,
				);
				let (nx, ny) = (
					self.drag.node_start_x + dx as f32,
					self.drag.node_start_y + dy as f32,
				);
				self.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.x = nx;
						node.data.y = ny;
						node.data.is_anchor = true;
					}
				});
			}
		} else if self.pan.active {
			let travelled = (x - self.pan.start_x).hypot(y - self.pan.start_y);
			self.pan.moved |= travelled > CLICK_SLOP;
			if self.pan.moved {
				self.follow = None;
				self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
				self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
			}
		}
	}

	pub fn pointer_up(&mut self) {
		if self.drag.active {
			let node = self
				.drag
				.node_idx
				.and_then(|idx| self.node_id(idx).map(str::to_owned));
			if self.drag.moved {
				self.events.push(EngineEvent::DragEnd);
			} else {
				self.events.push(EngineEvent::Click { node });
			}
		} else if self.pan.active {
			if self.pan.moved {
				self.events.push(EngineEvent::DragEnd);
			} else {
				self.events.push(EngineEvent::Click { node: None });
			}
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	pub fn pointer_leave(&mut self) {
		if (self.drag.active && self.drag.moved) || (self.pan.active && self.pan.moved) {
			self.events.push(EngineEvent::DragEnd);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	pub fn double_click(&mut self, x: f64, y: f64) {
		let node = self
			.node_at_position(x, y)
			.and_then(|idx| self.node_id(idx).map(str::to_owned));
		self.events.push(EngineEvent::DoubleClick { node });
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = clamp_scale(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.follow = None;
		self.events.push(EngineEvent::Zoom);
	}

	fn center_on(&mut self, idx: DefaultNodeIdx) {
		if let Some((x, y)) = self.node_position(idx) {
			self.transform.x = self.width / 2.0 - x * self.transform.k;
			self.transform.y = self.height / 2.0 - y * self.transform.k;
		}
	}

	pub fn tick(&mut self, dt: f32) {
		if self.animation_running {
			self.graph.update(dt);
			self.stabilization.iterations += 1;
			self.stabilization.remaining = self.stabilization.remaining.saturating_sub(1);
			if let Some(idx) = self.follow {
				self.center_on(idx);
			}
			if self.stabilization.remaining == 0 {
				// Frozen regardless of convergence.
				self.animation_running = false;
				self.follow = None;
				debug!(
					"force graph: stabilized after {} iterations",
					self.stabilization.iterations
				);
				self.events.push(EngineEvent::Stabilized {
					iterations: self.stabilization.iterations,
				});
			}
		}
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Keeps the graph point at the middle of the canvas where it was.
	pub fn resize(&mut self, width: f64, height: f64) {
		let camera = self.camera();
		self.width = width;
		self.height = height;
		self.apply_camera(camera);
	}

	fn apply_camera(&mut self, camera: CameraTransform) {
		self.transform.k = camera.scale;
		self.transform.x = self.width / 2.0 - camera.position.x * camera.scale;
		self.transform.y = self.height / 2.0 - camera.position.y * camera.scale;
	}
}

impl LayoutEngine for ForceGraphState {
	fn camera(&self) -> CameraTransform {
		let k = self.transform.k;
		CameraTransform::new(
			Point::new(
				(self.width / 2.0 - self.transform.x) / k,
				(self.height / 2.0 - self.transform.y) / k,
			),
			k,
		)
	}

	fn move_to(&mut self, camera: CameraTransform) {
		self.follow = None;
		self.apply_camera(camera);
		self.events.push(EngineEvent::AnimationFinished);
	}

	fn focus(&mut self, node_id: &str, scale: f64) {
		let Some(&idx) = self.ids.get(node_id) else {
			return;
		};
		self.transform.k = clamp_scale(scale);
		self.center_on(idx);
		// Keep the node centered while the layout is still settling.
		if self.animation_running {
			self.follow = Some(idx);
		}
	}

	fn positions(&self) -> LayoutPositions {
		let mut positions = LayoutPositions::with_capacity(self.ids.len());
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		positions
	}

	fn drain_events(&mut self) -> Vec<EngineEvent> {
		std::mem::take(&mut self.events)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::view_state::engine::{PlannedEdge, PlannedNode};

	fn plan(seeds: &[(&str, Option<Point>)], start: StartMode) -> LayoutPlan {
		let nodes = seeds
			.iter()
			.map(|(id, seed)| PlannedNode {
				id: id.to_string(),
				label: id.to_string(),
				category: "concept".into(),
				kind: None,
				seed: *seed,
			})
			.collect();
		let edges = vec![PlannedEdge {
			id: "A->B:0".into(),
			source: "A".into(),
			target: "B".into(),
			label: Some("PREREQ".into()),
			weight: None,
		}];
		LayoutPlan { nodes, edges, start }
	}

	#[test]
	fn warm_start_uses_seeds_and_stays_frozen() {
		let mut state = ForceGraphState::new(
			plan(
				&[("A", Some(Point::new(40.0, -20.0))), ("B", Some(Point::new(-5.0, 5.0)))],
				StartMode::Warm,
			),
			800.0,
			600.0,
		);
		assert!(!state.animation_running);

		state.tick(0.016);
		let positions = state.positions();
		assert_eq!(positions["A"], Point::new(40.0, -20.0));
		assert_eq!(positions["B"], Point::new(-5.0, 5.0));
		assert!(state.drain_events().is_empty());
	}

	#[test]
	fn warm_start_places_unseeded_nodes_by_default() {
		let state = ForceGraphState::new(
			plan(&[("A", Some(Point::new(1.0, 1.0))), ("B", None)], StartMode::Warm),
			800.0,
			600.0,
		);
		let positions = state.positions();
		assert_eq!(positions["A"], Point::new(1.0, 1.0));
		assert!(positions.contains_key("B"));
	}

	#[test]
	fn cold_start_freezes_after_budget() {
		let mut state = ForceGraphState::new(
			plan(&[("A", None), ("B", None)], StartMode::Cold { iterations: 3 }),
			800.0,
			600.0,
		);
		assert!(state.animation_running);
		for _ in 0..5 {
			state.tick(0.016);
		}
		assert!(!state.animation_running);
		assert_eq!(state.stabilization.iterations, 3);
		assert_eq!(
			state.drain_events(),
			vec![EngineEvent::Stabilized { iterations: 3 }]
		);
	}

	#[test]
	fn camera_round_trips_through_move_to() {
		let mut state = ForceGraphState::new(plan(&[("A", None)], StartMode::Warm), 800.0, 600.0);
		let target = CameraTransform::new(Point::new(12.0, -30.0), 2.0);
		state.move_to(target);
		assert_eq!(state.camera(), target);
		assert_eq!(state.drain_events(), vec![EngineEvent::AnimationFinished]);

		state.resize(1024.0, 768.0);
		assert_eq!(state.camera(), target);
	}

	#[test]
	fn focus_centers_node() {
		let mut state = ForceGraphState::new(
			plan(&[("A", Some(Point::new(50.0, 25.0)))], StartMode::Warm),
			800.0,
			600.0,
		);
		state.focus("A", 1.1);
		let camera = state.camera();
		assert!((camera.position.x - 50.0).abs() < 1e-9);
		assert!((camera.position.y - 25.0).abs() < 1e-9);
		assert_eq!(camera.scale, 1.1);
	}

	#[test]
	fn press_without_travel_is_a_click() {
		let mut state = ForceGraphState::new(
			plan(&[("A", Some(Point::new(0.0, 0.0)))], StartMode::Warm),
			800.0,
			600.0,
		);
		// Graph origin sits at the canvas center.
		state.pointer_down(400.0, 300.0);
		state.pointer_up();
		assert_eq!(
			state.drain_events(),
			vec![EngineEvent::Click {
				node: Some("A".into())
			}]
		);

		state.pointer_down(10.0, 10.0);
		state.pointer_move(60.0, 60.0);
		state.pointer_up();
		let events = state.drain_events();
		assert_eq!(events.last(), Some(&EngineEvent::DragEnd));
		assert_ne!(state.camera().position, Point::new(0.0, 0.0));
	}

	#[test]
	fn wheel_zoom_emits_event() {
		let mut state = ForceGraphState::new(plan(&[("A", None)], StartMode::Warm), 800.0, 600.0);
		state.wheel(400.0, 300.0, -1.0);
		assert!((state.camera().scale - 1.1).abs() < 1e-9);
		assert_eq!(state.drain_events(), vec![EngineEvent::Zoom]);
	}
}
