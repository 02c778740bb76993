//! Bridges snapshots and cached layout into a running engine instance.
//!
//! Per mount point the adapter cycles through
//! `Uninitialized -> EngineRunning -> Flushed`, and a new snapshot always
//! tears the old engine down (flushing its layout) before building the next
//! one, so at most one engine is alive at a time.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, warn};

use super::cache::ViewCache;
use super::engine::{
	EngineEvent, GraphEvent, LayoutEngine, LayoutPlan, PlannedEdge, PlannedNode, StartMode,
};
use super::model::{CameraTransform, LayoutPositions, ViewKey, ViewportSnapshot};
use super::recorder::CameraRecorder;
use super::schedule::{ScheduledTask, Scheduler};
use crate::config::LayoutConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountPhase {
	Uninitialized,
	EngineRunning,
	Flushed,
}

/// Builds the construction plan for an engine. Warm when `positions` is
/// given: every node with a cached coordinate is seeded from it, the rest
/// fall back to default placement. Duplicate node ids are dropped (first
/// wins) and edges with a missing endpoint are left out.
pub fn build_plan(
	snapshot: &ViewportSnapshot,
	positions: Option<&LayoutPositions>,
	config: &LayoutConfig,
) -> LayoutPlan {
	let mut seen = HashSet::with_capacity(snapshot.nodes.len());
	let nodes: Vec<PlannedNode> = snapshot
		.nodes
		.iter()
		.filter(|n| seen.insert(n.id.as_str()))
		.map(|n| PlannedNode {
			id: n.id.clone(),
			label: n.display_label.clone(),
			category: n.category.clone(),
			kind: n.kind.clone(),
			seed: positions.and_then(|p| p.get(&n.id).copied()),
		})
		.collect();

	if nodes.len() < snapshot.nodes.len() {
		warn!(
			"layout: dropped {} duplicate node(s) in {}",
			snapshot.nodes.len() - nodes.len(),
			snapshot.key()
		);
	}

	let edges: Vec<PlannedEdge> = snapshot
		.edges
		.iter()
		.filter(|e| seen.contains(e.source_id.as_str()) && seen.contains(e.target_id.as_str()))
		.map(|e| PlannedEdge {
			id: e.id.clone(),
			source: e.source_id.clone(),
			target: e.target_id.clone(),
			label: e.relation_label.clone(),
			weight: e.weight,
		})
		.collect();

	if edges.len() < snapshot.edges.len() {
		warn!(
			"layout: dropped {} dangling edge(s) in {}",
			snapshot.edges.len() - edges.len(),
			snapshot.key()
		);
	}

	let start = match positions {
		Some(_) => StartMode::Warm,
		None => StartMode::Cold {
			iterations: config.stabilization_iterations,
		},
	};

	LayoutPlan {
		nodes,
		edges,
		start,
	}
}

/// Maps the renderer's vocabulary onto domain events.
pub fn translate<E: LayoutEngine>(event: EngineEvent, engine: &E) -> Option<GraphEvent> {
	match event {
		EngineEvent::Click { node } => node.map(GraphEvent::Selected),
		EngineEvent::DoubleClick { node } => node.map(GraphEvent::DoubleClicked),
		EngineEvent::HoverNode { node } => Some(GraphEvent::Hovered(Some(node))),
		EngineEvent::BlurNode => Some(GraphEvent::Hovered(None)),
		EngineEvent::DragEnd | EngineEvent::Zoom | EngineEvent::AnimationFinished => {
			Some(GraphEvent::CameraChanged(engine.camera()))
		}
		EngineEvent::Stabilized { .. } => Some(GraphEvent::Stabilized(engine.camera())),
	}
}

struct Mounted<E> {
	snapshot: Arc<ViewportSnapshot>,
	engine: E,
	recorder: CameraRecorder,
	pending_restore: Option<CameraTransform>,
	restore_task: Option<ScheduledTask>,
}

pub struct LayoutAdapter<E: LayoutEngine> {
	config: LayoutConfig,
	phase: MountPhase,
	mounted: Option<Mounted<E>>,
}

impl<E: LayoutEngine> LayoutAdapter<E> {
	pub fn new(config: LayoutConfig) -> Self {
		Self {
			config,
			phase: MountPhase::Uninitialized,
			mounted: None,
		}
	}

	pub fn phase(&self) -> MountPhase {
		self.phase
	}

	pub fn mounted_key(&self) -> Option<ViewKey> {
		self.mounted.as_ref().map(|m| m.snapshot.key())
	}

	pub fn engine(&self) -> Option<&E> {
		self.mounted.as_ref().map(|m| &m.engine)
	}

	pub fn engine_mut(&mut self) -> Option<&mut E> {
		self.mounted.as_mut().map(|m| &mut m.engine)
	}

	pub fn latest_camera(&self) -> Option<CameraTransform> {
		self.mounted.as_ref().and_then(|m| m.recorder.latest())
	}

	/// Mounts `snapshot`, replacing whatever engine is running. Returns
	/// `false` when that exact snapshot is already mounted.
	pub fn mount(
		&mut self,
		snapshot: Arc<ViewportSnapshot>,
		selected: &str,
		cache: &mut ViewCache,
		build: impl FnOnce(LayoutPlan) -> E,
	) -> bool {
		if let Some(current) = &self.mounted {
			if Arc::ptr_eq(&current.snapshot, &snapshot) {
				return false;
			}
		}
		self.teardown(cache);
		self.phase = MountPhase::Uninitialized;

		let key = snapshot.key();
		let (camera, positions) = cache
			.read(&key)
			.map(|e| (e.camera, e.positions.clone()))
			.unwrap_or((None, None));

		let plan = build_plan(&snapshot, positions.as_ref(), &self.config);
		let warm = plan.is_warm();
		debug!(
			"layout: mounting {key} ({} start, {} nodes)",
			if warm { "warm" } else { "cold" },
			plan.nodes.len()
		);
		let mut engine = build(plan);

		let pending_restore = if warm {
			camera
		} else {
			if snapshot.contains_node(selected) {
				engine.focus(selected, self.config.focus_scale);
			}
			None
		};

		// Until the deferred restore lands, the camera to keep is the cached one.
		let recorder = CameraRecorder::with_latest(key, pending_restore);
		self.mounted = Some(Mounted {
			snapshot,
			engine,
			recorder,
			pending_restore,
			restore_task: None,
		});
		self.phase = MountPhase::EngineRunning;
		true
	}

	/// Arms the deferred camera restore of a warm start. The engine needs a
	/// tick to learn its container size before `move_to` is meaningful.
	pub fn schedule_restore(this: &Rc<RefCell<Self>>, scheduler: &dyn Scheduler)
	where
		E: 'static,
	{
		let (key, camera) = {
			let mut adapter = this.borrow_mut();
			let Some(mounted) = adapter.mounted.as_mut() else {
				return;
			};
			let Some(camera) = mounted.pending_restore.take() else {
				return;
			};
			(mounted.snapshot.key(), camera)
		};

		let weak = Rc::downgrade(this);
		let delay = this.borrow().config.camera_restore_delay;
		let task = scheduler.schedule(
			delay,
			Box::new(move || {
				if let Some(adapter) = weak.upgrade() {
					adapter.borrow_mut().restore_camera(&key, camera);
				}
			}),
		);

		match this.borrow_mut().mounted.as_mut() {
			Some(mounted) => mounted.restore_task = Some(task),
			None => task.cancel(),
		}
	}

	fn restore_camera(&mut self, key: &ViewKey, camera: CameraTransform) {
		let Some(mounted) = self.mounted.as_mut() else {
			return;
		};
		if mounted.recorder.key() != key {
			return;
		}
		mounted.restore_task = None;
		debug!("layout: restoring camera for {key}");
		mounted.engine.move_to(camera);
	}

	/// Drains engine events, feeds the recorder and returns domain events.
	pub fn pump(&mut self) -> Vec<GraphEvent> {
		let Some(mounted) = self.mounted.as_mut() else {
			return Vec::new();
		};
		let mut events = Vec::new();
		for native in mounted.engine.drain_events() {
			let name = native.name();
			let Some(event) = translate(native, &mounted.engine) else {
				continue;
			};
			debug!("layout: {name} -> {event:?}");
			mounted.recorder.observe(&event);
			events.push(event);
		}
		events
	}

	/// Cancels the pending restore, flushes the layout into the cache and
	/// only then destroys the engine. Nothing is written when the slot no
	/// longer holds the mounted snapshot (another key, or a reloaded copy).
	pub fn teardown(&mut self, cache: &mut ViewCache) {
		self.pump();
		let Some(mut mounted) = self.mounted.take() else {
			return;
		};
		if let Some(task) = mounted.restore_task.take() {
			task.cancel();
		}
		let owns_slot = cache
			.read(mounted.recorder.key())
			.is_some_and(|e| Arc::ptr_eq(&e.snapshot, &mounted.snapshot));
		if owns_slot {
			mounted.recorder.flush(&mounted.engine, cache);
		} else {
			debug!("layout: {} replaced in cache, layout dropped", mounted.recorder.key());
		}
		drop(mounted);
		self.phase = MountPhase::Flushed;
	}
}
