//! Fetch, mount, interact, unmount and remount an explore view without a
//! browser: the layout engine and the network are both in-memory.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use futures::executor::block_on;
use futures::future::{FutureExt, LocalBoxFuture};
use kb_explorer::api::ApiClient;
use kb_explorer::config::AppConfig;
use kb_explorer::context::ExploreContext;
use kb_explorer::error::Result;
use kb_explorer::view_state::dto::ViewportDto;
use kb_explorer::view_state::{
	CameraTransform, EngineEvent, GraphEvent, LayoutAdapter, LayoutEngine, LayoutPlan,
	LayoutPositions, ManualScheduler, MountPhase, Point, ViewKey, ViewportSource,
};

const N1_N2: &str = r#"{
	"nodes": [
		{"uid": "N1", "title": "Graphs", "kind": "Topic"},
		{"uid": "N2", "title": "Tree traversal", "kind": "Skill"}
	],
	"edges": [{"source": "N1", "target": "N2", "kind": "contains"}],
	"center_uid": "N1",
	"depth": 1
}"#;

/// Answers every request immediately with the same body and counts calls.
#[derive(Default)]
struct CountingSource {
	calls: Cell<usize>,
}

impl ViewportSource for CountingSource {
	fn viewport(&self, _key: &ViewKey) -> LocalBoxFuture<'static, Result<ViewportDto>> {
		self.calls.set(self.calls.get() + 1);
		futures::future::ready(ViewportDto::from_json(N1_N2)).boxed_local()
	}
}

/// Places cold nodes on a line and keeps warm seeds where they are.
#[derive(Default)]
struct ScriptEngine {
	plan: Option<LayoutPlan>,
	camera: CameraTransform,
	positions: LayoutPositions,
	focused: Option<String>,
	moves: Vec<CameraTransform>,
	events: Vec<EngineEvent>,
}

impl ScriptEngine {
	fn build(plan: LayoutPlan) -> Self {
		let positions = plan
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let placed = Point::new(40.0 * i as f64, -15.0 * i as f64);
				(node.id.clone(), node.seed.unwrap_or(placed))
			})
			.collect();
		Self {
			plan: Some(plan),
			positions,
			..Default::default()
		}
	}
}

impl LayoutEngine for ScriptEngine {
	fn camera(&self) -> CameraTransform {
		self.camera
	}

	fn move_to(&mut self, camera: CameraTransform) {
		self.camera = camera;
		self.moves.push(camera);
		self.events.push(EngineEvent::AnimationFinished);
	}

	fn focus(&mut self, node_id: &str, scale: f64) {
		self.focused = Some(node_id.to_string());
		self.camera.scale = scale;
	}

	fn positions(&self) -> LayoutPositions {
		self.positions.clone()
	}

	fn drain_events(&mut self) -> Vec<EngineEvent> {
		std::mem::take(&mut self.events)
	}
}

fn context() -> (Rc<CountingSource>, ExploreContext) {
	let source = Rc::new(CountingSource::default());
	let ctx = ExploreContext::with_source(AppConfig::default(), ApiClient::new(""), source.clone());
	(source, ctx)
}

fn adapter(ctx: &ExploreContext) -> Rc<RefCell<LayoutAdapter<ScriptEngine>>> {
	Rc::new(RefCell::new(LayoutAdapter::new(ctx.config.layout.clone())))
}

#[test]
fn remount_restores_the_view_the_user_left() {
	let (source, ctx) = context();
	let key = ViewKey::new("N1", 1);

	// First visit: network, cold start focused on the selection.
	let session = ctx.session();
	let snapshot = block_on(session.load(key.clone())).unwrap();
	assert_eq!(source.calls.get(), 1);
	assert_eq!(snapshot.nodes.len(), 2);
	assert_eq!(snapshot.nodes[0].category, "concept");
	assert_eq!(snapshot.nodes[1].category, "skill");

	let first = adapter(&ctx);
	assert!(first.borrow_mut().mount(
		snapshot.clone(),
		"N1",
		&mut ctx.cache.borrow_mut(),
		ScriptEngine::build,
	));
	{
		let view = first.borrow();
		let engine = view.engine().unwrap();
		assert!(!engine.plan.as_ref().unwrap().is_warm());
		assert_eq!(engine.focused.as_deref(), Some("N1"));
	}

	// The user drags N2 and zooms out.
	let zoomed = CameraTransform::new(Point::new(12.0, -4.0), 0.8);
	{
		let mut view = first.borrow_mut();
		let engine = view.engine_mut().unwrap();
		engine.positions.insert("N2".into(), Point::new(300.0, 150.0));
		engine.camera = zoomed;
		engine.events.push(EngineEvent::DragEnd);
		engine.events.push(EngineEvent::Zoom);
	}
	let events = first.borrow_mut().pump();
	assert_eq!(events.last(), Some(&GraphEvent::CameraChanged(zoomed)));

	// Navigate away.
	session.cancel();
	first.borrow_mut().teardown(&mut ctx.cache.borrow_mut());
	assert_eq!(first.borrow().phase(), MountPhase::Flushed);
	{
		let cache = ctx.cache.borrow();
		let entry = cache.read(&key).unwrap();
		assert_eq!(entry.camera, Some(zoomed));
		assert_eq!(
			entry.positions.as_ref().unwrap()["N2"],
			Point::new(300.0, 150.0)
		);
	}

	// Come back: no request, warm start, camera restored after the delay.
	let session = ctx.session();
	let again = block_on(session.load(key.clone())).unwrap();
	assert_eq!(source.calls.get(), 1);
	assert!(Arc::ptr_eq(&snapshot, &again));

	let second = adapter(&ctx);
	let scheduler = ManualScheduler::new();
	second
		.borrow_mut()
		.mount(again, "N1", &mut ctx.cache.borrow_mut(), ScriptEngine::build);
	LayoutAdapter::schedule_restore(&second, &scheduler);
	{
		let view = second.borrow();
		let engine = view.engine().unwrap();
		assert!(engine.plan.as_ref().unwrap().is_warm());
		assert_eq!(engine.focused, None);
		assert_eq!(engine.positions["N2"], Point::new(300.0, 150.0));
	}

	scheduler.run_all();
	assert_eq!(second.borrow().engine().unwrap().moves, vec![zoomed]);
	assert_eq!(
		second.borrow_mut().pump(),
		vec![GraphEvent::CameraChanged(zoomed)]
	);
}

#[test]
fn depth_change_replaces_the_slot() {
	let (source, ctx) = context();
	let session = ctx.session();
	let shallow = ViewKey::new("N1", 1);
	let deep = ViewKey::new("N1", 2);

	let view = adapter(&ctx);
	let snapshot = block_on(session.load(shallow.clone())).unwrap();
	view.borrow_mut()
		.mount(snapshot, "N1", &mut ctx.cache.borrow_mut(), ScriptEngine::build);

	let snapshot = block_on(session.load(deep.clone())).unwrap();
	assert_eq!(snapshot.key(), deep);
	view.borrow_mut()
		.mount(snapshot, "N1", &mut ctx.cache.borrow_mut(), ScriptEngine::build);
	assert_eq!(source.calls.get(), 2);

	// The shallow layout was not written over the deeper snapshot.
	{
		let cache = ctx.cache.borrow();
		assert!(cache.read(&shallow).is_none());
		let entry = cache.read(&deep).unwrap();
		assert_eq!(entry.positions, None);
		assert_eq!(entry.camera, None);
	}

	// Going back is a miss again: one slot only.
	block_on(session.load(shallow)).unwrap();
	assert_eq!(source.calls.get(), 3);
}

#[test]
fn reset_view_refetches_and_starts_cold() {
	let (source, ctx) = context();
	let session = ctx.session();
	let key = ViewKey::new("N1", 1);

	let view = adapter(&ctx);
	let snapshot = block_on(session.load(key.clone())).unwrap();
	view.borrow_mut()
		.mount(snapshot, "N1", &mut ctx.cache.borrow_mut(), ScriptEngine::build);

	let fresh = block_on(session.reload(key.clone())).unwrap();
	assert_eq!(source.calls.get(), 2);
	assert!(view.borrow_mut().mount(
		fresh,
		"N1",
		&mut ctx.cache.borrow_mut(),
		ScriptEngine::build,
	));
	assert!(!view.borrow().engine().unwrap().plan.as_ref().unwrap().is_warm());
	assert_eq!(ctx.cache.borrow().read(&key).unwrap().positions, None);
}
