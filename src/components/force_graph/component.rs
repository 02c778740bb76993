use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::context::ExploreContext;
use crate::view_state::{BrowserScheduler, GraphEvent, LayoutAdapter, ViewportSnapshot};

type Adapter = Rc<RefCell<LayoutAdapter<ForceGraphState>>>;

/// Where domain events from the canvas go.
#[derive(Clone, Copy)]
struct Handlers {
	on_select: Callback<String>,
	on_open: Option<Callback<String>>,
	on_hover: Callback<Option<String>>,
}

impl Handlers {
	fn dispatch(&self, events: Vec<GraphEvent>) {
		for event in events {
			match event {
				GraphEvent::Selected(id) => self.on_select.run(id),
				GraphEvent::DoubleClicked(id) => {
					if let Some(on_open) = self.on_open {
						on_open.run(id);
					}
				}
				GraphEvent::Hovered(node) => self.on_hover.run(node),
				GraphEvent::CameraChanged(_) | GraphEvent::Stabilized(_) => {}
			}
		}
	}
}

/// Everything the canvas must release when it unmounts.
struct CanvasHandles {
	ctx: ExploreContext,
	adapter: Adapter,
	alive: Rc<Cell<bool>>,
	resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl CanvasHandles {
	fn release(&self) {
		self.alive.set(false);
		// Flush happens inside teardown, before the engine is dropped.
		self.adapter
			.borrow_mut()
			.teardown(&mut self.ctx.cache.borrow_mut());
		if let (Some(window), Some(cb)) = (web_sys::window(), self.resize_cb.borrow_mut().take()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

fn canvas_size(canvas: &HtmlCanvasElement, window: &Window, fullscreen: bool) -> (f64, f64) {
	let inner = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	if fullscreen {
		(
			inner(window.inner_width(), 800.0),
			inner(window.inner_height(), 600.0),
		)
	} else {
		let parent = canvas.parent_element();
		(
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(800.0),
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(600.0),
		)
	}
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn with_engine(adapter: &Adapter, f: impl FnOnce(&mut ForceGraphState)) {
	if let Some(state) = adapter.borrow_mut().engine_mut() {
		f(state);
	}
}

/// Force-directed view of a viewport snapshot. Positions and camera survive
/// remounts through the explore context's view cache.
#[component]
pub fn ForceGraphCanvas(
	ctx: ExploreContext,
	#[prop(into)] snapshot: Signal<Option<Arc<ViewportSnapshot>>>,
	#[prop(into)] selected: Signal<String>,
	#[prop(into)] on_select: Callback<String>,
	#[prop(into)] on_hover: Callback<Option<String>>,
	#[prop(optional, into)] on_open: Option<Callback<String>>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let adapter: Adapter = Rc::new(RefCell::new(LayoutAdapter::new(ctx.config.layout.clone())));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = Rc::new(Cell::new(true));
	let handlers = Handlers {
		on_select,
		on_open,
		on_hover,
	};

	let handles = StoredValue::new_local(CanvasHandles {
		ctx: ctx.clone(),
		adapter: adapter.clone(),
		alive: alive.clone(),
		resize_cb: resize_cb.clone(),
	});
	on_cleanup(move || {
		handles.try_with_value(|h| h.release());
	});

	let (adapter_init, animate_init, resize_cb_init, alive_init) =
		(adapter.clone(), animate.clone(), resize_cb.clone(), alive.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let snapshot = snapshot.get();
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = canvas_size(&canvas, &window, fullscreen);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		match snapshot {
			Some(snapshot) => {
				let selected = selected.get_untracked();
				let mounted = adapter_init.borrow_mut().mount(
					snapshot,
					&selected,
					&mut ctx.cache.borrow_mut(),
					|plan| ForceGraphState::new(plan, w, h),
				);
				if mounted {
					LayoutAdapter::schedule_restore(&adapter_init, &BrowserScheduler);
				} else {
					with_engine(&adapter_init, |s| s.resize(w, h));
				}
			}
			None => adapter_init
				.borrow_mut()
				.teardown(&mut ctx.cache.borrow_mut()),
		}

		if resize_cb_init.borrow().is_none() {
			let (adapter_resize, canvas_resize) = (adapter_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = canvas_size(&canvas_resize, &win, fullscreen);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				with_engine(&adapter_resize, |s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let ctx2d: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx2d) => ctx2d,
			None => {
				warn!("force graph: 2d context unavailable");
				return;
			}
		};

		let (adapter_anim, animate_inner, alive_anim) =
			(adapter_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.get() {
				return;
			}
			let events = {
				let mut adapter = adapter_anim.borrow_mut();
				if let Some(s) = adapter.engine_mut() {
					s.tick(0.016);
					render::render(s, &ctx2d);
				}
				adapter.pump()
			};
			handlers.dispatch(events);
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let adapter_md = adapter.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			with_engine(&adapter_md, |s| s.pointer_down(x, y));
		}
	};

	let adapter_mm = adapter.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			with_engine(&adapter_mm, |s| s.pointer_move(x, y));
		}
	};

	let adapter_mu = adapter.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_engine(&adapter_mu, |s| s.pointer_up());
	};

	let adapter_ml = adapter.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_engine(&adapter_ml, |s| s.pointer_leave());
	};

	let adapter_dc = adapter.clone();
	let on_dblclick = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			with_engine(&adapter_dc, |s| s.double_click(x, y));
		}
	};

	let adapter_wh = adapter.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			with_engine(&adapter_wh, |s| s.wheel(x, y, ev.delta_y()));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
