use std::sync::Arc;

use futures::future::LocalBoxFuture;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::components::assistant_prompt::AssistantPrompt;
use crate::components::force_graph::{ForceGraphCanvas, node_color};
use crate::context::ExploreContext;
use crate::error::{ExploreError, Result};
use crate::view_state::model::Node;
use crate::view_state::{ViewKey, ViewportSnapshot};

type Load = LocalBoxFuture<'static, Result<Arc<ViewportSnapshot>>>;

fn find_node(snapshot: &Option<Arc<ViewportSnapshot>>, id: &str) -> Option<Node> {
	snapshot
		.as_ref()
		.and_then(|s| s.nodes.iter().find(|n| n.id == id).cloned())
}

/// Viewport around the selected node, with depth control, hover details and
/// the assistant prompt.
#[component]
pub fn Explore(ctx: ExploreContext) -> impl IntoView {
	let config = ctx.config.clone();
	let session = StoredValue::new_local(ctx.session());

	let selected = RwSignal::new(config.default_start_node.clone());
	let depth = RwSignal::new(config.default_depth);
	let snapshot = RwSignal::new(Option::<Arc<ViewportSnapshot>>::None);
	let loading = RwSignal::new(false);
	let error = RwSignal::new(Option::<String>::None);
	let hovered = RwSignal::new(Option::<String>::None);
	let details = RwSignal::new(Option::<String>::None);

	on_cleanup(move || {
		session.try_with_value(|s| s.cancel());
	});

	let run = move |load: Load| {
		loading.set(true);
		spawn_local(async move {
			match load.await {
				Ok(snap) => {
					snapshot.set(Some(snap));
					error.set(None);
					loading.set(false);
				}
				// A newer request owns the loading state.
				Err(ExploreError::StaleResultDiscarded) => {}
				Err(err) => {
					warn!("explore: {err}");
					error.set(Some(err.to_string()));
					loading.set(false);
				}
			}
		});
	};

	Effect::new(move |_| {
		let key = ViewKey::new(selected.get(), depth.get());
		if let Some(load) = session.try_with_value(|s| s.load(key)) {
			run(load);
		}
	});

	let reset_view = move |_: ev::MouseEvent| {
		let key = ViewKey::new(selected.get_untracked(), depth.get_untracked());
		info!("explore: resetting view for {key}");
		if let Some(load) = session.try_with_value(|s| s.reload(key)) {
			run(load);
		}
	};

	let on_depth = move |ev: ev::Event| match event_target_value(&ev).parse::<u32>() {
		Ok(value) => depth.set(value),
		Err(_) => warn!("explore: ignoring depth {:?}", event_target_value(&ev)),
	};

	let on_select = Callback::new(move |id: String| {
		if id != selected.get_untracked() {
			selected.set(id);
		}
	});
	let on_hover = Callback::new(move |node: Option<String>| hovered.set(node));
	let on_open = Callback::new(move |id: String| details.set(Some(id)));

	let depth_options = config.depth_options.clone();

	view! {
		<div class="explore-page">
			<header class="explore-toolbar">
				<div class="explore-title">
					<span class="muted">"Explore"</span>
					<strong>{move || selected.get()}</strong>
				</div>
				<label class="muted">"Depth"</label>
				<select on:change=on_depth prop:value=move || depth.get().to_string()>
					{depth_options
						.into_iter()
						.map(|d| view! { <option value=d.to_string()>{d}</option> })
						.collect_view()}
				</select>
				<button on:click=reset_view>"Reset view"</button>
			</header>

			{move || {
				error
					.get()
					.map(|message| {
						view! {
							<div class="explore-error">
								<strong>"Error"</strong>
								<pre>{message}</pre>
							</div>
						}
					})
			}}

			<div class="explore-canvas">
				<ForceGraphCanvas
					ctx=ctx.clone()
					snapshot=snapshot
					selected=selected
					on_select=on_select
					on_hover=on_hover
					on_open=on_open
				/>

				<Show when=move || loading.get()>
					<div class="explore-overlay loading">"Loading..."</div>
				</Show>

				{move || {
					snapshot
						.with(|s| s.as_ref().map(|s| (s.nodes.len(), s.edges.len())))
						.map(|(nodes, edges)| {
							view! {
								<div class="explore-overlay counters">
									<div>{format!("Nodes: {nodes}")}</div>
									<div>{format!("Edges: {edges}")}</div>
								</div>
							}
						})
				}}

				{move || {
					let id = hovered.get()?;
					let node = snapshot.with(|s| find_node(s, &id))?;
					let swatch = format!("background: {}", node_color(node.kind.as_deref(), &node.category));
					Some(view! {
						<div class="explore-overlay tooltip">
							<span class="swatch" style=swatch />
							<strong>{node.display_label}</strong>
							<span class="muted">{node.category}</span>
						</div>
					})
				}}

				{move || {
					let id = details.get()?;
					let node = snapshot.with(|s| find_node(s, &id))?;
					let attributes = serde_json::to_string_pretty(&node.attributes).unwrap_or_default();
					Some(view! {
						<div class="explore-overlay details">
							<button on:click=move |_| details.set(None)>"Close"</button>
							<h3>{node.display_label}</h3>
							<div class="muted">{format!("{} - {}", node.id, node.category)}</div>
							<pre>{attributes}</pre>
						</div>
					})
				}}
			</div>

			<AssistantPrompt ctx=ctx.clone() center=selected depth=depth related=details />
		</div>
	}
}
