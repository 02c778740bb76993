use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::api::{AssistantAction, AssistantRequest, answer_text};
use crate::context::ExploreContext;
use crate::view_state::transactions::tracked;

/// Question or tool request about the node being explored. Every submission
/// is recorded in the transaction log with the full request as its payload.
#[component]
pub fn AssistantPrompt(
	ctx: ExploreContext,
	#[prop(into)] center: Signal<String>,
	#[prop(into)] depth: Signal<u32>,
	/// Node opened in the details panel; the other end of a relation question.
	#[prop(into)]
	related: Signal<Option<String>>,
) -> impl IntoView {
	let ctx = StoredValue::new_local(ctx);
	let text = RwSignal::new(String::new());
	let action = RwSignal::new(Option::<AssistantAction>::None);
	let reply = RwSignal::new(Option::<Result<String, String>>::None);
	let busy = RwSignal::new(false);

	let submit = move || {
		let message = text.get_untracked().trim().to_string();
		let action = action.get_untracked();
		// Tools run without a question; a free-form ask needs one.
		if (action.is_none() && message.is_empty()) || busy.get_untracked() {
			return;
		}
		let center = center.get_untracked();
		let mut request = AssistantRequest::about(&center, depth.get_untracked(), message).with_action(action);
		if let Some(other) = related.get_untracked() {
			request = request.with_target(&other);
		}
		let payload = match serde_json::to_value(&request) {
			Ok(payload) => payload,
			Err(err) => {
				warn!("assistant: cannot record request: {err}");
				return;
			}
		};
		let (api, log) = ctx.with_value(|c| (c.api.clone(), c.transactions.clone()));
		busy.set(true);
		spawn_local(async move {
			let outcome = tracked(log, payload, async { api.assistant_chat(&request).await }).await;
			match outcome {
				Ok(body) => {
					reply.set(Some(Ok(answer_text(&body))));
					text.set(String::new());
				}
				Err(err) => {
					warn!("assistant: {err}");
					reply.set(Some(Err(err.to_string())));
				}
			}
			busy.set(false);
		});
	};

	let on_keydown = move |ev: ev::KeyboardEvent| {
		if ev.key() == "Enter" {
			ev.prevent_default();
			submit();
		}
	};

	let on_action = move |ev: ev::Event| action.set(AssistantAction::parse(&event_target_value(&ev)));

	view! {
		<div class="assistant-prompt">
			<select
				on:change=on_action
				prop:value=move || action.get().map(AssistantAction::as_str).unwrap_or_default()
			>
				<option value="">"Ask"</option>
				{AssistantAction::ALL
					.into_iter()
					.map(|a| view! { <option value=a.as_str()>{a.label()}</option> })
					.collect_view()}
			</select>
			<input
				type="text"
				placeholder="Ask about this node"
				prop:value=move || text.get()
				prop:disabled=move || busy.get()
				on:input=move |ev| text.set(event_target_value(&ev))
				on:keydown=on_keydown
			/>
			<button on:click=move |_| submit() disabled=move || busy.get()>
				{move || if busy.get() { "Asking..." } else { "Send" }}
			</button>
			{move || {
				(action.get() == Some(AssistantAction::ExplainRelation) && related.get().is_none())
					.then(|| view! { <p class="muted">"Open a second node to compare it with the selection."</p> })
			}}
			{move || {
				reply
					.get()
					.map(|r| match r {
						Ok(answer) => view! { <p class="assistant-reply">{answer}</p> }.into_any(),
						Err(message) => {
							view! { <p class="assistant-error">{format!("Error: {message}")}</p> }
								.into_any()
						}
					})
			}}
		</div>
	}
}
