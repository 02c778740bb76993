use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use wasm_bindgen::JsValue;

use crate::api::AssistantRequest;
use crate::context::ExploreContext;
use crate::view_state::{TransactionEntry, TxStatus, retry};

fn timestamp(ms: f64) -> String {
	js_sys::Date::new(&JsValue::from_f64(ms))
		.to_iso_string()
		.into()
}

fn status_class(status: TxStatus) -> &'static str {
	match status {
		TxStatus::Pending => "tx-status pending",
		TxStatus::Success => "tx-status success",
		TxStatus::Failed => "tx-status failed",
	}
}

#[component]
fn TransactionRow(entry: TransactionEntry, on_retry: Callback<String>) -> impl IntoView {
	let payload = serde_json::to_string(&entry.payload).unwrap_or_default();
	let retry_button = (entry.status == TxStatus::Failed).then(|| {
		let tx_id = entry.tx_id.clone();
		view! { <button on:click=move |_| on_retry.run(tx_id.clone())>"Retry"</button> }
	});
	view! {
		<tr>
			<td><code>{entry.tx_id}</code></td>
			<td>{timestamp(entry.created_at)}</td>
			<td class=status_class(entry.status)>{entry.status.as_str()}</td>
			<td>{entry.error.unwrap_or_default()}</td>
			<td><code>{payload}</code></td>
			<td>{retry_button}</td>
		</tr>
	}
}

/// Debug listing of tracked actions, newest first. The log is not reactive,
/// so the table re-reads it on demand. Failed assistant requests can be sent
/// again; the replay is a new entry.
#[component]
pub fn Transactions(ctx: ExploreContext) -> impl IntoView {
	let log = StoredValue::new_local(ctx.transactions.clone());
	let api = StoredValue::new_local(ctx.api.clone());
	let refresh = RwSignal::new(0u32);

	let on_retry = Callback::new(move |tx_id: String| {
		let (Some(log), Some(api)) = (log.try_get_value(), api.try_get_value()) else {
			return;
		};
		spawn_local(async move {
			let outcome = retry(log, &tx_id, |request: AssistantRequest| async move {
				api.assistant_chat(&request).await
			})
			.await;
			if let Err(err) = outcome {
				warn!("transactions: retry of {tx_id} failed: {err}");
			}
			refresh.update(|n| *n += 1);
		});
	});

	let entries = move || {
		refresh.track();
		log.with_value(|log| log.borrow().entries().to_vec())
	};

	view! {
		<div class="transactions-page">
			<header>
				<h2>"Transactions"</h2>
				<button on:click=move |_| refresh.update(|n| *n += 1)>"Refresh"</button>
			</header>
			{move || {
				let entries = entries();
				if entries.is_empty() {
					view! { <p class="muted">"No transactions yet."</p> }.into_any()
				} else {
					view! {
						<table>
							<thead>
								<tr>
									<th>"Id"</th>
									<th>"Created"</th>
									<th>"Status"</th>
									<th>"Error"</th>
									<th>"Payload"</th>
									<th></th>
								</tr>
							</thead>
							<tbody>
								{entries
									.into_iter()
									.map(|entry| view! { <TransactionRow entry=entry on_retry=on_retry /> })
									.collect_view()}
							</tbody>
						</table>
					}
						.into_any()
				}
			}}
		</div>
	}
}
