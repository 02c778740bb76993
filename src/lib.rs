//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod view_state;

// Modules
mod components;
mod pages;

use crate::config::AppConfig;
use crate::context::ExploreContext;
// Top-Level pages
use crate::pages::explore::Explore;
use crate::pages::not_found::NotFound;
use crate::pages::transactions::Transactions;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the explorer, the transaction log and
/// handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	// One context for the whole app so the view cache outlives page changes.
	let ctx = StoredValue::new_local(ExploreContext::new(AppConfig::from_window()));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Knowledge Graph Explorer" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<nav class="app-nav">
				<A href="/">"Explore"</A>
				<A href="/transactions">"Transactions"</A>
			</nav>
			<main>
				<Routes fallback=|| view! { <NotFound /> }>
					<Route path=path!("/") view=move || view! { <Explore ctx=ctx.get_value() /> } />
					<Route
						path=path!("/transactions")
						view=move || view! { <Transactions ctx=ctx.get_value() /> }
					/>
				</Routes>
			</main>
		</Router>
	}
}
