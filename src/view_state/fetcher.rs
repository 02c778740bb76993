//! Viewport fetcher: one meaningful in-flight request per view.
//!
//! A call for a new key cancels interest in the previous one. A call for the
//! key that is already in flight joins the pending request instead of issuing
//! a second one. Results never touch the cache here; the caller decides.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::debug;

use super::cancel::CancellationToken;
use super::dto::ViewportDto;
use super::model::{ViewKey, ViewportSnapshot};
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::{ExploreError, Result};

/// Anything that can answer a viewport request.
pub trait ViewportSource {
	fn viewport(&self, key: &ViewKey) -> LocalBoxFuture<'static, Result<ViewportDto>>;
}

/// The graph service's `GET /v1/graph/viewport` endpoint.
pub struct HttpViewportSource {
	client: ApiClient,
}

impl HttpViewportSource {
	pub fn new(client: ApiClient) -> Self {
		Self { client }
	}
}

impl ViewportSource for HttpViewportSource {
	fn viewport(&self, key: &ViewKey) -> LocalBoxFuture<'static, Result<ViewportDto>> {
		let client = self.client.clone();
		let path = ApiClient::viewport_path(&key.center_id, key.depth);
		async move {
			let body = client.get_text(&path).await?;
			ViewportDto::from_json(&body)
		}
		.boxed_local()
	}
}

pub type SharedViewport = Shared<LocalBoxFuture<'static, Result<Arc<ViewportSnapshot>>>>;

/// Handle to a started fetch. The token stays valid after the future
/// resolves so late consumers can re-check interest before applying it.
#[derive(Clone)]
pub struct PendingFetch {
	pub key: ViewKey,
	pub token: CancellationToken,
	pub result: SharedViewport,
}

struct InFlight {
	generation: u64,
	fetch: PendingFetch,
}

pub struct ViewportFetcher {
	source: Rc<dyn ViewportSource>,
	config: Rc<AppConfig>,
	in_flight: Rc<RefCell<Option<InFlight>>>,
	generation: Cell<u64>,
}

impl ViewportFetcher {
	pub fn new(source: Rc<dyn ViewportSource>, config: Rc<AppConfig>) -> Self {
		Self {
			source,
			config,
			in_flight: Rc::new(RefCell::new(None)),
			generation: Cell::new(0),
		}
	}

	/// Starts (or joins) the fetch for `key`. The cancellation token is
	/// captured here, synchronously, not when the future is first polled.
	pub fn fetch(&self, key: ViewKey) -> PendingFetch {
		if let Some(current) = self.in_flight.borrow().as_ref() {
			if current.fetch.key == key && !current.fetch.token.is_cancelled() {
				debug!("fetcher: joining in-flight request for {key}");
				return current.fetch.clone();
			}
		}
		self.cancel();

		let generation = self.generation.get() + 1;
		self.generation.set(generation);

		let token = CancellationToken::new();
		let request = self.source.viewport(&key);
		let config = self.config.clone();
		let in_flight = Rc::downgrade(&self.in_flight);
		let (task_key, task_token) = (key.clone(), token.clone());

		debug!("fetcher: requesting viewport {key}");
		let result = async move {
			let response = request.await;

			// Settled requests leave the in-flight slot unless superseded.
			if let Some(slot) = in_flight.upgrade() {
				let mut slot = slot.borrow_mut();
				if slot.as_ref().is_some_and(|f| f.generation == generation) {
					*slot = None;
				}
			}

			if task_token.is_cancelled() {
				debug!("fetcher: discarding stale response for {task_key}");
				return Err(ExploreError::StaleResultDiscarded);
			}
			let snapshot = response?.into_snapshot(&task_key, &config);
			Ok(Arc::new(snapshot))
		}
		.boxed_local()
		.shared();

		let fetch = PendingFetch { key, token, result };
		*self.in_flight.borrow_mut() = Some(InFlight {
			generation,
			fetch: fetch.clone(),
		});
		fetch
	}

	/// Abandons interest in whatever is in flight.
	pub fn cancel(&self) {
		if let Some(current) = self.in_flight.borrow_mut().take() {
			debug!("fetcher: cancelling request for {}", current.fetch.key);
			current.fetch.token.cancel();
		}
	}

	pub fn in_flight_key(&self) -> Option<ViewKey> {
		self.in_flight.borrow().as_ref().map(|f| f.fetch.key.clone())
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use std::collections::HashMap;

	use futures::channel::oneshot;

	use super::*;

	/// Source whose responses are released by the test, one per request.
	#[derive(Default)]
	pub struct ScriptedSource {
		pending: RefCell<HashMap<ViewKey, Vec<oneshot::Sender<Result<ViewportDto>>>>>,
		pub requests: RefCell<Vec<ViewKey>>,
	}

	impl ScriptedSource {
		pub fn respond(&self, key: &ViewKey, body: &str) {
			let dto = ViewportDto::from_json(body);
			self.respond_with(key, dto);
		}

		pub fn respond_with(&self, key: &ViewKey, result: Result<ViewportDto>) {
			let sender = self
				.pending
				.borrow_mut()
				.get_mut(key)
				.and_then(|senders| (!senders.is_empty()).then(|| senders.remove(0)))
				.expect("no pending request for key");
			let _ = sender.send(result);
		}

		pub fn request_count(&self) -> usize {
			self.requests.borrow().len()
		}
	}

	impl ViewportSource for ScriptedSource {
		fn viewport(&self, key: &ViewKey) -> LocalBoxFuture<'static, Result<ViewportDto>> {
			let (tx, rx) = oneshot::channel();
			self.requests.borrow_mut().push(key.clone());
			self.pending
				.borrow_mut()
				.entry(key.clone())
				.or_default()
				.push(tx);
			async move {
				rx.await
					.unwrap_or_else(|_| Err(ExploreError::network("request dropped")))
			}
			.boxed_local()
		}
	}
}
