//! Per-view loading: cache lookup first, network on a miss.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, info};

use super::cache::{CacheUpdate, ViewCache};
use super::fetcher::ViewportFetcher;
use super::model::{ViewKey, ViewportSnapshot};
use crate::error::{ExploreError, Result};

/// Drives the fetcher on behalf of one mounted explore view and is the only
/// place where fetched snapshots enter the cache.
pub struct ExploreSession {
	cache: Rc<RefCell<ViewCache>>,
	fetcher: ViewportFetcher,
}

impl ExploreSession {
	pub fn new(cache: Rc<RefCell<ViewCache>>, fetcher: ViewportFetcher) -> Self {
		Self { cache, fetcher }
	}

	/// Resolves the snapshot for `key`. A cache hit returns immediately and
	/// abandons any unrelated in-flight request. A miss fetches and stores
	/// the result unless interest was cancelled in the meantime, in which
	/// case the future yields [`ExploreError::StaleResultDiscarded`].
	pub fn load(&self, key: ViewKey) -> LocalBoxFuture<'static, Result<Arc<ViewportSnapshot>>> {
		let cached = self.cache.borrow().read(&key).map(|e| e.snapshot.clone());
		if let Some(snapshot) = cached {
			debug!("session: cache hit for {key}");
			self.fetcher.cancel();
			return futures::future::ready(Ok(snapshot)).boxed_local();
		}

		let pending = self.fetcher.fetch(key);
		let cache = self.cache.clone();
		async move {
			let snapshot = pending.result.await?;
			// Joined fetches resume one by one; re-check interest for each.
			if pending.token.is_cancelled() {
				return Err(ExploreError::StaleResultDiscarded);
			}
			let mut cache = cache.borrow_mut();
			let already_stored = cache
				.read(&pending.key)
				.is_some_and(|e| Arc::ptr_eq(&e.snapshot, &snapshot));
			if !already_stored {
				info!(
					"session: loaded {} ({} nodes, {} edges)",
					pending.key,
					snapshot.nodes.len(),
					snapshot.edges.len()
				);
				cache.write(CacheUpdate::snapshot(snapshot.clone()));
			}
			Ok(snapshot)
		}
		.boxed_local()
	}

	/// Drops the cached view for everyone and loads `key` from scratch.
	pub fn reload(&self, key: ViewKey) -> LocalBoxFuture<'static, Result<Arc<ViewportSnapshot>>> {
		self.cache.borrow_mut().clear();
		self.fetcher.cancel();
		self.load(key)
	}

	/// Called when the owning view unmounts.
	pub fn cancel(&self) {
		self.fetcher.cancel();
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::*;
	use crate::config::AppConfig;
	use crate::view_state::fetcher::testing::ScriptedSource;

	fn session() -> (Rc<ScriptedSource>, Rc<RefCell<ViewCache>>, ExploreSession) {
		let source = Rc::new(ScriptedSource::default());
		let cache = Rc::new(RefCell::new(ViewCache::new()));
		let fetcher = ViewportFetcher::new(source.clone(), Rc::new(AppConfig::default()));
		(source, cache.clone(), ExploreSession::new(cache, fetcher))
	}

	fn body(id: &str) -> String {
		format!(r#"{{"nodes":[{{"id":"{id}"}}],"edges":[]}}"#)
	}

	#[test]
	fn miss_fetches_and_stores() {
		let (source, cache, session) = session();
		let key = ViewKey::new("A", 1);
		let load = session.load(key.clone());
		source.respond(&key, &body("A"));

		let snapshot = block_on(load).unwrap();
		let cache = cache.borrow();
		let entry = cache.read(&key).unwrap();
		assert!(Arc::ptr_eq(&entry.snapshot, &snapshot));
		assert_eq!(entry.camera, None);
		assert_eq!(entry.positions, None);
	}

	#[test]
	fn hit_skips_network() {
		let (source, _cache, session) = session();
		let key = ViewKey::new("A", 1);
		let load = session.load(key.clone());
		source.respond(&key, &body("A"));
		let first = block_on(load).unwrap();

		let second = block_on(session.load(key)).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(source.request_count(), 1);
	}

	#[test]
	fn superseded_load_never_reaches_cache() {
		let (source, cache, session) = session();
		let a = ViewKey::new("A", 1);
		let b = ViewKey::new("B", 1);
		let load_a = session.load(a.clone());
		let load_b = session.load(b.clone());

		source.respond(&b, &body("B"));
		assert_eq!(block_on(load_b).unwrap().center_id, "B");

		// A resolves late, after B is already stored.
		source.respond(&a, &body("A"));
		assert_eq!(block_on(load_a).unwrap_err(), ExploreError::StaleResultDiscarded);
		assert_eq!(cache.borrow().current_key(), Some(b));
	}

	#[test]
	fn cancel_on_unmount_discards_result() {
		let (source, cache, session) = session();
		let key = ViewKey::new("A", 1);
		let load = session.load(key.clone());
		session.cancel();
		source.respond(&key, &body("A"));

		assert_eq!(block_on(load).unwrap_err(), ExploreError::StaleResultDiscarded);
		assert_eq!(cache.borrow().current_key(), None);
	}

	#[test]
	fn failure_leaves_previous_entry_untouched() {
		let (source, cache, session) = session();
		let a = ViewKey::new("A", 1);
		let load = session.load(a.clone());
		source.respond(&a, &body("A"));
		block_on(load).unwrap();

		let b = ViewKey::new("B", 1);
		let load = session.load(b.clone());
		source.respond_with(&b, Err(ExploreError::http(503, "unavailable")));
		assert!(block_on(load).is_err());

		let cache = cache.borrow();
		assert_eq!(cache.current_key(), Some(a));
		assert!(cache.read(&b).is_none());
	}

	#[test]
	fn cache_hit_cancels_unrelated_fetch() {
		let (source, cache, session) = session();
		let a = ViewKey::new("A", 1);
		let load = session.load(a.clone());
		source.respond(&a, &body("A"));
		block_on(load).unwrap();

		let b = ViewKey::new("B", 1);
		let load_b = session.load(b.clone());
		block_on(session.load(a.clone())).unwrap();
		source.respond(&b, &body("B"));

		assert_eq!(block_on(load_b).unwrap_err(), ExploreError::StaleResultDiscarded);
		assert_eq!(cache.borrow().current_key(), Some(a));
	}

	#[test]
	fn reload_refetches() {
		let (source, cache, session) = session();
		let key = ViewKey::new("A", 1);
		let load = session.load(key.clone());
		source.respond(&key, &body("A"));
		block_on(load).unwrap();

		let load = session.reload(key.clone());
		assert_eq!(cache.borrow().current_key(), None);
		source.respond(&key, &body("A"));
		block_on(load).unwrap();
		assert_eq!(source.request_count(), 2);
	}
}
