//! Application-wide state, created once by [`crate::App`] and handed to the
//! pages that need it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::view_state::{
	ExploreSession, HttpViewportSource, TransactionLog, ViewCache, ViewportFetcher, ViewportSource,
};

#[derive(Clone)]
pub struct ExploreContext {
	pub config: Rc<AppConfig>,
	pub api: ApiClient,
	pub cache: Rc<RefCell<ViewCache>>,
	pub transactions: Rc<RefCell<TransactionLog>>,
	source: Rc<dyn ViewportSource>,
}

impl ExploreContext {
	pub fn new(config: AppConfig) -> Self {
		let api = ApiClient::new(&config.api_base_url);
		let source: Rc<dyn ViewportSource> = Rc::new(HttpViewportSource::new(api.clone()));
		Self::with_source(config, api, source)
	}

	pub fn with_source(config: AppConfig, api: ApiClient, source: Rc<dyn ViewportSource>) -> Self {
		Self {
			config: Rc::new(config),
			api,
			cache: Rc::new(RefCell::new(ViewCache::new())),
			transactions: Rc::new(RefCell::new(TransactionLog::new())),
			source,
		}
	}

	/// A fresh session for one explore view; sessions share the cache.
	pub fn session(&self) -> ExploreSession {
		let fetcher = ViewportFetcher::new(self.source.clone(), self.config.clone());
		ExploreSession::new(self.cache.clone(), fetcher)
	}
}
