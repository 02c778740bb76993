//! Runtime configuration: built-in defaults overridden by `window.__ENV__`.

use std::collections::HashMap;
use std::time::Duration;

use log::warn;
use serde::Deserialize;

/// Tunables of the layout adapter and the camera recorder.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Physics ticks allowed on a cold start before the simulation freezes.
	pub stabilization_iterations: u32,
	/// Delay before a saved camera is replayed into a fresh engine.
	pub camera_restore_delay: Duration,
	/// Zoom applied when focusing the selected node.
	pub focus_scale: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			stabilization_iterations: 250,
			camera_restore_delay: Duration::from_millis(50),
			focus_scale: 1.1,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
	pub api_base_url: String,
	pub default_start_node: String,
	pub default_depth: u32,
	pub depth_options: Vec<u32>,
	/// Lower-cased service `kind` to display category.
	pub kind_map: HashMap<String, String>,
	pub fallback_category: String,
	pub layout: LayoutConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		let kind_map = [
			("skill", "skill"),
			("resource", "resource"),
			("example", "resource"),
			("concept", "concept"),
			("subject", "concept"),
			("section", "concept"),
			("topic", "concept"),
		]
		.into_iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect();

		Self {
			api_base_url: String::new(),
			default_start_node: "TOP-DEMO".into(),
			default_depth: 1,
			depth_options: vec![1, 2, 3],
			kind_map,
			fallback_category: "concept".into(),
			layout: LayoutConfig::default(),
		}
	}
}

/// Keys recognised in the injected `window.__ENV__` object.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
	#[serde(rename = "VITE_API_BASE_URL")]
	api_base_url: Option<String>,
	#[serde(rename = "DEFAULT_START_NODE")]
	default_start_node: Option<String>,
	#[serde(rename = "DEFAULT_DEPTH")]
	default_depth: Option<u32>,
}

impl AppConfig {
	/// Maps a raw service kind to a display category.
	pub fn category_for(&self, kind: Option<&str>) -> String {
		kind.and_then(|k| self.kind_map.get(&k.to_lowercase()))
			.cloned()
			.unwrap_or_else(|| self.fallback_category.clone())
	}

	/// Applies overrides from a JSON object; unknown keys are ignored.
	pub fn with_env_json(mut self, json: &str) -> Self {
		match serde_json::from_str::<EnvOverrides>(json) {
			Ok(env) => {
				if let Some(url) = env.api_base_url {
					self.api_base_url = url.trim_end_matches('/').to_string();
				}
				if let Some(node) = env.default_start_node.filter(|n| !n.is_empty()) {
					self.default_start_node = node;
				}
				if let Some(depth) = env.default_depth.filter(|d| *d > 0) {
					self.default_depth = depth;
				}
			}
			Err(err) => warn!("ignoring malformed __ENV__: {err}"),
		}
		self
	}

	/// Reads `window.__ENV__` when present.
	pub fn from_window() -> Self {
		let config = Self::default();
		let Some(window) = web_sys::window() else {
			return config;
		};
		let env = js_sys::Reflect::get(&window, &"__ENV__".into()).ok();
		let json = env
			.filter(|v| v.is_object())
			.and_then(|v| js_sys::JSON::stringify(&v).ok())
			.and_then(|s| s.as_string());
		match json {
			Some(json) => config.with_env_json(&json),
			None => config,
		}
	}
}
