//! Tracks the live camera of a mounted view and commits it, together with
//! the engine's node positions, into the cache on teardown.

use log::debug;

use super::cache::{CacheUpdate, ViewCache};
use super::engine::{GraphEvent, LayoutEngine};
use super::model::{CameraTransform, ViewKey};

#[derive(Debug)]
pub struct CameraRecorder {
	key: ViewKey,
	latest: Option<CameraTransform>,
}

impl CameraRecorder {
	pub fn new(key: ViewKey) -> Self {
		Self { key, latest: None }
	}

	/// Starts from a camera that is already known, such as the one a warm
	/// start is about to restore.
	pub fn with_latest(key: ViewKey, camera: Option<CameraTransform>) -> Self {
		Self {
			key,
			latest: camera,
		}
	}

	pub fn key(&self) -> &ViewKey {
		&self.key
	}

	pub fn latest(&self) -> Option<CameraTransform> {
		self.latest
	}

	pub fn observe(&mut self, event: &GraphEvent) {
		match event {
			GraphEvent::CameraChanged(camera) | GraphEvent::Stabilized(camera) => {
				self.latest = Some(*camera);
			}
			_ => {}
		}
	}

	/// Writes camera and positions in a single cache update. Skipped when
	/// the slot has moved on to another key, so a late teardown can never
	/// attach this layout to a different snapshot.
	pub fn flush<E: LayoutEngine>(&self, engine: &E, cache: &mut ViewCache) -> bool {
		if cache.read(&self.key).is_none() {
			debug!("recorder: cache moved past {}, layout not saved", self.key);
			return false;
		}
		let camera = self.latest.unwrap_or_else(|| engine.camera());
		let positions = engine.positions();
		debug!(
			"recorder: saving {} positions for {}",
			positions.len(),
			self.key
		);
		cache.write(CacheUpdate::layout(camera, positions));
		true
	}
}
