//! Single-slot view-state cache.
//!
//! Holds the last fetched snapshot together with the camera and node
//! positions that were live when its view was last torn down. Layout data is
//! only handed out for the exact key of the stored snapshot.

use std::sync::Arc;

use log::debug;

use super::model::{CameraTransform, LayoutPositions, ViewKey, ViewportSnapshot};

#[derive(Clone, Debug, PartialEq)]
pub struct ViewCacheEntry {
	pub snapshot: Arc<ViewportSnapshot>,
	pub camera: Option<CameraTransform>,
	pub positions: Option<LayoutPositions>,
}

impl ViewCacheEntry {
	/// Warm start is possible once positions were recorded for this snapshot.
	pub fn has_layout(&self) -> bool {
		self.positions.is_some()
	}
}

/// Partial update merged into the slot by [`ViewCache::write`]. `None`
/// fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct CacheUpdate {
	pub snapshot: Option<Arc<ViewportSnapshot>>,
	pub camera: Option<CameraTransform>,
	pub positions: Option<LayoutPositions>,
}

impl CacheUpdate {
	pub fn snapshot(snapshot: Arc<ViewportSnapshot>) -> Self {
		Self {
			snapshot: Some(snapshot),
			..Default::default()
		}
	}

	pub fn layout(camera: CameraTransform, positions: LayoutPositions) -> Self {
		Self {
			snapshot: None,
			camera: Some(camera),
			positions: Some(positions),
		}
	}

	pub fn with_camera(mut self, camera: CameraTransform) -> Self {
		self.camera = Some(camera);
		self
	}
}

#[derive(Debug, Default)]
pub struct ViewCache {
	slot: Option<ViewCacheEntry>,
}

impl ViewCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry only if it was stored for exactly `key`.
	pub fn read(&self, key: &ViewKey) -> Option<&ViewCacheEntry> {
		self.slot.as_ref().filter(|entry| entry.snapshot.matches(key))
	}

	/// Key of whatever snapshot currently occupies the slot.
	pub fn current_key(&self) -> Option<ViewKey> {
		self.slot.as_ref().map(|entry| entry.snapshot.key())
	}

	/// Merges `update` into the slot. A new snapshot always starts with no
	/// camera and no positions; layout fields carried alongside it are
	/// dropped. Layout fields without any stored snapshot are ignored.
	pub fn write(&mut self, update: CacheUpdate) {
		let CacheUpdate {
			snapshot,
			camera,
			positions,
		} = update;
		let has_layout = camera.is_some() || positions.is_some();

		if let Some(snapshot) = snapshot {
			debug!("view cache: storing snapshot {}", snapshot.key());
			if has_layout {
				debug!("view cache: layout sent with snapshot {} dropped", snapshot.key());
			}
			self.slot = Some(ViewCacheEntry {
				snapshot,
				camera: None,
				positions: None,
			});
			return;
		}

		let Some(entry) = self.slot.as_mut() else {
			if has_layout {
				debug!("view cache: layout write without snapshot ignored");
			}
			return;
		};
		if let Some(camera) = camera {
			entry.camera = Some(camera);
		}
		if let Some(positions) = positions {
			entry.positions = Some(positions);
		}
	}

	pub fn clear(&mut self) {
		debug!("view cache: cleared");
		self.slot = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::view_state::model::Point;

	fn snapshot(center: &str, depth: u32) -> Arc<ViewportSnapshot> {
		Arc::new(ViewportSnapshot::new(&ViewKey::new(center, depth), vec![], vec![]))
	}

	fn positions(ids: &[&str]) -> LayoutPositions {
		ids.iter()
			.enumerate()
			.map(|(i, id)| (id.to_string(), Point::new(i as f64, -(i as f64))))
			.collect()
	}

	#[test]
	fn read_requires_exact_key() {
		let mut cache = ViewCache::new();
		assert!(cache.read(&ViewKey::new("A", 1)).is_none());

		cache.write(CacheUpdate::snapshot(snapshot("A", 1)));
		assert!(cache.read(&ViewKey::new("A", 1)).is_some());
		assert!(cache.read(&ViewKey::new("A", 2)).is_none());
		assert!(cache.read(&ViewKey::new("B", 1)).is_none());

		cache.write(CacheUpdate::snapshot(snapshot("B", 1)));
		assert!(cache.read(&ViewKey::new("A", 1)).is_none());
		assert!(cache.read(&ViewKey::new("B", 1)).is_some());
	}

	#[test]
	fn new_snapshot_resets_layout() {
		let mut cache = ViewCache::new();
		cache.write(CacheUpdate::snapshot(snapshot("A", 1)));
		cache.write(CacheUpdate::layout(
			CameraTransform::new(Point::new(3.0, 4.0), 2.0),
			positions(&["A"]),
		));
		assert!(cache.read(&ViewKey::new("A", 1)).unwrap().has_layout());

		// Same key refetched still starts from a clean layout.
		cache.write(CacheUpdate::snapshot(snapshot("A", 1)));
		let entry = cache.read(&ViewKey::new("A", 1)).unwrap();
		assert_eq!(entry.camera, None);
		assert_eq!(entry.positions, None);
	}

	#[test]
	fn snapshot_write_ignores_layout_sent_with_it() {
		let mut cache = ViewCache::new();
		let update = CacheUpdate {
			positions: Some(positions(&["A"])),
			..CacheUpdate::snapshot(snapshot("A", 1))
		}
		.with_camera(CameraTransform::new(Point::new(1.0, 1.0), 2.0));
		cache.write(update);

		let entry = cache.read(&ViewKey::new("A", 1)).unwrap();
		assert_eq!(entry.camera, None);
		assert_eq!(entry.positions, None);
		assert!(!entry.has_layout());
	}

	#[test]
	fn layout_write_merges_into_existing_snapshot() {
		let mut cache = ViewCache::new();
		let stored = snapshot("A", 2);
		cache.write(CacheUpdate::snapshot(stored.clone()));
		cache.write(CacheUpdate::default().with_camera(CameraTransform::default()));

		let entry = cache.read(&ViewKey::new("A", 2)).unwrap();
		assert!(Arc::ptr_eq(&entry.snapshot, &stored));
		assert_eq!(entry.camera, Some(CameraTransform::default()));
		assert_eq!(entry.positions, None);
	}

	#[test]
	fn layout_without_snapshot_is_ignored() {
		let mut cache = ViewCache::new();
		cache.write(CacheUpdate::layout(CameraTransform::default(), positions(&["A"])));
		assert_eq!(cache.current_key(), None);
	}

	#[test]
	fn clear_empties_slot() {
		let mut cache = ViewCache::new();
		cache.write(CacheUpdate::snapshot(snapshot("A", 1)));
		cache.clear();
		assert!(cache.read(&ViewKey::new("A", 1)).is_none());
		assert_eq!(cache.current_key(), None);
	}
}
