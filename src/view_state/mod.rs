//! Graph exploration view-state engine.
//!
//! Fetches viewports, keeps the single-slot view cache, mounts snapshots into
//! a layout engine (cold or warm) and records camera and positions so that a
//! remount for the same key looks exactly like the view the user left.

pub mod adapter;
pub mod cache;
pub mod cancel;
pub mod dto;
pub mod engine;
pub mod fetcher;
pub mod model;
pub mod recorder;
pub mod schedule;
pub mod session;
pub mod transactions;

pub use adapter::{LayoutAdapter, MountPhase};
pub use cache::{CacheUpdate, ViewCache, ViewCacheEntry};
pub use cancel::CancellationToken;
pub use engine::{EngineEvent, GraphEvent, LayoutEngine, LayoutPlan, StartMode};
pub use fetcher::{HttpViewportSource, ViewportFetcher, ViewportSource};
pub use model::{CameraTransform, LayoutPositions, Point, ViewKey, ViewportSnapshot};
pub use schedule::{BrowserScheduler, ManualScheduler, ScheduledTask, Scheduler};
pub use session::ExploreSession;
pub use transactions::{TransactionEntry, TransactionLog, TxStatus, retry, tracked};
