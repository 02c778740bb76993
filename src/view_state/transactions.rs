//! Audit log of asynchronous user-triggered actions.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::error::{ExploreError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
	Pending,
	Success,
	Failed,
}

impl TxStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Success => "success",
			Self::Failed => "failed",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionEntry {
	pub tx_id: String,
	/// Milliseconds since the Unix epoch.
	pub created_at: f64,
	pub status: TxStatus,
	pub error: Option<String>,
	pub payload: serde_json::Value,
}

/// Append-only, newest first. Entries only ever move out of `Pending` once.
#[derive(Debug, Default)]
pub struct TransactionLog {
	entries: Vec<TransactionEntry>,
	next_seq: u64,
}

impl TransactionLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn begin(&mut self, payload: serde_json::Value) -> String {
		self.begin_at(payload, now_ms())
	}

	pub fn begin_at(&mut self, payload: serde_json::Value, created_at: f64) -> String {
		self.next_seq += 1;
		let tx_id = format!("tx_{}_{}", created_at as u64, self.next_seq);
		self.entries.insert(
			0,
			TransactionEntry {
				tx_id: tx_id.clone(),
				created_at,
				status: TxStatus::Pending,
				error: None,
				payload,
			},
		);
		tx_id
	}

	pub fn mark_success(&mut self, tx_id: &str) {
		self.resolve(tx_id, TxStatus::Success, None);
	}

	pub fn mark_failed(&mut self, tx_id: &str, error: impl Into<String>) {
		self.resolve(tx_id, TxStatus::Failed, Some(error.into()));
	}

	fn resolve(&mut self, tx_id: &str, status: TxStatus, error: Option<String>) {
		let Some(entry) = self
			.entries
			.iter_mut()
			.find(|e| e.tx_id == tx_id && e.status == TxStatus::Pending)
		else {
			return;
		};
		entry.status = status;
		entry.error = error;
		match status {
			TxStatus::Failed => warn!(
				"tx {tx_id} failed: {}",
				entry.error.as_deref().unwrap_or_default()
			),
			_ => info!("tx {tx_id} {}", status.as_str()),
		}
	}

	pub fn get(&self, tx_id: &str) -> Option<&TransactionEntry> {
		self.entries.iter().find(|e| e.tx_id == tx_id)
	}

	pub fn entries(&self) -> &[TransactionEntry] {
		&self.entries
	}

	/// Payload of `tx_id` if it failed and may be replayed.
	pub fn retryable(&self, tx_id: &str) -> Option<serde_json::Value> {
		self.get(tx_id)
			.filter(|e| e.status == TxStatus::Failed)
			.map(|e| e.payload.clone())
	}
}

/// Runs `action` as a tracked transaction, resolving its entry with the
/// outcome.
pub async fn tracked<T, F>(
	log: Rc<RefCell<TransactionLog>>,
	payload: serde_json::Value,
	action: F,
) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let tx_id = log.borrow_mut().begin(payload);
	let result = action.await;
	match &result {
		Ok(_) => log.borrow_mut().mark_success(&tx_id),
		Err(err) => log.borrow_mut().mark_failed(&tx_id, err.to_string()),
	}
	result
}

/// Replays a failed transaction: its payload is decoded back into the
/// request type and `run` goes through [`tracked`] as a new entry. The failed
/// entry is left as it was.
pub async fn retry<R, T, F, Fut>(
	log: Rc<RefCell<TransactionLog>>,
	tx_id: &str,
	run: F,
) -> Result<T>
where
	R: DeserializeOwned,
	F: FnOnce(R) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let payload = log
		.borrow()
		.retryable(tx_id)
		.ok_or_else(|| ExploreError::NotRetryable(tx_id.to_string()))?;
	let request: R = serde_json::from_value(payload.clone())?;
	info!("tx {tx_id}: retrying");
	tracked(log, payload, run(request)).await
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
	js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as f64)
		.unwrap_or_default()
}
