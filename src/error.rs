//! Error taxonomy of the explorer.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExploreError {
	/// Transport failure or a non-2xx response.
	#[error("network error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
	Network { status: Option<u16>, message: String },

	/// The response body did not have the expected shape.
	#[error("malformed response: {0}")]
	Parse(String),

	/// A cancelled request resolved; its result was dropped.
	#[error("stale result discarded")]
	StaleResultDiscarded,

	/// Only failed transactions can be replayed.
	#[error("transaction {0} cannot be retried")]
	NotRetryable(String),
}

impl ExploreError {
	pub fn network(message: impl Into<String>) -> Self {
		Self::Network {
			status: None,
			message: message.into(),
		}
	}

	pub fn http(status: u16, message: impl Into<String>) -> Self {
		Self::Network {
			status: Some(status),
			message: message.into(),
		}
	}

	/// Stale results are internal bookkeeping and never shown to the user.
	pub fn is_user_visible(&self) -> bool {
		!matches!(self, Self::StaleResultDiscarded)
	}
}

impl From<serde_json::Error> for ExploreError {
	fn from(err: serde_json::Error) -> Self {
		Self::Parse(err.to_string())
	}
}

pub type Result<T, E = ExploreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_are_displayable() {
		assert_eq!(
			ExploreError::http(502, "bad gateway").to_string(),
			"network error (HTTP 502): bad gateway"
		);
		assert_eq!(
			ExploreError::network("offline").to_string(),
			"network error: offline"
		);
		assert!(!ExploreError::StaleResultDiscarded.is_user_visible());
		assert_eq!(
			ExploreError::NotRetryable("tx_1_1".into()).to_string(),
			"transaction tx_1_1 cannot be retried"
		);
	}

	#[test]
	fn json_errors_become_parse_errors() {
		let err: ExploreError = serde_json::from_str::<serde_json::Value>("{")
			.unwrap_err()
			.into();
		assert!(matches!(err, ExploreError::Parse(_)));
	}
}
