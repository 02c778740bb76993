//! HTTP client for the graph service, built on the browser `fetch` API.

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::error::{ExploreError, Result};

#[derive(Clone, Debug)]
pub struct ApiClient {
	base_url: String,
}

/// Tool the assistant should run instead of a free-form answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantAction {
	ExplainRelation,
	Viewport,
	Roadmap,
	Analytics,
	Questions,
}

impl AssistantAction {
	pub const ALL: [Self; 5] = [
		Self::ExplainRelation,
		Self::Viewport,
		Self::Roadmap,
		Self::Analytics,
		Self::Questions,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ExplainRelation => "explain_relation",
			Self::Viewport => "viewport",
			Self::Roadmap => "roadmap",
			Self::Analytics => "analytics",
			Self::Questions => "questions",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::ExplainRelation => "Explain relation",
			Self::Viewport => "Load neighbourhood",
			Self::Roadmap => "Build roadmap",
			Self::Analytics => "Graph metrics",
			Self::Questions => "Practice questions",
		}
	}

	pub fn parse(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|a| a.as_str() == name)
	}
}

/// Body of an assistant query. Also stored as the transaction payload, so a
/// failed query can be sent again as is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<AssistantAction>,
	pub message: String,
	pub center_uid: String,
	pub depth: u32,
	pub from_uid: String,
	pub to_uid: String,
}

impl AssistantRequest {
	/// A free-form question scoped to the node currently being explored.
	pub fn about(center_uid: &str, depth: u32, message: impl Into<String>) -> Self {
		Self {
			action: None,
			message: message.into(),
			center_uid: center_uid.to_string(),
			depth,
			from_uid: center_uid.to_string(),
			to_uid: center_uid.to_string(),
		}
	}

	pub fn with_action(mut self, action: Option<AssistantAction>) -> Self {
		self.action = action;
		self
	}

	/// Second endpoint of a relation question.
	pub fn with_target(mut self, to_uid: &str) -> Self {
		self.to_uid = to_uid.to_string();
		self
	}
}

/// Text to show for an assistant reply: its `answer` field when present,
/// otherwise the raw body.
pub fn answer_text(reply: &serde_json::Value) -> String {
	match reply.get("answer").and_then(|a| a.as_str()) {
		Some(answer) => answer.to_string(),
		None => match reply {
			serde_json::Value::String(text) => text.clone(),
			serde_json::Value::Null => String::new(),
			other => other.to_string(),
		},
	}
}

impl ApiClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	pub fn viewport_path(center_uid: &str, depth: u32) -> String {
		let center: String = js_sys::encode_uri_component(center_uid).into();
		format!("/v1/graph/viewport?center_uid={center}&depth={depth}")
	}

	pub async fn get_text(&self, path: &str) -> Result<String> {
		self.send("GET", path, None).await
	}

	pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
		let body = serde_json::to_string(body)?;
		let text = self.send("POST", path, Some(body)).await?;
		if text.trim().is_empty() {
			return Ok(serde_json::Value::Null);
		}
		// Non-JSON replies are passed through as plain strings.
		Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
	}

	pub async fn assistant_chat(&self, request: &AssistantRequest) -> Result<serde_json::Value> {
		self.post_json("/v1/assistant/chat", request).await
	}

	async fn send(&self, method: &str, path: &str, body: Option<String>) -> Result<String> {
		let url = format!("{}{}", self.base_url, path);

		let opts = RequestInit::new();
		opts.set_method(method);
		opts.set_mode(RequestMode::Cors);
		if let Some(body) = &body {
			opts.set_body(&JsValue::from_str(body));
		}

		let request = Request::new_with_str_and_init(&url, &opts)
			.map_err(|e| ExploreError::network(format!("request error: {e:?}")))?;
		if body.is_some() {
			request
				.headers()
				.set("Content-Type", "application/json")
				.map_err(|e| ExploreError::network(format!("header error: {e:?}")))?;
		}

		let window = web_sys::window().ok_or_else(|| ExploreError::network("no window"))?;
		let resp_value = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| ExploreError::network(format!("fetch error: {e:?}")))?;
		let resp: Response = resp_value
			.dyn_into()
			.map_err(|_| ExploreError::network("response is not a Response"))?;

		let text = read_text(&resp).await;
		if !resp.ok() {
			let status = resp.status();
			let message = text
				.ok()
				.filter(|t| !t.trim().is_empty())
				.unwrap_or_else(|| format!("HTTP {status}"));
			return Err(ExploreError::http(status, message));
		}
		text
	}
}

async fn read_text(resp: &Response) -> Result<String> {
	let promise = resp
		.text()
		.map_err(|e| ExploreError::Parse(format!("body error: {e:?}")))?;
	let value = JsFuture::from(promise)
		.await
		.map_err(|e| ExploreError::network(format!("body error: {e:?}")))?;
	value
		.as_string()
		.ok_or_else(|| ExploreError::Parse("response body is not text".into()))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn answer_text_prefers_answer_field() {
		assert_eq!(answer_text(&json!({"answer": "N1 links N2", "usage": null})), "N1 links N2");
		assert_eq!(answer_text(&json!("plain")), "plain");
		assert_eq!(answer_text(&json!(null)), "");
		assert_eq!(answer_text(&json!({"items": []})), r#"{"items":[]}"#);
	}

	#[test]
	fn about_scopes_request_to_center() {
		let request = AssistantRequest::about("N1", 2, "what is this?");
		let body = serde_json::to_value(&request).unwrap();
		assert_eq!(
			body,
			json!({
				"message": "what is this?",
				"center_uid": "N1",
				"depth": 2,
				"from_uid": "N1",
				"to_uid": "N1",
			})
		);
	}

	#[test]
	fn relation_request_names_its_action() {
		let request = AssistantRequest::about("N1", 1, "how are these linked?")
			.with_action(AssistantAction::parse("explain_relation"))
			.with_target("N2");
		let body = serde_json::to_value(&request).unwrap();
		assert_eq!(body["action"], "explain_relation");
		assert_eq!(body["from_uid"], "N1");
		assert_eq!(body["to_uid"], "N2");

		let replayed: AssistantRequest = serde_json::from_value(body).unwrap();
		assert_eq!(replayed, request);
	}

	#[test]
	fn action_names_match_wire_format() {
		for action in AssistantAction::ALL {
			assert_eq!(
				serde_json::to_value(action).unwrap(),
				serde_json::Value::from(action.as_str())
			);
		}
		assert_eq!(AssistantAction::parse("chat"), None);
	}

	#[test]
	fn base_url_loses_trailing_slash() {
		assert_eq!(ApiClient::new("http://localhost:8000/").base_url, "http://localhost:8000");
	}
}
