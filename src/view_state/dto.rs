//! Wire shapes of the graph service's viewport endpoint and their
//! normalization into [`ViewportSnapshot`].

use serde::Deserialize;

use super::model::{Attributes, Edge, Node, ViewKey, ViewportSnapshot};
use crate::config::AppConfig;
use crate::error::Result;

#[derive(Clone, Debug, Deserialize)]
pub struct NodeDto {
	#[serde(alias = "id")]
	pub uid: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub kind: Option<String>,
	#[serde(default)]
	pub data: Option<Attributes>,
	#[serde(flatten)]
	pub extra: Attributes,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EdgeDto {
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub relation: Option<String>,
	#[serde(default)]
	pub kind: Option<String>,
	#[serde(default)]
	pub weight: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewportDto {
	pub nodes: Vec<NodeDto>,
	pub edges: Vec<EdgeDto>,
	#[serde(default)]
	pub center_uid: Option<String>,
	#[serde(default)]
	pub depth: Option<u32>,
}

impl ViewportDto {
	pub fn from_json(body: &str) -> Result<Self> {
		Ok(serde_json::from_str(body)?)
	}

	/// Normalizes the response for the key that was requested. The echoed
	/// `center_uid`/`depth` are informational only.
	pub fn into_snapshot(self, key: &ViewKey, config: &AppConfig) -> ViewportSnapshot {
		let nodes = self
			.nodes
			.into_iter()
			.map(|dto| dto.into_node(config))
			.collect();
		let edges = self
			.edges
			.into_iter()
			.enumerate()
			.map(|(index, dto)| dto.into_edge(index))
			.collect();
		ViewportSnapshot::new(key, nodes, edges)
	}
}

impl NodeDto {
	fn into_node(self, config: &AppConfig) -> Node {
		let category = config.category_for(self.kind.as_deref());
		let display_label = self
			.title
			.filter(|t| !t.trim().is_empty())
			.unwrap_or_else(|| self.uid.clone());

		let mut attributes = self.extra;
		for (key, value) in self.data.unwrap_or_default() {
			attributes.insert(key, value);
		}

		Node {
			id: self.uid,
			display_label,
			category,
			kind: self.kind,
			attributes,
		}
	}
}

impl EdgeDto {
	fn into_edge(self, index: usize) -> Edge {
		Edge {
			id: Edge::derive_id(&self.source, &self.target, index),
			relation_label: self.relation.or(self.kind),
			weight: self.weight,
			source_id: self.source,
			target_id: self.target,
		}
	}
}
