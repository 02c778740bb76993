use force_graph::DefaultNodeIdx;

/// Per-node payload stored inside the simulation.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub category: String,
	pub color: String,
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub label: Option<String>,
}

const DEFAULT_COLOR: &str = "#7c5cff";

fn kind_color(kind: &str) -> Option<&'static str> {
	let color = match kind.to_ascii_lowercase().as_str() {
		"topic" => "#7c5cff",
		"skill" => "#e71d36",
		"subject" => "#ff9f1c",
		"section" => "#2ec4b6",
		"resource" | "example" => "#808080",
		_ => return None,
	};
	Some(color)
}

pub fn category_color(category: &str) -> &'static str {
	match category {
		"skill" => "#e71d36",
		"resource" => "#808080",
		_ => DEFAULT_COLOR,
	}
}

/// Color of a node: its raw service kind when that has its own color,
/// otherwise its display category.
pub fn node_color(kind: Option<&str>, category: &str) -> &'static str {
	kind.and_then(kind_color)
		.unwrap_or_else(|| category_color(category))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn raw_kind_picks_color_before_category() {
		assert_eq!(node_color(Some("Subject"), "concept"), "#ff9f1c");
		assert_eq!(node_color(Some("Section"), "concept"), "#2ec4b6");
		assert_eq!(node_color(Some("TOPIC"), "concept"), DEFAULT_COLOR);
		assert_eq!(node_color(Some("Skill"), "skill"), "#e71d36");
	}

	#[test]
	fn unknown_kind_falls_back_to_category() {
		assert_eq!(node_color(Some("Lemma"), "resource"), "#808080");
		assert_eq!(node_color(None, "skill"), "#e71d36");
		assert_eq!(node_color(None, "concept"), DEFAULT_COLOR);
	}
}
