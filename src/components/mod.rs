pub mod assistant_prompt;
pub mod force_graph;
