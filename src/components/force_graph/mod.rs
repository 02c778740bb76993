//! Canvas rendering of a viewport snapshot on top of the `force_graph`
//! simulation. [`ForceGraphState`] is the [`LayoutEngine`](crate::view_state::LayoutEngine)
//! the explore page drives through a [`LayoutAdapter`](crate::view_state::LayoutAdapter).

mod component;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use state::ForceGraphState;
pub use types::node_color;
