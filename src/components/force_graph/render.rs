use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, NODE_RADIUS};
use super::types::{EdgeInfo, NodeInfo};

const BACKGROUND: &str = "#12121c";
const EDGE_RGB: &str = "255, 255, 255";
/// Below this the hover fade counts as finished.
const FADE_EPSILON: f64 = 0.01;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// How a node relates to the hovered one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Emphasis {
	/// Outside the hover neighbourhood, or nothing is hovered.
	Faded,
	/// Still highlighted while the previous hover fades out.
	Lingering,
	Neighbor,
	Hovered,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct NodeStyle {
	alpha: f64,
	radius: f64,
	/// Outer radius and peak alpha of the focus glow.
	glow: Option<(f64, f64)>,
	ring: bool,
	label_alpha: f64,
}

fn node_style(emphasis: Emphasis, fade: f64) -> NodeStyle {
	let focused = |scale: f64, glow: (f64, f64), glow_alpha: f64| NodeStyle {
		alpha: 1.0,
		radius: NODE_RADIUS * (1.0 + scale * fade),
		glow: (fade > FADE_EPSILON)
			.then(|| (NODE_RADIUS * (glow.0 + glow.1 * fade), glow_alpha * fade)),
		ring: false,
		label_alpha: 1.0,
	};
	match emphasis {
		Emphasis::Faded => {
			let alpha = 1.0 - 0.7 * fade;
			NodeStyle {
				alpha,
				radius: NODE_RADIUS * (1.0 - 0.15 * fade),
				glow: None,
				ring: false,
				label_alpha: 0.8 * alpha,
			}
		}
		Emphasis::Lingering => NodeStyle {
			alpha: 1.0,
			radius: NODE_RADIUS,
			glow: None,
			ring: false,
			label_alpha: 1.0,
		},
		Emphasis::Neighbor => focused(0.2, (1.4, 0.6), 0.2),
		Emphasis::Hovered => NodeStyle {
			ring: fade > FADE_EPSILON,
			..focused(0.35, (1.8, 1.2), 0.35)
		},
	}
}

fn emphasis(state: &ForceGraphState, idx: DefaultNodeIdx) -> Emphasis {
	if !state.has_active_highlight() || !state.is_highlighted(idx) {
		Emphasis::Faded
	} else if state.is_hovered(idx) {
		Emphasis::Hovered
	} else if state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx) {
		Emphasis::Neighbor
	} else {
		Emphasis::Lingering
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RelationStyle {
	line_alpha: f64,
	arrow_alpha: f64,
	width: f64,
	labelled: bool,
}

/// Relations between highlighted nodes brighten while the rest recede.
fn relation_style(highlighted: bool, fade: f64, base_width: f64) -> RelationStyle {
	let (line_alpha, arrow_alpha, grow) = if highlighted {
		(0.4 + 0.5 * fade, 0.6 + 0.3 * fade, 0.3 * fade)
	} else {
		(0.4 - 0.3 * fade, 0.6 - 0.45 * fade, -0.3 * fade)
	};
	RelationStyle {
		line_alpha,
		arrow_alpha,
		width: base_width * (1.0 + grow),
		labelled: highlighted && fade > FADE_EPSILON,
	}
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_relations(state, ctx);
	draw_concepts(state, ctx);
	ctx.restore();
}

fn node_positions(state: &ForceGraphState) -> HashMap<DefaultNodeIdx, (f64, f64)> {
	let mut positions = HashMap::new();
	state.graph.visit_nodes(|node| {
		positions.insert(node.index(), (node.x() as f64, node.y() as f64));
	});
	positions
}

/// Screen-constant sizes for relation strokes at zoom `k`.
struct Pen {
	k: f64,
	width: f64,
	dash: f64,
	gap: f64,
	arrow: f64,
	offset: f64,
}

impl Pen {
	fn new(k: f64, flow_time: f64) -> Self {
		let (dash, gap) = (2.0 / k, 4.0 / k);
		Self {
			k,
			width: 1.0 / k,
			dash,
			gap,
			arrow: 7.0 / k,
			offset: -(flow_time * 30.0) % (dash + gap),
		}
	}
}

fn draw_relations(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let pen = Pen::new(state.transform.k, state.flow_time);
	let fade = ease_out_cubic(state.hover.highlight_t);
	let positions = node_positions(state);

	for edge in &state.edges {
		let (Some(&from), Some(&to)) = (positions.get(&edge.source), positions.get(&edge.target))
		else {
			continue;
		};
		let highlighted = state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let style = relation_style(highlighted, fade, pen.width);
		draw_relation(ctx, edge, from, to, &style, &pen, fade);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_relation(
	ctx: &CanvasRenderingContext2d,
	edge: &EdgeInfo,
	(x1, y1): (f64, f64),
	(x2, y2): (f64, f64),
	style: &RelationStyle,
	pen: &Pen,
	fade: f64,
) {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = dx.hypot(dy);
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	// Flowing dashes from the rim of the source to the base of the arrow.
	ctx.set_stroke_style_str(&format!("rgba({EDGE_RGB}, {})", style.line_alpha));
	ctx.set_line_width(style.width);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(pen.dash),
		&JsValue::from_f64(pen.gap),
	));
	ctx.set_line_dash_offset(pen.offset);
	let stop = NODE_RADIUS + pen.arrow;
	ctx.begin_path();
	ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
	ctx.line_to(x2 - ux * stop, y2 - uy * stop);
	ctx.stroke();

	let tip = (x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
	draw_arrow_head(ctx, tip, (ux, uy), pen.arrow, style.arrow_alpha);

	if style.labelled {
		if let Some(relation) = &edge.label {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * fade));
			ctx.set_font(&format!("{}px sans-serif", 9.0 / pen.k.max(0.5)));
			let _ = ctx.fill_text(relation, (x1 + x2) / 2.0, (y1 + y2) / 2.0 - 3.0 / pen.k);
		}
	}
}

fn draw_arrow_head(
	ctx: &CanvasRenderingContext2d,
	(tip_x, tip_y): (f64, f64),
	(ux, uy): (f64, f64),
	size: f64,
	alpha: f64,
) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_fill_style_str(&format!("rgba({EDGE_RGB}, {alpha})"));
	let (base_x, base_y) = (tip_x - ux * size, tip_y - uy * size);
	let (wing_x, wing_y) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(base_x + wing_x, base_y + wing_y);
	ctx.line_to(base_x - wing_x, base_y - wing_y);
	ctx.close_path();
	ctx.fill();
}

/// Faded concepts first, the hover neighbourhood on top.
fn draw_concepts(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let fade = ease_out_cubic(state.hover.highlight_t);
	let k = state.transform.k;
	for on_top in [false, true] {
		state.graph.visit_nodes(|node| {
			let emphasis = emphasis(state, node.index());
			if (emphasis != Emphasis::Faded) != on_top {
				return;
			}
			let at = (node.x() as f64, node.y() as f64);
			draw_concept(ctx, &node.data.user_data, at, &node_style(emphasis, fade), fade, k);
		});
	}
}

fn draw_concept(
	ctx: &CanvasRenderingContext2d,
	info: &NodeInfo,
	(x, y): (f64, f64),
	style: &NodeStyle,
	fade: f64,
	k: f64,
) {
	if let Some((outer, alpha)) = style.glow {
		draw_focus_glow(ctx, (x, y), style.radius * 0.3, outer, alpha);
	}

	ctx.set_global_alpha(style.alpha);
	ctx.begin_path();
	let _ = ctx.arc(x, y, style.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&info.color);
	ctx.fill();
	ctx.set_global_alpha(1.0);

	if style.ring {
		ctx.begin_path();
		let _ = ctx.arc(x, y, style.radius + 2.0 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * fade));
		ctx.set_line_width(1.5 / k);
		ctx.stroke();
	}

	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", style.label_alpha));
	draw_caption(ctx, &info.label, x + style.radius + 3.0, y + 3.0, k);
}

fn draw_focus_glow(
	ctx: &CanvasRenderingContext2d,
	(x, y): (f64, f64),
	inner: f64,
	outer: f64,
	alpha: f64,
) {
	let Ok(gradient) = ctx.create_radial_gradient(x, y, inner, x, y, outer) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
	let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, outer, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

/// Outlined so captions stay readable over relations.
fn draw_caption(ctx: &CanvasRenderingContext2d, caption: &str, x: f64, y: f64, k: f64) {
	let k = k.max(0.5);
	ctx.set_font(&format!("{}px sans-serif", 11.0 / k));
	ctx.set_line_width(3.0 / k);
	ctx.set_stroke_style_str("rgba(0, 0, 0, 0.8)");
	let _ = ctx.stroke_text(caption, x, y);
	let _ = ctx.fill_text(caption, x, y);
}
