use std::collections::HashMap;

use web_sys::CanvasRenderingContext2d;

use super::geometry::{self, ANCHOR_ZONE, ROW_CONTROL_WIDTH};
use super::layout::node_size;
use super::state::DiagramState;
use super::types::{DiagramNode, DiagramVariant, EdgeVariant, Point, parse_handle};

const BACKGROUND: &str = "#10141c";
const CARD_FILL: &str = "#1e2433";
const CARD_BORDER: &str = "#343e54";
const HEADER_FILL: &str = "#283046";
const TEXT_PRIMARY: &str = "#e8ecf4";
const TEXT_MUTED: &str = "#8b95ab";
const ROW_HIGHLIGHT: &str = "rgba(86, 156, 255, 0.18)";
const SCHEMA_EDGE: &str = "rgba(122, 144, 186, 0.75)";
const SCHEMA_EDGE_HIGHLIGHT: &str = "rgba(120, 186, 255, 0.95)";
const FEDERATION_EDGE: &str = "rgba(176, 136, 255, 0.8)";
const PK_BADGE: &str = "#e3b341";
const FK_BADGE: &str = "#569cff";
const INACTIVE_ALPHA: f64 = 0.35;
const CARD_RADIUS: f64 = 8.0;

pub const MENU_WIDTH: f64 = 180.0;
pub const MENU_ITEM_HEIGHT: f64 = 32.0;
pub const MENU_ITEM_COUNT: usize = 3;

/// Context-menu item index under a screen point, if any.
pub fn menu_item_at(origin: Point, sx: f64, sy: f64) -> Option<usize> {
	let inside = sx >= origin.x
		&& sx <= origin.x + MENU_WIDTH
		&& sy >= origin.y
		&& sy <= origin.y + MENU_ITEM_HEIGHT * MENU_ITEM_COUNT as f64;
	if !inside {
		return None;
	}
	let item = ((sy - origin.y) / MENU_ITEM_HEIGHT) as usize;
	(item < MENU_ITEM_COUNT).then_some(item)
}

pub fn render(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_connect_gesture(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	draw_menu(state, ctx);
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn edge_is_highlighted(state: &DiagramState, source_handle: &str, target_handle: &str) -> bool {
	[source_handle, target_handle].iter().any(|handle| {
		parse_handle(handle)
			.map(|(column_id, _)| state.highlights.contains(column_id))
			.unwrap_or(false)
	})
}

fn draw_edges(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let by_id: HashMap<&str, &DiagramNode> =
		state.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

	for edge in &state.edges {
		let Some(path) = geometry::edge_path(&by_id, edge, &state.options) else {
			continue;
		};
		let highlighted = edge_is_highlighted(state, &edge.source_handle, &edge.target_handle);

		let stroke = edge
			.style
			.as_ref()
			.and_then(|s| s.stroke.as_deref())
			.unwrap_or(match (edge.variant, highlighted) {
				(EdgeVariant::Schema, false) => SCHEMA_EDGE,
				(EdgeVariant::Schema, true) => SCHEMA_EDGE_HIGHLIGHT,
				(EdgeVariant::Federation, _) => FEDERATION_EDGE,
			});
		let base_width = edge
			.style
			.as_ref()
			.and_then(|s| s.stroke_width)
			.unwrap_or(1.5);
		let width = if highlighted { base_width * 1.6 } else { base_width };

		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(width / k);
		ctx.begin_path();
		match edge.variant {
			EdgeVariant::Schema => {
				let points = geometry::smoothstep_points(&path);
				ctx.move_to(points[0].x, points[0].y);
				for p in &points[1..] {
					ctx.line_to(p.x, p.y);
				}
			}
			EdgeVariant::Federation => {
				let (c1, c2) = geometry::bezier_controls(&path);
				ctx.move_to(path.start.x, path.start.y);
				ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, path.end.x, path.end.y);
			}
		}
		ctx.stroke();
	}
}

fn draw_connect_gesture(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let Some(connect) = &state.connect else {
		return;
	};
	let by_id: HashMap<&str, &DiagramNode> =
		state.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
	let Some((column_id, side)) = parse_handle(&connect.source_handle) else {
		return;
	};
	let Some((node, row)) = by_id.values().find_map(|n| {
		n.data
			.columns
			.iter()
			.position(|c| c.id == column_id)
			.map(|row| (*n, row))
	}) else {
		return;
	};

	let start = geometry::anchor_position(node, row, side, &state.options);
	let k = state.transform.k;
	ctx.set_stroke_style_str(SCHEMA_EDGE_HIGHLIGHT);
	ctx.set_line_width(1.5 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&wasm_bindgen::JsValue::from_f64(6.0 / k),
		&wasm_bindgen::JsValue::from_f64(4.0 / k),
	));
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(connect.cursor.x, connect.cursor.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	for node in &state.nodes {
		match state.variant {
			DiagramVariant::Schema => draw_schema_node(state, node, ctx),
			DiagramVariant::Federation => draw_federation_node(state, node, ctx),
		}
	}
}

fn draw_card(
	state: &DiagramState,
	node: &DiagramNode,
	ctx: &CanvasRenderingContext2d,
) -> (f64, f64, f64, f64) {
	let (w, h) = node_size(node, &state.options);
	let (x, y) = (node.position.x, node.position.y);

	rounded_rect(ctx, x, y, w, h, CARD_RADIUS);
	ctx.set_fill_style_str(CARD_FILL);
	ctx.fill();
	ctx.set_stroke_style_str(CARD_BORDER);
	ctx.set_line_width(1.0 / state.transform.k);
	ctx.stroke();

	// Header band: rounded top corners, square bottom edge
	ctx.set_fill_style_str(HEADER_FILL);
	rounded_rect(ctx, x, y, w, state.options.base_height, CARD_RADIUS);
	ctx.fill();
	ctx.fill_rect(
		x,
		y + state.options.base_height - CARD_RADIUS,
		w,
		CARD_RADIUS,
	);

	ctx.set_fill_style_str(TEXT_PRIMARY);
	ctx.set_font("bold 14px sans-serif");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&node.data.label, x + 12.0, y + state.options.base_height / 2.0);

	(x, y, w, h)
}

fn draw_rows(state: &DiagramState, node: &DiagramNode, ctx: &CanvasRenderingContext2d) {
	let options = &state.options;
	let (x, _, w, _) = geometry::node_rect(node, options);
	let row_h = options.height_per_column;

	for (row, column) in node.data.columns.iter().enumerate() {
		let row_y = node.position.y + options.base_height + row as f64 * row_h;
		let center_y = row_y + row_h / 2.0;

		if state.highlights.contains(&column.id) {
			ctx.set_fill_style_str(ROW_HIGHLIGHT);
			ctx.fill_rect(x + 1.0, row_y, w - 2.0, row_h);
		}
		if !column.active {
			ctx.set_global_alpha(INACTIVE_ALPHA);
		}

		let mut text_x = x + 12.0;
		ctx.set_font("bold 9px sans-serif");
		ctx.set_text_baseline("middle");
		if column.is_primary_key {
			ctx.set_fill_style_str(PK_BADGE);
			let _ = ctx.fill_text("PK", text_x, center_y);
			text_x += 18.0;
		}
		if column.is_foreign_key {
			ctx.set_fill_style_str(FK_BADGE);
			let _ = ctx.fill_text("FK", text_x, center_y);
			text_x += 18.0;
		}

		ctx.set_font("12px sans-serif");
		ctx.set_fill_style_str(TEXT_PRIMARY);
		let _ = ctx.fill_text(&column.name, text_x, center_y);

		ctx.set_fill_style_str(TEXT_MUTED);
		ctx.set_font("11px sans-serif");
		let type_x = x + w - ANCHOR_ZONE - 2.0 * ROW_CONTROL_WIDTH - 8.0;
		ctx.set_text_align("right");
		let _ = ctx.fill_text(&column.ty, type_x, center_y);
		ctx.set_text_align("left");

		if matches!(state.variant, DiagramVariant::Schema) {
			draw_row_controls(state, column.active, x + w, center_y, ctx);
		}

		ctx.set_global_alpha(1.0);
	}
}

/// Eye toggle and "view distinct values" affordance at the row's right end.
fn draw_row_controls(
	state: &DiagramState,
	active: bool,
	right: f64,
	center_y: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let eye_x = right - ANCHOR_ZONE - ROW_CONTROL_WIDTH / 2.0;
	let distinct_x = right - ANCHOR_ZONE - 1.5 * ROW_CONTROL_WIDTH;

	ctx.set_stroke_style_str(TEXT_MUTED);
	ctx.set_line_width(1.2 / k);
	ctx.begin_path();
	let _ = ctx.ellipse(eye_x, center_y, 5.5, 3.5, 0.0, 0.0, std::f64::consts::TAU);
	ctx.stroke();
	ctx.begin_path();
	let _ = ctx.arc(eye_x, center_y, 1.6, 0.0, std::f64::consts::TAU);
	ctx.set_fill_style_str(if active { TEXT_PRIMARY } else { TEXT_MUTED });
	ctx.fill();
	if !active {
		ctx.begin_path();
		ctx.move_to(eye_x - 6.0, center_y + 5.0);
		ctx.line_to(eye_x + 6.0, center_y - 5.0);
		ctx.stroke();
	}

	ctx.set_fill_style_str(TEXT_MUTED);
	ctx.set_font("bold 11px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text("#", distinct_x, center_y);
	ctx.set_text_align("left");
}

fn draw_schema_node(state: &DiagramState, node: &DiagramNode, ctx: &CanvasRenderingContext2d) {
	if !node.data.active {
		ctx.set_global_alpha(INACTIVE_ALPHA);
	}
	let (x, y, w, _) = draw_card(state, node, ctx);

	// Context-menu affordance
	ctx.set_fill_style_str(TEXT_MUTED);
	ctx.set_font("bold 14px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text("⋯", x + w - 14.0, y + state.options.base_height / 2.0);
	ctx.set_text_align("left");

	draw_rows(state, node, ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_federation_node(state: &DiagramState, node: &DiagramNode, ctx: &CanvasRenderingContext2d) {
	if !node.data.active {
		ctx.set_global_alpha(INACTIVE_ALPHA);
	}
	let (x, y, w, h) = draw_card(state, node, ctx);
	let accent = node
		.data
		.connection_color
		.as_deref()
		.unwrap_or(FK_BADGE);

	// Connection-colored left border
	ctx.set_fill_style_str(accent);
	ctx.fill_rect(x, y + 2.0, 4.0, h - 4.0);

	// Connection badge at the header's right end
	if let Some(name) = &node.data.connection_name {
		ctx.set_font("10px sans-serif");
		ctx.set_text_align("right");
		ctx.set_fill_style_str(accent);
		let _ = ctx.fill_text(name, x + w - 10.0, y + state.options.base_height / 2.0);
		ctx.set_text_align("left");
	}

	draw_rows(state, node, ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_menu(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let Some(menu) = &state.menu else {
		return;
	};
	let active = state
		.node(&menu.node_id)
		.map(|n| n.data.active)
		.unwrap_or(true);
	let items = [
		if active { "Deactivate table" } else { "Activate table" },
		"Link image storage",
		"View sample data",
	];

	let (x, y) = (menu.origin.x, menu.origin.y);
	let h = MENU_ITEM_HEIGHT * items.len() as f64;
	rounded_rect(ctx, x, y, MENU_WIDTH, h, 6.0);
	ctx.set_fill_style_str(HEADER_FILL);
	ctx.fill();
	ctx.set_stroke_style_str(CARD_BORDER);
	ctx.set_line_width(1.0);
	ctx.stroke();

	ctx.set_font("13px sans-serif");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(TEXT_PRIMARY);
	for (i, item) in items.iter().enumerate() {
		let _ = ctx.fill_text(item, x + 12.0, y + (i as f64 + 0.5) * MENU_ITEM_HEIGHT);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn menu_hit_testing() {
		let origin = Point::new(100.0, 50.0);
		assert_eq!(menu_item_at(origin, 110.0, 60.0), Some(0));
		assert_eq!(menu_item_at(origin, 110.0, 50.0 + MENU_ITEM_HEIGHT * 2.5), Some(2));
		assert_eq!(menu_item_at(origin, 99.0, 60.0), None);
		assert_eq!(
			menu_item_at(origin, 110.0, 50.0 + MENU_ITEM_HEIGHT * 3.0 + 1.0),
			None
		);
	}
}
