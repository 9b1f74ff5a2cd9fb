use std::collections::HashMap;

use super::types::{
	DiagramEdge, DiagramNode, DiagramVariant, EdgeVariant, LayoutOptions, Point, Side,
	parse_handle,
};

/// Width of the per-row control cells (eye toggle, distinct values).
pub const ROW_CONTROL_WIDTH: f64 = 22.0;
/// Strip along the card's left/right edge that acts as a column anchor.
pub const ANCHOR_ZONE: f64 = 10.0;
/// Header cell reserved for the context-menu affordance.
pub const MENU_BUTTON_WIDTH: f64 = 28.0;

/// Horizontal stub length before an orthogonal edge jogs between ranks.
const STEP_STUB: f64 = 24.0;
/// Samples used to approximate a bezier for hit testing.
const BEZIER_SAMPLES: usize = 24;

/// One edge endpoint pair plus the card sides the anchors sit on. Both edge
/// variants consume this shape; swapping schema and federation mode never
/// changes the edge data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePath {
	pub start: Point,
	pub end: Point,
	pub start_side: Side,
	pub end_side: Side,
}

/// What a graph-space point lands on inside one node card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRegion {
	Header,
	MenuButton,
	/// Column row body (click toggles highlight).
	Row(usize),
	/// Per-column eye toggle (schema variant only).
	RowEye(usize),
	/// Per-column "view distinct values" affordance (schema variant only).
	RowDistinct(usize),
	/// Column anchor strip (starts or completes a connect gesture).
	RowAnchor(usize, Side),
}

pub fn node_rect(node: &DiagramNode, options: &LayoutOptions) -> (f64, f64, f64, f64) {
	let (w, h) = super::layout::node_size(node, options);
	(node.position.x, node.position.y, w, h)
}

/// Vertical center of a column row, in graph space.
pub fn row_center_y(node: &DiagramNode, row: usize, options: &LayoutOptions) -> f64 {
	node.position.y
		+ options.base_height
		+ row as f64 * options.height_per_column
		+ options.height_per_column / 2.0
}

/// Anchor point for a column on the given card side.
pub fn anchor_position(
	node: &DiagramNode,
	row: usize,
	side: Side,
	options: &LayoutOptions,
) -> Point {
	let x = match side {
		Side::Left => node.position.x,
		Side::Right => node.position.x + options.node_width,
	};
	Point::new(x, row_center_y(node, row, options))
}

fn resolve_handle(
	node: &DiagramNode,
	handle: &str,
	options: &LayoutOptions,
) -> (Point, Side) {
	if let Some((column_id, side)) = parse_handle(handle) {
		if let Some(row) = node.data.columns.iter().position(|c| c.id == column_id) {
			return (anchor_position(node, row, side, options), side);
		}
	}
	// Unknown column: degrade to the card's vertical center on the right
	// edge rather than failing the edge.
	let (x, y, w, h) = node_rect(node, options);
	(Point::new(x + w, y + h / 2.0), Side::Right)
}

/// Build the shared path contract for one edge. `None` only when an endpoint
/// node is missing, which the layout pass already filters out.
pub fn edge_path(
	nodes_by_id: &HashMap<&str, &DiagramNode>,
	edge: &DiagramEdge,
	options: &LayoutOptions,
) -> Option<EdgePath> {
	let source = nodes_by_id.get(edge.source.as_str())?;
	let target = nodes_by_id.get(edge.target.as_str())?;
	let (start, start_side) = resolve_handle(source, &edge.source_handle, options);
	let (end, end_side) = resolve_handle(target, &edge.target_handle, options);
	Some(EdgePath {
		start,
		end,
		start_side,
		end_side,
	})
}

fn side_sign(side: Side) -> f64 {
	match side {
		Side::Left => -1.0,
		Side::Right => 1.0,
	}
}

/// Orthogonal "smoothstep" route: stub out of each anchor, one vertical jog
/// at the midpoint between the stubs.
pub fn smoothstep_points(path: &EdgePath) -> Vec<Point> {
	let sx = path.start.x + side_sign(path.start_side) * STEP_STUB;
	let ex = path.end.x + side_sign(path.end_side) * STEP_STUB;
	let mid_x = (sx + ex) / 2.0;
	vec![
		path.start,
		Point::new(mid_x, path.start.y),
		Point::new(mid_x, path.end.y),
		path.end,
	]
}

/// Cubic bezier control points with horizontal tangents out of the anchors.
pub fn bezier_controls(path: &EdgePath) -> (Point, Point) {
	let reach = ((path.end.x - path.start.x).abs() / 2.0).max(40.0);
	(
		Point::new(path.start.x + side_sign(path.start_side) * reach, path.start.y),
		Point::new(path.end.x + side_sign(path.end_side) * reach, path.end.y),
	)
}

/// Sample the bezier as a polyline (for hit testing, not painting).
pub fn bezier_points(path: &EdgePath) -> Vec<Point> {
	let (c1, c2) = bezier_controls(path);
	(0..=BEZIER_SAMPLES)
		.map(|i| {
			let t = i as f64 / BEZIER_SAMPLES as f64;
			let u = 1.0 - t;
			let x = u * u * u * path.start.x
				+ 3.0 * u * u * t * c1.x
				+ 3.0 * u * t * t * c2.x
				+ t * t * t * path.end.x;
			let y = u * u * u * path.start.y
				+ 3.0 * u * u * t * c1.y
				+ 3.0 * u * t * t * c2.y
				+ t * t * t * path.end.y;
			Point::new(x, y)
		})
		.collect()
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq == 0.0 {
		0.0
	} else {
		(((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.x + t * dx, a.y + t * dy);
	((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

pub fn polyline_distance(p: Point, points: &[Point]) -> f64 {
	points
		.windows(2)
		.map(|w| segment_distance(p, w[0], w[1]))
		.fold(f64::MAX, f64::min)
}

/// Distance from a graph-space point to an edge's visible path. Federation
/// edges are curves; schema edges are the stepped route.
pub fn edge_distance(path: &EdgePath, variant: EdgeVariant, p: Point) -> f64 {
	let points = match variant {
		EdgeVariant::Schema => smoothstep_points(path),
		EdgeVariant::Federation => bezier_points(path),
	};
	polyline_distance(p, &points)
}

/// Classify a graph-space point against one node card. Anchor strips win
/// over row controls, controls win over the row body.
pub fn node_region_at(
	node: &DiagramNode,
	variant: DiagramVariant,
	p: Point,
	options: &LayoutOptions,
) -> Option<NodeRegion> {
	let (x, y, w, h) = node_rect(node, options);
	if p.x < x || p.x > x + w || p.y < y || p.y > y + h {
		return None;
	}

	let local_y = p.y - y;
	if local_y < options.base_height {
		if matches!(variant, DiagramVariant::Schema) && p.x > x + w - MENU_BUTTON_WIDTH {
			return Some(NodeRegion::MenuButton);
		}
		return Some(NodeRegion::Header);
	}

	let row = ((local_y - options.base_height) / options.height_per_column) as usize;
	if row >= node.data.columns.len() {
		return Some(NodeRegion::Header);
	}

	if p.x <= x + ANCHOR_ZONE {
		return Some(NodeRegion::RowAnchor(row, Side::Left));
	}
	if p.x >= x + w - ANCHOR_ZONE {
		return Some(NodeRegion::RowAnchor(row, Side::Right));
	}
	if matches!(variant, DiagramVariant::Schema) {
		if p.x >= x + w - ANCHOR_ZONE - ROW_CONTROL_WIDTH {
			return Some(NodeRegion::RowEye(row));
		}
		if p.x >= x + w - ANCHOR_ZONE - 2.0 * ROW_CONTROL_WIDTH {
			return Some(NodeRegion::RowDistinct(row));
		}
	}
	Some(NodeRegion::Row(row))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram::types::{Column, NodeData};

	fn node_with_columns(id: &str, count: usize) -> DiagramNode {
		let columns = (0..count)
			.map(|i| Column::new(format!("{id}.c{i}"), format!("c{i}"), "int"))
			.collect();
		DiagramNode::new(
			id,
			NodeData {
				label: id.to_string(),
				columns,
				active: true,
				..NodeData::default()
			},
		)
	}

	#[test]
	fn anchors_sit_on_row_centers() {
		let options = LayoutOptions::default();
		let node = node_with_columns("t", 3);
		let a = anchor_position(&node, 1, Side::Left, &options);
		assert_eq!(a.x, node.position.x);
		assert_eq!(
			a.y,
			options.base_height + options.height_per_column * 1.5
		);
		let b = anchor_position(&node, 1, Side::Right, &options);
		assert_eq!(b.x, node.position.x + options.node_width);
	}

	#[test]
	fn smoothstep_is_orthogonal() {
		let path = EdgePath {
			start: Point::new(280.0, 100.0),
			end: Point::new(500.0, 300.0),
			start_side: Side::Right,
			end_side: Side::Left,
		};
		let points = smoothstep_points(&path);
		assert_eq!(points.first(), Some(&path.start));
		assert_eq!(points.last(), Some(&path.end));
		for w in points.windows(2) {
			let horizontal = (w[0].y - w[1].y).abs() < 1e-9;
			let vertical = (w[0].x - w[1].x).abs() < 1e-9;
			assert!(horizontal || vertical);
		}
	}

	#[test]
	fn bezier_hit_corridor_is_wide() {
		let path = EdgePath {
			start: Point::new(0.0, 0.0),
			end: Point::new(400.0, 200.0),
			start_side: Side::Right,
			end_side: Side::Left,
		};
		let points = bezier_points(&path);
		let mid = points[points.len() / 2];
		// A point 8px off the curve is still inside a 12px hit corridor.
		let probe = Point::new(mid.x, mid.y + 8.0);
		assert!(edge_distance(&path, EdgeVariant::Federation, probe) < 12.0);
		// But far-away points are not.
		let far = Point::new(mid.x, mid.y + 80.0);
		assert!(edge_distance(&path, EdgeVariant::Federation, far) > 12.0);
	}

	#[test]
	fn region_classification() {
		let options = LayoutOptions::default();
		let node = node_with_columns("t", 2);
		let (x, y, w, _) = node_rect(&node, &options);
		let row0_y = y + options.base_height + options.height_per_column / 2.0;

		assert_eq!(
			node_region_at(&node, DiagramVariant::Schema, Point::new(x + 5.0, y + 5.0), &options),
			Some(NodeRegion::Header)
		);
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Schema,
				Point::new(x + w - 4.0, y + 5.0),
				&options
			),
			Some(NodeRegion::MenuButton)
		);
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Schema,
				Point::new(x + w / 2.0, row0_y),
				&options
			),
			Some(NodeRegion::Row(0))
		);
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Schema,
				Point::new(x + w - ANCHOR_ZONE - 4.0, row0_y),
				&options
			),
			Some(NodeRegion::RowEye(0))
		);
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Schema,
				Point::new(x + 2.0, row0_y),
				&options
			),
			Some(NodeRegion::RowAnchor(0, Side::Left))
		);
		// Federation cards have no per-column controls.
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Federation,
				Point::new(x + w - ANCHOR_ZONE - 4.0, row0_y),
				&options
			),
			Some(NodeRegion::Row(0))
		);
		assert_eq!(
			node_region_at(
				&node,
				DiagramVariant::Schema,
				Point::new(x - 1.0, row0_y),
				&options
			),
			None
		);
	}
}
