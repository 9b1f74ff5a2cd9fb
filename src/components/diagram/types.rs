#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
	pub id: String,
	pub name: String,
	pub ty: String,
	pub is_primary_key: bool,
	pub is_foreign_key: bool,
	pub active: bool,
	pub is_image_path: bool,
}

impl Column {
	pub fn new(id: impl Into<String>, name: impl Into<String>, ty: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			ty: ty.into(),
			is_primary_key: false,
			is_foreign_key: false,
			active: true,
			is_image_path: false,
		}
	}

	pub fn primary_key(mut self) -> Self {
		self.is_primary_key = true;
		self
	}

	pub fn foreign_key(mut self) -> Self {
		self.is_foreign_key = true;
		self
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
	pub label: String,
	/// Display order; never reordered by toggles.
	pub columns: Vec<Column>,
	pub active: bool,
	pub connection_id: Option<String>,
	pub connection_name: Option<String>,
	pub connection_color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramNode {
	/// Stable across re-layouts; drag and highlight state key off it.
	pub id: String,
	pub position: Point,
	pub data: NodeData,
}

impl DiagramNode {
	pub fn new(id: impl Into<String>, data: NodeData) -> Self {
		Self {
			id: id.into(),
			position: Point::default(),
			data,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeVariant {
	#[default]
	Schema,
	Federation,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeStyle {
	pub stroke: Option<String>,
	pub stroke_width: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub source_handle: String,
	pub target_handle: String,
	pub variant: EdgeVariant,
	pub style: Option<EdgeStyle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
	Left,
	Right,
}

/// Column anchor handles are `"{columnId}-left"` / `"{columnId}-right"`.
pub fn column_handle(column_id: &str, side: Side) -> String {
	match side {
		Side::Left => format!("{column_id}-left"),
		Side::Right => format!("{column_id}-right"),
	}
}

pub fn parse_handle(handle: &str) -> Option<(&str, Side)> {
	if let Some(column_id) = handle.strip_suffix("-left") {
		Some((column_id, Side::Left))
	} else {
		handle
			.strip_suffix("-right")
			.map(|column_id| (column_id, Side::Right))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankDirection {
	#[default]
	LeftToRight,
	TopToBottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
	pub rank_direction: RankDirection,
	/// Gap between neighbors within a rank.
	pub node_spacing: f64,
	/// Gap between consecutive ranks.
	pub rank_spacing: f64,
	pub base_height: f64,
	pub height_per_column: f64,
	pub node_width: f64,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			rank_direction: RankDirection::LeftToRight,
			node_spacing: 60.0,
			rank_spacing: 120.0,
			base_height: 40.0,
			height_per_column: 28.0,
			node_width: 280.0,
		}
	}
}

/// Derived per recompute; never hand-edited.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Node count the value was derived from.
	pub computed_at: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagramVariant {
	#[default]
	Schema,
	Federation,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handle_round_trip() {
		let handle = column_handle("orders.customer_id", Side::Right);
		assert_eq!(handle, "orders.customer_id-right");
		assert_eq!(
			parse_handle(&handle),
			Some(("orders.customer_id", Side::Right))
		);
		assert_eq!(parse_handle("c1-left"), Some(("c1", Side::Left)));
		assert_eq!(parse_handle("no-suffix-here"), None);
	}
}
