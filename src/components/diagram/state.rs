use std::collections::{HashMap, HashSet};

use super::fit::ViewportFit;
use super::geometry::{self, NodeRegion};
use super::layout::{self, GridOptions};
use super::types::{
	DiagramEdge, DiagramNode, DiagramVariant, EdgeVariant, LayoutOptions, Point,
};

/// Displacement on either axis must exceed this for a drag-stop to count as
/// a move rather than a click.
pub const DRAG_THRESHOLD: f64 = 5.0;

/// Hit tolerance around an edge's visible path, in graph space. The
/// federation corridor is deliberately much wider than the stroke.
const SCHEMA_EDGE_TOLERANCE: f64 = 6.0;
const FEDERATION_EDGE_TOLERANCE: f64 = 12.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
	Moved,
	Unmoved,
}

/// Click-vs-drag classifier, independent per node id. Captures the node
/// position at drag-start and compares it at drag-stop.
#[derive(Clone, Debug, Default)]
pub struct DragTracker {
	starts: HashMap<String, Point>,
}

impl DragTracker {
	pub fn begin(&mut self, node_id: &str, position: Point) {
		self.starts.insert(node_id.to_string(), position);
	}

	pub fn finish(&mut self, node_id: &str, position: Point) -> DragOutcome {
		let Some(start) = self.starts.remove(node_id) else {
			return DragOutcome::Unmoved;
		};
		let dx = (position.x - start.x).abs();
		let dy = (position.y - start.y).abs();
		if dx > DRAG_THRESHOLD || dy > DRAG_THRESHOLD {
			DragOutcome::Moved
		} else {
			DragOutcome::Unmoved
		}
	}
}

/// Column highlight state, one owned set per diagram instance so that
/// cross-table highlighting is a single membership check.
#[derive(Clone, Debug, Default)]
pub struct HighlightSet {
	columns: HashSet<String>,
}

impl HighlightSet {
	pub fn toggle(&mut self, column_id: &str) {
		if !self.columns.remove(column_id) {
			self.columns.insert(column_id.to_string());
		}
	}

	pub fn contains(&self, column_id: &str) -> bool {
		self.columns.contains(column_id)
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// In-flight node drag gesture (pointer plumbing; classification happens in
/// the tracker).
#[derive(Clone, Debug)]
pub struct ActiveDrag {
	pub node_id: String,
	pub pointer_start: Point,
	pub node_start: Point,
}

/// In-flight connect gesture from a column anchor.
#[derive(Clone, Debug)]
pub struct PendingConnect {
	pub source_handle: String,
	pub cursor: Point,
}

/// Open context menu for one table card, anchored in screen space.
#[derive(Clone, Debug)]
pub struct ContextMenu {
	pub node_id: String,
	pub origin: Point,
}

pub struct DiagramState {
	pub nodes: Vec<DiagramNode>,
	pub edges: Vec<DiagramEdge>,
	pub options: LayoutOptions,
	pub variant: DiagramVariant,
	pub transform: ViewTransform,
	pub fit: ViewportFit,
	pub tracker: DragTracker,
	pub drag: Option<ActiveDrag>,
	pub pan: PanState,
	pub connect: Option<PendingConnect>,
	pub menu: Option<ContextMenu>,
	pub highlights: HighlightSet,
	pub hovered_node: Option<String>,
	pub width: f64,
	pub height: f64,
	pub dirty: bool,
}

impl DiagramState {
	pub fn new(
		nodes: Vec<DiagramNode>,
		edges: Vec<DiagramEdge>,
		variant: DiagramVariant,
		options: LayoutOptions,
		width: f64,
		height: f64,
	) -> Self {
		// Unconnected snapshots read better on a grid; anything with
		// relationships gets the hierarchical pass.
		let (nodes, edges) = if edges.is_empty() {
			(layout::grid_positions(&nodes, &GridOptions::default(), &options), edges)
		} else {
			layout::layout(&nodes, &edges, &options)
		};

		Self {
			nodes,
			edges,
			options,
			variant,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			fit: ViewportFit::new(),
			tracker: DragTracker::default(),
			drag: None,
			pan: PanState::default(),
			connect: None,
			menu: None,
			highlights: HighlightSet::default(),
			hovered_node: None,
			width,
			height,
			dirty: true,
		}
	}

	/// Replace the snapshot and re-run the hierarchical pass. Node ids are
	/// stable across re-layouts, so highlight and drag state survive.
	pub fn replace(&mut self, nodes: Vec<DiagramNode>, edges: Vec<DiagramEdge>) {
		let (nodes, edges) = layout::layout(&nodes, &edges, &self.options);
		self.nodes = nodes;
		self.edges = edges;
		self.dirty = true;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_mut(&mut self, node_id: &str) -> Option<&mut DiagramNode> {
		self.nodes.iter_mut().find(|n| n.id == node_id)
	}

	pub fn node(&self, node_id: &str) -> Option<&DiagramNode> {
		self.nodes.iter().find(|n| n.id == node_id)
	}

	/// Topmost card under a screen point, with the region inside it.
	pub fn region_at(&self, sx: f64, sy: f64) -> Option<(String, NodeRegion)> {
		let p = self.screen_to_graph(sx, sy);
		self.nodes.iter().rev().find_map(|node| {
			geometry::node_region_at(node, self.variant, p, &self.options)
				.map(|region| (node.id.clone(), region))
		})
	}

	/// Edge whose visible path passes near a screen point. Federation edges
	/// use the wide hit corridor.
	pub fn edge_at(&self, sx: f64, sy: f64) -> Option<String> {
		let p = self.screen_to_graph(sx, sy);
		let by_id: HashMap<&str, &DiagramNode> =
			self.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
		self.edges.iter().find_map(|edge| {
			let path = geometry::edge_path(&by_id, edge, &self.options)?;
			let tolerance = match edge.variant {
				EdgeVariant::Schema => SCHEMA_EDGE_TOLERANCE,
				EdgeVariant::Federation => FEDERATION_EDGE_TOLERANCE,
			};
			(geometry::edge_distance(&path, edge.variant, p) <= tolerance)
				.then(|| edge.id.clone())
		})
	}

	pub fn begin_node_drag(&mut self, node_id: &str, sx: f64, sy: f64) {
		let Some(node) = self.node(node_id) else {
			return;
		};
		let node_start = node.position;
		self.tracker.begin(node_id, node_start);
		self.drag = Some(ActiveDrag {
			node_id: node_id.to_string(),
			pointer_start: Point::new(sx, sy),
			node_start,
		});
	}

	pub fn move_node_drag(&mut self, sx: f64, sy: f64) {
		let Some(drag) = self.drag.clone() else {
			return;
		};
		let dx = (sx - drag.pointer_start.x) / self.transform.k;
		let dy = (sy - drag.pointer_start.y) / self.transform.k;
		if let Some(node) = self.node_mut(&drag.node_id) {
			node.position = Point::new(drag.node_start.x + dx, drag.node_start.y + dy);
			self.dirty = true;
		}
	}

	/// Ends the gesture and classifies it. Returns the node id and outcome
	/// so the component can schedule a re-fit only on real displacement.
	pub fn end_node_drag(&mut self) -> Option<(String, Point, DragOutcome)> {
		let drag = self.drag.take()?;
		let position = self.node(&drag.node_id)?.position;
		let outcome = self.tracker.finish(&drag.node_id, position);
		Some((drag.node_id, position, outcome))
	}

	/// Presentation-only: a deactivated table stays in the model so its
	/// relationships remain navigable.
	pub fn toggle_node_active(&mut self, node_id: &str) -> bool {
		if let Some(node) = self.node_mut(node_id) {
			node.data.active = !node.data.active;
			self.dirty = true;
			true
		} else {
			false
		}
	}

	/// Presentation-only; never removes the column or reorders the card.
	pub fn toggle_column_active(&mut self, column_id: &str) -> bool {
		for node in &mut self.nodes {
			if let Some(column) = node.data.columns.iter_mut().find(|c| c.id == column_id) {
				column.active = !column.active;
				self.dirty = true;
				return true;
			}
		}
		false
	}

	pub fn toggle_highlight(&mut self, column_id: &str) {
		self.highlights.toggle(column_id);
		self.dirty = true;
	}

	/// Zoom about a screen point, clamped to the current viewport state.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor)
			.clamp(self.fit.state.min_zoom, self.fit.state.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.dirty = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram::types::{Column, NodeData};

	fn table(id: &str, columns: usize) -> DiagramNode {
		DiagramNode::new(
			id,
			NodeData {
				label: id.to_string(),
				columns: (0..columns)
					.map(|i| Column::new(format!("{id}.c{i}"), format!("c{i}"), "int"))
					.collect(),
				active: true,
				..NodeData::default()
			},
		)
	}

	fn state_with(nodes: Vec<DiagramNode>) -> DiagramState {
		DiagramState::new(
			nodes,
			Vec::new(),
			DiagramVariant::Schema,
			LayoutOptions::default(),
			800.0,
			600.0,
		)
	}

	#[test]
	fn drag_below_threshold_is_a_click() {
		let mut tracker = DragTracker::default();
		tracker.begin("t1", Point::new(10.0, 10.0));
		assert_eq!(
			tracker.finish("t1", Point::new(14.0, 13.0)),
			DragOutcome::Unmoved
		);

		tracker.begin("t1", Point::new(10.0, 10.0));
		assert_eq!(
			tracker.finish("t1", Point::new(16.0, 10.0)),
			DragOutcome::Moved
		);
	}

	#[test]
	fn drag_state_is_independent_per_node() {
		let mut tracker = DragTracker::default();
		tracker.begin("a", Point::new(0.0, 0.0));
		tracker.begin("b", Point::new(100.0, 0.0));
		assert_eq!(tracker.finish("b", Point::new(100.0, 0.0)), DragOutcome::Unmoved);
		assert_eq!(tracker.finish("a", Point::new(50.0, 0.0)), DragOutcome::Moved);
		// Finishing an untracked drag is a no-op classification.
		assert_eq!(tracker.finish("c", Point::new(9.0, 9.0)), DragOutcome::Unmoved);
	}

	#[test]
	fn highlight_toggle_round_trip() {
		let mut highlights = HighlightSet::default();
		highlights.toggle("a");
		highlights.toggle("b");
		highlights.toggle("a");
		assert!(!highlights.contains("a"));
		assert!(highlights.contains("b"));
	}

	#[test]
	fn active_toggles_never_shrink_the_model() {
		let mut state = state_with(vec![table("t1", 3)]);
		assert!(state.toggle_column_active("t1.c1"));
		assert!(state.toggle_node_active("t1"));
		let node = state.node("t1").unwrap();
		assert_eq!(node.data.columns.len(), 3);
		assert!(!node.data.columns[1].active);
		assert!(!node.data.active);
		// Column order is untouched by the toggle.
		let names: Vec<&str> = node.data.columns.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["c0", "c1", "c2"]);
	}

	#[test]
	fn end_drag_reports_displacement_outcome() {
		let mut state = state_with(vec![table("t1", 2)]);
		state.transform = ViewTransform { x: 0.0, y: 0.0, k: 1.0 };
		let start = state.node("t1").unwrap().position;

		state.begin_node_drag("t1", 100.0, 100.0);
		state.move_node_drag(103.0, 102.0);
		let (_, _, outcome) = state.end_node_drag().unwrap();
		assert_eq!(outcome, DragOutcome::Unmoved);
		// The sub-threshold nudge still moved the card a little.
		assert_ne!(state.node("t1").unwrap().position, start);

		state.begin_node_drag("t1", 100.0, 100.0);
		state.move_node_drag(160.0, 100.0);
		let (id, pos, outcome) = state.end_node_drag().unwrap();
		assert_eq!(id, "t1");
		assert_eq!(outcome, DragOutcome::Moved);
		assert_eq!(pos, state.node("t1").unwrap().position);
	}

	#[test]
	fn zoom_clamps_to_viewport_state() {
		let mut state = state_with(vec![table("t1", 2)]);
		let nodes = state.nodes.clone();
		let options = state.options;
		state.fit.recompute(&nodes, &options, 800.0, 600.0, 0);
		for _ in 0..50 {
			state.zoom_at(400.0, 300.0, 0.5);
		}
		assert!(state.transform.k >= state.fit.state.min_zoom - 1e-12);
		for _ in 0..50 {
			state.zoom_at(400.0, 300.0, 2.0);
		}
		assert!(state.transform.k <= state.fit.state.max_zoom + 1e-12);
	}
}
