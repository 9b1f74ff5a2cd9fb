use super::layout::{self, calculate_min_zoom};
use super::state::ViewTransform;
use super::types::{DiagramNode, LayoutOptions, ViewportState};

/// Margin added around the content bounding box before fitting.
pub const FIT_PADDING: f64 = 200.0;
/// Wheel-zoom ceiling; table cards carry text, 4x is past legibility needs.
pub const MAX_ZOOM: f64 = 4.0;

/// Debounce before a fit request measures the container and writes the
/// transform. A full re-layout moves more nodes than a drag, so it gets the
/// longer settle window.
pub const FIT_DELAY_DRAG_MS: i32 = 150;
pub const FIT_DELAY_LAYOUT_MS: i32 = 300;

/// Viewport fit controller. Recomputes `ViewportState` only on structural
/// changes (node count, drag with real displacement, caller layout epoch),
/// never per frame or per pointer move.
#[derive(Clone, Copy, Debug)]
pub struct ViewportFit {
	pub state: ViewportState,
	layout_epoch: u32,
}

impl Default for ViewportFit {
	fn default() -> Self {
		Self {
			state: ViewportState {
				min_zoom: 0.1,
				max_zoom: MAX_ZOOM,
				computed_at: 0,
			},
			layout_epoch: 0,
		}
	}
}

impl ViewportFit {
	pub fn new() -> Self {
		Self::default()
	}

	/// True when the node count or the caller's layout epoch moved since the
	/// last recompute.
	pub fn needs_recompute(&self, node_count: usize, layout_epoch: u32) -> bool {
		self.state.computed_at != node_count || self.layout_epoch != layout_epoch
	}

	pub fn recompute(
		&mut self,
		nodes: &[DiagramNode],
		options: &LayoutOptions,
		container_w: f64,
		container_h: f64,
		layout_epoch: u32,
	) -> ViewportState {
		self.state = ViewportState {
			min_zoom: calculate_min_zoom(nodes, container_w, container_h, FIT_PADDING, options),
			max_zoom: MAX_ZOOM,
			computed_at: nodes.len(),
		};
		self.layout_epoch = layout_epoch;
		self.state
	}
}

/// Pan+zoom transform that centers the content bounding box in the
/// container at the fitted zoom.
pub fn fit_transform(
	nodes: &[DiagramNode],
	options: &LayoutOptions,
	container_w: f64,
	container_h: f64,
	zoom: f64,
) -> ViewTransform {
	if nodes.is_empty() {
		return ViewTransform {
			x: container_w / 2.0,
			y: container_h / 2.0,
			k: zoom,
		};
	}
	let (min_x, min_y, max_x, max_y) = layout::bounds(nodes, options);
	let center_x = (min_x + max_x) / 2.0;
	let center_y = (min_y + max_y) / 2.0;
	ViewTransform {
		x: container_w / 2.0 - center_x * zoom,
		y: container_h / 2.0 - center_y * zoom,
		k: zoom,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram::types::{Column, NodeData, Point};

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

	#[test]
	fn recompute_records_node_count() {
		let mut fit = ViewportFit::new();
		let nodes = vec![table("a", 5)];
		let state = fit.recompute(&nodes, &LayoutOptions::default(), 800.0, 600.0, 1);
		assert_eq!(state.computed_at, 1);
		assert!((state.min_zoom - 0.9).abs() < 1e-9);
		assert!(!fit.needs_recompute(1, 1));
		assert!(fit.needs_recompute(2, 1));
		assert!(fit.needs_recompute(1, 2));
	}

	#[test]
	fn fit_transform_centers_content() {
		let options = LayoutOptions::default();
		let mut node = table("a", 5); // 280x180
		node.position = Point::new(100.0, 50.0);
		let t = fit_transform(&[node], &options, 800.0, 600.0, 1.0);
		// Content center (240, 140) must land on the container center.
		assert!((240.0 * t.k + t.x - 400.0).abs() < 1e-9);
		assert!((140.0 * t.k + t.y - 300.0).abs() < 1e-9);
	}
}
