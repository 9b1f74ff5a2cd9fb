use std::collections::{HashMap, HashSet};

use log::warn;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, depth_first_search};

use super::types::{DiagramEdge, DiagramNode, LayoutOptions, Point, RankDirection};

/// Footprint of one table card: fixed width, height grows with column count.
pub fn node_size(node: &DiagramNode, options: &LayoutOptions) -> (f64, f64) {
	(
		options.node_width,
		options.base_height + node.data.columns.len() as f64 * options.height_per_column,
	)
}

/// Hierarchical layered layout. Builds a fresh directed graph on every call:
/// no incremental state, identical input always yields identical positions.
///
/// Edges referencing unknown node ids are dropped from the pass and from the
/// returned edge set; the host surfaces the data-integrity problem.
pub fn layout(
	nodes: &[DiagramNode],
	edges: &[DiagramEdge],
	options: &LayoutOptions,
) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
	let id_to_slot: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();

	let mut graph: DiGraph<usize, ()> = DiGraph::new();
	let indices: Vec<NodeIndex> = (0..nodes.len()).map(|slot| graph.add_node(slot)).collect();

	let mut kept_edges: Vec<DiagramEdge> = Vec::new();
	for edge in edges {
		let (Some(&src), Some(&tgt)) = (
			id_to_slot.get(edge.source.as_str()),
			id_to_slot.get(edge.target.as_str()),
		) else {
			warn!(
				"dropping edge {}: endpoint {} -> {} not in node set",
				edge.id, edge.source, edge.target
			);
			continue;
		};
		if src != tgt {
			graph.add_edge(indices[src], indices[tgt], ());
		}
		kept_edges.push(edge.clone());
	}

	let ranks = assign_ranks(&graph, &indices);
	let ordering = order_ranks(&graph, &ranks, nodes.len());
	let positions = assign_coordinates(nodes, &ordering, options);

	let positioned = nodes
		.iter()
		.enumerate()
		.map(|(slot, node)| {
			let mut node = node.clone();
			node.position = positions[slot];
			node
		})
		.collect();

	(positioned, kept_edges)
}

/// Longest-path rank assignment over the graph with back edges reversed.
/// Back edges are found by DFS in insertion order, so the result is
/// deterministic for a fixed input.
fn assign_ranks(graph: &DiGraph<usize, ()>, indices: &[NodeIndex]) -> Vec<usize> {
	let mut back_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
	depth_first_search(graph, indices.iter().copied(), |event| {
		if let DfsEvent::BackEdge(src, tgt) = event {
			back_edges.insert((src, tgt));
		}
	});

	let dag_edges: Vec<(usize, usize)> = graph
		.edge_indices()
		.filter_map(|e| graph.edge_endpoints(e))
		.map(|(src, tgt)| {
			if back_edges.contains(&(src, tgt)) {
				(graph[tgt], graph[src])
			} else {
				(graph[src], graph[tgt])
			}
		})
		.collect();

	let mut ranks = vec![0usize; indices.len()];
	let mut changed = true;
	while changed {
		changed = false;
		for &(src, tgt) in &dag_edges {
			if ranks[tgt] < ranks[src] + 1 {
				ranks[tgt] = ranks[src] + 1;
				changed = true;
			}
		}
	}
	ranks
}

/// Barycenter crossing-minimization sweeps. Initial order within a rank is
/// original array order, which doubles as the deterministic tie-break when
/// several orderings are equally good.
fn order_ranks(graph: &DiGraph<usize, ()>, ranks: &[usize], node_count: usize) -> Vec<Vec<usize>> {
	let rank_count = ranks.iter().copied().max().map(|m| m + 1).unwrap_or(0);
	let mut ordering: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
	for slot in 0..node_count {
		ordering[ranks[slot]].push(slot);
	}

	// slot -> neighbors (undirected; layering already fixed the ranks)
	let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
	for e in graph.edge_indices() {
		if let Some((src, tgt)) = graph.edge_endpoints(e) {
			neighbors[graph[src]].push(graph[tgt]);
			neighbors[graph[tgt]].push(graph[src]);
		}
	}

	let barycenter = |slot: usize, adjacent_pos: &HashMap<usize, f64>| -> f64 {
		let positions: Vec<f64> = neighbors[slot]
			.iter()
			.filter_map(|nb| adjacent_pos.get(nb).copied())
			.collect();
		if positions.is_empty() {
			f64::INFINITY
		} else {
			positions.iter().sum::<f64>() / positions.len() as f64
		}
	};

	let max_passes = 8;
	let mut best = count_crossings(&ordering, &neighbors, ranks);
	for _ in 0..max_passes {
		for r in 1..rank_count {
			let prev: HashMap<usize, f64> = ordering[r - 1]
				.iter()
				.enumerate()
				.map(|(i, &slot)| (slot, i as f64))
				.collect();
			ordering[r].sort_by(|&a, &b| {
				barycenter(a, &prev)
					.partial_cmp(&barycenter(b, &prev))
					.unwrap_or(std::cmp::Ordering::Equal)
			});
		}
		for r in (0..rank_count.saturating_sub(1)).rev() {
			let next: HashMap<usize, f64> = ordering[r + 1]
				.iter()
				.enumerate()
				.map(|(i, &slot)| (slot, i as f64))
				.collect();
			ordering[r].sort_by(|&a, &b| {
				barycenter(a, &next)
					.partial_cmp(&barycenter(b, &next))
					.unwrap_or(std::cmp::Ordering::Equal)
			});
		}

		let crossings = count_crossings(&ordering, &neighbors, ranks);
		if crossings >= best {
			break;
		}
		best = crossings;
	}

	ordering
}

fn count_crossings(ordering: &[Vec<usize>], neighbors: &[Vec<usize>], ranks: &[usize]) -> usize {
	let mut total = 0;
	for r in 0..ordering.len().saturating_sub(1) {
		let lower_pos: HashMap<usize, usize> = ordering[r + 1]
			.iter()
			.enumerate()
			.map(|(i, &slot)| (slot, i))
			.collect();
		let mut spans: Vec<(usize, usize)> = Vec::new();
		for (upper, &slot) in ordering[r].iter().enumerate() {
			for nb in &neighbors[slot] {
				if ranks[*nb] == r + 1 {
					if let Some(&lower) = lower_pos.get(nb) {
						spans.push((upper, lower));
					}
				}
			}
		}
		for i in 0..spans.len() {
			for j in (i + 1)..spans.len() {
				let ((a0, a1), (b0, b1)) = (spans[i], spans[j]);
				if (a0 < b0 && a1 > b1) || (a0 > b0 && a1 < b1) {
					total += 1;
				}
			}
		}
	}
	total
}

/// Center-to-top-left output mapping: each node is centered on its
/// rank/order slot, the returned position is the top-left corner.
fn assign_coordinates(
	nodes: &[DiagramNode],
	ordering: &[Vec<usize>],
	options: &LayoutOptions,
) -> Vec<Point> {
	let mut positions = vec![Point::default(); nodes.len()];

	match options.rank_direction {
		RankDirection::LeftToRight => {
			// Fixed width per rank; stack real heights along the cross axis.
			for (r, rank_slots) in ordering.iter().enumerate() {
				let center_x =
					r as f64 * (options.node_width + options.rank_spacing) + options.node_width / 2.0;
				let total: f64 = rank_slots
					.iter()
					.map(|&slot| node_size(&nodes[slot], options).1)
					.sum::<f64>()
					+ rank_slots.len().saturating_sub(1) as f64 * options.node_spacing;
				let mut cursor = -total / 2.0;
				for &slot in rank_slots {
					let (w, h) = node_size(&nodes[slot], options);
					let center_y = cursor + h / 2.0;
					positions[slot] = Point::new(center_x - w / 2.0, center_y - h / 2.0);
					cursor += h + options.node_spacing;
				}
			}
		}
		RankDirection::TopToBottom => {
			// Rank extent is the tallest node in the rank.
			let mut rank_y = 0.0;
			for rank_slots in ordering {
				let max_h = rank_slots
					.iter()
					.map(|&slot| node_size(&nodes[slot], options).1)
					.fold(0.0, f64::max);
				let total: f64 = rank_slots.len() as f64 * options.node_width
					+ rank_slots.len().saturating_sub(1) as f64 * options.node_spacing;
				let mut cursor = -total / 2.0;
				for &slot in rank_slots {
					let (w, h) = node_size(&nodes[slot], options);
					let center_y = rank_y + max_h / 2.0;
					positions[slot] = Point::new(cursor, center_y - h / 2.0);
					cursor += w + options.node_spacing;
				}
				rank_y += max_h + options.rank_spacing;
			}
		}
	}

	positions
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridOptions {
	pub columns: usize,
	pub gap_x: f64,
	pub gap_y: f64,
}

impl Default for GridOptions {
	fn default() -> Self {
		Self {
			columns: 3,
			gap_x: 100.0,
			gap_y: 80.0,
		}
	}
}

/// Row-major fallback placement for callers that have not run a real layout
/// yet (first paint). Each row advances by its tallest card.
pub fn grid_positions(
	nodes: &[DiagramNode],
	grid: &GridOptions,
	options: &LayoutOptions,
) -> Vec<DiagramNode> {
	let columns = grid.columns.max(1);
	let mut out = Vec::with_capacity(nodes.len());
	let mut x = 0.0;
	let mut y = 0.0;
	let mut row_height: f64 = 0.0;

	for (i, node) in nodes.iter().enumerate() {
		let (w, h) = node_size(node, options);
		let mut node = node.clone();
		node.position = Point::new(x, y);
		out.push(node);
		row_height = row_height.max(h);

		if (i + 1) % columns == 0 {
			x = 0.0;
			y += row_height + grid.gap_y;
			row_height = 0.0;
		} else {
			x += w + grid.gap_x;
		}
	}

	out
}

/// Minimum zoom that still fits every node footprint plus a padding margin,
/// with a 10% safety margin, floored at 5% and capped at 100%. Pure function
/// over already-positioned nodes; degenerate geometry falls back to 0.1.
pub fn calculate_min_zoom(
	nodes: &[DiagramNode],
	container_w: f64,
	container_h: f64,
	padding: f64,
	options: &LayoutOptions,
) -> f64 {
	if nodes.is_empty() || container_w < 1.0 || container_h < 1.0 {
		return 0.1;
	}

	let (min_x, min_y, max_x, max_y) = bounds(nodes, options);
	let content_w = (max_x - min_x) + padding;
	let content_h = (max_y - min_y) + padding;
	if content_w <= 0.0 || content_h <= 0.0 {
		return 0.1;
	}

	let zoom_x = container_w / content_w;
	let zoom_y = container_h / content_h;
	let raw = zoom_x.min(zoom_y).min(1.0);
	(raw * 0.9).max(0.05)
}

/// Axis-aligned bounding box of all node footprints.
pub fn bounds(nodes: &[DiagramNode], options: &LayoutOptions) -> (f64, f64, f64, f64) {
	let mut min_x = f64::MAX;
	let mut min_y = f64::MAX;
	let mut max_x = f64::MIN;
	let mut max_y = f64::MIN;
	for node in nodes {
		let (w, h) = node_size(node, options);
		min_x = min_x.min(node.position.x);
		min_y = min_y.min(node.position.y);
		max_x = max_x.max(node.position.x + w);
		max_y = max_y.max(node.position.y + h);
	}
	(min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram::types::{Column, EdgeVariant, NodeData};

	fn table(id: &str, column_count: usize) -> DiagramNode {
		let columns = (0..column_count)
			.map(|i| Column::new(format!("{id}.c{i}"), format!("c{i}"), "text"))
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

	fn edge(id: &str, source: &str, target: &str) -> DiagramEdge {
		DiagramEdge {
			id: id.to_string(),
			source: source.to_string(),
			target: target.to_string(),
			source_handle: format!("{source}.c0-right"),
			target_handle: format!("{target}.c0-left"),
			variant: EdgeVariant::Schema,
			style: None,
		}
	}

	#[test]
	fn layout_is_deterministic() {
		let nodes = vec![table("a", 3), table("b", 1), table("c", 5), table("d", 2)];
		let edges = vec![edge("e1", "a", "b"), edge("e2", "a", "c"), edge("e3", "c", "d")];
		let options = LayoutOptions::default();

		let (first, _) = layout(&nodes, &edges, &options);
		let (second, _) = layout(&nodes, &edges, &options);
		for (a, b) in first.iter().zip(&second) {
			assert_eq!(a.position, b.position);
		}
	}

	#[test]
	fn height_grows_with_column_count() {
		let options = LayoutOptions::default();
		let small = table("s", 2);
		let big = table("b", 3);
		assert!(node_size(&big, &options).1 > node_size(&small, &options).1);
		assert_eq!(node_size(&big, &options).1, 40.0 + 3.0 * 28.0);
	}

	#[test]
	fn dangling_edges_are_dropped_without_panic() {
		let nodes = vec![table("a", 1), table("b", 1)];
		let edges = vec![edge("ok", "a", "b"), edge("dangling", "a", "ghost")];
		let (positioned, kept) = layout(&nodes, &edges, &LayoutOptions::default());
		assert_eq!(positioned.len(), 2);
		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].id, "ok");
	}

	#[test]
	fn tall_table_claims_more_vertical_extent() {
		// t1(2 cols) -> t2(6 cols) -> t3(1 col), left to right
		let nodes = vec![table("t1", 2), table("t2", 6), table("t3", 1)];
		let edges = vec![edge("e1", "t1", "t2"), edge("e2", "t2", "t3")];
		let options = LayoutOptions::default();
		let (positioned, _) = layout(&nodes, &edges, &options);

		let t2 = &positioned[1];
		let t2_h = node_size(t2, &options).1;
		assert_eq!(t2_h, options.base_height + 6.0 * options.height_per_column);
		for other in [&positioned[0], &positioned[2]] {
			let h = node_size(other, &options).1;
			assert!(t2_h > h);
			// Different ranks, so no overlap with t2's footprint at all.
			assert!(
				other.position.x + options.node_width <= t2.position.x
					|| t2.position.x + options.node_width <= other.position.x
			);
		}
	}

	#[test]
	fn rank_neighbors_keep_spacing() {
		// Two siblings of a shared parent share a rank; they must be
		// separated by at least node_spacing regardless of height.
		let nodes = vec![table("p", 1), table("a", 8), table("b", 2)];
		let edges = vec![edge("e1", "p", "a"), edge("e2", "p", "b")];
		let options = LayoutOptions::default();
		let (positioned, _) = layout(&nodes, &edges, &options);

		let (a, b) = (&positioned[1], &positioned[2]);
		let a_h = node_size(a, &options).1;
		let b_h = node_size(b, &options).1;
		let (top, top_h, bottom) = if a.position.y < b.position.y {
			(a, a_h, b)
		} else {
			(b, b_h, a)
		};
		assert!(bottom.position.y - (top.position.y + top_h) >= options.node_spacing - 1e-9);
	}

	#[test]
	fn cycles_do_not_hang_layout() {
		let nodes = vec![table("a", 1), table("b", 1), table("c", 1)];
		let edges = vec![
			edge("e1", "a", "b"),
			edge("e2", "b", "c"),
			edge("e3", "c", "a"),
		];
		let (positioned, kept) = layout(&nodes, &edges, &LayoutOptions::default());
		assert_eq!(positioned.len(), 3);
		assert_eq!(kept.len(), 3);
	}

	#[test]
	fn grid_positions_advance_by_tallest_row_member() {
		let nodes = vec![table("a", 1), table("b", 10), table("c", 1), table("d", 1)];
		let options = LayoutOptions::default();
		let grid = GridOptions {
			columns: 3,
			..GridOptions::default()
		};
		let placed = grid_positions(&nodes, &grid, &options);

		assert_eq!(placed[0].position, Point::new(0.0, 0.0));
		let b_h = node_size(&placed[1], &options).1;
		assert_eq!(placed[3].position.x, 0.0);
		assert_eq!(placed[3].position.y, b_h + grid.gap_y);
	}

	#[test]
	fn min_zoom_matches_reference_scenario() {
		// Container 800x600, one node at (0,0) sized 280x180, padding 200.
		let node = table("t", 5); // 40 + 5*28 = 180
		let options = LayoutOptions::default();
		assert_eq!(node_size(&node, &options), (280.0, 180.0));
		let min_zoom = calculate_min_zoom(&[node], 800.0, 600.0, 200.0, &options);
		assert!((min_zoom - 0.9).abs() < 1e-9);
	}

	#[test]
	fn min_zoom_stays_in_range() {
		let options = LayoutOptions::default();
		let mut far = table("far", 1);
		far.position = Point::new(100_000.0, 100_000.0);
		let nodes = vec![table("near", 1), far];
		for (w, h) in [(1.0, 1.0), (320.0, 200.0), (4000.0, 3000.0)] {
			let z = calculate_min_zoom(&nodes, w, h, 200.0, &options);
			assert!((0.05..=1.0).contains(&z), "zoom {z} out of range at {w}x{h}");
		}
	}

	#[test]
	fn min_zoom_short_circuits_degenerate_geometry() {
		let options = LayoutOptions::default();
		assert_eq!(calculate_min_zoom(&[], 800.0, 600.0, 200.0, &options), 0.1);
		let nodes = vec![table("a", 1)];
		assert_eq!(calculate_min_zoom(&nodes, 0.0, 600.0, 200.0, &options), 0.1);
	}
}
