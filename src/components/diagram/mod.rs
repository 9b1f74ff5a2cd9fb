mod component;
mod fit;
mod geometry;
mod layout;
mod render;
mod schedule;
mod state;
mod types;

pub use component::DiagramCanvas;
pub use fit::{FIT_PADDING, MAX_ZOOM, fit_transform};
pub use geometry::{EdgePath, NodeRegion};
pub use layout::{GridOptions, calculate_min_zoom, grid_positions, layout, node_size};
pub use state::{DRAG_THRESHOLD, DragOutcome, DragTracker, HighlightSet};
pub use types::{
	Column, DiagramEdge, DiagramNode, DiagramVariant, EdgeStyle, EdgeVariant, LayoutOptions,
	NodeData, Point, RankDirection, Side, ViewportState, column_handle, parse_handle,
};
