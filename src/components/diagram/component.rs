use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::fit::{self, FIT_DELAY_DRAG_MS, FIT_DELAY_LAYOUT_MS};
use super::geometry::NodeRegion;
use super::render;
use super::schedule::Debouncer;
use super::state::{DiagramState, DragOutcome, PendingConnect};
use super::types::{
	DiagramEdge, DiagramNode, DiagramVariant, LayoutOptions, Point, column_handle,
};

type SharedState = Rc<RefCell<Option<DiagramState>>>;

/// Re-measure the container, recompute the viewport state and pan+zoom the
/// content bounds into view. Runs behind the coalescing debouncer so the DOM
/// has settled before we read pixel sizes.
fn apply_fit(state: &mut DiagramState, canvas: &HtmlCanvasElement, layout_epoch: u32) {
	let rect = canvas.get_bounding_client_rect();
	let (w, h) = (rect.width(), rect.height());
	if w >= 1.0 && h >= 1.0 {
		state.width = w;
		state.height = h;
	}
	let nodes = state.nodes.clone();
	let options = state.options;
	let viewport = state
		.fit
		.recompute(&nodes, &options, state.width, state.height, layout_epoch);
	state.transform = fit_transform_for(state, viewport.min_zoom);
	state.dirty = true;
}

fn fit_transform_for(state: &DiagramState, zoom: f64) -> super::state::ViewTransform {
	fit::fit_transform(&state.nodes, &state.options, state.width, state.height, zoom)
}

#[component]
pub fn DiagramCanvas(
	#[prop(into)] nodes: Signal<Vec<DiagramNode>>,
	#[prop(into)] edges: Signal<Vec<DiagramEdge>>,
	#[prop(default = DiagramVariant::Schema)] variant: DiagramVariant,
	#[prop(default = LayoutOptions::default())] options: LayoutOptions,
	/// Bumped by the caller to signal a structural change worth a re-layout.
	#[prop(into, default = Signal::stored(0))]
	layout_epoch: Signal<u32>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional, into)] on_nodes_change: Option<Callback<Vec<DiagramNode>>>,
	#[prop(optional, into)] on_edges_change: Option<Callback<Vec<DiagramEdge>>>,
	#[prop(optional, into)] on_connect: Option<Callback<(String, String)>>,
	#[prop(optional, into)] on_edge_click: Option<Callback<String>>,
	#[prop(optional, into)] on_node_drag_stop: Option<Callback<(String, Point)>>,
	#[prop(optional, into)] on_toggle_active: Option<Callback<String>>,
	#[prop(optional, into)] on_toggle_column_active: Option<Callback<String>>,
	#[prop(optional, into)] on_link_image: Option<Callback<(String, Option<String>)>>,
	#[prop(optional, into)] on_view_sample: Option<Callback<String>>,
	#[prop(optional, into)] on_view_distinct: Option<Callback<(String, String)>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let fit_timer: Rc<RefCell<Debouncer>> = Rc::new(RefCell::new(Debouncer::new()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let pressed: Rc<RefCell<Option<(String, NodeRegion)>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let mut initial = DiagramState::new(
			nodes.get_untracked(),
			edges.get_untracked(),
			variant,
			options,
			w,
			h,
		);
		apply_fit(&mut initial, &canvas, layout_epoch.get_untracked());
		if let Some(cb) = &on_nodes_change {
			cb.run(initial.nodes.clone());
		}
		if let Some(cb) = &on_edges_change {
			cb.run(initial.edges.clone());
		}
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.dirty {
					render::render(s, &ctx);
					s.dirty = false;
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Structural changes from the caller: fresh snapshot, re-layout, re-fit.
	// Data edits that keep the node count and epoch are presentation-level
	// and never trigger the hierarchical pass.
	let (state_update, timer_update) = (state.clone(), fit_timer.clone());
	Effect::new(move |_| {
		let next_nodes = nodes.get();
		let next_edges = edges.get();
		let epoch = layout_epoch.get();

		let mut slot = state_update.borrow_mut();
		let Some(s) = slot.as_mut() else {
			return;
		};
		if !s.fit.needs_recompute(next_nodes.len(), epoch) {
			return;
		}

		s.replace(next_nodes, next_edges);
		if let Some(cb) = &on_nodes_change {
			cb.run(s.nodes.clone());
		}
		if let Some(cb) = &on_edges_change {
			cb.run(s.edges.clone());
		}

		let state_fit = state_update.clone();
		timer_update
			.borrow_mut()
			.schedule(FIT_DELAY_LAYOUT_MS, move || {
				let mut slot = state_fit.borrow_mut();
				if let (Some(s), Some(canvas)) = (slot.as_mut(), canvas_ref.get_untracked()) {
					apply_fit(s, &canvas.into(), epoch);
				}
			});
	});

	let (state_md, pressed_md) = (state.clone(), pressed.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut slot = state_md.borrow_mut();
		let Some(s) = slot.as_mut() else {
			return;
		};

		// An open context menu captures the click.
		if let Some(menu) = s.menu.clone() {
			if let Some(item) = render::menu_item_at(menu.origin, x, y) {
				match item {
					0 => {
						if s.toggle_node_active(&menu.node_id) {
							if let Some(cb) = &on_toggle_active {
								cb.run(menu.node_id.clone());
							}
						}
					}
					1 => {
						if let Some(cb) = &on_link_image {
							cb.run((menu.node_id.clone(), None));
						}
					}
					_ => {
						if let Some(cb) = &on_view_sample {
							cb.run(menu.node_id.clone());
						}
					}
				}
			}
			s.menu = None;
			s.dirty = true;
			return;
		}

		if let Some((node_id, region)) = s.region_at(x, y) {
			*pressed_md.borrow_mut() = Some((node_id.clone(), region.clone()));
			match region {
				NodeRegion::MenuButton => {
					s.menu = Some(super::state::ContextMenu {
						node_id,
						origin: Point::new(x, y),
					});
					s.dirty = true;
				}
				NodeRegion::RowEye(row) => {
					let column_id = s.node(&node_id).map(|n| n.data.columns[row].id.clone());
					if let Some(column_id) = column_id {
						if s.toggle_column_active(&column_id) {
							if let Some(cb) = &on_toggle_column_active {
								cb.run(column_id);
							}
						}
					}
				}
				NodeRegion::RowDistinct(row) => {
					let column = s
						.node(&node_id)
						.map(|n| (n.data.columns[row].id.clone(), n.data.columns[row].name.clone()));
					if let Some((column_id, name)) = column {
						if let Some(cb) = &on_view_distinct {
							cb.run((column_id, name));
						}
					}
				}
				NodeRegion::RowAnchor(row, side) => {
					let handle = s
						.node(&node_id)
						.map(|n| column_handle(&n.data.columns[row].id, side));
					if let Some(source_handle) = handle {
						s.connect = Some(PendingConnect {
							source_handle,
							cursor: s.screen_to_graph(x, y),
						});
						s.dirty = true;
					}
				}
				NodeRegion::Header | NodeRegion::Row(_) => {
					s.begin_node_drag(&node_id, x, y);
				}
			}
			return;
		}

		if let Some(edge_id) = s.edge_at(x, y) {
			if let Some(cb) = &on_edge_click {
				cb.run(edge_id);
			}
			return;
		}

		s.pan.active = true;
		s.pan.start_x = x;
		s.pan.start_y = y;
		s.pan.transform_start_x = s.transform.x;
		s.pan.transform_start_y = s.transform.y;
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.is_some() {
				s.move_node_drag(x, y);
			} else if s.connect.is_some() {
				let cursor = s.screen_to_graph(x, y);
				if let Some(connect) = s.connect.as_mut() {
					connect.cursor = cursor;
				}
				s.dirty = true;
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
				s.dirty = true;
			} else {
				let hovered = s.region_at(x, y).map(|(id, _)| id);
				if hovered != s.hovered_node {
					s.hovered_node = hovered;
				}
			}
		}
	};

	let (state_mu, pressed_mu, timer_mu) = (state.clone(), pressed.clone(), fit_timer.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut slot = state_mu.borrow_mut();
		let Some(s) = slot.as_mut() else {
			return;
		};
		let was_pressed = pressed_mu.borrow_mut().take();

		// Complete a connect gesture if it ends on another column anchor.
		if let Some(connect) = s.connect.take() {
			if let Some((node_id, NodeRegion::RowAnchor(row, side))) = s.region_at(x, y) {
				let target = s
					.node(&node_id)
					.map(|n| column_handle(&n.data.columns[row].id, side));
				if let Some(target_handle) = target {
					if target_handle != connect.source_handle {
						if let Some(cb) = &on_connect {
							cb.run((connect.source_handle, target_handle));
						}
					}
				}
			}
			s.dirty = true;
			return;
		}

		if s.drag.is_some() {
			if let Some((node_id, position, outcome)) = s.end_node_drag() {
				match outcome {
					DragOutcome::Moved => {
						// Real displacement: notify the host, then re-fit
						// after a short settle. Position is read now, not
						// when the timer fires.
						if let Some(cb) = &on_node_drag_stop {
							cb.run((node_id, position));
						}
						if let Some(cb) = &on_nodes_change {
							cb.run(s.nodes.clone());
						}
						let epoch = layout_epoch.get_untracked();
						let state_fit = state_mu.clone();
						timer_mu.borrow_mut().schedule(FIT_DELAY_DRAG_MS, move || {
							let mut slot = state_fit.borrow_mut();
							if let (Some(s), Some(canvas)) =
								(slot.as_mut(), canvas_ref.get_untracked())
							{
								apply_fit(s, &canvas.into(), epoch);
							}
						});
					}
					DragOutcome::Unmoved => {
						// A click, not a drag: row clicks toggle the shared
						// column highlight.
						if let Some((node_id, NodeRegion::Row(row))) = was_pressed {
							let column_id =
								s.node(&node_id).map(|n| n.data.columns[row].id.clone());
							if let Some(column_id) = column_id {
								s.toggle_highlight(&column_id);
							}
						}
					}
				}
			}
		}
		s.pan.active = false;
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag = None;
			s.connect = None;
			s.pan.active = false;
			s.hovered_node = None;
			s.dirty = true;
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="diagram-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
