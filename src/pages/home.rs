use leptos::prelude::*;
use log::info;

use crate::components::diagram::{
	Column, DiagramCanvas, DiagramEdge, DiagramNode, DiagramVariant, EdgeVariant, NodeData,
	Point, Side, column_handle,
};

/// Sample single-connection schema: a small web-shop catalog.
fn sample_schema() -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
	let customers = DiagramNode::new(
		"customers",
		NodeData {
			label: "customers".into(),
			columns: vec![
				Column::new("customers.id", "id", "uuid").primary_key(),
				Column::new("customers.name", "name", "text"),
				Column::new("customers.email", "email", "text"),
			],
			active: true,
			..NodeData::default()
		},
	);
	let orders = DiagramNode::new(
		"orders",
		NodeData {
			label: "orders".into(),
			columns: vec![
				Column::new("orders.id", "id", "uuid").primary_key(),
				Column::new("orders.customer_id", "customer_id", "uuid").foreign_key(),
				Column::new("orders.placed_at", "placed_at", "timestamptz"),
				Column::new("orders.status", "status", "text"),
			],
			active: true,
			..NodeData::default()
		},
	);
	let order_items = DiagramNode::new(
		"order_items",
		NodeData {
			label: "order_items".into(),
			columns: vec![
				Column::new("order_items.id", "id", "uuid").primary_key(),
				Column::new("order_items.order_id", "order_id", "uuid").foreign_key(),
				Column::new("order_items.product_id", "product_id", "uuid").foreign_key(),
				Column::new("order_items.quantity", "quantity", "int4"),
				Column::new("order_items.unit_price", "unit_price", "numeric"),
			],
			active: true,
			..NodeData::default()
		},
	);
	let products = DiagramNode::new(
		"products",
		NodeData {
			label: "products".into(),
			columns: vec![
				Column::new("products.id", "id", "uuid").primary_key(),
				Column::new("products.sku", "sku", "text"),
				Column::new("products.image_path", "image_path", "text"),
			],
			active: true,
			..NodeData::default()
		},
	);

	let edge = |id: &str, source: &str, target: &str, source_col: &str, target_col: &str| {
		DiagramEdge {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			source_handle: column_handle(source_col, Side::Right),
			target_handle: column_handle(target_col, Side::Left),
			variant: EdgeVariant::Schema,
			style: None,
		}
	};

	let edges = vec![
		edge("fk-orders-customers", "customers", "orders", "customers.id", "orders.customer_id"),
		edge("fk-items-orders", "orders", "order_items", "orders.id", "order_items.order_id"),
		edge(
			"fk-items-products",
			"products",
			"order_items",
			"products.id",
			"order_items.product_id",
		),
	];

	(vec![customers, orders, order_items, products], edges)
}

/// Single-connection schema diagram demo.
#[component]
pub fn Home() -> impl IntoView {
	let (nodes, edges) = sample_schema();
	let nodes = Signal::derive(move || nodes.clone());
	let edges = Signal::derive(move || edges.clone());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<DiagramCanvas
					nodes=nodes
					edges=edges
					variant=DiagramVariant::Schema
					fullscreen=true
					on_node_drag_stop=Callback::new(move |(id, position): (String, Point)| {
						info!("{id} moved to ({:.0}, {:.0})", position.x, position.y);
					})
					on_toggle_active=Callback::new(move |id: String| info!("table toggled: {id}"))
					on_toggle_column_active=Callback::new(move |id: String| info!("column toggled: {id}"))
					on_view_sample=Callback::new(move |id: String| info!("view sample: {id}"))
					on_view_distinct=Callback::new(move |(id, name): (String, String)| {
						info!("view distinct values of {name} ({id})");
					})
					on_link_image=Callback::new(move |(id, column): (String, Option<String>)| {
						info!("link image storage: {id} {column:?}");
					})
					on_edge_click=Callback::new(move |id: String| info!("edge clicked: {id}"))
					on_connect=Callback::new(move |(source, target): (String, String)| {
						info!("connect {source} -> {target}");
					})
				/>
				<div class="graph-overlay">
					<h1>"Schema Diagram"</h1>
					<p class="subtitle">
						"Drag tables to reposition. Scroll to zoom. Drag background to pan. Click a column to highlight it."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
