use leptos::prelude::*;
use log::info;

use crate::components::diagram::{
	Column, DiagramCanvas, DiagramEdge, DiagramNode, DiagramVariant, EdgeVariant, NodeData,
	Side, column_handle,
};

fn connection_table(
	id: &str,
	connection: (&str, &str, &str),
	columns: Vec<Column>,
) -> DiagramNode {
	let (connection_id, connection_name, connection_color) = connection;
	DiagramNode::new(
		id,
		NodeData {
			label: id.to_string(),
			columns,
			active: true,
			connection_id: Some(connection_id.to_string()),
			connection_name: Some(connection_name.to_string()),
			connection_color: Some(connection_color.to_string()),
		},
	)
}

/// Sample cross-connection composition: an app database joined against a
/// warehouse.
fn sample_federation() -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
	let app = ("conn-app", "app-postgres", "#569cff");
	let warehouse = ("conn-dwh", "warehouse", "#b088ff");

	let users = connection_table(
		"users",
		app,
		vec![
			Column::new("users.id", "id", "uuid").primary_key(),
			Column::new("users.email", "email", "text"),
		],
	);
	let events = connection_table(
		"events",
		warehouse,
		vec![
			Column::new("events.id", "id", "bigint").primary_key(),
			Column::new("events.user_id", "user_id", "uuid").foreign_key(),
			Column::new("events.kind", "kind", "varchar"),
			Column::new("events.occurred_at", "occurred_at", "timestamp"),
		],
	);
	let sessions = connection_table(
		"sessions",
		warehouse,
		vec![
			Column::new("sessions.id", "id", "bigint").primary_key(),
			Column::new("sessions.user_id", "user_id", "uuid").foreign_key(),
		],
	);

	let edge = |id: &str, source: &str, target: &str, source_col: &str, target_col: &str| {
		DiagramEdge {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			source_handle: column_handle(source_col, Side::Right),
			target_handle: column_handle(target_col, Side::Left),
			variant: EdgeVariant::Federation,
			style: None,
		}
	};

	let edges = vec![
		edge("fed-users-events", "users", "events", "users.id", "events.user_id"),
		edge("fed-users-sessions", "users", "sessions", "users.id", "sessions.user_id"),
	];

	(vec![users, events, sessions], edges)
}

/// Cross-connection federation diagram demo (read-only composition).
#[component]
pub fn Federation() -> impl IntoView {
	let (nodes, edges) = sample_federation();
	let nodes = Signal::derive(move || nodes.clone());
	let edges = Signal::derive(move || edges.clone());

	view! {
		<div class="fullscreen-graph">
			<DiagramCanvas
				nodes=nodes
				edges=edges
				variant=DiagramVariant::Federation
				fullscreen=true
				on_edge_click=Callback::new(move |id: String| info!("edge clicked: {id}"))
			/>
			<div class="graph-overlay">
				<h1>"Federation Diagram"</h1>
				<p class="subtitle">
					"Cross-connection relationships. Cards are colored by owning connection."
				</p>
			</div>
		</div>
	}
}
