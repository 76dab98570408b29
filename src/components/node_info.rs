use std::collections::BTreeMap;

use leptos::prelude::*;
use serde_json::Value;

use super::force_graph::node_color;
use super::handle::ConsoleHandle;
use crate::graph::{Link, Node};

fn property_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Current values of the editable properties the node actually has.
fn initial_edits(node: &Node, is_editable: impl Fn(&str) -> bool) -> BTreeMap<String, String> {
	node.properties
		.iter()
		.filter(|(key, _)| is_editable(key))
		.map(|(key, value)| (key.clone(), property_text(value)))
		.collect()
}

fn confirm(message: &str) -> bool {
	web_sys::window()
		.and_then(|w| w.confirm_with_message(message).ok())
		.unwrap_or(false)
}

/// Details of the selected node: properties, observations, neighbours and actions.
#[component]
pub fn NodeInfo() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let edits = RwSignal::new(BTreeMap::<String, String>::new());

	let node = Memo::new(move |_| {
		handle.graph.track();
		let id = handle.selected.get()?;
		handle.with_console(|c| c.with_snapshot(|s| s.nodes.iter().find(|n| n.id == id).cloned()))
	});
	let neighbors = Memo::new(move |_| {
		handle.graph.track();
		handle.selected.track();
		handle.with_console(|c| c.selected_neighbors())
	});

	Effect::new(move |_| {
		if !handle.editing.get() {
			return;
		}
		if let Some(node) = node.get_untracked() {
			edits.set(handle.with_console(|c| initial_edits(&node, |k| c.config().is_editable(k))));
		}
	});

	let toggle_edit = move |_| handle.act(|c| {
		let _ = c.toggle_editing();
	});
	let cancel_edit = move |_| handle.act(|c| c.cancel_editing());
	let save = move |_| {
		let edits = edits.get_untracked();
		handle.run(move |c| async move {
			let _ = c.save_properties(&edits).await;
		});
	};
	let delete_node = move |_| {
		let Some(node) = node.get_untracked() else {
			return;
		};
		if !confirm(&format!("Delete node \"{}\"? This cannot be undone.", node.name)) {
			return;
		}
		handle.run(|c| async move {
			let _ = c.delete_selected().await;
		});
	};

	view! {
		<Show
			when=move || node.with(Option::is_some)
			fallback=|| view! { <p class="muted">"Click a node to see its details."</p> }
		>
			{move || {
				node.get()
					.map(|n| {
						let color = node_color(&n.kind);
						view! {
							<div class="node-header">
								<h3>{n.name.clone()}</h3>
								<div class="node-tags">
									<span class="tag" style=format!("border-color: {}", color)>
										{n.kind.clone()}
									</span>
									<span class="tag mono">{n.id.clone()}</span>
								</div>
							</div>
						}
					})
			}}

			<section>
				<div class="section-head">
					<h4>"Properties"</h4>
					<button class="icon-btn" title="Edit properties" on:click=toggle_edit>
						"✎"
					</button>
				</div>
				<Show
					when=move || handle.editing.get()
					fallback=move || {
						view! {
							<PropertyList properties=Signal::derive(move || {
								node.get().map(|n| n.properties).unwrap_or_default()
							}) />
						}
					}
				>
					<Show
						when=move || edits.with(|e| !e.is_empty())
						fallback=|| view! { <p class="muted">"No editable properties for this node."</p> }
					>
						<For
							each=move || edits.get().into_keys()
							key=|k| k.clone()
							children=move |key| {
								let (label, field) = (key.clone(), key.clone());
								view! {
									<label class="form-label">{label}</label>
									<input
										class="form-input"
										type="text"
										prop:value=move || edits.with(|e| e.get(&key).cloned().unwrap_or_default())
										on:input=move |ev| {
											let value = event_target_value(&ev);
											edits.update(|e| {
												e.insert(field.clone(), value);
											});
										}
									/>
								}
							}
						/>
					</Show>
					<div class="row">
						<button class="btn btn-primary" on:click=save disabled=move || handle.busy.get()>
							"Save"
						</button>
						<button class="btn btn-secondary" on:click=cancel_edit>
							"Cancel"
						</button>
					</div>
				</Show>
			</section>

			<section>
				<h4>"Observations"</h4>
				{move || {
					let observations = node.get().map(|n| n.observations).unwrap_or_default();
					if observations.is_empty() {
						view! { <p class="muted">"No observations"</p> }.into_any()
					} else {
						observations
							.into_iter()
							.map(|o| view! { <div class="observation">{o}</div> })
							.collect_view()
							.into_any()
					}
				}}
			</section>

			<section>
				<h4>"Connected nodes"</h4>
				{move || {
					let list = neighbors.get();
					if list.is_empty() {
						return view! { <p class="muted">"No connections"</p> }.into_any();
					}
					list.into_iter()
						.map(|(link, other)| view! { <NeighborRow link=link other=other /> })
						.collect_view()
						.into_any()
				}}
			</section>

			<section class="danger-zone">
				<button class="btn btn-danger" on:click=delete_node disabled=move || handle.busy.get()>
					"Delete node"
				</button>
			</section>
		</Show>
	}
}

#[component]
fn PropertyList(#[prop(into)] properties: Signal<BTreeMap<String, Value>>) -> impl IntoView {
	move || {
		let properties = properties.get();
		if properties.is_empty() {
			return view! { <p class="muted">"No properties"</p> }.into_any();
		}
		properties
			.into_iter()
			.map(|(key, value)| {
				view! {
					<div class="property">
						<span class="muted">{key}":"</span>
						" "
						<span>{value.to_string()}</span>
					</div>
				}
			})
			.collect_view()
			.into_any()
	}
}

#[component]
fn NeighborRow(link: Link, other: Node) -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let other_id = other.id.clone();
	let key = link.key();
	let select = move |_| {
		let id = other_id.clone();
		handle.act(move |c| {
			let _ = c.select_node(&id);
		});
	};
	let remove = move |_| {
		let key = key.clone();
		if !confirm(&format!("Delete relation \"{}\"?", key.relation)) {
			return;
		}
		handle.run(move |c| async move {
			let _ = c.delete_edge(&key).await;
		});
	};

	view! {
		<div class="neighbor">
			<button class="neighbor-name" style=format!("color: {}", node_color(&other.kind)) on:click=select>
				{other.name}
			</button>
			<span class="relation">{link.relation}</span>
			<button class="icon-btn" title="Delete relation" on:click=remove>
				"🗑"
			</button>
		</div>
	}
}
