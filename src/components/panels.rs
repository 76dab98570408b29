//! Side panels for the mutating workflows: new relation, maintenance, linking and debug search.

use leptos::prelude::*;

use super::handle::ConsoleHandle;
use crate::api::BatchTask;

/// Which workflow the right-hand panel shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RightPanel {
	#[default]
	Closed,
	Tools,
	LinkEntity,
}

fn node_name(handle: ConsoleHandle, id: &str) -> String {
	handle.with_console(|c| {
		c.with_snapshot(|s| {
			s.nodes
				.iter()
				.find(|n| n.id == id)
				.map(|n| n.name.clone())
				.unwrap_or_else(|| id.to_string())
		})
	})
}

/// Relation type prompt shown after the second connect-mode click.
#[component]
pub fn ConnectPanel() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let relation = RwSignal::new(String::new());

	let create = move || {
		let rel = relation.get_untracked();
		handle.run(move |c| async move {
			if c.create_edge(&rel).await.is_ok() {
				relation.set(String::new());
			}
		});
	};

	view! {
		{move || {
			handle
				.pending_edge
				.get()
				.map(|draft| {
					let (from, to) = (node_name(handle, &draft.from), node_name(handle, &draft.to));
					view! {
						<div class="panel connect-panel">
							<div class="section-head">
								<h4>"Connect nodes"</h4>
								<button
									class="icon-btn"
									title="Cancel"
									on:click=move |_| handle.act(|c| c.cancel_edge())
								>
									"×"
								</button>
							</div>
							<p class="muted">
								"Create a relation from " <strong>{from}</strong> " to " <strong>{to}</strong>
							</p>
							<label class="form-label">"Relation type"</label>
							<input
								class="form-input"
								type="text"
								placeholder="e.g. IS_A, PART_OF, RELATED_TO"
								prop:value=move || relation.get()
								on:input=move |ev| relation.set(event_target_value(&ev))
								on:keyup=move |ev| {
									if ev.key() == "Enter" {
										create();
									}
								}
							/>
							<button
								class="btn btn-primary"
								disabled=move || handle.busy.get()
								on:click=move |_| create()
							>
								"Create relation"
							</button>
						</div>
					}
				})
		}}
	}
}

/// Server-side maintenance tasks.
#[component]
pub fn ToolsPanel() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();

	view! {
		<div class="tool-section">
			<div class="tool-section-title">"Batch maintenance"</div>
			{BatchTask::ALL
				.into_iter()
				.map(|task| {
					let run = move |_| {
						let prompt = format!("{}: {}?", task.title(), task.description());
						let confirmed = web_sys::window()
							.and_then(|w| w.confirm_with_message(&prompt).ok())
							.unwrap_or(false);
						if confirmed {
							handle.run(move |c| async move {
								let _ = c.batch_delete(task).await;
							});
						}
					};
					view! {
						<div class="tool-item">
							<div>
								<div class="tool-title">{task.title()}</div>
								<div class="muted">{task.description()}</div>
							</div>
							<button class="btn btn-danger" disabled=move || handle.busy.get() on:click=run>
								"Run"
							</button>
						</div>
					}
				})
				.collect_view()}
		</div>
	}
}

/// Attach the selected entity to a conversation session.
#[component]
pub fn LinkEntityPanel() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let initial = handle
		.scope
		.get_untracked()
		.and_then(|s| s.session_id().map(str::to_string))
		.unwrap_or_default();
	let session_id = RwSignal::new(initial);
	let entity = move || {
		handle.selected.get().map(|id| node_name(handle, &id))
	};

	let link = move |_| {
		let target = session_id.get_untracked();
		handle.run(move |c| async move {
			let _ = c.link_entity(&target).await;
		});
	};

	view! {
		<div class="tool-section">
			<div class="tool-section-title">"Link entity to session"</div>
			<p class="muted">
				"Entity: "
				<strong>{move || entity().unwrap_or_else(|| "none selected".to_string())}</strong>
			</p>
			<label class="form-label">"Session id"</label>
			<input
				class="form-input"
				type="text"
				placeholder="aiocqhttp:GroupMessage:123"
				prop:value=move || session_id.get()
				on:input=move |ev| session_id.set(event_target_value(&ev))
			/>
			<button class="btn btn-primary" disabled=move || handle.busy.get() on:click=link>
				"Link"
			</button>
		</div>
	}
}

/// Retrieval debugger: query the memory search and optionally draw its result.
#[component]
pub fn DebugPanel() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let query = RwSignal::new(String::new());

	let search = move || {
		let q = query.get_untracked();
		handle.run(move |c| async move {
			let _ = c.debug_search(&q).await;
		});
	};
	let visualize = move |_| {
		handle.act(|c| {
			let _ = c.visualize_debug_result();
		});
	};

	view! {
		<div class="debug-panel">
			<div class="row">
				<input
					class="form-input"
					type="text"
					placeholder="Search memory..."
					prop:value=move || query.get()
					on:input=move |ev| query.set(event_target_value(&ev))
					on:keyup=move |ev| {
						if ev.key() == "Enter" {
							search();
						}
					}
				/>
				<button class="btn btn-primary" disabled=move || handle.busy.get() on:click=move |_| search()>
					{move || if handle.busy.get() { "..." } else { "Search" }}
				</button>
			</div>
			{move || {
				handle
					.debug_result
					.get()
					.map(|result| {
						let empty = result.node_count() == 0;
						view! {
							<div class="debug-result">
								<div class="debug-stats">
									{format!("Nodes: {} | Edges: {}", result.node_count(), result.edge_count())}
								</div>
								<button class="btn btn-secondary" disabled=empty on:click=visualize>
									"Visualize"
								</button>
								<pre class="debug-json">{result.pretty()}</pre>
							</div>
						}
					})
			}}
		</div>
	}
}
