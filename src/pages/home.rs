use leptos::prelude::*;

use crate::api::SessionScope;
use crate::components::force_graph::{CanvasEvent, ForceGraphCanvas};
use crate::components::handle::ConsoleHandle;
use crate::components::monitor_panel::MonitorPanel;
use crate::components::node_info::NodeInfo;
use crate::components::panels::{ConnectPanel, DebugPanel, LinkEntityPanel, RightPanel, ToolsPanel};
use crate::components::toasts::ToastStack;
use crate::config::ConsoleConfig;
use crate::control::ConnectState;
use crate::pages::login::Login;
use crate::storage::Theme;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SideTab {
	#[default]
	Info,
	Debug,
	Monitor,
}

/// The console: login gate, graph canvas and the panels around it.
#[component]
pub fn Home() -> impl IntoView {
	let handle = ConsoleHandle::new(ConsoleConfig::from_window());
	provide_context(handle);

	handle.run(|c| async move {
		if c.check_session().await {
			let _ = c.init().await;
		}
	});

	view! {
		<Show when=move || handle.authenticated.get() fallback=|| view! { <Login /> }>
			<Workspace />
		</Show>
		<ToastStack />
	}
}

#[component]
fn Workspace() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let theme = expect_context::<RwSignal<Theme>>();
	let show_labels = RwSignal::new(false);
	let side_tab = RwSignal::new(SideTab::Info);
	let right_panel = RwSignal::new(RightPanel::Closed);
	let query = RwSignal::new(String::new());
	let (focus_zoom, focus_duration) = handle.with_console(|c| (c.config().focus_zoom, c.config().focus_duration));

	let on_event = Callback::new(move |event: CanvasEvent| match event {
		CanvasEvent::NodeClick(id) => {
			handle.act(|c| c.node_clicked(&id));
			side_tab.set(SideTab::Info);
		}
		CanvasEvent::BackgroundClick => handle.act(|c| c.background_clicked()),
	});

	let change_scope = move |value: String| {
		let scope = SessionScope::from_value(&value);
		handle.run(move |c| async move {
			let _ = c.load_scope(scope).await;
		});
	};
	let search = move |value: String| {
		query.set(value.clone());
		handle.act(|c| c.search(&value));
	};
	let toggle_connect = move |_| {
		handle.act(|c| {
			c.toggle_connect();
		});
	};
	let open_panel = move |panel: RightPanel| {
		right_panel.update(|p| *p = if *p == panel { RightPanel::Closed } else { panel });
	};
	let reload = move |_| {
		query.set(String::new());
		handle.run(|c| async move {
			let _ = c.reload().await;
		});
	};
	let logout = move |_| {
		right_panel.set(RightPanel::Closed);
		handle.act(|c| c.logout());
	};

	let connect_label = move || match handle.connect.get() {
		ConnectState::Off => "Connect",
		ConnectState::On { start: None } => "Pick first node",
		ConnectState::On { start: Some(_) } => "Pick second node",
	};
	let scope_value = move || handle.scope.get().unwrap_or_default().value().to_string();

	let tab = move |which: SideTab, label: &'static str| {
		view! {
			<button
				class=move || if side_tab.get() == which { "tab active" } else { "tab" }
				on:click=move |_| side_tab.set(which)
			>
				{label}
			</button>
		}
	};

	view! {
		<div class="console">
			<header class="topbar">
				<select
					class="form-input session-select"
					prop:value=scope_value
					on:change=move |ev| change_scope(event_target_value(&ev))
				>
					<option value="global">"Global graph"</option>
					<For
						each=move || handle.sessions.get()
						key=|s| s.session_id.clone()
						children=|s| {
							let name = s.display_name();
							let title = s.session_id.clone();
							view! { <option value=s.session_id title=title>{name}</option> }
						}
					/>
				</select>
				<input
					class="form-input search"
					type="search"
					placeholder="Search nodes..."
					prop:value=move || query.get()
					on:input=move |ev| search(event_target_value(&ev))
				/>
				<button
					class=move || {
						if handle.connect.get() == ConnectState::Off { "btn btn-secondary" } else { "btn btn-primary" }
					}
					on:click=toggle_connect
				>
					{connect_label}
				</button>
				<button class="btn btn-secondary" on:click=move |_| open_panel(RightPanel::Tools)>
					"Tools"
				</button>
				<button class="btn btn-secondary" on:click=move |_| open_panel(RightPanel::LinkEntity)>
					"Link"
				</button>
				<button class="btn btn-secondary" disabled=move || handle.busy.get() on:click=reload>
					"Reload"
				</button>
				<button class="btn btn-secondary" on:click=move |_| handle.request_fit()>
					"Fit"
				</button>
				<label class="toggle">
					<input
						type="checkbox"
						prop:checked=move || show_labels.get()
						on:change=move |ev| show_labels.set(event_target_checked(&ev))
					/>
					"Labels"
				</label>
				<span class="stats">
					{move || {
						let stats = handle.stats.get();
						format!("{} nodes · {} links", stats.nodes, stats.links)
					}}
				</span>
				<button
					class="icon-btn"
					title="Toggle theme"
					on:click=move |_| theme.update(|t| *t = t.toggled())
				>
					{move || if theme.get().is_dark() { "☀" } else { "☾" }}
				</button>
				<button class="btn btn-secondary" on:click=logout>
					"Log out"
				</button>
			</header>

			<main class="graph-area">
				<ForceGraphCanvas
					graph=handle.graph
					highlight=handle.highlight
					selected=handle.selected
					focus=handle.focus
					fit_requests=handle.fit_requests
					show_labels=show_labels
					theme=theme
					focus_zoom=focus_zoom
					focus_duration=focus_duration
					on_event=on_event
				/>
				<ConnectPanel />
			</main>

			<aside class="sidebar">
				<div class="tabs">
					{tab(SideTab::Info, "Info")}
					{tab(SideTab::Debug, "Debug")}
					{tab(SideTab::Monitor, "Monitor")}
				</div>
				<div class="sidebar-body">
					{move || match side_tab.get() {
						SideTab::Info => view! { <NodeInfo /> }.into_any(),
						SideTab::Debug => view! { <DebugPanel /> }.into_any(),
						SideTab::Monitor => view! { <MonitorPanel /> }.into_any(),
					}}
				</div>
			</aside>

			<Show when=move || right_panel.get() != RightPanel::Closed>
				<aside class="right-panel">
					<div class="section-head">
						<h4>
							{move || match right_panel.get() {
								RightPanel::LinkEntity => "Link entity",
								_ => "Tools",
							}}
						</h4>
						<button class="icon-btn" title="Close" on:click=move |_| right_panel.set(RightPanel::Closed)>
							"×"
						</button>
					</div>
					{move || match right_panel.get() {
						RightPanel::Tools => view! { <ToolsPanel /> }.into_any(),
						RightPanel::LinkEntity => view! { <LinkEntityPanel /> }.into_any(),
						RightPanel::Closed => ().into_any(),
					}}
				</aside>
			</Show>
		</div>
	}
}
