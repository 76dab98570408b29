//! Reactive bridge between the [`Console`] coordinator and the views.

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{DebugSearchResult, HttpGraphApi, SessionContext, SessionScope};
use crate::config::ConsoleConfig;
use crate::console::{Console, Notice};
use crate::control::{ConnectState, EdgeDraft, FocusRequest};
use crate::graph::{GraphSnapshot, GraphStats, HighlightSet, NodeId};
use crate::monitor::{self, SharedChannel};

const TOAST_LIFETIME: Duration = Duration::from_secs(4);

pub type BrowserConsole = Console<HttpGraphApi>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
	pub id: u64,
	pub notice: Notice,
}

/// Console plus one signal per piece of state the views render.
///
/// Views read signals; event handlers call [`ConsoleHandle::run`] or
/// [`ConsoleHandle::act`], which refresh every signal once the console is done.
#[derive(Clone, Copy)]
pub struct ConsoleHandle {
	console: StoredValue<Rc<BrowserConsole>, LocalStorage>,
	monitor: StoredValue<Option<SharedChannel>, LocalStorage>,
	pub monitor_revision: RwSignal<u64>,
	pub authenticated: RwSignal<bool>,
	pub graph: RwSignal<Arc<GraphSnapshot>>,
	graph_version: RwSignal<u64>,
	pub stats: RwSignal<GraphStats>,
	pub highlight: RwSignal<HighlightSet>,
	pub selected: RwSignal<Option<NodeId>>,
	pub focus: RwSignal<Option<FocusRequest>>,
	pub editing: RwSignal<bool>,
	pub connect: RwSignal<ConnectState>,
	pub pending_edge: RwSignal<Option<EdgeDraft>>,
	pub scope: RwSignal<Option<SessionScope>>,
	pub sessions: RwSignal<Vec<SessionContext>>,
	pub debug_result: RwSignal<Option<DebugSearchResult>>,
	pub toasts: RwSignal<Vec<Toast>>,
	pub busy: RwSignal<bool>,
	pub fit_requests: RwSignal<u64>,
	next_toast: StoredValue<u64>,
}

impl ConsoleHandle {
	pub fn new(config: ConsoleConfig) -> Self {
		let api = HttpGraphApi::new(config.api_base.clone());
		let console = Rc::new(Console::new(api, config));
		let stats = RwSignal::new(GraphStats::default());
		console.on_stats(move |s| stats.set(s));
		Self {
			console: StoredValue::new_local(console),
			monitor: StoredValue::new_local(None),
			monitor_revision: RwSignal::new(0),
			authenticated: RwSignal::new(false),
			graph: RwSignal::new(Arc::new(GraphSnapshot::default())),
			graph_version: RwSignal::new(0),
			stats,
			highlight: RwSignal::new(HighlightSet::default()),
			selected: RwSignal::new(None),
			focus: RwSignal::new(None),
			editing: RwSignal::new(false),
			connect: RwSignal::new(ConnectState::Off),
			pending_edge: RwSignal::new(None),
			scope: RwSignal::new(None),
			sessions: RwSignal::new(Vec::new()),
			debug_result: RwSignal::new(None),
			toasts: RwSignal::new(Vec::new()),
			busy: RwSignal::new(false),
			fit_requests: RwSignal::new(0),
			next_toast: StoredValue::new(0),
		}
	}

	pub fn console(&self) -> Rc<BrowserConsole> {
		self.console.get_value()
	}

	pub fn with_console<R>(&self, f: impl FnOnce(&BrowserConsole) -> R) -> R {
		self.console.with_value(|c| f(c))
	}

	/// Run a synchronous console action, then refresh.
	pub fn act(&self, f: impl FnOnce(&BrowserConsole)) {
		self.with_console(f);
		self.sync();
	}

	/// Run an async console operation, then refresh. `busy` is raised meanwhile.
	pub fn run<F, Fut>(&self, f: F)
	where
		F: FnOnce(Rc<BrowserConsole>) -> Fut + 'static,
		Fut: Future<Output = ()> + 'static,
	{
		let handle = *self;
		let console = self.console();
		handle.busy.set(true);
		spawn_local(async move {
			f(console).await;
			handle.busy.set(false);
			handle.sync();
		});
	}

	/// Copy console state into the signals; the snapshot only when it was replaced.
	pub fn sync(&self) {
		let console = self.console();
		self.authenticated.set(console.is_authenticated());
		let version = console.graph_version();
		if version != self.graph_version.get_untracked() {
			self.graph_version.set(version);
			self.graph.set(Arc::new(console.with_snapshot(Clone::clone)));
		}
		self.highlight.set(console.highlight());
		self.selected.set(console.selected());
		self.focus.set(console.focus());
		self.editing.set(console.is_editing());
		self.connect.set(console.connect_state());
		self.pending_edge.set(console.pending_edge());
		self.scope.set(console.scope());
		self.sessions.set(console.sessions());
		self.debug_result.set(console.debug_result());
		for notice in console.take_notices() {
			self.toast(notice);
		}
		if console.is_authenticated() {
			self.start_monitor();
		}
	}

	pub fn toast(&self, notice: Notice) {
		let id = self.next_toast.get_value();
		self.next_toast.set_value(id + 1);
		self.toasts.update(|t| t.push(Toast { id, notice }));
		let toasts = self.toasts;
		set_timeout(
			move || toasts.update(|t| t.retain(|toast| toast.id != id)),
			TOAST_LIFETIME,
		);
	}

	pub fn request_fit(&self) {
		self.fit_requests.update(|n| *n += 1);
	}

	pub fn monitor(&self) -> Option<SharedChannel> {
		self.monitor.get_value()
	}

	fn start_monitor(&self) {
		if self.monitor.with_value(Option::is_some) {
			return;
		}
		let (url, delay) = self.with_console(|c| (c.config().monitor_url.clone(), c.config().reconnect_delay));
		let revision = self.monitor_revision;
		let channel = monitor::start(url, delay, move || revision.update(|r| *r += 1));
		self.monitor.set_value(Some(channel));
	}
}
