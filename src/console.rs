//! Coordinator between the REST API, the graph store and the interaction controllers.
//!
//! Every operation borrows the component it needs, releases it before awaiting the
//! server, and borrows again to apply the result. Failures are returned to the caller
//! and also queued as [`Notice`]s for the toast area.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use log::{error, info, warn};

use crate::api::{
	BatchTask, DebugSearchResult, EdgeRequest, GraphApi, LinkEntityRequest, SessionContext,
	SessionScope,
};
use crate::config::ConsoleConfig;
use crate::control::{
	ConnectModeMachine, ConnectState, ConnectStep, EdgeDraft, FocusRequest, SelectionController,
};
use crate::error::ConsoleError;
use crate::graph::{
	GraphDataStore, GraphSnapshot, GraphStats, HighlightEngine, HighlightSet, Link, LinkKey, Node,
	SearchMatcher, SearchOutcome,
};

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	/// Progress hint.
	Info,
	/// A mutation went through.
	Success,
	/// Rejected before reaching the server.
	Warning,
	/// The server or the network failed.
	Error,
}

/// A transient message for the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	/// Severity.
	pub level: NoticeLevel,
	/// Operation the notice is about.
	pub title: String,
	/// Detail shown under the title.
	pub message: String,
}

/// Owner of all console state, talking to the server through `A`.
pub struct Console<A> {
	api: A,
	config: ConsoleConfig,
	store: RefCell<GraphDataStore>,
	highlight: RefCell<HighlightSet>,
	selection: RefCell<SelectionController>,
	connect: RefCell<ConnectModeMachine>,
	pending_edge: RefCell<Option<EdgeDraft>>,
	scope: RefCell<Option<SessionScope>>,
	sessions: RefCell<Vec<SessionContext>>,
	debug_result: RefCell<Option<DebugSearchResult>>,
	focus: RefCell<Option<FocusRequest>>,
	notices: RefCell<Vec<Notice>>,
	authenticated: Cell<bool>,
	graph_version: Cell<u64>,
}

impl<A: GraphApi> Console<A> {
	/// An unauthenticated console with an empty graph.
	pub fn new(api: A, config: ConsoleConfig) -> Self {
		Self {
			api,
			config,
			store: RefCell::new(GraphDataStore::new()),
			highlight: RefCell::new(HighlightEngine::clear()),
			selection: RefCell::new(SelectionController::new()),
			connect: RefCell::new(ConnectModeMachine::new()),
			pending_edge: RefCell::new(None),
			scope: RefCell::new(None),
			sessions: RefCell::new(Vec::new()),
			debug_result: RefCell::new(None),
			focus: RefCell::new(None),
			notices: RefCell::new(Vec::new()),
			authenticated: Cell::new(false),
			graph_version: Cell::new(0),
		}
	}

	/// The server client.
	pub fn api(&self) -> &A {
		&self.api
	}

	/// Settings this console was built with.
	pub fn config(&self) -> &ConsoleConfig {
		&self.config
	}

	/// Whether the last login or session check succeeded.
	pub fn is_authenticated(&self) -> bool {
		self.authenticated.get()
	}

	/// Forward node/link counts of every future replace to `listener`.
	pub fn on_stats(&self, listener: impl FnMut(GraphStats) + 'static) {
		self.store.borrow_mut().on_stats(listener);
	}

	/// Run `f` on the current snapshot.
	pub fn with_snapshot<R>(&self, f: impl FnOnce(&GraphSnapshot) -> R) -> R {
		f(self.store.borrow().snapshot())
	}

	/// Node and link counts of the current snapshot.
	pub fn stats(&self) -> GraphStats {
		self.store.borrow().stats()
	}

	/// Bumped on every replace of the snapshot.
	pub fn graph_version(&self) -> u64 {
		self.graph_version.get()
	}

	/// Nodes and links currently drawn at full opacity.
	pub fn highlight(&self) -> HighlightSet {
		self.highlight.borrow().clone()
	}

	/// Id of the selected node.
	pub fn selected(&self) -> Option<String> {
		self.selection.borrow().selected().map(str::to_string)
	}

	/// The selected node, resolved against the snapshot.
	pub fn selected_node(&self) -> Option<Node> {
		let id = self.selected()?;
		self.store.borrow().node(&id).cloned()
	}

	/// Relations of the selected node with the node on the other end.
	pub fn selected_neighbors(&self) -> Vec<(Link, Node)> {
		let Some(id) = self.selected() else {
			return Vec::new();
		};
		self.store
			.borrow()
			.neighbors(&id)
			.into_iter()
			.map(|(link, node)| (link.clone(), node.clone()))
			.collect()
	}

	/// Whether the selected node is in edit mode.
	pub fn is_editing(&self) -> bool {
		self.selection.borrow().is_editing()
	}

	/// Current connect-mode state.
	pub fn connect_state(&self) -> ConnectState {
		self.connect.borrow().state().clone()
	}

	/// Edge waiting for a relation type after the second connect-mode click.
	pub fn pending_edge(&self) -> Option<EdgeDraft> {
		self.pending_edge.borrow().clone()
	}

	/// Scope of the loaded graph, `None` before the first load.
	pub fn scope(&self) -> Option<SessionScope> {
		self.scope.borrow().clone()
	}

	/// Sessions offered by the scope selector.
	pub fn sessions(&self) -> Vec<SessionContext> {
		self.sessions.borrow().clone()
	}

	/// Result of the last successful debug search.
	pub fn debug_result(&self) -> Option<DebugSearchResult> {
		self.debug_result.borrow().clone()
	}

	/// Latest camera request; renderers compare `seq` to spot new ones.
	pub fn focus(&self) -> Option<FocusRequest> {
		self.focus.borrow().clone()
	}

	/// Drain the queued notices.
	pub fn take_notices(&self) -> Vec<Notice> {
		self.notices.take()
	}

	fn notify(&self, level: NoticeLevel, title: &str, message: impl Into<String>) {
		self.notices.borrow_mut().push(Notice {
			level,
			title: title.to_string(),
			message: message.into(),
		});
	}

	/// Queue `err` under `title`; a 401 anywhere ends the session.
	fn fail<T>(&self, title: &str, err: ConsoleError) -> Result<T, ConsoleError> {
		if err.is_auth() {
			warn!("{}: session rejected, logging out", title);
			self.logout();
		} else if err.is_validation() {
			self.notify(NoticeLevel::Warning, title, err.to_string());
		} else {
			error!("{}: {}", title, err);
			self.notify(NoticeLevel::Error, title, err.to_string());
		}
		Err(err)
	}

	/// Swap in a new snapshot. The highlight is rebuilt against it: the focus of a
	/// surviving selection, otherwise nothing.
	fn replace_graph(&self, raw: Option<&serde_json::Value>) -> GraphStats {
		let stats = self.store.borrow_mut().replace(raw);
		self.graph_version.set(self.graph_version.get() + 1);
		let store = self.store.borrow();
		*self.highlight.borrow_mut() = self.selection.borrow_mut().revalidate(store.snapshot());
		stats
	}

	fn set_focus(&self, request: FocusRequest) {
		*self.focus.borrow_mut() = Some(request);
	}

	/// Validate a stored token against the server; drops it when rejected.
	pub async fn check_session(&self) -> bool {
		if !self.api.has_session() {
			self.authenticated.set(false);
			return false;
		}
		match self.api.contexts().await {
			Ok(sessions) => {
				*self.sessions.borrow_mut() = sessions;
				self.authenticated.set(true);
				true
			}
			Err(e) => {
				warn!("stored session is no longer valid: {}", e);
				self.api.logout();
				self.authenticated.set(false);
				false
			}
		}
	}

	/// Exchange `key` for a session token.
	pub async fn login(&self, key: &str) -> Result<(), ConsoleError> {
		let key = key.trim();
		if key.is_empty() {
			return self.fail("Login", ConsoleError::EmptyAccessKey);
		}
		if let Err(e) = self.api.login(key).await {
			return self.fail("Login", e);
		}
		info!("logged in");
		self.authenticated.set(true);
		Ok(())
	}

	/// Forget the token and every piece of loaded state.
	pub fn logout(&self) {
		self.api.logout();
		self.authenticated.set(false);
		self.replace_graph(None);
		*self.highlight.borrow_mut() = self.selection.borrow_mut().clear_selection();
		*self.connect.borrow_mut() = ConnectModeMachine::new();
		self.pending_edge.take();
		self.scope.take();
		self.sessions.borrow_mut().clear();
		self.debug_result.take();
		self.focus.take();
	}

	/// Fill the session selector and load the global view.
	pub async fn init(&self) -> Result<GraphStats, ConsoleError> {
		match self.api.contexts().await {
			Ok(sessions) => *self.sessions.borrow_mut() = sessions,
			Err(e) => return self.fail("Sessions", e),
		}
		self.load_scope(SessionScope::Global).await
	}

	/// Fetch and show `scope`. A failed fetch keeps the previous scope and graph.
	pub async fn load_scope(&self, scope: SessionScope) -> Result<GraphStats, ConsoleError> {
		info!("loading graph for {}", scope.value());
		let raw = match self.api.graph(&scope).await {
			Ok(raw) => raw,
			Err(e) => return self.fail("Load failed", e),
		};
		*self.scope.borrow_mut() = Some(scope);
		Ok(self.replace_graph(raw.as_ref()))
	}

	/// Clear selection and highlight, then load the current scope again.
	pub async fn reload(&self) -> Result<GraphStats, ConsoleError> {
		self.clear_selection();
		let scope = self.scope().unwrap_or_default();
		self.load_scope(scope).await
	}

	/// Canvas node click: connect mode consumes it when active, otherwise it selects.
	pub fn node_clicked(&self, id: &str) {
		let step = {
			let store = self.store.borrow();
			self.connect.borrow_mut().on_node_clicked(store.snapshot(), id)
		};
		match step {
			Ok(None) => {
				let _ = self.select_node(id);
			}
			Ok(Some(ConnectStep::StartChosen { start, highlight })) => {
				*self.highlight.borrow_mut() = highlight;
				let name = self.store.borrow().node(&start).map(|n| n.name.clone()).unwrap_or(start);
				self.notify(
					NoticeLevel::Info,
					"First node chosen",
					format!("{}, now click the second node", name),
				);
			}
			Ok(Some(ConnectStep::Completed(draft))) => {
				*self.pending_edge.borrow_mut() = Some(draft);
			}
			Err(e) => {
				let _ = self.fail::<()>("Cannot connect", e);
			}
		}
	}

	/// Select `id`, highlight its neighbourhood and request a camera focus.
	pub fn select_node(&self, id: &str) -> Result<(), ConsoleError> {
		let selected = {
			let store = self.store.borrow();
			self.selection.borrow_mut().select_node(store.snapshot(), id)
		};
		match selected {
			Ok((highlight, focus)) => {
				*self.highlight.borrow_mut() = highlight;
				self.set_focus(focus);
				Ok(())
			}
			Err(e) => self.fail("Select", e),
		}
	}

	/// Canvas click on empty space.
	pub fn background_clicked(&self) {
		self.clear_selection();
	}

	/// Back to Idle with no highlight.
	pub fn clear_selection(&self) {
		*self.highlight.borrow_mut() = self.selection.borrow_mut().clear_selection();
	}

	/// Highlight matches of `query`; a single match is also selected and focused.
	pub fn search(&self, query: &str) {
		let outcome = SearchMatcher::search(&self.store.borrow().snapshot().nodes, query);
		match outcome {
			SearchOutcome::Cleared => *self.highlight.borrow_mut() = HighlightEngine::clear(),
			SearchOutcome::Matched { highlight, single } => {
				*self.highlight.borrow_mut() = highlight;
				if let Some(id) = single {
					let focus = {
						let store = self.store.borrow();
						self.selection.borrow_mut().focus_only(store.snapshot(), &id)
					};
					if let Ok(focus) = focus {
						self.set_focus(focus);
					}
				}
			}
		}
	}

	/// Enter or leave connect mode; leaving discards any partial pick.
	pub fn toggle_connect(&self) -> bool {
		let active = self.connect.borrow_mut().toggle();
		if active {
			self.notify(
				NoticeLevel::Info,
				"Connect mode",
				"Click two nodes in turn to create a relation",
			);
		}
		active
	}

	/// Drop the relation waiting for a type.
	pub fn cancel_edge(&self) {
		self.pending_edge.take();
	}

	/// Flip edit mode of the selected node.
	pub fn toggle_editing(&self) -> Result<bool, ConsoleError> {
		let toggled = self.selection.borrow_mut().toggle_editing();
		toggled.or_else(|e| self.fail("Edit", e))
	}

	/// Leave edit mode without saving.
	pub fn cancel_editing(&self) {
		self.selection.borrow_mut().cancel_editing();
	}

	fn edge_request(&self, from: &str, to: &str, relation: &str) -> Result<EdgeRequest, ConsoleError> {
		let store = self.store.borrow();
		let kind = |id: &str| {
			store
				.node(id)
				.map(|n| n.kind.clone())
				.ok_or_else(|| ConsoleError::UnknownNode(id.to_string()))
		};
		Ok(EdgeRequest {
			from_id: from.to_string(),
			to_id: to.to_string(),
			rel_type: relation.to_string(),
			from_type: kind(from)?,
			to_type: kind(to)?,
		})
	}

	/// Create the pending edge with `relation`, then reload.
	pub async fn create_edge(&self, relation: &str) -> Result<(), ConsoleError> {
		const TITLE: &str = "Create relation";
		let relation = relation.trim();
		if relation.is_empty() {
			return self.fail(TITLE, ConsoleError::EmptyRelationType);
		}
		let Some(draft) = self.pending_edge() else {
			return self.fail(TITLE, ConsoleError::NoPendingEdge);
		};
		let request = match self.edge_request(&draft.from, &draft.to, relation) {
			Ok(request) => request,
			Err(e) => return self.fail(TITLE, e),
		};
		if let Err(e) = self.api.create_edge(&request).await {
			return self.fail(TITLE, e);
		}
		self.pending_edge.take();
		self.notify(NoticeLevel::Success, TITLE, format!("Created {} relation", relation));
		self.reload().await.map(|_| ())
	}

	/// Delete the relation `key`, then reload.
	pub async fn delete_edge(&self, key: &LinkKey) -> Result<(), ConsoleError> {
		const TITLE: &str = "Delete relation";
		let request = match self.edge_request(&key.source, &key.target, &key.relation) {
			Ok(request) => request,
			Err(e) => return self.fail(TITLE, e),
		};
		if let Err(e) = self.api.delete_edge(&request).await {
			return self.fail(TITLE, e);
		}
		self.notify(NoticeLevel::Success, TITLE, "Relation deleted");
		self.reload().await.map(|_| ())
	}

	/// Remove the selected node on the server. Local state only changes via the reload.
	pub async fn delete_selected(&self) -> Result<(), ConsoleError> {
		const TITLE: &str = "Delete node";
		let target = {
			let selection = self.selection.borrow();
			selection.delete_target().map(str::to_string)
		};
		let node = match target.and_then(|id| {
			self.store
				.borrow()
				.node(&id)
				.cloned()
				.ok_or(ConsoleError::UnknownNode(id))
		}) {
			Ok(node) => node,
			Err(e) => return self.fail(TITLE, e),
		};
		if let Err(e) = self.api.delete_node(&node.kind, &node.id).await {
			return self.fail(TITLE, e);
		}
		self.selection.borrow_mut().deleted();
		self.notify(NoticeLevel::Success, TITLE, "Node deleted");
		self.reload().await.map(|_| ())
	}

	/// Send property edits of the selected node; only allow-listed keys pass.
	pub async fn save_properties(&self, edits: &BTreeMap<String, String>) -> Result<(), ConsoleError> {
		const TITLE: &str = "Update properties";
		let checked = self.selection.borrow().check_edits(&self.config, edits);
		let node = match checked.and_then(|id| {
			self.store
				.borrow()
				.node(&id)
				.cloned()
				.ok_or(ConsoleError::UnknownNode(id))
		}) {
			Ok(node) => node,
			Err(e) => return self.fail(TITLE, e),
		};
		if let Err(e) = self.api.update_node(&node.kind, &node.id, edits).await {
			return self.fail(TITLE, e);
		}
		self.selection.borrow_mut().saved();
		self.notify(NoticeLevel::Success, TITLE, "Properties updated");
		self.reload().await.map(|_| ())
	}

	/// Link the selected entity to `session_id`.
	pub async fn link_entity(&self, session_id: &str) -> Result<(), ConsoleError> {
		const TITLE: &str = "Link entity";
		let session_id = session_id.trim();
		let node = match self.selected_node() {
			None => return self.fail(TITLE, ConsoleError::NoSelection),
			Some(node) if !node.is_entity() => {
				return self.fail(TITLE, ConsoleError::NotAnEntity(node.name));
			}
			Some(node) => node,
		};
		if session_id.is_empty() {
			return self.fail(TITLE, ConsoleError::EmptySessionId);
		}
		let request = LinkEntityRequest {
			session_id: session_id.to_string(),
			entity_name: node.name.clone(),
		};
		if let Err(e) = self.api.link_entity(&request).await {
			return self.fail(TITLE, e);
		}
		self.notify(
			NoticeLevel::Success,
			TITLE,
			format!("{} linked to session {}", node.name, session_id),
		);
		let current = self.scope().and_then(|s| s.session_id().map(str::to_string));
		if current.as_deref() == Some(session_id) {
			self.reload().await?;
		}
		Ok(())
	}

	/// Run a maintenance task; returns how many items the server removed.
	pub async fn batch_delete(&self, task: BatchTask) -> Result<u64, ConsoleError> {
		let deleted = match self.api.batch_delete(task).await {
			Ok(result) => result.deleted_count,
			Err(e) => return self.fail(task.title(), e),
		};
		info!("{} removed {} items", task.task_name(), deleted);
		self.notify(NoticeLevel::Success, task.title(), format!("Deleted {} items", deleted));
		self.reload().await?;
		Ok(deleted)
	}

	/// Query the retrieval debugger against the loaded scope and keep the result.
	pub async fn debug_search(&self, query: &str) -> Result<(), ConsoleError> {
		const TITLE: &str = "Debug search";
		let query = query.trim();
		if query.is_empty() {
			return self.fail(TITLE, ConsoleError::EmptyQuery);
		}
		let Some(scope) = self.scope() else {
			return self.fail(TITLE, ConsoleError::NoSessionLoaded);
		};
		match self.api.debug_search(query, scope.value()).await {
			Ok(result) => {
				*self.debug_result.borrow_mut() = Some(result);
				Ok(())
			}
			Err(e) => {
				self.debug_result.take();
				self.fail(TITLE, e)
			}
		}
	}

	/// Show the last debug result as the graph, through the usual validation.
	pub fn visualize_debug_result(&self) -> Result<GraphStats, ConsoleError> {
		let payload = match &*self.debug_result.borrow() {
			Some(result) if result.node_count() > 0 => result.as_graph_payload(),
			_ => return Err(ConsoleError::NoDebugResult),
		};
		self.clear_selection();
		Ok(self.replace_graph(Some(&payload)))
	}
}
