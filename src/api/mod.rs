//! REST contract of the graph-memory backend.
//!
//! The console only talks to the server through [`GraphApi`], so controllers can run
//! against an in-memory double in tests. [`HttpGraphApi`] is the browser implementation.

mod http;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConsoleError;

pub use http::HttpGraphApi;

/// Which slice of the graph to load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionScope {
	/// Every node the server knows about.
	#[default]
	Global,
	/// Nodes linked to a single conversation session.
	Session(String),
}

impl SessionScope {
	/// Selector value; `global` maps back to [`SessionScope::Global`].
	pub fn from_value(value: &str) -> Self {
		match value.trim() {
			"" | "global" => Self::Global,
			id => Self::Session(id.to_string()),
		}
	}

	/// Selector value, the inverse of [`SessionScope::from_value`].
	pub fn value(&self) -> &str {
		match self {
			Self::Global => "global",
			Self::Session(id) => id,
		}
	}

	/// `None` for the global view.
	pub fn session_id(&self) -> Option<&str> {
		match self {
			Self::Global => None,
			Self::Session(id) => Some(id),
		}
	}
}

/// One entry of `GET /api/contexts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
	/// Conversation session identifier.
	pub session_id: String,
}

impl SessionContext {
	/// Long ids keep their tail, which is the distinctive part.
	pub fn display_name(&self) -> String {
		let chars: Vec<char> = self.session_id.chars().collect();
		if chars.len() > 30 {
			let tail: String = chars[chars.len() - 27..].iter().collect();
			format!("...{}", tail)
		} else {
			self.session_id.clone()
		}
	}
}

/// Body of a successful `POST /api/login`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
	/// Bearer token for later calls.
	#[serde(default)]
	pub token: Option<String>,
}

/// Body of `POST /api/edge`, and the query of `DELETE /api/edge`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeRequest {
	/// Source node id.
	pub from_id: String,
	/// Target node id.
	pub to_id: String,
	/// Relation type.
	pub rel_type: String,
	/// Server label of the source node.
	pub from_type: String,
	/// Server label of the target node.
	pub to_type: String,
}

/// Body of `POST /api/link`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkEntityRequest {
	/// Session the entity is attached to.
	pub session_id: String,
	/// Name of the entity node.
	pub entity_name: String,
}

/// Server-side maintenance jobs exposed through `POST /api/batch-delete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchTask {
	/// Remove entities without any relation.
	DeleteIsolatedEntities,
	/// Remove raw messages older than `days`.
	DeleteOldMessages { days: u32 },
}

impl BatchTask {
	/// Every task offered in the tools panel.
	pub const ALL: [BatchTask; 2] = [
		BatchTask::DeleteIsolatedEntities,
		BatchTask::DeleteOldMessages { days: 90 },
	];

	/// Wire name sent as `task_name`.
	pub fn task_name(&self) -> &'static str {
		match self {
			Self::DeleteIsolatedEntities => "delete_isolated_entities",
			Self::DeleteOldMessages { .. } => "delete_old_messages",
		}
	}

	/// Human-readable task name.
	pub fn title(&self) -> &'static str {
		match self {
			Self::DeleteIsolatedEntities => "Delete isolated entities",
			Self::DeleteOldMessages { .. } => "Delete old messages",
		}
	}

	/// One-line summary for the confirmation prompt.
	pub fn description(&self) -> String {
		match self {
			Self::DeleteIsolatedEntities => "Remove nodes without any connection".to_string(),
			Self::DeleteOldMessages { days } => format!("Remove raw messages older than {} days", days),
		}
	}

	/// Request body, `{task_name, params}`.
	pub fn body(&self) -> Value {
		let params = match self {
			Self::DeleteIsolatedEntities => serde_json::json!({}),
			Self::DeleteOldMessages { days } => serde_json::json!({ "days": days }),
		};
		serde_json::json!({ "task_name": self.task_name(), "params": params })
	}
}

/// Response of `POST /api/batch-delete`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BatchDeleteResult {
	/// How many items the task removed.
	#[serde(default)]
	pub deleted_count: u64,
}

/// Raw result of `GET /api/debug_search`, kept verbatim for display.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugSearchResult {
	/// Response body as received.
	pub raw: Value,
}

impl DebugSearchResult {
	fn items(&self, key: &str) -> &[Value] {
		self.raw
			.get(key)
			.and_then(Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Length of the `nodes` array, zero when absent.
	pub fn node_count(&self) -> usize {
		self.items("nodes").len()
	}

	/// Length of the `edges` array, zero when absent.
	pub fn edge_count(&self) -> usize {
		self.items("edges").len()
	}

	/// Indented JSON for display.
	pub fn pretty(&self) -> String {
		serde_json::to_string_pretty(&self.raw).unwrap_or_default()
	}

	/// Re-shape the result into a `{nodes, edges}` graph payload with display defaults.
	pub fn as_graph_payload(&self) -> Value {
		let text = |v: &Value, key: &str| {
			v.get(key)
				.and_then(Value::as_str)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
		};
		let nodes: Vec<Value> = self
			.items("nodes")
			.iter()
			.map(|n| {
				let id = text(n, "id").or_else(|| text(n, "name"));
				let name = text(n, "name").or_else(|| text(n, "id"));
				serde_json::json!({
					"id": id,
					"name": name,
					"type": text(n, "type").unwrap_or_else(|| "debug".to_string()),
					"importance": n.get("importance").and_then(Value::as_f64).unwrap_or(0.7),
					"properties": n.get("properties").cloned().unwrap_or_else(|| serde_json::json!({})),
					"observations": n.get("observations").cloned().unwrap_or_else(|| serde_json::json!([])),
				})
			})
			.collect();
		let edges: Vec<Value> = self
			.items("edges")
			.iter()
			.map(|e| {
				serde_json::json!({
					"source": e.get("source").cloned().unwrap_or(Value::Null),
					"target": e.get("target").cloned().unwrap_or(Value::Null),
					"relation": text(e, "relation").unwrap_or_else(|| "debug_link".to_string()),
				})
			})
			.collect();
		serde_json::json!({ "nodes": nodes, "edges": edges })
	}
}

/// Endpoints the console consumes. Every call is authenticated out of band.
#[allow(async_fn_in_trait)]
pub trait GraphApi {
	/// Whether a session token is currently held.
	fn has_session(&self) -> bool;

	/// Exchange an access key for a session token and keep it.
	async fn login(&self, key: &str) -> Result<(), ConsoleError>;

	/// Forget the session token.
	fn logout(&self);

	/// Sessions that have graph data.
	async fn contexts(&self) -> Result<Vec<SessionContext>, ConsoleError>;

	/// Raw graph payload; `None` when the server answered with an empty body or `null`.
	async fn graph(&self, scope: &SessionScope) -> Result<Option<Value>, ConsoleError>;

	/// Create a relation.
	async fn create_edge(&self, edge: &EdgeRequest) -> Result<(), ConsoleError>;

	/// Delete a relation.
	async fn delete_edge(&self, edge: &EdgeRequest) -> Result<(), ConsoleError>;

	/// Delete a node with its relations.
	async fn delete_node(&self, node_type: &str, id: &str) -> Result<(), ConsoleError>;

	/// Overwrite the given properties of a node.
	async fn update_node(
		&self,
		node_type: &str,
		id: &str,
		props: &BTreeMap<String, String>,
	) -> Result<(), ConsoleError>;

	/// Attach an entity to a session.
	async fn link_entity(&self, link: &LinkEntityRequest) -> Result<(), ConsoleError>;

	/// Run a maintenance task.
	async fn batch_delete(&self, task: BatchTask) -> Result<BatchDeleteResult, ConsoleError>;

	/// Retrieval debugger query scoped to `session_id`.
	async fn debug_search(
		&self,
		query: &str,
		session_id: &str,
	) -> Result<DebugSearchResult, ConsoleError>;
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn scope_round_trips_selector_value() {
		assert_eq!(SessionScope::from_value("global"), SessionScope::Global);
		assert_eq!(
			SessionScope::from_value("aiocqhttp:GroupMessage:1"),
			SessionScope::Session("aiocqhttp:GroupMessage:1".into())
		);
		assert_eq!(SessionScope::Global.value(), "global");
		assert_eq!(SessionScope::Global.session_id(), None);
	}

	#[test]
	fn long_session_ids_keep_tail() {
		let short = SessionContext { session_id: "abc".into() };
		assert_eq!(short.display_name(), "abc");
		let long = SessionContext {
			session_id: "aiocqhttp:GroupMessage:123456789012345".into(),
		};
		let shown = long.display_name();
		assert!(shown.starts_with("..."));
		assert_eq!(shown.len(), 30);
		assert!(shown.ends_with("123456789012345"));
	}

	#[test]
	fn batch_task_bodies() {
		assert_eq!(
			BatchTask::DeleteOldMessages { days: 90 }.body(),
			json!({"task_name": "delete_old_messages", "params": {"days": 90}})
		);
		assert_eq!(
			BatchTask::DeleteIsolatedEntities.body(),
			json!({"task_name": "delete_isolated_entities", "params": {}})
		);
	}

	#[test]
	fn debug_result_normalises_to_graph_payload() {
		let result = DebugSearchResult {
			raw: json!({
				"nodes": [{"name": "Alice"}, {"id": "m1", "type": "Memory", "importance": 0.2}],
				"edges": [{"source": "Alice", "target": "m1"}]
			}),
		};
		assert_eq!(result.node_count(), 2);
		assert_eq!(result.edge_count(), 1);
		let payload = result.as_graph_payload();
		assert_eq!(payload["nodes"][0]["id"], "Alice");
		assert_eq!(payload["nodes"][0]["type"], "debug");
		assert_eq!(payload["nodes"][0]["importance"], 0.7);
		assert_eq!(payload["nodes"][1]["name"], "m1");
		assert_eq!(payload["edges"][0]["relation"], "debug_link");
	}
}
