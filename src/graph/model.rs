use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Node identity as reported by the server.
pub type NodeId = String;

/// An entity or memory in the graph.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Node {
	/// Unique id.
	pub id: NodeId,
	/// Display name; the id when the server sent none.
	pub name: String,
	/// Server-side label, e.g. `Entity`, `Memory`, `Session`.
	pub kind: String,
	/// Relative weight in `[0, 1]`; drives the rendered radius.
	pub importance: Option<f64>,
	/// Free-form properties.
	pub properties: BTreeMap<String, Value>,
	/// Observation texts recorded for the node.
	pub observations: Vec<String>,
}

impl Node {
	/// Lenient decode of one raw node; `None` unless `id` is a non-empty string.
	pub fn from_value(value: &Value) -> Option<Self> {
		let id = value.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())?;
		let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
		let properties = value
			.get("properties")
			.and_then(Value::as_object)
			.map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
			.unwrap_or_default();
		let observations = value
			.get("observations")
			.and_then(Value::as_array)
			.map(|items| {
				items
					.iter()
					.map(|item| match item {
						Value::String(s) => s.clone(),
						other => other.to_string(),
					})
					.collect()
			})
			.unwrap_or_default();

		Some(Self {
			id: id.to_string(),
			name: text("name").unwrap_or_else(|| id.to_string()),
			kind: text("type").unwrap_or_default(),
			importance: value
				.get("importance")
				.and_then(Value::as_f64)
				.map(|i| i.clamp(0.0, 1.0)),
			properties,
			observations,
		})
	}

	/// Entities are the only nodes that can be linked to a session.
	pub fn is_entity(&self) -> bool {
		self.kind == "Entity"
	}
}

/// A directed relation between two nodes, stored as an id pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
	/// Id of the source node.
	pub source: NodeId,
	/// Id of the target node.
	pub target: NodeId,
	/// Relation type, e.g. `KNOWS`.
	pub relation: String,
}

impl Link {
	/// Lenient decode of one raw edge; endpoints must be non-empty strings.
	pub fn from_value(value: &Value) -> Option<Self> {
		let endpoint = |key: &str| {
			value
				.get(key)
				.and_then(Value::as_str)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
		};
		let relation = ["relation", "label"]
			.iter()
			.find_map(|key| value.get(*key).and_then(Value::as_str))
			.unwrap_or_default();
		Some(Self {
			source: endpoint("source")?,
			target: endpoint("target")?,
			relation: relation.to_string(),
		})
	}

	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}

	/// The endpoint on the other side of `id`, if the link touches it.
	pub fn opposite(&self, id: &str) -> Option<&str> {
		if self.source == id {
			Some(&self.target)
		} else if self.target == id {
			Some(&self.source)
		} else {
			None
		}
	}

	/// Highlight identity of this link.
	pub fn key(&self) -> LinkKey {
		LinkKey {
			source: self.source.clone(),
			target: self.target.clone(),
			relation: self.relation.clone(),
		}
	}
}

/// Identity of a link inside a highlight set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
	/// Source node id.
	pub source: NodeId,
	/// Target node id.
	pub target: NodeId,
	/// Relation type.
	pub relation: String,
}

impl fmt::Display for LinkKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.source, self.target)
	}
}

/// The authoritative in-memory copy of the graph, replaced wholesale on load.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct GraphSnapshot {
	/// Nodes, unique by id.
	pub nodes: Vec<Node>,
	/// Links whose endpoints are both in `nodes`.
	pub links: Vec<Link>,
}

impl GraphSnapshot {
	/// Node and link counts.
	pub fn stats(&self) -> GraphStats {
		GraphStats {
			nodes: self.nodes.len(),
			links: self.links.len(),
		}
	}

	/// True without nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Counts published after every replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GraphStats {
	/// Number of nodes.
	pub nodes: usize,
	/// Number of links.
	pub links: usize,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn node_requires_id() {
		assert!(Node::from_value(&json!({"name": "orphan"})).is_none());
		assert!(Node::from_value(&json!({"id": ""})).is_none());
		assert!(Node::from_value(&json!({"id": 7})).is_none());
	}

	#[test]
	fn node_decodes_leniently() {
		let node = Node::from_value(&json!({
			"id": "e1",
			"type": "Entity",
			"importance": 1.7,
			"properties": {"summary": "a cat", "weight": 3},
			"observations": ["likes fish", 42]
		}))
		.unwrap();
		assert_eq!(node.name, "e1");
		assert_eq!(node.kind, "Entity");
		assert_eq!(node.importance, Some(1.0));
		assert_eq!(node.properties["summary"], json!("a cat"));
		assert_eq!(node.observations, vec!["likes fish".to_string(), "42".to_string()]);
		assert!(node.is_entity());
	}

	#[test]
	fn link_relation_falls_back_to_label() {
		let link = Link::from_value(&json!({"source": "a", "target": "b", "label": "KNOWS"})).unwrap();
		assert_eq!(link.relation, "KNOWS");
		assert_eq!(link.opposite("a"), Some("b"));
		assert_eq!(link.opposite("b"), Some("a"));
		assert_eq!(link.opposite("c"), None);
		assert_eq!(link.key().to_string(), "a-b");
		assert!(Link::from_value(&json!({"source": "a"})).is_none());
	}
}
