use std::collections::HashSet;

use super::model::{GraphSnapshot, LinkKey, Node, NodeId};

/// Nodes and links rendered at full opacity; everything else dims.
///
/// `active` separates "nothing highlighted" from "a query matched nothing": the latter
/// is active with an empty node set and dims every node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
	/// Whether anything is highlighted at all.
	pub active: bool,
	/// Nodes drawn at full opacity.
	pub node_ids: HashSet<NodeId>,
	/// Links drawn emphasised.
	pub link_keys: HashSet<LinkKey>,
}

impl HighlightSet {
	/// Whether `id` is highlighted.
	pub fn contains_node(&self, id: &str) -> bool {
		self.node_ids.contains(id)
	}

	/// Whether `key` is highlighted.
	pub fn contains_link(&self, key: &LinkKey) -> bool {
		self.link_keys.contains(key)
	}

	/// Whether `id` is drawn faded.
	pub fn is_node_dimmed(&self, id: &str) -> bool {
		self.active && !self.node_ids.contains(id)
	}

	/// Links are judged against `link_keys` alone, so a node-only highlight leaves
	/// every link at full opacity.
	pub fn is_link_dimmed(&self, key: &LinkKey) -> bool {
		!self.link_keys.is_empty() && !self.link_keys.contains(key)
	}
}

/// Stateless highlight computations over a snapshot.
pub struct HighlightEngine;

impl HighlightEngine {
	/// The node plus every direct neighbour and the links between them (one hop).
	pub fn compute_focus(snapshot: &GraphSnapshot, id: &str) -> HighlightSet {
		let mut set = HighlightSet {
			active: true,
			..HighlightSet::default()
		};
		set.node_ids.insert(id.to_string());
		for link in &snapshot.links {
			if let Some(other) = link.opposite(id) {
				set.node_ids.insert(other.to_string());
				set.link_keys.insert(link.key());
			}
		}
		set
	}

	/// Node-only highlight of every node passing `predicate`.
	pub fn compute_query<'a>(
		nodes: impl IntoIterator<Item = &'a Node>,
		predicate: impl Fn(&Node) -> bool,
	) -> HighlightSet {
		HighlightSet {
			active: true,
			node_ids: nodes
				.into_iter()
				.filter(|node| predicate(node))
				.map(|node| node.id.clone())
				.collect(),
			link_keys: HashSet::new(),
		}
	}

	/// Nothing highlighted, nothing dimmed.
	pub fn clear() -> HighlightSet {
		HighlightSet::default()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::GraphDataStore;

	fn store(edges: serde_json::Value) -> GraphDataStore {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}],
			"edges": edges
		})));
		store
	}

	fn key(source: &str, target: &str) -> LinkKey {
		LinkKey {
			source: source.into(),
			target: target.into(),
			relation: String::new(),
		}
	}

	#[test]
	fn focus_is_one_hop() {
		let store = store(json!([
			{"source": "a", "target": "b"},
			{"source": "c", "target": "a"},
			{"source": "c", "target": "d"}
		]));
		let set = HighlightEngine::compute_focus(store.snapshot(), "a");
		let mut ids: Vec<_> = set.node_ids.iter().cloned().collect();
		ids.sort();
		assert_eq!(ids, vec!["a", "b", "c"]);
		assert_eq!(set.link_keys, HashSet::from([key("a", "b"), key("c", "a")]));
		assert!(set.is_node_dimmed("d"));
		assert!(set.is_link_dimmed(&key("c", "d")));
		assert!(!set.is_link_dimmed(&key("a", "b")));
	}

	#[test]
	fn focus_on_isolated_node_is_reflexive() {
		let store = store(json!([{"source": "a", "target": "b"}]));
		let set = HighlightEngine::compute_focus(store.snapshot(), "d");
		assert_eq!(set.node_ids, HashSet::from(["d".to_string()]));
		assert!(set.link_keys.is_empty());
	}

	#[test]
	fn query_highlight_leaves_links_undimmed() {
		let store = store(json!([{"source": "a", "target": "b"}]));
		let set = HighlightEngine::compute_query(&store.snapshot().nodes, |n| n.id == "c");
		assert!(!set.is_node_dimmed("c"));
		assert!(set.is_node_dimmed("a"));
		assert!(!set.is_link_dimmed(&key("a", "b")));
	}

	#[test]
	fn zero_match_query_dims_everything_but_clear_dims_nothing() {
		let store = store(json!([]));
		let none = HighlightEngine::compute_query(&store.snapshot().nodes, |_| false);
		assert!(none.active);
		assert!(none.node_ids.is_empty());
		assert!(none.is_node_dimmed("a"));

		let cleared = HighlightEngine::clear();
		assert!(!cleared.active);
		assert!(!cleared.is_node_dimmed("a"));
	}
}
