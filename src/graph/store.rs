use std::collections::HashSet;

use log::{debug, info};
use serde_json::Value;

use super::model::{GraphSnapshot, GraphStats, Link, Node};

type StatsListener = Box<dyn FnMut(GraphStats)>;

/// Owner of the current graph snapshot.
///
/// Every load goes through [`GraphDataStore::replace`], which drops nodes without an id
/// and edges whose endpoints are not both present. Readers get the snapshot by
/// reference and never see a half-built graph.
#[derive(Default)]
pub struct GraphDataStore {
	snapshot: GraphSnapshot,
	listeners: Vec<StatsListener>,
}

impl GraphDataStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a callback fired with the node/link counts after every replace.
	pub fn on_stats(&mut self, listener: impl FnMut(GraphStats) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Replace the snapshot with a validated copy of `raw` (`{nodes, edges}`).
	///
	/// Null, absent or non-object payloads produce an empty snapshot.
	pub fn replace(&mut self, raw: Option<&Value>) -> GraphStats {
		self.snapshot = validate(raw);
		let stats = self.snapshot.stats();
		info!("graph replaced: {} nodes, {} links", stats.nodes, stats.links);
		for listener in &mut self.listeners {
			listener(stats);
		}
		stats
	}

	/// Replace with an empty snapshot.
	pub fn clear(&mut self) -> GraphStats {
		self.replace(None)
	}

	/// The current snapshot.
	pub fn snapshot(&self) -> &GraphSnapshot {
		&self.snapshot
	}

	/// Counts of the current snapshot.
	pub fn stats(&self) -> GraphStats {
		self.snapshot.stats()
	}

	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.snapshot.nodes.iter().find(|n| n.id == id)
	}

	/// Incident links of `id`, each paired with the node on the other end.
	pub fn neighbors(&self, id: &str) -> Vec<(&Link, &Node)> {
		self.snapshot
			.links
			.iter()
			.filter_map(|link| {
				let other = link.opposite(id)?;
				self.node(other).map(|node| (link, node))
			})
			.collect()
	}
}

fn validate(raw: Option<&Value>) -> GraphSnapshot {
	let Some(raw) = raw.filter(|v| v.is_object()) else {
		debug!("empty or malformed graph payload");
		return GraphSnapshot::default();
	};
	let items = |key: &str| raw.get(key).and_then(Value::as_array).into_iter().flatten();

	let mut ids = HashSet::new();
	let nodes: Vec<Node> = items("nodes")
		.filter_map(Node::from_value)
		.filter(|node| ids.insert(node.id.clone()))
		.collect();

	let mut seen = HashSet::new();
	let links: Vec<Link> = items("edges")
		.filter_map(Link::from_value)
		.filter(|link| ids.contains(&link.source) && ids.contains(&link.target))
		.filter(|link| seen.insert(link.clone()))
		.collect();

	GraphSnapshot { nodes, links }
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use proptest::prelude::*;
	use serde_json::json;

	use super::*;

	#[test]
	fn dangling_edge_is_dropped() {
		let mut store = GraphDataStore::new();
		let stats = store.replace(Some(&json!({
			"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
			"edges": [{"source": "a", "target": "b"}, {"source": "a", "target": "z"}]
		})));
		assert_eq!(stats, GraphStats { nodes: 3, links: 1 });
		assert_eq!(store.snapshot().links[0].target, "b");
	}

	#[test]
	fn absent_payload_is_empty_not_error() {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({"nodes": [{"id": "a"}]})));
		assert_eq!(store.replace(None), GraphStats::default());
		assert_eq!(store.replace(Some(&Value::Null)), GraphStats::default());
		assert_eq!(store.replace(Some(&json!([1, 2]))), GraphStats::default());
		assert!(store.snapshot().is_empty());
	}

	#[test]
	fn nodes_unique_by_id_and_invalid_nodes_skipped() {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a", "name": "first"}, {"id": "a", "name": "second"}, {"name": "x"}, null],
			"edges": []
		})));
		assert_eq!(store.snapshot().nodes.len(), 1);
		assert_eq!(store.node("a").unwrap().name, "first");
	}

	#[test]
	fn stats_listeners_fire_on_every_replace() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut store = GraphDataStore::new();
		let sink = seen.clone();
		store.on_stats(move |stats| sink.borrow_mut().push(stats));

		store.replace(Some(&json!({"nodes": [{"id": "a"}, {"id": "b"}], "edges": [{"source": "a", "target": "b"}]})));
		store.replace(None);

		assert_eq!(
			*seen.borrow(),
			vec![GraphStats { nodes: 2, links: 1 }, GraphStats::default()]
		);
	}

	#[test]
	fn neighbors_resolve_opposite_node() {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a"}, {"id": "b", "name": "Bee"}, {"id": "c"}],
			"edges": [
				{"source": "a", "target": "b", "relation": "KNOWS"},
				{"source": "c", "target": "a", "relation": "OWNS"},
				{"source": "b", "target": "c", "relation": "NEAR"}
			]
		})));
		let names: Vec<(&str, &str)> = store
			.neighbors("a")
			.into_iter()
			.map(|(link, node)| (link.relation.as_str(), node.name.as_str()))
			.collect();
		assert_eq!(names, vec![("KNOWS", "Bee"), ("OWNS", "c")]);
	}

	fn arb_payload() -> impl Strategy<Value = Value> {
		let id = "[a-f]{0,2}";
		let nodes = prop::collection::vec(id, 0..12);
		let edges = prop::collection::vec((id, id), 0..24);
		(nodes, edges).prop_map(|(nodes, edges)| {
			json!({
				"nodes": nodes.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
				"edges": edges
					.iter()
					.map(|(s, t)| json!({"source": s, "target": t}))
					.collect::<Vec<_>>(),
			})
		})
	}

	proptest! {
		#[test]
		fn replace_never_keeps_dangling_links(payload in arb_payload()) {
			let mut store = GraphDataStore::new();
			store.replace(Some(&payload));
			let snapshot = store.snapshot();
			let ids: HashSet<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
			prop_assert_eq!(ids.len(), snapshot.nodes.len());
			for link in &snapshot.links {
				prop_assert!(ids.contains(link.source.as_str()));
				prop_assert!(ids.contains(link.target.as_str()));
			}
		}
	}
}
