use super::highlight::{HighlightEngine, HighlightSet};
use super::model::Node;

/// Outcome of a search box update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
	/// Blank query: highlighting removed entirely.
	Cleared,
	/// Node-only highlight of the matches; `single` is set when exactly one node matched.
	Matched {
		highlight: HighlightSet,
		single: Option<String>,
	},
}

/// Case-insensitive substring search over `name`, `type` and `id`.
pub struct SearchMatcher;

impl SearchMatcher {
	/// Nodes matching `query`, in snapshot order.
	pub fn matches<'a>(nodes: &'a [Node], query: &str) -> Vec<&'a Node> {
		let needle = query.trim().to_lowercase();
		nodes.iter().filter(|node| Self::is_match(node, &needle)).collect()
	}

	/// Highlight for a search box value; blank clears.
	pub fn search(nodes: &[Node], query: &str) -> SearchOutcome {
		let needle = query.trim().to_lowercase();
		if needle.is_empty() {
			return SearchOutcome::Cleared;
		}
		let highlight = HighlightEngine::compute_query(nodes, |node| Self::is_match(node, &needle));
		let single = match highlight.node_ids.len() {
			1 => highlight.node_ids.iter().next().cloned(),
			_ => None,
		};
		SearchOutcome::Matched { highlight, single }
	}

	fn is_match(node: &Node, needle: &str) -> bool {
		[&node.name, &node.kind, &node.id]
			.iter()
			.any(|field| field.to_lowercase().contains(needle))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use proptest::prelude::*;

	use super::*;

	fn node(id: &str, name: &str, kind: &str) -> Node {
		Node {
			id: id.into(),
			name: name.into(),
			kind: kind.into(),
			..Node::default()
		}
	}

	fn sample() -> Vec<Node> {
		vec![
			node("e1", "Alice", "Entity"),
			node("e2", "Bob", "Entity"),
			node("m1", "lunch with alice", "Memory"),
			node("s1", "group-42", "Session"),
		]
	}

	#[test]
	fn matches_any_field_ignoring_case() {
		let nodes = sample();
		let ids = |q: &str| -> Vec<String> {
			SearchMatcher::matches(&nodes, q).iter().map(|n| n.id.clone()).collect()
		};
		assert_eq!(ids("ALICE"), vec!["e1", "m1"]);
		assert_eq!(ids("entity"), vec!["e1", "e2"]);
		assert_eq!(ids("S1"), vec!["s1"]);
	}

	#[test]
	fn blank_query_clears() {
		assert_eq!(SearchMatcher::search(&sample(), "   "), SearchOutcome::Cleared);
		assert_eq!(SearchMatcher::search(&sample(), ""), SearchOutcome::Cleared);
	}

	#[test]
	fn single_match_reports_focus_target() {
		match SearchMatcher::search(&sample(), "bob") {
			SearchOutcome::Matched { highlight, single } => {
				assert_eq!(single.as_deref(), Some("e2"));
				assert!(highlight.link_keys.is_empty());
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn zero_matches_is_active_and_empty() {
		match SearchMatcher::search(&sample(), "nobody") {
			SearchOutcome::Matched { highlight, single } => {
				assert!(highlight.active);
				assert!(highlight.node_ids.is_empty());
				assert!(single.is_none());
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	proptest! {
		#[test]
		fn order_independent(seed in any::<u64>(), query in "[a-z1-4]{1,3}") {
			let nodes = sample();
			let mut shuffled = nodes.clone();
			// deterministic shuffle driven by the seed
			let len = shuffled.len();
			for i in (1..len).rev() {
				let j = (seed.rotate_left(i as u32) % (i as u64 + 1)) as usize;
				shuffled.swap(i, j);
			}
			let a: HashSet<String> = SearchMatcher::matches(&nodes, &query).iter().map(|n| n.id.clone()).collect();
			let b: HashSet<String> = SearchMatcher::matches(&shuffled, &query).iter().map(|n| n.id.clone()).collect();
			let again: HashSet<String> = SearchMatcher::matches(&nodes, &query).iter().map(|n| n.id.clone()).collect();
			prop_assert_eq!(&a, &b);
			prop_assert_eq!(&a, &again);
		}
	}
}
