use crate::error::ConsoleError;
use crate::graph::{GraphSnapshot, HighlightEngine, HighlightSet, NodeId};

/// Connect mode: off, or on with an optional first pick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectState {
	/// Clicks select nodes as usual.
	#[default]
	Off,
	/// Clicks pick endpoints; `start` is the first pick.
	On { start: Option<NodeId> },
}

/// Two picked endpoints waiting for a relation type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeDraft {
	/// First picked node.
	pub from: NodeId,
	/// Second picked node.
	pub to: NodeId,
}

/// Result of a node click while connect mode is on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectStep {
	/// First node picked; its neighbourhood is highlighted.
	StartChosen { start: NodeId, highlight: HighlightSet },
	/// Second node picked; the machine is back to `Off`.
	Completed(EdgeDraft),
}

/// Two-click workflow for creating a relation between existing nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectModeMachine {
	state: ConnectState,
}

impl ConnectModeMachine {
	/// A machine in `Off`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current state.
	pub fn state(&self) -> &ConnectState {
		&self.state
	}

	/// Whether connect mode is on.
	pub fn is_active(&self) -> bool {
		matches!(self.state, ConnectState::On { .. })
	}

	/// First pick, if any.
	pub fn start(&self) -> Option<&str> {
		match &self.state {
			ConnectState::On { start } => start.as_deref(),
			ConnectState::Off => None,
		}
	}

	/// Off → On with no pick; On → Off, silently discarding a partial pick.
	pub fn toggle(&mut self) -> bool {
		self.state = match self.state {
			ConnectState::Off => ConnectState::On { start: None },
			ConnectState::On { .. } => ConnectState::Off,
		};
		self.is_active()
	}

	/// Feed a node click. `Ok(None)` when the machine is off.
	///
	/// Picking the start node again is rejected with [`ConsoleError::SelfLoop`] and
	/// leaves the pick in place.
	pub fn on_node_clicked(
		&mut self,
		snapshot: &GraphSnapshot,
		id: &str,
	) -> Result<Option<ConnectStep>, ConsoleError> {
		let ConnectState::On { start } = &self.state else {
			return Ok(None);
		};
		if !snapshot.nodes.iter().any(|n| n.id == id) {
			return Err(ConsoleError::UnknownNode(id.to_string()));
		}
		match start {
			None => {
				self.state = ConnectState::On {
					start: Some(id.to_string()),
				};
				Ok(Some(ConnectStep::StartChosen {
					start: id.to_string(),
					highlight: HighlightEngine::compute_focus(snapshot, id),
				}))
			}
			Some(start) if start == id => Err(ConsoleError::SelfLoop),
			Some(start) => {
				let draft = EdgeDraft {
					from: start.clone(),
					to: id.to_string(),
				};
				self.state = ConnectState::Off;
				Ok(Some(ConnectStep::Completed(draft)))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::GraphDataStore;

	fn snapshot() -> GraphSnapshot {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"edges": [{"source": "a", "target": "b"}]
		})));
		store.snapshot().clone()
	}

	#[test]
	fn toggle_twice_returns_to_off() {
		let mut machine = ConnectModeMachine::new();
		assert!(machine.toggle());
		machine.on_node_clicked(&snapshot(), "a").unwrap();
		assert!(!machine.toggle());
		assert_eq!(machine.state(), &ConnectState::Off);
		assert_eq!(machine.start(), None);
	}

	#[test]
	fn clicks_ignored_while_off() {
		let mut machine = ConnectModeMachine::new();
		assert_eq!(machine.on_node_clicked(&snapshot(), "a"), Ok(None));
	}

	#[test]
	fn self_loop_rejected_and_start_kept() {
		let snapshot = snapshot();
		let mut machine = ConnectModeMachine::new();
		machine.toggle();
		match machine.on_node_clicked(&snapshot, "a").unwrap() {
			Some(ConnectStep::StartChosen { start, highlight }) => {
				assert_eq!(start, "a");
				assert!(highlight.contains_node("b"));
			}
			other => panic!("unexpected {other:?}"),
		}
		assert_eq!(machine.on_node_clicked(&snapshot, "a"), Err(ConsoleError::SelfLoop));
		assert_eq!(machine.on_node_clicked(&snapshot, "a"), Err(ConsoleError::SelfLoop));
		assert_eq!(machine.start(), Some("a"));
		assert!(machine.is_active());
	}

	#[test]
	fn second_pick_emits_draft_and_turns_off() {
		let snapshot = snapshot();
		let mut machine = ConnectModeMachine::new();
		machine.toggle();
		machine.on_node_clicked(&snapshot, "a").unwrap();
		assert_eq!(
			machine.on_node_clicked(&snapshot, "b"),
			Ok(Some(ConnectStep::Completed(EdgeDraft {
				from: "a".into(),
				to: "b".into()
			})))
		);
		assert_eq!(machine.state(), &ConnectState::Off);
	}
}
