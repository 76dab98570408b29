use std::collections::BTreeMap;

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::graph::{GraphSnapshot, HighlightEngine, HighlightSet, NodeId};

/// Camera request handed to the renderer: centre on the node and zoom in.
///
/// Requests are fire-and-forget; a newer `seq` simply redirects the animation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusRequest {
	/// Node to centre on.
	pub node_id: NodeId,
	/// Increases with every request.
	pub seq: u64,
}

/// Idle / Selected(id) with an edit flag that is only meaningful while selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionController {
	selected: Option<NodeId>,
	editing: bool,
	focus_seq: u64,
}

impl SelectionController {
	/// An Idle controller.
	pub fn new() -> Self {
		Self::default()
	}

	/// Id of the selected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Whether edit mode is on.
	pub fn is_editing(&self) -> bool {
		self.editing
	}

	/// Select `id`, resetting edit mode. Returns the one-hop highlight and a camera request.
	pub fn select_node(
		&mut self,
		snapshot: &GraphSnapshot,
		id: &str,
	) -> Result<(HighlightSet, FocusRequest), ConsoleError> {
		let focus = self.focus_only(snapshot, id)?;
		Ok((HighlightEngine::compute_focus(snapshot, id), focus))
	}

	/// Select `id` and move the camera without touching the current highlight.
	pub fn focus_only(
		&mut self,
		snapshot: &GraphSnapshot,
		id: &str,
	) -> Result<FocusRequest, ConsoleError> {
		if !snapshot.nodes.iter().any(|n| n.id == id) {
			return Err(ConsoleError::UnknownNode(id.to_string()));
		}
		self.selected = Some(id.to_string());
		self.editing = false;
		self.focus_seq += 1;
		Ok(FocusRequest {
			node_id: id.to_string(),
			seq: self.focus_seq,
		})
	}

	/// Back to Idle; returns the cleared highlight.
	pub fn clear_selection(&mut self) -> HighlightSet {
		self.selected = None;
		self.editing = false;
		HighlightEngine::clear()
	}

	/// Re-derive the highlight after a replace. A selection whose node is gone goes
	/// back to Idle; a surviving one gets its focus recomputed on the new snapshot.
	pub fn revalidate(&mut self, snapshot: &GraphSnapshot) -> HighlightSet {
		match self.selected.clone() {
			Some(id) if snapshot.nodes.iter().any(|n| n.id == id) => {
				HighlightEngine::compute_focus(snapshot, &id)
			}
			_ => self.clear_selection(),
		}
	}

	/// Flip edit mode; returns the new flag.
	pub fn toggle_editing(&mut self) -> Result<bool, ConsoleError> {
		if self.selected.is_none() {
			return Err(ConsoleError::NoSelection);
		}
		self.editing = !self.editing;
		Ok(self.editing)
	}

	/// Leave edit mode.
	pub fn cancel_editing(&mut self) {
		self.editing = false;
	}

	/// Id of the node a delete would remove.
	pub fn delete_target(&self) -> Result<&str, ConsoleError> {
		self.selected().ok_or(ConsoleError::NoSelection)
	}

	/// Called once the server confirmed the removal.
	pub fn deleted(&mut self) {
		self.clear_selection();
	}

	/// Validate an edit set against the current state and the allow-list.
	pub fn check_edits(
		&self,
		config: &ConsoleConfig,
		edits: &BTreeMap<String, String>,
	) -> Result<NodeId, ConsoleError> {
		let id = self.selected.clone().ok_or(ConsoleError::NoSelection)?;
		if !self.editing {
			return Err(ConsoleError::NotEditing);
		}
		if edits.is_empty() {
			return Err(ConsoleError::NoPropertyEdits);
		}
		if let Some(key) = edits.keys().find(|k| !config.is_editable(k)) {
			return Err(ConsoleError::PropertyNotEditable(key.clone()));
		}
		Ok(id)
	}

	/// Called once the server accepted the property update.
	pub fn saved(&mut self) {
		self.editing = false;
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
			"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
			"edges": [{"source": "a", "target": "b"}, {"source": "a", "target": "c"}]
		})));
		store.snapshot().clone()
	}

	fn edits(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn select_highlights_neighbourhood_and_resets_editing() {
		let snapshot = snapshot();
		let mut selection = SelectionController::new();
		selection.select_node(&snapshot, "b").unwrap();
		selection.toggle_editing().unwrap();

		let (highlight, focus) = selection.select_node(&snapshot, "a").unwrap();
		assert_eq!(selection.selected(), Some("a"));
		assert!(!selection.is_editing());
		assert_eq!(highlight.node_ids.len(), 3);
		assert_eq!(highlight.link_keys.len(), 2);
		assert_eq!(focus.node_id, "a");
		assert_eq!(focus.seq, 2);
	}

	#[test]
	fn unknown_node_is_rejected() {
		let mut selection = SelectionController::new();
		assert_eq!(
			selection.select_node(&snapshot(), "zz").unwrap_err(),
			ConsoleError::UnknownNode("zz".into())
		);
		assert_eq!(selection.selected(), None);
	}

	#[test]
	fn editing_requires_selection() {
		let mut selection = SelectionController::new();
		assert_eq!(selection.toggle_editing(), Err(ConsoleError::NoSelection));
		selection.select_node(&snapshot(), "a").unwrap();
		assert_eq!(selection.toggle_editing(), Ok(true));
		assert_eq!(selection.toggle_editing(), Ok(false));
	}

	#[test]
	fn clear_returns_to_idle() {
		let mut selection = SelectionController::new();
		selection.select_node(&snapshot(), "a").unwrap();
		selection.toggle_editing().unwrap();
		let highlight = selection.clear_selection();
		assert_eq!(selection.selected(), None);
		assert!(!selection.is_editing());
		assert!(!highlight.active);
	}

	#[test]
	fn edit_checks() {
		let config = ConsoleConfig::default();
		let mut selection = SelectionController::new();
		assert_eq!(
			selection.check_edits(&config, &edits(&[("summary", "x")])),
			Err(ConsoleError::NoSelection)
		);
		selection.select_node(&snapshot(), "a").unwrap();
		assert_eq!(
			selection.check_edits(&config, &edits(&[("summary", "x")])),
			Err(ConsoleError::NotEditing)
		);
		selection.toggle_editing().unwrap();
		assert_eq!(selection.check_edits(&config, &edits(&[])), Err(ConsoleError::NoPropertyEdits));
		assert_eq!(
			selection.check_edits(&config, &edits(&[("id", "evil")])),
			Err(ConsoleError::PropertyNotEditable("id".into()))
		);
		assert_eq!(
			selection.check_edits(&config, &edits(&[("summary", "x"), ("text", "y")])),
			Ok("a".to_string())
		);
	}

	#[test]
	fn revalidate_recomputes_or_drops_selection() {
		let mut selection = SelectionController::new();
		selection.select_node(&snapshot(), "a").unwrap();

		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"edges": [{"source": "b", "target": "a", "relation": "NEW"}]
		})));
		let kept = selection.revalidate(store.snapshot());
		assert_eq!(selection.selected(), Some("a"));
		assert_eq!(kept.node_ids.len(), 2);
		assert_eq!(kept.link_keys.len(), 1);
		assert!(kept.link_keys.iter().all(|k| k.relation == "NEW"));

		let dropped = selection.revalidate(&GraphSnapshot::default());
		assert_eq!(selection.selected(), None);
		assert!(!dropped.active);
		assert!(dropped.node_ids.is_empty());
	}
}
