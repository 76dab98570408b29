use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::{Palette, node_color, node_radius, tooltip};
use crate::graph::{GraphSnapshot, HighlightSet, LinkKey, NodeId};
use crate::storage::Theme;

/// Minimum pick radius in world space; tiny nodes stay clickable.
pub const HIT_RADIUS: f64 = 6.0;
/// Screen pixels a press may travel before it counts as a drag.
pub const CLICK_SLOP: f64 = 4.0;
const FIT_PADDING: f64 = 40.0;
/// Simulated seconds before the first automatic fit.
const SETTLE_TIME: f64 = 1.2;
const FIT_DURATION: f64 = 0.4;

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: NodeId,
	pub name: String,
	pub tooltip: String,
	pub color: &'static str,
	pub radius: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Camera animation between two transforms.
#[derive(Clone, Debug)]
struct CameraTween {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

fn ease_in_out(t: f64) -> f64 {
	if t < 0.5 {
		2.0 * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
	}
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<DefaultNodeIdx>,
	pub highlight: HighlightSet,
	pub selected: Option<NodeId>,
	pub show_labels: bool,
	pub palette: Palette,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	camera: Option<CameraTween>,
	focus_seq: u64,
	settle: Option<f64>,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx, LinkKey)>,
	index: HashMap<NodeId, DefaultNodeIdx>,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl ForceGraphState {
	pub fn new(snapshot: &GraphSnapshot, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: simulation(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			highlight: HighlightSet::default(),
			selected: None,
			show_labels: true,
			palette: Palette::for_theme(Theme::default()),
			width,
			height,
			flow_time: 0.0,
			camera: None,
			focus_seq: 0,
			settle: None,
			edges: Vec::new(),
			index: HashMap::new(),
		};
		state.load(snapshot);
		state
	}

	/// Rebuild the simulation from a new snapshot and schedule a fit once it settles.
	pub fn load(&mut self, snapshot: &GraphSnapshot) {
		self.graph = simulation();
		self.index.clear();
		self.edges.clear();
		self.hover = None;
		self.drag = DragState::default();

		let count = snapshot.nodes.len().max(1) as f64;
		let spread = 30.0 * count.sqrt();
		for (i, node) in snapshot.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count;
			let idx = self.graph.add_node(NodeData {
				x: (spread * angle.cos()) as f32,
				y: (spread * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id.clone(),
					name: node.name.clone(),
					tooltip: tooltip(node),
					color: node_color(&node.kind),
					radius: node_radius(node.importance),
				},
			});
			self.index.insert(node.id.clone(), idx);
		}

		for link in &snapshot.links {
			if let (Some(&src), Some(&tgt)) =
				(self.index.get(&link.source), self.index.get(&link.target))
			{
				self.graph.add_edge(src, tgt, EdgeData::default());
				self.edges.push((src, tgt, link.key()));
			}
		}
		self.settle = (!snapshot.nodes.is_empty()).then_some(SETTLE_TIME);
	}

	pub fn set_theme(&mut self, theme: Theme) {
		self.palette = Palette::for_theme(theme);
	}

	pub fn edges(&self) -> &[(DefaultNodeIdx, DefaultNodeIdx, LinkKey)] {
		&self.edges
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let reach = node.data.user_data.radius.max(HIT_RADIUS);
			if (dx * dx + dy * dy).sqrt() < reach {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_info(&self, idx: DefaultNodeIdx) -> Option<NodeInfo> {
		let mut info = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				info = Some(node.data.user_data.clone());
			}
		});
		info
	}

	pub fn node_position(&self, id: &str) -> Option<(f64, f64)> {
		let idx = *self.index.get(id)?;
		let mut position = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				position = Some((node.x() as f64, node.y() as f64));
			}
		});
		position
	}

	/// World position and radius of every node, for drawing links.
	pub fn placements(&self) -> HashMap<DefaultNodeIdx, (f64, f64, f64)> {
		let mut placements = HashMap::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			let r = node.data.user_data.radius;
			placements.insert(node.index(), (node.x() as f64, node.y() as f64, r));
		});
		placements
	}

	/// Returns whether the hovered node changed.
	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) -> bool {
		if self.hover == node {
			return false;
		}
		self.hover = node;
		true
	}

	fn animate_to(&mut self, to: ViewTransform, duration: f64) {
		if duration <= 0.0 {
			self.transform = to;
			self.camera = None;
			return;
		}
		self.camera = Some(CameraTween {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration,
		});
	}

	/// Centre `id` at `zoom`. Stale requests (seq not newer than the last one) are ignored.
	pub fn focus(&mut self, id: &str, seq: u64, zoom: f64, duration: f64) -> bool {
		if seq <= self.focus_seq {
			return false;
		}
		let Some((gx, gy)) = self.node_position(id) else {
			return false;
		};
		self.focus_seq = seq;
		self.settle = None;
		let to = ViewTransform {
			x: self.width / 2.0 - gx * zoom,
			y: self.height / 2.0 - gy * zoom,
			k: zoom,
		};
		self.animate_to(to, duration);
		true
	}

	/// Frame every node in the viewport.
	pub fn fit_view(&mut self, duration: f64) {
		let (mut min_x, mut min_y, mut max_x, mut max_y) =
			(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		self.graph.visit_nodes(|node| {
			let r = node.data.user_data.radius;
			let (x, y) = (node.x() as f64, node.y() as f64);
			min_x = min_x.min(x - r);
			min_y = min_y.min(y - r);
			max_x = max_x.max(x + r);
			max_y = max_y.max(y + r);
		});
		if min_x > max_x {
			return;
		}
		let (w, h) = ((max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
		let k = ((self.width - 2.0 * FIT_PADDING) / w)
			.min((self.height - 2.0 * FIT_PADDING) / h)
			.clamp(0.1, 10.0);
		let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
		let to = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		self.animate_to(to, duration);
	}

	/// Any user-driven camera move cancels running animations.
	pub fn stop_camera(&mut self) {
		self.camera = None;
		self.settle = None;
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		if let Some(remaining) = self.settle.as_mut() {
			*remaining -= dt as f64;
			if *remaining <= 0.0 {
				self.settle = None;
				self.fit_view(FIT_DURATION);
			}
		}

		if let Some(tween) = self.camera.as_mut() {
			tween.elapsed += dt as f64;
			let t = ease_in_out((tween.elapsed / tween.duration).min(1.0));
			let lerp = |a: f64, b: f64| a + (b - a) * t;
			self.transform = ViewTransform {
				x: lerp(tween.from.x, tween.to.x),
				y: lerp(tween.from.y, tween.to.y),
				k: lerp(tween.from.k, tween.to.k),
			};
			if tween.elapsed >= tween.duration {
				self.transform = tween.to;
				self.camera = None;
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::GraphDataStore;

	fn state() -> ForceGraphState {
		let mut store = GraphDataStore::new();
		store.replace(Some(&json!({
			"nodes": [{"id": "a", "importance": 1.0, "type": "Entity"}, {"id": "b"}, {"id": "c"}],
			"edges": [{"source": "a", "target": "b", "relation": "KNOWS"}]
		})));
		ForceGraphState::new(store.snapshot(), 800.0, 600.0)
	}

	#[test]
	fn builds_one_edge_per_link() {
		let s = state();
		assert_eq!(s.edges().len(), 1);
		assert_eq!(s.edges()[0].2.relation, "KNOWS");
		assert_eq!(s.placements().len(), 3);
	}

	#[test]
	fn picks_node_under_cursor() {
		let s = state();
		let (gx, gy) = s.node_position("a").unwrap();
		let (sx, sy) = (s.transform.x + gx * s.transform.k, s.transform.y + gy * s.transform.k);
		let idx = s.node_at_position(sx, sy).unwrap();
		let info = s.node_info(idx).unwrap();
		assert_eq!(info.id, "a");
		assert_eq!(info.tooltip, "a (Entity)");
		assert_eq!(s.node_at_position(-5000.0, -5000.0), None);
	}

	#[test]
	fn focus_centres_node_and_ignores_stale_requests() {
		let mut s = state();
		assert!(s.focus("b", 1, 3.0, 0.0));
		let (gx, gy) = s.node_position("b").unwrap();
		assert!((s.transform.x + gx * 3.0 - 400.0).abs() < 1e-6);
		assert!((s.transform.y + gy * 3.0 - 300.0).abs() < 1e-6);
		assert_eq!(s.transform.k, 3.0);

		assert!(!s.focus("c", 1, 3.0, 0.0));
		assert!(!s.focus("missing", 2, 3.0, 0.0));
	}

	#[test]
	fn camera_tween_lands_on_target() {
		let mut s = state();
		s.focus("a", 1, 2.0, 0.5);
		let target = s.camera.as_ref().unwrap().to;
		for _ in 0..40 {
			s.tick(0.016);
		}
		assert!(s.camera.is_none());
		assert_eq!(s.transform, target);
	}

	#[test]
	fn fit_view_keeps_nodes_on_screen() {
		let mut s = state();
		s.fit_view(0.0);
		for (x, y, _) in s.placements().values() {
			let (sx, sy) = (s.transform.x + x * s.transform.k, s.transform.y + y * s.transform.k);
			assert!((0.0..=800.0).contains(&sx));
			assert!((0.0..=600.0).contains(&sy));
		}
	}

	#[test]
	fn empty_snapshot_skips_auto_fit() {
		let s = ForceGraphState::new(&GraphSnapshot::default(), 800.0, 600.0);
		assert!(s.settle.is_none());
		assert!(state().settle.is_some());
	}
}
