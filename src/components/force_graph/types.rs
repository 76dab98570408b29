use crate::graph::{Node, NodeId};
use crate::storage::Theme;

/// Pointer input the canvas reports to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanvasEvent {
	/// A node was pressed and released without dragging.
	NodeClick(NodeId),
	/// Empty canvas was clicked without panning.
	BackgroundClick,
}

/// Fill colour by type family; matched as a case-insensitive substring.
pub fn node_color(kind: &str) -> &'static str {
	let kind = kind.to_lowercase();
	let has = |needles: &[&str]| needles.iter().any(|n| kind.contains(n));
	if has(&["concept", "memory"]) {
		"#818cf8"
	} else if has(&["action", "event"]) {
		"#34d399"
	} else if has(&["persona", "user"]) {
		"#60a5fa"
	} else if has(&["loc", "place"]) {
		"#f472b6"
	} else if has(&["time", "date"]) {
		"#fcd34d"
	} else {
		"#9ca3af"
	}
}

/// World-space radius; importance defaults to 0.5.
pub fn node_radius(importance: Option<f64>) -> f64 {
	(importance.unwrap_or(0.5) * 5.0).max(0.0).sqrt() * 4.0
}

pub fn tooltip(node: &Node) -> String {
	format!("{} ({})", node.name, node.kind)
}

/// Theme-dependent colours of everything that is not a node fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
	pub background: &'static str,
	/// RGB triple used with varying alpha for links, labels and dimmed nodes.
	pub ink: (u8, u8, u8),
	pub selected: &'static str,
}

impl Palette {
	pub fn for_theme(theme: Theme) -> Self {
		if theme.is_dark() {
			Self {
				background: "#080808",
				ink: (255, 255, 255),
				selected: "#ffffff",
			}
		} else {
			Self {
				background: "#f2f2f2",
				ink: (0, 0, 0),
				selected: "#333333",
			}
		}
	}

	pub fn ink(&self, alpha: f64) -> String {
		let (r, g, b) = self.ink;
		format!("rgba({}, {}, {}, {})", r, g, b, alpha)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn colours_follow_type_family() {
		assert_eq!(node_color("Memory"), "#818cf8");
		assert_eq!(node_color("user_profile"), "#60a5fa");
		assert_eq!(node_color("Location"), "#f472b6");
		assert_eq!(node_color("Entity"), "#9ca3af");
		assert_eq!(node_color(""), "#9ca3af");
	}

	#[test]
	fn radius_grows_with_importance() {
		assert_eq!(node_radius(Some(0.0)), 0.0);
		assert!((node_radius(None) - 2.5f64.sqrt() * 4.0).abs() < 1e-9);
		assert!(node_radius(Some(1.0)) > node_radius(Some(0.2)));
		assert_eq!(node_radius(Some(-1.0)), 0.0);
	}

	#[test]
	fn palette_per_theme() {
		assert_eq!(Palette::for_theme(Theme::Dark).background, "#080808");
		assert_eq!(Palette::for_theme(Theme::Light).ink(0.3), "rgba(0, 0, 0, 0.3)");
	}
}
