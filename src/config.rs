//! Console settings derived from the page origin.

use std::time::Duration;

/// Path of the monitor stream on the serving host.
pub const MONITOR_PATH: &str = "/ws/status";
/// Fixed delay between a monitor disconnect and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Property keys an operator may edit; everything else stays read-only.
pub const EDITABLE_PROPERTIES: &[&str] = &["summary", "type", "text"];
/// Zoom level the camera moves to when a node is focused.
pub const FOCUS_ZOOM: f64 = 3.0;
/// Duration of the camera focus animation.
pub const FOCUS_DURATION: Duration = Duration::from_millis(1000);

/// Runtime configuration for a console instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleConfig {
	/// Absolute origin REST paths are resolved against, e.g. `https://host:8080`.
	pub api_base: String,
	/// Full `ws://` or `wss://` URL of the monitor stream.
	pub monitor_url: String,
	/// Wait between a monitor disconnect and the next attempt.
	pub reconnect_delay: Duration,
	/// Property keys the info panel may edit.
	pub editable_properties: Vec<String>,
	/// Zoom level of a node focus.
	pub focus_zoom: f64,
	/// Length of the focus camera animation.
	pub focus_duration: Duration,
}

impl Default for ConsoleConfig {
	fn default() -> Self {
		Self::for_location("http:", "localhost:8000")
	}
}

impl ConsoleConfig {
	/// Build a config for a page served from `protocol//host`.
	pub fn for_location(protocol: &str, host: &str) -> Self {
		Self {
			api_base: format!("{}//{}", protocol, host),
			monitor_url: monitor_url(protocol, host),
			reconnect_delay: RECONNECT_DELAY,
			editable_properties: EDITABLE_PROPERTIES.iter().map(|k| k.to_string()).collect(),
			focus_zoom: FOCUS_ZOOM,
			focus_duration: FOCUS_DURATION,
		}
	}

	/// Read the current `window.location`, falling back to the defaults off-page.
	pub fn from_window() -> Self {
		let Some(location) = web_sys::window().map(|w| w.location()) else {
			return Self::default();
		};
		match (location.protocol(), location.host()) {
			(Ok(protocol), Ok(host)) => Self::for_location(&protocol, &host),
			_ => Self::default(),
		}
	}

	/// Whether `key` is on the edit allow-list.
	pub fn is_editable(&self, key: &str) -> bool {
		self.editable_properties.iter().any(|k| k == key)
	}
}

/// Monitor URL mirroring the page's transport security.
pub fn monitor_url(protocol: &str, host: &str) -> String {
	let scheme = if protocol == "https:" { "wss:" } else { "ws:" };
	format!("{}//{}{}", scheme, host, MONITOR_PATH)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn secure_page_uses_secure_socket() {
		assert_eq!(
			monitor_url("https:", "graph.example:443"),
			"wss://graph.example:443/ws/status"
		);
		assert_eq!(monitor_url("http:", "127.0.0.1:8000"), "ws://127.0.0.1:8000/ws/status");
	}

	#[test]
	fn allow_list_is_fixed() {
		let config = ConsoleConfig::for_location("http:", "localhost");
		assert!(config.is_editable("summary"));
		assert!(config.is_editable("text"));
		assert!(!config.is_editable("id"));
		assert!(!config.is_editable("created_at"));
		assert_eq!(config.api_base, "http://localhost");
		assert_eq!(config.reconnect_delay, Duration::from_secs(3));
	}
}
