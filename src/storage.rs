//! Browser-persisted preferences: theme in local storage, session token per tab.

const THEME_KEY: &str = "theme";
const TOKEN_KEY: &str = "session_token";

/// Colour scheme of the console; dark unless the operator picked light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
	/// Dark background.
	#[default]
	Dark,
	/// Light background.
	Light,
}

impl Theme {
	/// Stored value `light` selects light; anything else (or nothing) is dark.
	pub fn from_stored(value: Option<&str>) -> Self {
		match value {
			Some("light") => Self::Light,
			_ => Self::Dark,
		}
	}

	/// Stored and `data-theme` value.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Dark => "dark",
			Self::Light => "light",
		}
	}

	/// The other theme.
	pub fn toggled(self) -> Self {
		match self {
			Self::Dark => Self::Light,
			Self::Light => Self::Dark,
		}
	}

	/// Whether this is the dark theme.
	pub fn is_dark(&self) -> bool {
		*self == Self::Dark
	}
}

fn local_storage() -> Option<web_sys::Storage> {
	web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn session_storage() -> Option<web_sys::Storage> {
	web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

/// Theme saved in local storage, dark when unset.
pub fn load_theme() -> Theme {
	let stored = local_storage().and_then(|s| s.get_item(THEME_KEY).ok().flatten());
	Theme::from_stored(stored.as_deref())
}

/// Persist `theme` in local storage.
pub fn save_theme(theme: Theme) {
	if let Some(s) = local_storage() {
		let _ = s.set_item(THEME_KEY, theme.as_str());
	}
}

/// Bearer token of this tab, if logged in.
pub fn session_token() -> Option<String> {
	session_storage()
		.and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
		.filter(|t| !t.is_empty())
}

/// Keep `token` for this tab.
pub fn set_session_token(token: &str) {
	if let Some(s) = session_storage() {
		let _ = s.set_item(TOKEN_KEY, token);
	}
}

/// Forget the token.
pub fn clear_session_token() {
	if let Some(s) = session_storage() {
		let _ = s.remove_item(TOKEN_KEY);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absent_theme_means_dark() {
		assert_eq!(Theme::from_stored(None), Theme::Dark);
		assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
		assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
		assert_eq!(Theme::Dark.toggled(), Theme::Light);
	}
}
