//! Browser console for a graph-memory server: login, graph canvas, editing and the live monitor.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
pub mod api;
mod components;
pub mod config;
pub mod console;
pub mod control;
pub mod error;
pub mod graph;
pub mod monitor;
mod pages;
pub mod storage;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;
use crate::storage::{load_theme, save_theme};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the console and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let theme = RwSignal::new(load_theme());
	provide_context(theme);
	Effect::new(move |_| save_theme(theme.get()));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=move || theme.get().as_str() />

		// sets the document title
		<Title text="Graph Memory Console" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
