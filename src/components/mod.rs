//! Views of the console. [`handle::ConsoleHandle`] is the only way they reach console state.

pub mod force_graph;
pub mod handle;
pub mod monitor_panel;
pub mod node_info;
pub mod panels;
pub mod toasts;
