//! Selection and connect-mode state machines.

mod connect;
mod selection;

pub use connect::{ConnectModeMachine, ConnectState, ConnectStep, EdgeDraft};
pub use selection::{FocusRequest, SelectionController};
