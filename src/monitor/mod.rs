//! Live status stream of the backend: logs, task events and chat messages.

mod channel;
mod frame;
mod socket;

pub use channel::{ChannelState, MonitorChannel, MonitorTransport};
pub use frame::{LevelFilter, LogEntry, LogLevel, MessageEntry, StreamFrame, TaskEntry, time_of_day};
pub use socket::{SharedChannel, WebSocketTransport, start};
