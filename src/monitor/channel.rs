use std::time::Duration;

use log::{debug, info, warn};

use super::frame::{LevelFilter, LogEntry, LogLevel, MessageEntry, StreamFrame, TaskEntry};

/// Socket side of the channel. Implementations report back through the
/// `handle_*` methods of [`MonitorChannel`].
pub trait MonitorTransport {
	/// Start connecting to `url`, replacing any previous socket.
	fn open(&mut self, url: &str);
	/// Close the current socket; a close event is expected to follow.
	fn close(&mut self);
	/// Call [`MonitorChannel::reconnect_due`] once after `delay`.
	fn schedule_reconnect(&mut self, delay: Duration);
}

/// Connection state of the monitor stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
	/// Never connected.
	#[default]
	Idle,
	/// Socket created, not open yet.
	Connecting,
	/// Receiving frames.
	Open,
	/// Disconnected with a reconnect pending.
	Closed,
}

/// Append-only list whose visible part can be frozen.
#[derive(Clone, Debug)]
pub struct Feed<T> {
	entries: Vec<T>,
	frozen_at: Option<usize>,
}

impl<T> Default for Feed<T> {
	fn default() -> Self {
		Self {
			entries: Vec::new(),
			frozen_at: None,
		}
	}
}

impl<T> Feed<T> {
	fn push(&mut self, entry: T) {
		self.entries.push(entry);
	}

	fn freeze(&mut self, frozen: bool) {
		self.frozen_at = frozen.then_some(self.entries.len());
	}

	/// Entries up to the freeze point.
	pub fn visible(&self) -> &[T] {
		let end = self.frozen_at.unwrap_or(self.entries.len());
		&self.entries[..end]
	}

	/// Every entry, frozen or not.
	pub fn all(&self) -> &[T] {
		&self.entries
	}
}

/// Live monitor stream: reconnects forever on a fixed delay, caches every log line
/// and projects the cache through the active level filter.
pub struct MonitorChannel<T> {
	transport: T,
	url: String,
	retry_delay: Duration,
	state: ChannelState,
	paused: bool,
	filter: LevelFilter,
	logs: Feed<LogEntry>,
	visible_logs: Vec<LogEntry>,
	tasks: Feed<TaskEntry>,
	messages: Feed<MessageEntry>,
	reconnects: u64,
	revision: u64,
}

impl<T: MonitorTransport> MonitorChannel<T> {
	/// An idle channel; call [`MonitorChannel::connect`] to start.
	pub fn new(transport: T, url: impl Into<String>, retry_delay: Duration) -> Self {
		Self {
			transport,
			url: url.into(),
			retry_delay,
			state: ChannelState::Idle,
			paused: false,
			filter: LevelFilter::All,
			logs: Feed::default(),
			visible_logs: Vec::new(),
			tasks: Feed::default(),
			messages: Feed::default(),
			reconnects: 0,
			revision: 0,
		}
	}

	/// Open the socket unless one is already open or opening.
	pub fn connect(&mut self) {
		if matches!(self.state, ChannelState::Open | ChannelState::Connecting) {
			return;
		}
		info!("monitor connecting to {}", self.url);
		self.state = ChannelState::Connecting;
		self.touch();
		self.transport.open(&self.url);
	}

	/// Socket open event.
	pub fn handle_open(&mut self) {
		info!("monitor connected");
		self.state = ChannelState::Open;
		self.push_log(LogEntry::now(LogLevel::Info, "Monitor service connected."));
	}

	/// Dispatch one text frame; frames that do not parse are dropped.
	pub fn handle_frame(&mut self, text: &str) {
		match StreamFrame::parse(text) {
			Ok(StreamFrame::Log(entry)) => self.push_log(entry),
			Ok(StreamFrame::Task(task)) => {
				self.tasks.push(task);
				self.touch();
			}
			Ok(StreamFrame::Message(message)) => {
				self.messages.push(message);
				self.touch();
			}
			Err(e) => debug!("dropping monitor frame: {}", e),
		}
	}

	/// Socket error: record it and close; the close event schedules the retry.
	pub fn handle_error(&mut self) {
		warn!("monitor connection error");
		self.push_log(LogEntry::now(LogLevel::Error, "Monitor connection error."));
		self.transport.close();
	}

	/// Every close event schedules exactly one reconnect after the fixed delay.
	pub fn handle_close(&mut self) {
		let secs = self.retry_delay.as_secs_f64();
		warn!("monitor disconnected, retrying in {}s", secs);
		self.state = ChannelState::Closed;
		self.push_log(LogEntry::now(
			LogLevel::Warning,
			format!("Monitor service disconnected, retrying in {}s...", secs),
		));
		self.reconnects += 1;
		self.transport.schedule_reconnect(self.retry_delay);
	}

	/// Timer callback of a scheduled reconnect.
	pub fn reconnect_due(&mut self) {
		self.connect();
	}

	/// Change the level filter and rebuild the visible view from the cache.
	pub fn set_filter(&mut self, filter: LevelFilter) {
		self.filter = filter;
		self.rebuild_visible();
	}

	/// Freeze or unfreeze the visible views; entries keep arriving in the cache.
	pub fn set_paused(&mut self, paused: bool) {
		self.paused = paused;
		self.logs.freeze(paused);
		self.tasks.freeze(paused);
		self.messages.freeze(paused);
		self.rebuild_visible();
	}

	/// Flip pause; returns the new flag.
	pub fn toggle_pause(&mut self) -> bool {
		self.set_paused(!self.paused);
		self.paused
	}

	/// Drop every cached log line.
	pub fn clear_logs(&mut self) {
		self.logs = Feed::default();
		self.logs.freeze(self.paused);
		self.visible_logs.clear();
		self.touch();
	}

	/// Current connection state.
	pub fn state(&self) -> ChannelState {
		self.state
	}

	/// Stream URL.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Active level filter.
	pub fn filter(&self) -> &LevelFilter {
		&self.filter
	}

	/// Whether the views are frozen.
	pub fn is_paused(&self) -> bool {
		self.paused
	}

	/// Every log line received, regardless of filter or pause.
	pub fn log_cache(&self) -> &[LogEntry] {
		self.logs.all()
	}

	/// Log lines passing the filter, as of the last unpause.
	pub fn visible_logs(&self) -> &[LogEntry] {
		&self.visible_logs
	}

	/// Visible task events.
	pub fn tasks(&self) -> &[TaskEntry] {
		self.tasks.visible()
	}

	/// Visible chat messages.
	pub fn messages(&self) -> &[MessageEntry] {
		self.messages.visible()
	}

	/// Reconnects scheduled so far.
	pub fn reconnects_scheduled(&self) -> u64 {
		self.reconnects
	}

	/// Bumped on every observable change.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// The socket side.
	pub fn transport(&self) -> &T {
		&self.transport
	}

	fn push_log(&mut self, entry: LogEntry) {
		if !self.paused && self.filter.admits(&entry.level) {
			self.visible_logs.push(entry.clone());
		}
		self.logs.push(entry);
		self.touch();
	}

	fn rebuild_visible(&mut self) {
		let filter = &self.filter;
		self.visible_logs = self
			.logs
			.visible()
			.iter()
			.filter(|entry| filter.admits(&entry.level))
			.cloned()
			.collect();
		self.touch();
	}

	fn touch(&mut self) {
		self.revision += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, PartialEq)]
	enum Call {
		Open(String),
		Close,
		Schedule(Duration),
	}

	#[derive(Default)]
	struct FakeTransport {
		calls: Vec<Call>,
	}

	impl FakeTransport {
		fn scheduled(&self) -> usize {
			self.calls.iter().filter(|c| matches!(c, Call::Schedule(_))).count()
		}

		fn opened(&self) -> usize {
			self.calls.iter().filter(|c| matches!(c, Call::Open(_))).count()
		}
	}

	impl MonitorTransport for FakeTransport {
		fn open(&mut self, url: &str) {
			self.calls.push(Call::Open(url.to_string()));
		}

		fn close(&mut self) {
			self.calls.push(Call::Close);
		}

		fn schedule_reconnect(&mut self, delay: Duration) {
			self.calls.push(Call::Schedule(delay));
		}
	}

	fn channel() -> MonitorChannel<FakeTransport> {
		MonitorChannel::new(
			FakeTransport::default(),
			"ws://localhost/ws/status",
			Duration::from_secs(3),
		)
	}

	fn log_frame(level: &str, message: &str) -> String {
		format!(
			r#"{{"type":"log","payload":{{"level":"{}","message":"{}","timestamp":"2024-05-01T10:00:00Z"}}}}"#,
			level, message
		)
	}

	fn messages(entries: &[LogEntry]) -> Vec<&str> {
		entries.iter().map(|e| e.message.as_str()).collect()
	}

	#[test]
	fn lifecycle_appends_synthetic_entries() {
		let mut channel = channel();
		channel.connect();
		assert_eq!(channel.state(), ChannelState::Connecting);
		channel.connect();
		assert_eq!(channel.transport().opened(), 1);

		channel.handle_open();
		assert_eq!(channel.state(), ChannelState::Open);
		channel.handle_error();
		channel.handle_close();
		assert_eq!(channel.state(), ChannelState::Closed);

		let levels: Vec<LogLevel> = channel.log_cache().iter().map(|e| e.level.clone()).collect();
		assert_eq!(levels, vec![LogLevel::Info, LogLevel::Error, LogLevel::Warning]);
		assert_eq!(
			channel.transport().calls,
			vec![
				Call::Open("ws://localhost/ws/status".into()),
				Call::Close,
				Call::Schedule(Duration::from_secs(3)),
			]
		);
	}

	#[test]
	fn each_close_schedules_exactly_one_reconnect() {
		let mut channel = channel();
		channel.connect();
		for n in 1..=5 {
			channel.handle_close();
			assert_eq!(channel.transport().scheduled(), n);
			channel.reconnect_due();
			assert_eq!(channel.state(), ChannelState::Connecting);
		}
		assert_eq!(channel.reconnects_scheduled(), 5);
		assert_eq!(channel.transport().opened(), 6);
		assert!(channel
			.transport()
			.calls
			.iter()
			.all(|c| !matches!(c, Call::Schedule(d) if *d != Duration::from_secs(3))));
	}

	#[test]
	fn malformed_frames_are_dropped_without_state_change() {
		let mut channel = channel();
		channel.connect();
		channel.handle_open();
		let before = channel.log_cache().len();
		channel.handle_frame("{not json");
		channel.handle_frame(r#"{"type":"unknown","payload":{}}"#);
		assert_eq!(channel.state(), ChannelState::Open);
		assert_eq!(channel.log_cache().len(), before);
		assert_eq!(channel.transport().calls.len(), 1);
	}

	#[test]
	fn frames_dispatch_by_kind() {
		let mut channel = channel();
		channel.handle_frame(&log_frame("INFO", "hello"));
		channel.handle_frame(r#"{"type":"task","payload":{"content":"extract","timestamp":"t"}}"#);
		channel.handle_frame(r#"{"type":"message","payload":{"sender":"amy","text":"hi","timestamp":"t"}}"#);
		assert_eq!(messages(channel.visible_logs()), vec!["hello"]);
		assert_eq!(channel.tasks()[0].content, "extract");
		assert_eq!(channel.revision(), 3);

		channel.handle_frame(r#"{"type":"log","payload":{"message":"bare"}}"#);
		assert_eq!(messages(channel.visible_logs()), vec!["hello", "bare"]);
		channel.set_filter(LevelFilter::from_value("INFO"));
		assert_eq!(messages(channel.visible_logs()), vec!["hello"]);
		assert_eq!(channel.messages()[0].sender, "amy");
	}

	#[test]
	fn filter_round_trip_replays_full_history_in_order() {
		let mut channel = channel();
		for (level, msg) in [("INFO", "one"), ("ERROR", "two"), ("INFO", "three"), ("ERROR", "four")] {
			channel.handle_frame(&log_frame(level, msg));
		}
		let original: Vec<LogEntry> = channel.visible_logs().to_vec();

		channel.set_filter(LevelFilter::from_value("ERROR"));
		assert_eq!(messages(channel.visible_logs()), vec!["two", "four"]);
		channel.handle_frame(&log_frame("INFO", "five"));
		assert_eq!(messages(channel.visible_logs()), vec!["two", "four"]);

		channel.set_filter(LevelFilter::All);
		assert_eq!(&channel.visible_logs()[..4], original.as_slice());
		assert_eq!(
			messages(channel.visible_logs()),
			vec!["one", "two", "three", "four", "five"]
		);
	}

	#[test]
	fn pause_freezes_view_but_keeps_caching() {
		let mut channel = channel();
		channel.handle_frame(&log_frame("INFO", "before"));
		channel.handle_frame(r#"{"type":"task","payload":{"content":"t1"}}"#);
		assert!(channel.toggle_pause());

		channel.handle_frame(&log_frame("INFO", "during"));
		channel.handle_frame(r#"{"type":"task","payload":{"content":"t2"}}"#);
		assert_eq!(messages(channel.visible_logs()), vec!["before"]);
		assert_eq!(channel.log_cache().len(), 2);
		assert_eq!(channel.tasks().len(), 1);

		channel.set_filter(LevelFilter::All);
		assert_eq!(messages(channel.visible_logs()), vec!["before"]);

		assert!(!channel.toggle_pause());
		assert_eq!(messages(channel.visible_logs()), vec!["before", "during"]);
		assert_eq!(channel.tasks().len(), 2);
		assert_eq!(channel.state(), ChannelState::Idle);
	}

	#[test]
	fn clear_empties_cache_and_view() {
		let mut channel = channel();
		channel.handle_frame(&log_frame("INFO", "a"));
		channel.clear_logs();
		assert!(channel.log_cache().is_empty());
		assert!(channel.visible_logs().is_empty());
		channel.handle_frame(&log_frame("INFO", "b"));
		assert_eq!(messages(channel.visible_logs()), vec!["b"]);
	}
}
