use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::Deserialize;

/// Severity of a monitor log line. Unknown server levels are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum LogLevel {
	/// DEBUG
	Debug,
	/// INFO
	Info,
	/// WARNING or WARN
	Warning,
	/// ERROR
	Error,
	/// CRITICAL or FATAL
	Critical,
	/// Any other level, verbatim.
	Other(String),
}

impl From<String> for LogLevel {
	fn from(value: String) -> Self {
		match value.to_ascii_uppercase().as_str() {
			"DEBUG" => Self::Debug,
			"INFO" => Self::Info,
			"WARN" | "WARNING" => Self::Warning,
			"ERROR" => Self::Error,
			"CRITICAL" | "FATAL" => Self::Critical,
			_ => Self::Other(value),
		}
	}
}

/// A frame without a level is kept and only shows under `ALL`.
impl Default for LogLevel {
	fn default() -> Self {
		Self::Other(String::new())
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Debug => f.write_str("DEBUG"),
			Self::Info => f.write_str("INFO"),
			Self::Warning => f.write_str("WARNING"),
			Self::Error => f.write_str("ERROR"),
			Self::Critical => f.write_str("CRITICAL"),
			Self::Other(level) => f.write_str(level),
		}
	}
}

/// Which log levels the visible view shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LevelFilter {
	/// Every level.
	#[default]
	All,
	/// A single level.
	Only(LogLevel),
}

impl LevelFilter {
	/// Selector value; `ALL` (any case) shows everything.
	pub fn from_value(value: &str) -> Self {
		if value.eq_ignore_ascii_case("all") {
			Self::All
		} else {
			Self::Only(LogLevel::from(value.to_string()))
		}
	}

	/// Selector value, the inverse of [`LevelFilter::from_value`].
	pub fn value(&self) -> String {
		match self {
			Self::All => "ALL".to_string(),
			Self::Only(level) => level.to_string(),
		}
	}

	/// Whether lines at `level` are shown.
	pub fn admits(&self, level: &LogLevel) -> bool {
		match self {
			Self::All => true,
			Self::Only(wanted) => wanted == level,
		}
	}
}

/// One log line of the backend.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
	/// Severity; empty when the server sent none.
	#[serde(default)]
	pub level: LogLevel,
	/// Log text.
	#[serde(default)]
	pub message: String,
	/// ISO8601 timestamp as sent by the server.
	#[serde(default)]
	pub timestamp: String,
}

impl LogEntry {
	/// A locally generated entry stamped with the current time.
	pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
		Self {
			level,
			message: message.into(),
			timestamp: Utc::now().to_rfc3339(),
		}
	}
}

/// A background task event.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TaskEntry {
	/// Event description.
	#[serde(default)]
	pub content: String,
	/// ISO8601 timestamp.
	#[serde(default)]
	pub timestamp: String,
}

/// A chat message seen by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageEntry {
	/// Sender display name.
	#[serde(default)]
	pub sender: String,
	/// Message text.
	#[serde(default)]
	pub text: String,
	/// ISO8601 timestamp.
	#[serde(default)]
	pub timestamp: String,
}

/// One inbound frame of the monitor stream: `{"type": ..., "payload": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum StreamFrame {
	/// Log line.
	Log(LogEntry),
	/// Task event.
	Task(TaskEntry),
	/// Chat message.
	Message(MessageEntry),
}

impl StreamFrame {
	/// Decode one text frame.
	pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}
}

/// Local `HH:MM:SS` of an ISO8601 timestamp; the raw text if it does not parse.
pub fn time_of_day(timestamp: &str) -> String {
	DateTime::parse_from_rfc3339(timestamp)
		.map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
		.unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_each_kind() {
		let log = StreamFrame::parse(
			r#"{"type":"log","payload":{"level":"ERROR","message":"boom","timestamp":"2024-05-01T10:00:00Z"}}"#,
		)
		.unwrap();
		assert_eq!(
			log,
			StreamFrame::Log(LogEntry {
				level: LogLevel::Error,
				message: "boom".into(),
				timestamp: "2024-05-01T10:00:00Z".into(),
			})
		);
		assert!(matches!(
			StreamFrame::parse(r#"{"type":"task","payload":{"content":"flush buffer"}}"#),
			Ok(StreamFrame::Task(_))
		));
		assert!(matches!(
			StreamFrame::parse(r#"{"type":"message","payload":{"sender":"bob","text":"hi"}}"#),
			Ok(StreamFrame::Message(_))
		));
	}

	#[test]
	fn rejects_malformed_and_unknown_frames() {
		assert!(StreamFrame::parse("not json").is_err());
		assert!(StreamFrame::parse(r#"{"type":"metrics","payload":{}}"#).is_err());
		assert!(StreamFrame::parse(r#"{"type":"log","payload":"just text"}"#).is_err());
	}

	#[test]
	fn log_without_level_is_kept_for_all() {
		let Ok(StreamFrame::Log(entry)) =
			StreamFrame::parse(r#"{"type":"log","payload":{"message":"no level"}}"#)
		else {
			panic!("log frame without level should parse");
		};
		assert_eq!(entry.level, LogLevel::Other(String::new()));
		assert!(LevelFilter::All.admits(&entry.level));
		assert!(!LevelFilter::from_value("INFO").admits(&entry.level));
	}

	#[test]
	fn unknown_levels_survive() {
		assert_eq!(LogLevel::from("warn".to_string()), LogLevel::Warning);
		assert_eq!(LogLevel::from("TRACE".to_string()), LogLevel::Other("TRACE".into()));
		assert_eq!(LogLevel::Other("TRACE".into()).to_string(), "TRACE");
	}

	#[test]
	fn filter_admits() {
		assert!(LevelFilter::All.admits(&LogLevel::Debug));
		let errors = LevelFilter::from_value("ERROR");
		assert!(errors.admits(&LogLevel::Error));
		assert!(!errors.admits(&LogLevel::Info));
		assert_eq!(LevelFilter::from_value("all"), LevelFilter::All);
		assert_eq!(errors.value(), "ERROR");
	}

	#[test]
	fn unparsable_timestamp_shown_raw() {
		assert_eq!(time_of_day("yesterday"), "yesterday");
		assert_eq!(time_of_day("2024-05-01T10:00:00+00:00").len(), 8);
	}
}
