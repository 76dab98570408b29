use leptos::prelude::*;

use super::handle::ConsoleHandle;
use crate::monitor::{
	ChannelState, LevelFilter, LogEntry, LogLevel, MessageEntry, TaskEntry,
	time_of_day,
};

const LEVELS: [&str; 6] = ["ALL", "DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Feed {
	#[default]
	Logs,
	Tasks,
	Messages,
}

fn level_class(level: &LogLevel) -> &'static str {
	match level {
		LogLevel::Debug => "log-debug",
		LogLevel::Info => "log-info",
		LogLevel::Warning => "log-warning",
		LogLevel::Error | LogLevel::Critical => "log-error",
		LogLevel::Other(_) => "log-other",
	}
}

/// Live view of the backend status stream.
#[component]
pub fn MonitorPanel() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let feed = RwSignal::new(Feed::Logs);

	// every read tracks the revision the socket bumps on each event
	let logs = move || -> Vec<LogEntry> {
		handle.monitor_revision.track();
		handle
			.monitor()
			.map(|c| c.borrow().visible_logs().to_vec())
			.unwrap_or_default()
	};
	let tasks = move || -> Vec<TaskEntry> {
		handle.monitor_revision.track();
		handle.monitor().map(|c| c.borrow().tasks().to_vec()).unwrap_or_default()
	};
	let messages = move || -> Vec<MessageEntry> {
		handle.monitor_revision.track();
		handle.monitor().map(|c| c.borrow().messages().to_vec()).unwrap_or_default()
	};
	let status = move || {
		handle.monitor_revision.track();
		match handle.monitor().map(|c| c.borrow().state()) {
			Some(ChannelState::Open) => ("online", "Connected"),
			Some(ChannelState::Connecting) => ("pending", "Connecting"),
			_ => ("offline", "Disconnected"),
		}
	};
	let paused = move || {
		handle.monitor_revision.track();
		handle.monitor().is_some_and(|c| c.borrow().is_paused())
	};

	let bump = move || handle.monitor_revision.update(|r| *r += 1);
	let set_filter = move |value: String| {
		let filter = LevelFilter::from_value(&value);
		if let Some(channel) = handle.monitor() {
			channel.borrow_mut().set_filter(filter);
		}
		bump();
	};
	let toggle_pause = move |_| {
		if let Some(channel) = handle.monitor() {
			channel.borrow_mut().toggle_pause();
		}
		bump();
	};
	let clear = move |_| {
		if let Some(channel) = handle.monitor() {
			channel.borrow_mut().clear_logs();
		}
		bump();
	};

	let tab = move |which: Feed, label: &'static str| {
		view! {
			<button
				class=move || if feed.get() == which { "tab active" } else { "tab" }
				on:click=move |_| feed.set(which)
			>
				{label}
			</button>
		}
	};

	view! {
		<div class="monitor-panel">
			<div class="monitor-head">
				<span class=move || format!("status-dot {}", status().0)></span>
				<span>{move || status().1}</span>
				<div class="tabs">
					{tab(Feed::Logs, "Logs")}
					{tab(Feed::Tasks, "Tasks")}
					{tab(Feed::Messages, "Messages")}
				</div>
			</div>
			<Show when=move || feed.get() == Feed::Logs>
				<div class="row">
					<select class="form-input" on:change=move |ev| set_filter(event_target_value(&ev))>
						{LEVELS
							.into_iter()
							.map(|level| view! { <option value=level>{level}</option> })
							.collect_view()}
					</select>
					<button class="btn btn-secondary" on:click=toggle_pause>
						{move || if paused() { "Resume" } else { "Pause" }}
					</button>
					<button class="btn btn-secondary" on:click=clear>
						"Clear"
					</button>
				</div>
			</Show>
			<div class="monitor-feed">
				{move || match feed.get() {
					Feed::Logs => {
						logs()
							.into_iter()
							.rev()
							.map(|entry| {
								view! {
									<div class=format!("log-line {}", level_class(&entry.level))>
										<span class="log-time">{time_of_day(&entry.timestamp)}</span>
										<span class="log-level">{entry.level.to_string()}</span>
										<span class="log-message">{entry.message}</span>
									</div>
								}
							})
							.collect_view()
							.into_any()
					}
					Feed::Tasks => {
						tasks()
							.into_iter()
							.rev()
							.map(|task| {
								view! {
									<div class="task-line">
										<span class="log-time">{time_of_day(&task.timestamp)}</span>
										<span>{task.content}</span>
									</div>
								}
							})
							.collect_view()
							.into_any()
					}
					Feed::Messages => {
						messages()
							.into_iter()
							.rev()
							.map(|message| {
								view! {
									<div class="message-line">
										<span class="log-time">{time_of_day(&message.timestamp)}</span>
										<strong>{message.sender}</strong>
										<span>{message.text}</span>
									</div>
								}
							})
							.collect_view()
							.into_any()
					}
				}}
			</div>
		</div>
	}
}
