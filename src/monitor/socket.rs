use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use super::channel::{MonitorChannel, MonitorTransport};

/// Channel shared between the UI and the socket callbacks.
pub type SharedChannel = Rc<RefCell<MonitorChannel<WebSocketTransport>>>;
type WeakChannel = Weak<RefCell<MonitorChannel<WebSocketTransport>>>;

struct SocketHandlers {
	_on_open: Closure<dyn FnMut(Event)>,
	_on_message: Closure<dyn FnMut(MessageEvent)>,
	_on_error: Closure<dyn FnMut(Event)>,
	_on_close: Closure<dyn FnMut(CloseEvent)>,
}

/// [`MonitorTransport`] over a browser `WebSocket` and `setTimeout`.
pub struct WebSocketTransport {
	channel: WeakChannel,
	notify: Rc<dyn Fn()>,
	socket: Option<WebSocket>,
	handlers: Option<SocketHandlers>,
}

/// Create the channel and start connecting. `notify` runs after every socket event.
pub fn start(url: String, retry_delay: Duration, notify: impl Fn() + 'static) -> SharedChannel {
	let notify: Rc<dyn Fn()> = Rc::new(notify);
	let channel = Rc::new_cyclic(|weak: &WeakChannel| {
		let transport = WebSocketTransport {
			channel: weak.clone(),
			notify,
			socket: None,
			handlers: None,
		};
		RefCell::new(MonitorChannel::new(transport, url, retry_delay))
	});
	channel.borrow_mut().connect();
	channel
}

fn dispatch(
	channel: &WeakChannel,
	notify: &Rc<dyn Fn()>,
	event: impl FnOnce(&mut MonitorChannel<WebSocketTransport>),
) {
	let Some(channel) = channel.upgrade() else {
		return;
	};
	match channel.try_borrow_mut() {
		Ok(mut channel) => event(&mut channel),
		Err(_) => {
			warn!("monitor event while channel busy, dropped");
			return;
		}
	}
	notify();
}

impl WebSocketTransport {
	fn detach(&mut self) {
		if let Some(socket) = self.socket.take() {
			socket.set_onopen(None);
			socket.set_onmessage(None);
			socket.set_onerror(None);
			socket.set_onclose(None);
		}
		self.handlers = None;
	}

	/// Run `event` on the channel after `delay`, outside the current borrow.
	fn defer(&self, delay: Duration, event: impl FnOnce(&mut MonitorChannel<Self>) + 'static) {
		let (weak, notify) = (self.channel.clone(), self.notify.clone());
		let callback = Closure::once_into_js(move || dispatch(&weak, &notify, event));
		let scheduled = web_sys::window().map(|window| {
			window.set_timeout_with_callback_and_timeout_and_arguments_0(
				callback.unchecked_ref(),
				delay.as_millis() as i32,
			)
		});
		if !matches!(scheduled, Some(Ok(_))) {
			error!("could not schedule monitor timer");
		}
	}
}

impl MonitorTransport for WebSocketTransport {
	fn open(&mut self, url: &str) {
		self.detach();
		let socket = match WebSocket::new(url) {
			Ok(socket) => socket,
			Err(e) => {
				error!("cannot open monitor socket {}: {:?}", url, e);
				self.defer(Duration::ZERO, |channel| channel.handle_close());
				return;
			}
		};

		let (weak, notify) = (self.channel.clone(), self.notify.clone());
		let on_open = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			dispatch(&weak, &notify, |channel| channel.handle_open());
		});
		let (weak, notify) = (self.channel.clone(), self.notify.clone());
		let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			// binary frames are not part of the protocol
			if let Some(text) = ev.data().as_string() {
				dispatch(&weak, &notify, |channel| channel.handle_frame(&text));
			}
		});
		let (weak, notify) = (self.channel.clone(), self.notify.clone());
		let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			dispatch(&weak, &notify, |channel| channel.handle_error());
		});
		let (weak, notify) = (self.channel.clone(), self.notify.clone());
		let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |_: CloseEvent| {
			dispatch(&weak, &notify, |channel| channel.handle_close());
		});

		socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
		socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
		socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
		socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

		self.socket = Some(socket);
		self.handlers = Some(SocketHandlers {
			_on_open: on_open,
			_on_message: on_message,
			_on_error: on_error,
			_on_close: on_close,
		});
	}

	fn close(&mut self) {
		if let Some(socket) = &self.socket {
			let _ = socket.close();
		}
	}

	fn schedule_reconnect(&mut self, delay: Duration) {
		self.defer(delay, |channel| channel.reconnect_due());
	}
}
