use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{CLICK_SLOP, ForceGraphState};
use super::types::CanvasEvent;
use crate::config::{FOCUS_DURATION, FOCUS_ZOOM};
use crate::control::FocusRequest;
use crate::graph::{GraphSnapshot, HighlightSet, NodeId};
use crate::storage::Theme;

type Shared<T> = Rc<RefCell<Option<T>>>;

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

fn local_position(canvas: &NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Force-directed view of a [`GraphSnapshot`].
///
/// The canvas owns layout and camera; everything it shows about selection and
/// highlighting comes in through signals, and clicks go out through `on_event`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<Arc<GraphSnapshot>>,
	#[prop(into)] highlight: Signal<HighlightSet>,
	#[prop(into)] selected: Signal<Option<NodeId>>,
	#[prop(into)] focus: Signal<Option<FocusRequest>>,
	/// Each change of the value frames the whole graph.
	#[prop(into)]
	fit_requests: Signal<u64>,
	#[prop(into)] show_labels: Signal<bool>,
	#[prop(into)] theme: Signal<Theme>,
	#[prop(default = FOCUS_ZOOM)] focus_zoom: f64,
	#[prop(default = FOCUS_DURATION)] focus_duration: Duration,
	on_event: Callback<CanvasEvent>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let tooltip = RwSignal::new(None::<(String, f64, f64)>);
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx,
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			return;
		};

		let mut initial = ForceGraphState::new(&graph.get_untracked(), w, h);
		initial.highlight = highlight.get_untracked();
		initial.selected = selected.get_untracked();
		initial.show_labels = show_labels.get_untracked();
		initial.set_theme(theme.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(window)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_graph = state.clone();
	Effect::new(move |_| {
		let snapshot = graph.get();
		if let Some(ref mut s) = *state_graph.borrow_mut() {
			s.load(&snapshot);
		}
		tooltip.set(None);
	});

	let state_view = state.clone();
	Effect::new(move |_| {
		let (h, sel, labels, scheme) = (
			highlight.get(),
			selected.get(),
			show_labels.get(),
			theme.get(),
		);
		if let Some(ref mut s) = *state_view.borrow_mut() {
			s.highlight = h;
			s.selected = sel;
			s.show_labels = labels;
			s.set_theme(scheme);
		}
	});

	let state_focus = state.clone();
	Effect::new(move |_| {
		let Some(request) = focus.get() else {
			return;
		};
		if let Some(ref mut s) = *state_focus.borrow_mut() {
			s.focus(
				&request.node_id,
				request.seq,
				focus_zoom,
				focus_duration.as_secs_f64(),
			);
		}
	});

	let state_fit = state.clone();
	Effect::new(move |prev: Option<u64>| {
		let requests = fit_requests.get();
		if prev.is_some() {
			if let Some(ref mut s) = *state_fit.borrow_mut() {
				s.fit_view(0.4);
			}
		}
		requests
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(&canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.stop_camera();
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.moved = false;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(&canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_mm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if !s.drag.active {
			let hovered = s.node_at_position(x, y);
			s.set_hover(hovered);
			let label = hovered.and_then(|idx| s.node_info(idx)).map(|info| info.tooltip);
			tooltip.set(label.map(|text| (text, x, y)));
		}

		if s.drag.active {
			s.drag.moved |= (x - s.drag.start_x).hypot(y - s.drag.start_y) > CLICK_SLOP;
			if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
				let (dx, dy) = (
					(x - s.drag.start_x) / s.transform.k,
					(y - s.drag.start_y) / s.transform.k,
				);
				let (nx, ny) = (
					s.drag.node_start_x + dx as f32,
					s.drag.node_start_y + dy as f32,
				);
				s.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.x = nx;
						node.data.y = ny;
						node.data.is_anchor = true;
					}
				});
			}
		} else if s.pan.active {
			s.pan.moved |= (x - s.pan.start_x).hypot(y - s.pan.start_y) > CLICK_SLOP;
			s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
			s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let event = {
			let mut guard = state_mu.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			let event = if s.drag.active && !s.drag.moved {
				s.drag
					.node_idx
					.and_then(|idx| s.node_info(idx))
					.map(|info| CanvasEvent::NodeClick(info.id))
			} else if s.pan.active && !s.pan.moved {
				Some(CanvasEvent::BackgroundClick)
			} else {
				None
			};
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			event
		};
		if let Some(event) = event {
			on_event.run(event);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
		tooltip.set(None);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(&canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.stop_camera();
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<div class="graph-canvas-wrap">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				tooltip
					.get()
					.map(|(text, x, y)| {
						view! {
							<div
								class="graph-tooltip"
								style=format!("left: {}px; top: {}px;", x + 12.0, y + 12.0)
							>
								{text}
							</div>
						}
					})
			}}
		</div>
	}
}
