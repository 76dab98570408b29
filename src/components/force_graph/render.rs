use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(state.palette.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.0 / k, 8.0 / k, 4.0 / k, 6.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let placements = state.placements();

	for (src, tgt, key) in state.edges() {
		let (Some(&(x1, y1, r1)), Some(&(x2, y2, r2))) = (placements.get(src), placements.get(tgt))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// highlighted links flow, dimmed ones fade, the rest stay plain
		let highlighted = state.highlight.contains_link(key);
		let (alpha, width) = if highlighted {
			(0.8, line_width * 2.5)
		} else if state.highlight.is_link_dimmed(key) {
			(0.05, line_width)
		} else {
			(0.3, line_width)
		};
		ctx.set_stroke_style_str(&state.palette.ink(alpha));
		ctx.set_line_width(width);
		if highlighted {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow_size), y2 - uy * (r2 + arrow_size));
		ctx.stroke();
		if highlighted {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.set_fill_style_str(&state.palette.ink(alpha));
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let palette = &state.palette;

	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let dimmed = state.highlight.is_node_dimmed(&info.id);
		let selected = state.selected.as_deref() == Some(info.id.as_str());
		let hovered = state.hover == Some(node.index());

		ctx.begin_path();
		let _ = ctx.arc(x, y, info.radius, 0.0, 2.0 * PI);
		if dimmed {
			ctx.set_fill_style_str(&palette.ink(0.05));
		} else {
			ctx.set_fill_style_str(info.color);
		}
		ctx.fill();

		if selected || hovered {
			ctx.set_stroke_style_str(palette.selected);
			ctx.set_line_width((if selected { 2.0 } else { 1.0 }) / k);
			ctx.stroke();
		}

		let emphasised = state.highlight.active && !dimmed;
		if !(state.show_labels || selected || emphasised) {
			return;
		}
		let size = (if selected { 14.0 } else { 10.0 }) / k;
		ctx.set_font(&format!(
			"{}{}px sans-serif",
			if selected { "bold " } else { "" },
			size
		));
		ctx.set_text_align("center");
		ctx.set_text_baseline("top");
		ctx.set_fill_style_str(&palette.ink(if dimmed { 0.2 } else { 0.8 }));
		let _ = ctx.fill_text(&info.name, x, y + info.radius + 2.0 / k);
	});
}
