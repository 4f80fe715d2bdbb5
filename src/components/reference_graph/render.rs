use std::collections::BTreeSet;

use web_sys::CanvasRenderingContext2d;

use super::config::Palette;
use super::layout::LayoutEngine;
use super::types::Point;

pub const NODE_SIZE: f64 = 4.0;
const EDGE_WIDTH: f64 = 1.0;
const ARROW_LENGTH: f64 = 12.0;
const ARROW_WIDTH: f64 = 2.0;
const ARROW_NOTCH: f64 = 0.8;
const DEFAULT_WEIGHT: f64 = 1.0;

/// The drawing calls a frame needs. Implemented by the browser 2D context.
pub trait Surface {
	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str);
	fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: &str);
	fn fill_polygon(&mut self, points: &[Point], color: &str);
}

impl Surface for CanvasRenderingContext2d {
	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
		self.set_fill_style_str(color);
		CanvasRenderingContext2d::fill_rect(self, x, y, width, height);
	}

	fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: &str) {
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.stroke();
	}

	fn fill_polygon(&mut self, points: &[Point], color: &str) {
		let Some((first, rest)) = points.split_first() else {
			return;
		};
		self.set_fill_style_str(color);
		self.begin_path();
		self.move_to(first.x, first.y);
		for p in rest {
			self.line_to(p.x, p.y);
		}
		self.close_path();
		self.fill();
	}
}

/// Chevron at the head of an edge: tip, one barb, the notch, the other barb.
pub fn arrowhead(tail: Point, head: Point, weight: f64) -> [Point; 4] {
	let angle = (head.y - tail.y).atan2(head.x - tail.x);
	let (sin, cos) = angle.sin_cos();
	let (length, width) = (ARROW_LENGTH + weight, ARROW_WIDTH + weight);
	let local = |lx: f64, ly: f64| Point::new(head.x + lx * cos - ly * sin, head.y + lx * sin + ly * cos);
	[
		head,
		local(-length, width),
		local(-length * ARROW_NOTCH, 0.0),
		local(-length, -width),
	]
}

/// Redraws the whole canvas from the layout's current positions.
///
/// Reads only; calling it twice with the same layout gives the same calls.
pub fn render<L, S>(layout: &L, members: &BTreeSet<String>, palette: &Palette, surface: &mut S)
where
	L: LayoutEngine + ?Sized,
	S: Surface + ?Sized,
{
	let mapping = layout.mapping();
	surface.fill_rect(0.0, 0.0, mapping.width(), mapping.height(), &palette.background);

	layout.each_edge(&mut |edge| {
		surface.stroke_line(edge.from, edge.to, EDGE_WIDTH, &palette.edge);
		// no direction to point along
		if edge.from.distance(edge.to) < 0.001 {
			return;
		}
		let head = arrowhead(edge.from, edge.to, edge.weight.unwrap_or(DEFAULT_WEIGHT));
		surface.fill_polygon(&head, &palette.edge);
	});

	layout.each_node(&mut |node| {
		let color = node.highlight.unwrap_or(if members.contains(node.id) {
			palette.member.as_str()
		} else {
			palette.node.as_str()
		});
		let half = NODE_SIZE / 2.0;
		surface.fill_rect(node.point.x - half, node.point.y - half, NODE_SIZE, NODE_SIZE, color);
	});
}
