//! Mapping between screen pixels and simulation space.
//!
//! Simulation space is the square `[-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT]` on
//! both axes. It is stretched onto the canvas minus `padding` pixels on every
//! side, each axis independently, so the two directions are exact inverses.

use super::types::Point;

pub const WORLD_HALF_EXTENT: f64 = 200.0;

/// Smallest drawable span in pixels; keeps the mapping invertible on tiny canvases.
const MIN_SPAN: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ScreenMapping {
	width: f64,
	height: f64,
	padding: f64,
}

impl ScreenMapping {
	pub fn new(width: f64, height: f64, padding: f64) -> Self {
		Self {
			width,
			height,
			padding,
		}
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn set_padding(&mut self, padding: f64) {
		self.padding = padding;
	}

	fn spans(&self) -> (f64, f64) {
		(
			(self.width - 2.0 * self.padding).max(MIN_SPAN),
			(self.height - 2.0 * self.padding).max(MIN_SPAN),
		)
	}

	pub fn to_screen(&self, sim: Point) -> Point {
		let (sx, sy) = self.spans();
		let world = 2.0 * WORLD_HALF_EXTENT;
		Point::new(
			self.padding + (sim.x + WORLD_HALF_EXTENT) / world * sx,
			self.padding + (sim.y + WORLD_HALF_EXTENT) / world * sy,
		)
	}

	pub fn to_sim(&self, screen: Point) -> Point {
		let (sx, sy) = self.spans();
		let world = 2.0 * WORLD_HALF_EXTENT;
		Point::new(
			(screen.x - self.padding) / sx * world - WORLD_HALF_EXTENT,
			(screen.y - self.padding) / sy * world - WORLD_HALF_EXTENT,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const EPS: f64 = 1e-6;

	#[test]
	fn world_corners_land_on_padded_corners() {
		let mapping = ScreenMapping::new(800.0, 600.0, 80.0);
		let top_left = mapping.to_screen(Point::new(-WORLD_HALF_EXTENT, -WORLD_HALF_EXTENT));
		let bottom_right = mapping.to_screen(Point::new(WORLD_HALF_EXTENT, WORLD_HALF_EXTENT));
		assert!((top_left.x - 80.0).abs() < EPS && (top_left.y - 80.0).abs() < EPS);
		assert!((bottom_right.x - 720.0).abs() < EPS && (bottom_right.y - 520.0).abs() < EPS);
	}

	#[test]
	fn origin_maps_to_canvas_centre() {
		let mapping = ScreenMapping::new(1000.0, 400.0, 50.0);
		let centre = mapping.to_screen(Point::default());
		assert!((centre.x - 500.0).abs() < EPS);
		assert!((centre.y - 200.0).abs() < EPS);
	}

	#[test]
	fn padding_wider_than_canvas_stays_invertible() {
		let mapping = ScreenMapping::new(100.0, 100.0, 80.0);
		let p = Point::new(42.0, 17.0);
		let back = mapping.to_screen(mapping.to_sim(p));
		assert!((back.x - p.x).abs() < EPS && (back.y - p.y).abs() < EPS);
	}

	proptest! {
		#[test]
		fn screen_round_trip(
			width in 200.0f64..2500.0,
			height in 200.0f64..2500.0,
			padding in 0.0f64..80.0,
			fx in 0.0f64..=1.0,
			fy in 0.0f64..=1.0,
		) {
			let mapping = ScreenMapping::new(width, height, padding);
			let p = Point::new(fx * width, fy * height);
			let back = mapping.to_screen(mapping.to_sim(p));
			prop_assert!((back.x - p.x).abs() < EPS);
			prop_assert!((back.y - p.y).abs() < EPS);
		}
	}
}
