/// A point in either screen pixels or simulation units, depending on who hands it out.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Directed edge between two document identifiers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeRef {
	pub source: String,
	pub target: String,
}

impl EdgeRef {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// A node as seen by one frame, with its position already mapped to the screen.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
	pub id: &'a str,
	pub point: Point,
	pub highlight: Option<&'a str>,
}

/// An edge as seen by one frame, endpoints in screen space.
#[derive(Clone, Copy, Debug)]
pub struct EdgeView {
	pub from: Point,
	pub to: Point,
	pub weight: Option<f64>,
}

/// Result of a nearest-node query; `distance` is in screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Nearest {
	pub id: String,
	pub distance: f64,
}
