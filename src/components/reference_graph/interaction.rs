//! Pointer and keyboard handling for the graph canvas.
//!
//! Dragging and hovering are tracked separately: a drag owns the node's
//! position and `fixed` flag, hover owns its highlight colour. Both may point
//! at the same node.

use log::{debug, info};

use super::config::GraphConfig;
use super::layout::LayoutEngine;
use super::types::{Nearest, Point};

/// A node being dragged, and where the pointer went down.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
	pub node: String,
	pub origin: Point,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragPhase {
	#[default]
	Idle,
	Dragging(DragSession),
}

pub struct PointerController {
	drag: DragPhase,
	hovered: Option<String>,
	last_pointer: Option<Point>,
	selection: Vec<String>,
	hover_radius: f64,
	highlight: String,
	save_key: String,
	release_mass: f32,
}

impl PointerController {
	pub fn new(config: &GraphConfig) -> Self {
		Self {
			drag: DragPhase::Idle,
			hovered: None,
			last_pointer: None,
			selection: Vec::new(),
			hover_radius: config.hover_radius,
			highlight: config.palette.highlight.clone(),
			save_key: config.save_key.clone(),
			release_mass: config.release_mass,
		}
	}

	/// The node currently being dragged.
	pub fn dragging(&self) -> Option<&str> {
		match &self.drag {
			DragPhase::Idle => None,
			DragPhase::Dragging(session) => Some(session.node.as_str()),
		}
	}

	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Identifiers saved with the save key, oldest first.
	pub fn selection(&self) -> &[String] {
		&self.selection
	}

	fn target<L: LayoutEngine + ?Sized>(&self, layout: &L, at: Point) -> Option<Nearest> {
		layout
			.nearest(at)
			.filter(|hit| hit.distance <= self.hover_radius)
	}

	/// Starts a drag if a node is within reach. Returns `true` when one started.
	pub fn pointer_down<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L, at: Point) -> bool {
		if matches!(self.drag, DragPhase::Dragging(_)) {
			return false;
		}
		self.last_pointer = Some(at);
		let Some(hit) = self.target(layout, at) else {
			return false;
		};
		if !layout.set_fixed(&hit.id, true) {
			return false;
		}
		debug!("drag start on {}", hit.id);
		self.drag = DragPhase::Dragging(DragSession {
			node: hit.id,
			origin: at,
		});
		true
	}

	pub fn pointer_move<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L, at: Point) {
		self.last_pointer = Some(at);
		if let DragPhase::Dragging(session) = &self.drag {
			let sim = layout.to_sim_space(at);
			if !layout.set_position(&session.node, sim) {
				debug!("dragged node {} was pruned, dropping the drag", session.node);
				self.drag = DragPhase::Idle;
			}
		}
		self.update_hover(layout, at);
	}

	fn update_hover<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L, at: Point) {
		let next = self.target(layout, at).map(|hit| hit.id);
		if next != self.hovered {
			self.clear_hover(layout);
		}
		// Re-applied even when the id is unchanged: the node may have been
		// pruned and re-created under the same id since the last move.
		self.hovered = next.filter(|id| layout.set_highlight(id, Some(&self.highlight)));
	}

	fn clear_hover<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L) {
		if let Some(previous) = self.hovered.take() {
			layout.set_highlight(&previous, None);
		}
	}

	/// Ends the drag, if any. Returns the node that was dropped.
	pub fn pointer_up<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L) -> Option<String> {
		let DragPhase::Dragging(session) = std::mem::take(&mut self.drag) else {
			return None;
		};
		if !layout.set_fixed(&session.node, false) {
			return None;
		}
		layout.set_temp_mass(&session.node, self.release_mass);
		let travelled = self
			.last_pointer
			.map_or(0.0, |p| p.distance(session.origin));
		debug!("dropped {} after {travelled:.1}px", session.node);
		Some(session.node)
	}

	/// Pointer left the canvas: release any drag and drop the highlight.
	pub fn pointer_leave<L: LayoutEngine + ?Sized>(&mut self, layout: &mut L) {
		self.pointer_up(layout);
		self.clear_hover(layout);
		self.last_pointer = None;
	}

	/// Saves the node under the last pointer position when `key` is the save key.
	///
	/// `key` is a DOM `KeyboardEvent.key` value and must match the save key
	/// exactly, so named keys such as `Enter` never stand in for a letter.
	///
	/// Returns the identifier if it was newly added to the selection.
	pub fn key_press<L: LayoutEngine + ?Sized>(&mut self, layout: &L, key: &str) -> Option<&str> {
		if key != self.save_key {
			return None;
		}
		let hit = self.target(layout, self.last_pointer?)?;
		if self.selection.contains(&hit.id) {
			return None;
		}
		info!("saved {}", hit.id);
		self.selection.push(hit.id);
		self.selection.last().map(String::as_str)
	}
}
