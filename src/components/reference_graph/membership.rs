//! Keeps the graph in step with the document checklist.
//!
//! A toggle is a [`ToggleRequest`] message. [`Membership::begin`] takes the
//! toggle lock synchronously and hands back a [`PendingToggle`] that keeps it
//! until the toggle has been applied, including the reference fetch for
//! checks. A request arriving in between is refused with [`ToggleError::Busy`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use log::{debug, info, warn};
use thiserror::Error;

use super::layout::LayoutEngine;
use super::source::ReferenceSource;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToggleError {
	#[error("toggle of `{0}` refused: another toggle is still running")]
	Busy(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleRequest {
	pub id: String,
	pub checked: bool,
}

impl ToggleRequest {
	pub fn check(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			checked: true,
		}
	}

	pub fn uncheck(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			checked: false,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
	Checked { id: String, added: usize },
	Unchecked { id: String, pruned: Vec<String> },
}

impl fmt::Display for ToggleOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Checked { id, added } => write!(f, "checked {id}: {added} new edges"),
			Self::Unchecked { id, pruned } if pruned.is_empty() => write!(f, "unchecked {id}"),
			Self::Unchecked { id, pruned } => {
				write!(f, "unchecked {id}, pruned {}", pruned.join(", "))
			}
		}
	}
}

#[derive(Clone, Debug, Default)]
struct ToggleLock(Rc<Cell<bool>>);

impl ToggleLock {
	fn try_acquire(&self) -> Option<ToggleGuard> {
		if self.0.replace(true) {
			return None;
		}
		Some(ToggleGuard(Rc::clone(&self.0)))
	}
}

/// Releases the toggle lock on drop.
#[derive(Debug)]
struct ToggleGuard(Rc<Cell<bool>>);

impl Drop for ToggleGuard {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

#[derive(Debug, Default)]
pub struct Membership {
	checked: BTreeSet<String>,
	lock: ToggleLock,
}

impl Membership {
	pub fn new() -> Self {
		Self::default()
	}

	/// Identifiers of the checked documents, i.e. the pinned roots.
	pub fn checked(&self) -> &BTreeSet<String> {
		&self.checked
	}

	pub fn begin(&self, request: ToggleRequest) -> Result<PendingToggle, ToggleError> {
		match self.lock.try_acquire() {
			Some(guard) => Ok(PendingToggle {
				request,
				_guard: guard,
			}),
			None => {
				warn!("rejecting toggle of {}: busy", request.id);
				Err(ToggleError::Busy(request.id))
			}
		}
	}

	/// Pins `id` and adds `id -> reference` for each reference. Returns the number of new edges.
	pub fn apply_check<L>(&mut self, layout: &mut L, id: &str, references: &[String]) -> usize
	where
		L: LayoutEngine + ?Sized,
	{
		self.checked.insert(id.to_owned());
		layout.add_node(id);
		let mut added = 0;
		for reference in references {
			if reference == id {
				debug!("{id} references itself, skipped");
				continue;
			}
			if layout.add_edge(id, reference, None) {
				added += 1;
			}
		}
		added
	}

	/// Unpins and removes `id`, then prunes former targets left without any edge.
	///
	/// Only direct targets of `id` are examined, and targets that are pinned
	/// themselves are kept. Returns every removed identifier, `id` first.
	pub fn apply_uncheck<L>(&mut self, layout: &mut L, id: &str) -> Vec<String>
	where
		L: LayoutEngine + ?Sized,
	{
		self.checked.remove(id);
		let lost = layout.edges_from(id);
		let mut pruned = Vec::new();
		if layout.remove_node(id) {
			pruned.push(id.to_owned());
		}
		for edge in lost {
			let next = edge.target;
			if self.checked.contains(&next) {
				continue;
			}
			if layout.edges_to(&next).is_empty()
				&& layout.edges_from(&next).is_empty()
				&& layout.remove_node(&next)
			{
				debug!("pruned orphan {next}");
				pruned.push(next);
			}
		}
		pruned
	}
}

/// A toggle that holds the lock. Dropping it without running releases the lock.
#[derive(Debug)]
pub struct PendingToggle {
	request: ToggleRequest,
	_guard: ToggleGuard,
}

impl PendingToggle {
	/// Applies the toggle. Checks fetch the reference list first; a failed
	/// fetch is logged and the document is pinned with no edges.
	pub async fn run<L, S>(
		self,
		membership: &RefCell<Membership>,
		layout: &RefCell<L>,
		source: &S,
	) -> ToggleOutcome
	where
		L: LayoutEngine + ?Sized,
		S: ReferenceSource + ?Sized,
	{
		let ToggleRequest { id, checked } = &self.request;
		let outcome = if *checked {
			let references = match source.references(id).await {
				Ok(references) => references,
				Err(err) => {
					warn!("no references for {id}: {err}");
					Vec::new()
				}
			};
			let added = membership
				.borrow_mut()
				.apply_check(&mut *layout.borrow_mut(), id, &references);
			ToggleOutcome::Checked {
				id: id.clone(),
				added,
			}
		} else {
			let pruned = membership
				.borrow_mut()
				.apply_uncheck(&mut *layout.borrow_mut(), id);
			ToggleOutcome::Unchecked {
				id: id.clone(),
				pruned,
			}
		};
		info!("{outcome}");
		outcome
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::components::reference_graph::config::SimulationConfig;
	use crate::components::reference_graph::layout::ForceLayout;
	use crate::components::reference_graph::scale::ScreenMapping;
	use crate::components::reference_graph::source::ReferenceIndex;
	use crate::components::reference_graph::types::EdgeRef;

	struct Harness {
		membership: RefCell<Membership>,
		layout: RefCell<ForceLayout>,
		index: ReferenceIndex,
	}

	impl Harness {
		fn new(index: ReferenceIndex) -> Self {
			Self {
				membership: RefCell::new(Membership::new()),
				layout: RefCell::new(ForceLayout::new(
					&SimulationConfig::default(),
					ScreenMapping::new(800.0, 600.0, 80.0),
				)),
				index,
			}
		}

		fn toggle(&self, request: ToggleRequest) -> ToggleOutcome {
			let pending = self
				.membership
				.borrow()
				.begin(request)
				.expect("lock is free");
			pollster::block_on(pending.run(&self.membership, &self.layout, &self.index))
		}

		fn check(&self, id: &str) -> ToggleOutcome {
			self.toggle(ToggleRequest::check(id))
		}

		fn uncheck(&self, id: &str) -> ToggleOutcome {
			self.toggle(ToggleRequest::uncheck(id))
		}

		fn nodes(&self) -> BTreeSet<String> {
			let mut ids = BTreeSet::new();
			self.layout
				.borrow()
				.each_node(&mut |node| {
					ids.insert(node.id.to_owned());
				});
			ids
		}

		fn edges(&self) -> BTreeSet<EdgeRef> {
			let layout = self.layout.borrow();
			self.nodes()
				.iter()
				.flat_map(|id| layout.edges_from(id))
				.collect()
		}
	}

	fn ids(list: &[&str]) -> BTreeSet<String> {
		list.iter().map(|s| (*s).to_owned()).collect()
	}

	fn papers() -> ReferenceIndex {
		[
			("A", vec!["B", "C"]),
			("D", vec!["C"]),
			("E", vec![]),
			("F", vec!["F", "G", "G"]),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn checking_adds_one_edge_per_reference() {
		let h = Harness::new(papers());
		assert_eq!(
			h.check("A"),
			ToggleOutcome::Checked {
				id: "A".into(),
				added: 2
			}
		);
		assert_eq!(h.nodes(), ids(&["A", "B", "C"]));
		assert!(h.membership.borrow().checked().contains("A"));
	}

	#[test]
	fn checking_twice_is_idempotent() {
		let h = Harness::new(papers());
		h.check("A");
		let (nodes, edges) = (h.nodes(), h.edges());
		assert_eq!(
			h.check("A"),
			ToggleOutcome::Checked {
				id: "A".into(),
				added: 0
			}
		);
		assert_eq!(h.nodes(), nodes);
		assert_eq!(h.edges(), edges);
	}

	#[test]
	fn check_then_uncheck_restores_graph() {
		let h = Harness::new(papers());
		h.check("D");
		let (nodes, edges) = (h.nodes(), h.edges());
		h.check("A");
		h.uncheck("A");
		// C is still referenced by D, so it stays
		assert_eq!(h.nodes(), nodes);
		assert_eq!(h.edges(), edges);
	}

	#[test]
	fn uncheck_cascades_to_orphaned_targets_only() {
		let h = Harness::new(papers());
		h.check("A");
		h.check("D");
		let outcome = h.uncheck("A");
		assert_eq!(
			outcome,
			ToggleOutcome::Unchecked {
				id: "A".into(),
				pruned: vec!["A".into(), "B".into()]
			}
		);
		assert_eq!(h.nodes(), ids(&["C", "D"]));
		assert_eq!(h.edges(), BTreeSet::from([EdgeRef::new("D", "C")]));
	}

	#[test]
	fn uncheck_keeps_pinned_targets() {
		let index: ReferenceIndex = [("A", vec!["B"]), ("B", vec![])].into_iter().collect();
		let h = Harness::new(index);
		h.check("A");
		h.check("B");
		h.uncheck("A");
		assert_eq!(h.nodes(), ids(&["B"]));
		assert!(h.membership.borrow().checked().contains("B"));
	}

	#[test]
	fn uncheck_prunes_target_left_without_edges() {
		let index: ReferenceIndex = [("A", vec!["B"]), ("B", vec!["C"])].into_iter().collect();
		let h = Harness::new(index);
		h.check("B");
		h.check("A");
		h.uncheck("B");
		// C lost its only edge; A has none left either but is still checked
		assert_eq!(h.nodes(), ids(&["A"]));
	}

	#[test]
	fn unknown_document_is_pinned_without_edges() {
		let h = Harness::new(papers());
		assert_eq!(
			h.check("missing"),
			ToggleOutcome::Checked {
				id: "missing".into(),
				added: 0
			}
		);
		assert_eq!(h.nodes(), ids(&["missing"]));
		h.uncheck("missing");
		assert!(h.nodes().is_empty());
	}

	#[test]
	fn self_and_duplicate_references_collapse() {
		let h = Harness::new(papers());
		h.check("F");
		assert_eq!(h.edges(), BTreeSet::from([EdgeRef::new("F", "G")]));
		h.check("E");
		assert_eq!(h.nodes(), ids(&["E", "F", "G"]));
	}

	#[test]
	fn toggle_while_busy_is_refused() {
		let h = Harness::new(papers());
		let first = h
			.membership
			.borrow()
			.begin(ToggleRequest::uncheck("A"))
			.expect("lock is free");
		let second = h.membership.borrow().begin(ToggleRequest::check("D"));
		assert_eq!(second.unwrap_err(), ToggleError::Busy("D".into()));

		pollster::block_on(first.run(&h.membership, &h.layout, &h.index));
		assert!(h.nodes().is_empty());
		assert_eq!(
			h.check("D"),
			ToggleOutcome::Checked {
				id: "D".into(),
				added: 1
			}
		);
	}

	#[test]
	fn dropping_a_pending_toggle_releases_the_lock() {
		let h = Harness::new(papers());
		let pending = h
			.membership
			.borrow()
			.begin(ToggleRequest::check("A"))
			.expect("lock is free");
		assert!(h.membership.borrow().begin(ToggleRequest::check("D")).is_err());
		drop(pending);
		assert!(h.membership.borrow().begin(ToggleRequest::check("D")).is_ok());
		assert!(h.nodes().is_empty());
	}
}
