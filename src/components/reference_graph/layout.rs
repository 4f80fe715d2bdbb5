use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};
use log::debug;

use super::config::SimulationConfig;
use super::scale::ScreenMapping;
use super::types::{EdgeRef, EdgeView, Nearest, NodeView, Point};

pub const BASE_MASS: f32 = 10.0;
/// Share of the temporary mass above `BASE_MASS` shed per second.
const MASS_RELAX_RATE: f32 = 1.5;
const SPAWN_SPACING: f64 = 12.0;
const GOLDEN_ANGLE: f64 = PI * 0.763_932_022_500_210_3;

/// The force-directed layout as the controllers see it.
///
/// Mutators return `false` when the node they name is not in the graph, so
/// callers holding an identifier from an earlier event can tell it was pruned.
pub trait LayoutEngine {
	fn configure_screen(&mut self, width: f64, height: f64);
	fn configure_padding(&mut self, padding: f64);
	fn mapping(&self) -> &ScreenMapping;

	fn to_sim_space(&self, screen: Point) -> Point {
		self.mapping().to_sim(screen)
	}

	/// Returns `true` if the node was created.
	fn add_node(&mut self, id: &str) -> bool;
	/// Adds `source -> target`, creating missing endpoints. Returns `true` if the edge is new.
	fn add_edge(&mut self, source: &str, target: &str, weight: Option<f64>) -> bool;
	/// Removes the node and every edge touching it.
	fn remove_node(&mut self, id: &str) -> bool;
	fn edges_from(&self, id: &str) -> Vec<EdgeRef>;
	fn edges_to(&self, id: &str) -> Vec<EdgeRef>;
	/// Closest node to a screen point, if the graph has any node at all.
	fn nearest(&self, screen: Point) -> Option<Nearest>;

	/// Simulation-space position.
	fn position(&self, id: &str) -> Option<Point>;
	fn set_position(&mut self, id: &str, sim: Point) -> bool;
	fn set_fixed(&mut self, id: &str, fixed: bool) -> bool;
	/// Makes the node sluggish: its per-tick movement is scaled by
	/// `BASE_MASS / mass`, and `mass` relaxes back to `BASE_MASS` over later ticks.
	fn set_temp_mass(&mut self, id: &str, mass: f32) -> bool;
	fn set_highlight(&mut self, id: &str, color: Option<&str>) -> bool;

	fn each_node(&self, visit: &mut dyn FnMut(NodeView<'_>));
	fn each_edge(&self, visit: &mut dyn FnMut(EdgeView));
	fn tick(&mut self, dt: f32);
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub highlight: Option<String>,
	/// Inertia on top of the simulation. Kept apart from `NodeData::mass`,
	/// which only scales how hard a node repels its neighbours.
	pub temp_mass: f32,
}

#[derive(Clone, Debug)]
struct DirectedEdge {
	source: String,
	target: String,
	weight: Option<f64>,
}

impl DirectedEdge {
	fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}

	fn to_ref(&self) -> EdgeRef {
		EdgeRef::new(self.source.clone(), self.target.clone())
	}
}

/// [`LayoutEngine`] on top of the `force_graph` simulation.
///
/// `force_graph` stores undirected springs keyed by index; direction, weights
/// and identifiers are tracked here.
pub struct ForceLayout {
	graph: ForceGraph<NodeInfo, ()>,
	mapping: ScreenMapping,
	index: HashMap<String, DefaultNodeIdx>,
	edges: Vec<DirectedEdge>,
	gravity: f32,
	spawned: usize,
}

impl ForceLayout {
	pub fn new(simulation: &SimulationConfig, mapping: ScreenMapping) -> Self {
		Self {
			graph: ForceGraph::new(simulation.into()),
			mapping,
			index: HashMap::new(),
			edges: Vec::new(),
			gravity: simulation.gravity,
			spawned: 0,
		}
	}

	/// Spiral placement around `near` so fresh nodes never start on top of each other.
	fn spawn_point(&mut self, near: Option<Point>) -> Point {
		self.spawned += 1;
		let centre = near.unwrap_or_default();
		let angle = self.spawned as f64 * GOLDEN_ANGLE;
		let radius = SPAWN_SPACING * (self.spawned as f64).sqrt().min(4.0);
		Point::new(centre.x + radius * angle.cos(), centre.y + radius * angle.sin())
	}

	fn insert_node(&mut self, id: &str, near: Option<Point>) -> DefaultNodeIdx {
		if let Some(&idx) = self.index.get(id) {
			return idx;
		}
		let at = self.spawn_point(near);
		let idx = self.graph.add_node(NodeData {
			x: at.x as f32,
			y: at.y as f32,
			mass: BASE_MASS,
			is_anchor: false,
			user_data: NodeInfo {
				id: id.to_owned(),
				highlight: None,
				temp_mass: BASE_MASS,
			},
		});
		self.index.insert(id.to_owned(), idx);
		idx
	}

	/// Runs `update` on the node behind `id`; `false` if there is none.
	fn with_node_mut(&mut self, id: &str, mut update: impl FnMut(&mut NodeData<NodeInfo>)) -> bool {
		let Some(&idx) = self.index.get(id) else {
			return false;
		};
		let mut found = false;
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				update(&mut node.data);
				found = true;
			}
		});
		found
	}

	fn screen_positions(&self) -> HashMap<DefaultNodeIdx, Point> {
		let mut positions = HashMap::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			let sim = Point::new(node.x() as f64, node.y() as f64);
			positions.insert(node.index(), self.mapping.to_screen(sim));
		});
		positions
	}
}

impl LayoutEngine for ForceLayout {
	fn configure_screen(&mut self, width: f64, height: f64) {
		self.mapping.resize(width, height);
	}

	fn configure_padding(&mut self, padding: f64) {
		self.mapping.set_padding(padding);
	}

	fn mapping(&self) -> &ScreenMapping {
		&self.mapping
	}

	fn add_node(&mut self, id: &str) -> bool {
		if self.index.contains_key(id) {
			return false;
		}
		self.insert_node(id, None);
		true
	}

	fn add_edge(&mut self, source: &str, target: &str, weight: Option<f64>) -> bool {
		if source == target {
			debug!("ignoring self-edge on {source}");
			return false;
		}
		if self
			.edges
			.iter()
			.any(|e| e.source == source && e.target == target)
		{
			return false;
		}
		let src = self.insert_node(source, None);
		let near = self.position(source);
		let tgt = self.insert_node(target, near);
		self.graph.add_edge(src, tgt, EdgeData::default());
		self.edges.push(DirectedEdge {
			source: source.to_owned(),
			target: target.to_owned(),
			weight,
		});
		true
	}

	fn remove_node(&mut self, id: &str) -> bool {
		let Some(idx) = self.index.remove(id) else {
			return false;
		};
		self.graph.remove_node(idx);
		self.edges.retain(|e| !e.touches(id));
		true
	}

	fn edges_from(&self, id: &str) -> Vec<EdgeRef> {
		self.edges
			.iter()
			.filter(|e| e.source == id)
			.map(DirectedEdge::to_ref)
			.collect()
	}

	fn edges_to(&self, id: &str) -> Vec<EdgeRef> {
		self.edges
			.iter()
			.filter(|e| e.target == id)
			.map(DirectedEdge::to_ref)
			.collect()
	}

	fn nearest(&self, screen: Point) -> Option<Nearest> {
		let mut best: Option<Nearest> = None;
		self.graph.visit_nodes(|node| {
			let at = self
				.mapping
				.to_screen(Point::new(node.x() as f64, node.y() as f64));
			let distance = at.distance(screen);
			if best.as_ref().is_none_or(|b| distance < b.distance) {
				best = Some(Nearest {
					id: node.data.user_data.id.clone(),
					distance,
				});
			}
		});
		best
	}

	fn position(&self, id: &str) -> Option<Point> {
		let idx = *self.index.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(Point::new(node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	fn set_position(&mut self, id: &str, sim: Point) -> bool {
		self.with_node_mut(id, |data| {
			data.x = sim.x as f32;
			data.y = sim.y as f32;
		})
	}

	fn set_fixed(&mut self, id: &str, fixed: bool) -> bool {
		self.with_node_mut(id, |data| data.is_anchor = fixed)
	}

	fn set_temp_mass(&mut self, id: &str, mass: f32) -> bool {
		self.with_node_mut(id, |data| data.user_data.temp_mass = mass.max(BASE_MASS))
	}

	fn set_highlight(&mut self, id: &str, color: Option<&str>) -> bool {
		self.with_node_mut(id, |data| data.user_data.highlight = color.map(str::to_owned))
	}

	fn each_node(&self, visit: &mut dyn FnMut(NodeView<'_>)) {
		self.graph.visit_nodes(|node| {
			let sim = Point::new(node.x() as f64, node.y() as f64);
			visit(NodeView {
				id: &node.data.user_data.id,
				point: self.mapping.to_screen(sim),
				highlight: node.data.user_data.highlight.as_deref(),
			});
		});
	}

	fn each_edge(&self, visit: &mut dyn FnMut(EdgeView)) {
		let positions = self.screen_positions();
		for edge in &self.edges {
			let endpoints = self
				.index
				.get(&edge.source)
				.zip(self.index.get(&edge.target))
				.and_then(|(s, t)| positions.get(s).zip(positions.get(t)));
			if let Some((&from, &to)) = endpoints {
				visit(EdgeView {
					from,
					to,
					weight: edge.weight,
				});
			}
		}
	}

	fn tick(&mut self, dt: f32) {
		let mut heavy = HashMap::new();
		self.graph.visit_nodes(|node| {
			if node.data.user_data.temp_mass > BASE_MASS {
				heavy.insert(node.index(), (node.data.x, node.data.y));
			}
		});

		self.graph.update(dt);
		let pull = (self.gravity * dt).clamp(0.0, 1.0);
		let relax = (1.0 - MASS_RELAX_RATE * dt).clamp(0.0, 1.0);
		self.graph.visit_nodes_mut(|node| {
			let start = heavy.get(&node.index()).copied();
			let data = &mut node.data;
			if !data.is_anchor {
				data.x -= data.x * pull;
				data.y -= data.y * pull;
			}
			if let Some((x0, y0)) = start {
				let info = &mut data.user_data;
				let inertia = BASE_MASS / info.temp_mass;
				data.x = x0 + (data.x - x0) * inertia;
				data.y = y0 + (data.y - y0) * inertia;
				info.temp_mass = BASE_MASS + (info.temp_mass - BASE_MASS) * relax;
				if info.temp_mass - BASE_MASS < 0.01 {
					info.temp_mass = BASE_MASS;
				}
			}
		});
	}
}

#[cfg(test)]
impl ForceLayout {
	pub(super) fn node_count(&self) -> usize {
		self.index.len()
	}

	pub(super) fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub(super) fn is_fixed(&self, id: &str) -> bool {
		let Some(&idx) = self.index.get(id) else {
			return false;
		};
		let mut fixed = false;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				fixed = node.data.is_anchor;
			}
		});
		fixed
	}

	fn temp_mass(&self, id: &str) -> Option<f32> {
		let idx = *self.index.get(id)?;
		let mut mass = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				mass = Some(node.data.user_data.temp_mass);
			}
		});
		mass
	}
}
