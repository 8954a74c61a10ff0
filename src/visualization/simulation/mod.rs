//! Force-directed layout: charge, link springs, collision and centering
//! under a cooling alpha schedule, with pinning and drag.

mod forces;
mod quadtree;

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::geometry::Vector;
use super::model::Graph;
use super::{Result, VisualizationError};
use quadtree::QuadNode;

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_ALPHA_MIN: f64 = 0.05;
pub const DEFAULT_ALPHA_TARGET: f64 = 0.0;
pub const DRAGGING_ALPHA: f64 = 0.8;
pub const DRAGGING_ALPHA_TARGET: f64 = 0.09;
/// Upper bound on ticks run before the first render.
pub const PRECOMPUTED_TICKS: usize = 300;

/// Radius step of the phyllotaxis spiral new nodes are seeded on.
const INITIAL_RADIUS: f64 = 10.0;

/// Decay that takes alpha from 1 to `0.001` in 300 ticks.
pub fn default_alpha_decay() -> f64 {
	1.0 - 0.001_f64.powf(1.0 / 300.0)
}

/// Force constants and the alpha schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
	pub charge_strength: f64,
	/// Added twice to the endpoint radii to get a link's rest length.
	pub link_distance: f64,
	pub collide_padding: f64,
	pub center_strength: f64,
	pub velocity_decay: f64,
	pub alpha: f64,
	pub alpha_min: f64,
	pub alpha_target: f64,
	pub alpha_decay: f64,
	pub dragging_alpha: f64,
	pub dragging_alpha_target: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge_strength: -400.0,
			link_distance: 45.0,
			collide_padding: 25.0,
			center_strength: 0.03,
			velocity_decay: 0.4,
			alpha: DEFAULT_ALPHA,
			alpha_min: DEFAULT_ALPHA_MIN,
			alpha_target: DEFAULT_ALPHA_TARGET,
			alpha_decay: default_alpha_decay(),
			dragging_alpha: DRAGGING_ALPHA,
			dragging_alpha_target: DRAGGING_ALPHA_TARGET,
		}
	}
}

impl SimulationConfig {
	/// Clamps every constant into a usable range; non-finite values take the
	/// default.
	pub fn sanitized(&self) -> Self {
		let defaults = Self::default();
		let clamp = |value: f64, default: f64, min: f64, max: f64| {
			if value.is_finite() { value.clamp(min, max) } else { default }
		};
		Self {
			charge_strength: clamp(self.charge_strength, defaults.charge_strength, -10_000.0, 10_000.0),
			link_distance: clamp(self.link_distance, defaults.link_distance, 0.0, 10_000.0),
			collide_padding: clamp(self.collide_padding, defaults.collide_padding, 0.0, 1_000.0),
			center_strength: clamp(self.center_strength, defaults.center_strength, 0.0, 1.0),
			velocity_decay: clamp(self.velocity_decay, defaults.velocity_decay, 0.0, 1.0),
			alpha: clamp(self.alpha, defaults.alpha, 0.0, 1.0),
			alpha_min: clamp(self.alpha_min, defaults.alpha_min, 1e-6, 1.0),
			alpha_target: clamp(self.alpha_target, defaults.alpha_target, 0.0, 1.0),
			alpha_decay: clamp(self.alpha_decay, defaults.alpha_decay, 1e-6, 1.0),
			dragging_alpha: clamp(self.dragging_alpha, defaults.dragging_alpha, 0.0, 1.0),
			dragging_alpha_target: clamp(
				self.dragging_alpha_target,
				defaults.dragging_alpha_target,
				0.0,
				1.0,
			),
		}
	}
}

/// Cooling force simulation over a [`Graph`]'s node positions.
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	config: SimulationConfig,
	alpha: f64,
	alpha_target: f64,
	center: Vector,
	/// Nodes being dragged, with whether the pointer has moved yet.
	dragging: HashMap<String, bool>,
	ticks: usize,
}

impl Default for ForceSimulation {
	fn default() -> Self {
		Self::new(SimulationConfig::default())
	}
}

impl ForceSimulation {
	pub fn new(config: SimulationConfig) -> Self {
		let config = config.sanitized();
		Self {
			alpha: config.alpha,
			alpha_target: config.alpha_target,
			config,
			center: Vector::ZERO,
			dragging: HashMap::new(),
			ticks: 0,
		}
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn center(&self) -> Vector {
		self.center
	}

	/// Cooled below `alpha_min` with no drag in progress.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.dragging.is_empty()
	}

	pub fn is_dragging(&self) -> bool {
		!self.dragging.is_empty()
	}

	/// Seeds unplaced nodes around `center` (or next to the node they were
	/// expanded from) and restarts the schedule. Placed nodes keep their
	/// positions.
	pub fn initialize(&mut self, graph: &mut Graph, center: Vector) {
		self.center = if center.is_finite() { center } else { Vector::ZERO };
		let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
		let mut seeded = 0_usize;
		for node in graph.nodes_mut().iter_mut().filter(|node| !node.placed) {
			let step = seeded as f64;
			let radius = INITIAL_RADIUS * (0.5 + step).sqrt();
			let origin = match node.seed_near.take() {
				Some(anchor) if anchor.is_finite() => anchor + Vector::from_angle(step * golden_angle) * node.radius(),
				_ => self.center,
			};
			node.position = origin + Vector::from_angle(step * golden_angle) * radius;
			node.velocity = Vector::ZERO;
			node.placed = true;
			seeded += 1;
		}
		if seeded > 0 {
			debug!("seeded {seeded} node positions");
		}
		self.reheat();
	}

	/// Restarts the schedule from full heat.
	pub fn reheat(&mut self) {
		self.alpha = self.config.alpha;
		self.ticks = 0;
	}

	/// Advances one step. Does nothing once settled; returns whether the
	/// simulation is settled after the step.
	pub fn tick(&mut self, graph: &mut Graph) -> bool {
		if self.is_settled() {
			return true;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		self.ticks += 1;

		let padding = self.config.collide_padding;
		let link_distance = self.config.link_distance;
		let center = self.center;

		let nodes = graph.nodes_mut();
		for node in nodes.iter_mut() {
			if !node.position.is_finite() {
				node.position = center;
				node.velocity = Vector::ZERO;
			}
			if !node.velocity.is_finite() {
				node.velocity = Vector::ZERO;
			}
		}
		let positions = nodes.iter().map(|node| node.position).collect::<Vec<_>>();
		let radii = nodes.iter().map(|node| node.radius() + padding).collect::<Vec<_>>();
		let mut velocities = nodes.iter().map(|node| node.velocity).collect::<Vec<_>>();

		let pairs = graph
			.relationships()
			.iter()
			.filter(|rel| !rel.is_loop())
			.map(|rel| {
				let source = &graph.nodes()[rel.source_index()];
				let target = &graph.nodes()[rel.target_index()];
				(
					rel.source_index(),
					rel.target_index(),
					source.radius() + target.radius() + 2.0 * link_distance,
				)
			})
			.collect::<Vec<_>>();
		let springs = forces::links(&pairs, positions.len());

		if let Some(tree) = QuadNode::build(&positions, &radii) {
			forces::apply_charge(&tree, &positions, self.config.charge_strength, self.alpha, &mut velocities);
		}
		forces::apply_links(&springs, &positions, self.alpha, &mut velocities);
		if let Some(tree) = QuadNode::build(&positions, &radii) {
			forces::apply_collide(&tree, &positions, &radii, &mut velocities);
		}
		forces::apply_center(center, self.config.center_strength, self.alpha, &positions, &mut velocities);

		let retain = 1.0 - self.config.velocity_decay;
		for (node, velocity) in graph.nodes_mut().iter_mut().zip(velocities) {
			match node.pin {
				Some(pin) => {
					node.position = pin;
					node.velocity = Vector::ZERO;
				}
				None => {
					node.velocity = velocity * retain;
					node.position += node.velocity;
				}
			}
		}

		let settled = self.is_settled();
		if settled {
			debug!("simulation settled after {} ticks", self.ticks);
		}
		settled
	}

	/// Runs up to `max_ticks` (capped at [`PRECOMPUTED_TICKS`]) without
	/// rendering and returns how many ran.
	pub fn precompute(&mut self, graph: &mut Graph, max_ticks: usize) -> usize {
		let mut ran = 0;
		while ran < max_ticks.min(PRECOMPUTED_TICKS) && !self.is_settled() {
			self.tick(graph);
			ran += 1;
		}
		ran
	}

	/// Holds the node under the pointer and keeps the layout warm while the
	/// drag lasts.
	pub fn start_drag(&mut self, graph: &mut Graph, node_id: &str) -> Result<()> {
		let node = graph
			.find_node_mut(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?;
		node.dragged = true;
		node.pin = Some(node.position);
		self.dragging.insert(node_id.to_owned(), false);
		self.alpha_target = self.config.dragging_alpha_target;
		Ok(())
	}

	/// Moves the pin to the pointer. Only the first move of a drag raises
	/// alpha; later moves just hold the elevated target.
	pub fn set_dragging(&mut self, graph: &mut Graph, node_id: &str, x: f64, y: f64) -> Result<()> {
		let node = graph
			.find_node_mut(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?;
		let pointer = Vector::new(x, y);
		if pointer.is_finite() {
			node.pin = Some(pointer);
		}
		let first_move = match self.dragging.get_mut(node_id) {
			Some(moved) => !std::mem::replace(moved, true),
			None => true,
		};
		if first_move {
			self.alpha = self.alpha.max(self.config.dragging_alpha);
		}
		self.alpha_target = self.config.dragging_alpha_target;
		Ok(())
	}

	/// Releases the node. It stays where it was dropped only if it was
	/// pinned before the drag.
	pub fn end_drag(&mut self, graph: &mut Graph, node_id: &str) -> Result<()> {
		let node = graph
			.find_node_mut(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?;
		node.dragged = false;
		if node.fixed {
			node.pin = Some(node.position);
		} else {
			node.pin = None;
		}
		self.dragging.remove(node_id);
		if self.dragging.is_empty() {
			self.alpha_target = self.config.alpha_target;
		}
		Ok(())
	}

	/// Forgets drags of nodes that no longer exist.
	pub(crate) fn retain_drags(&mut self, graph: &Graph) {
		self.dragging.retain(|id, _| graph.find_node(id).is_some());
		if self.dragging.is_empty() {
			self.alpha_target = self.config.alpha_target;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::visualization::model::{BasicNode, BasicRelationship, GraphData, create_graph};

	fn chain(n: usize) -> Graph {
		let nodes = (0..n).map(|i| BasicNode::new(i.to_string(), &["N"])).collect();
		let relationships = (1..n)
			.map(|i| BasicRelationship::new(format!("r{i}"), (i - 1).to_string(), i.to_string(), "NEXT"))
			.collect();
		create_graph(&GraphData { nodes, relationships }).unwrap()
	}

	#[test]
	fn decay_reaches_a_thousandth_in_300_ticks() {
		let remaining = (1.0 - default_alpha_decay()).powi(300);
		assert!((remaining - 0.001).abs() < 1e-9);
	}

	#[test]
	fn sanitized_replaces_nonsense() {
		let config = SimulationConfig {
			charge_strength: f64::NAN,
			velocity_decay: 7.0,
			alpha_min: -1.0,
			..SimulationConfig::default()
		}
		.sanitized();
		assert_eq!(config.charge_strength, -400.0);
		assert_eq!(config.velocity_decay, 1.0);
		assert!(config.alpha_min > 0.0);
	}

	#[test]
	fn seeding_keeps_placed_nodes() {
		let mut graph = chain(3);
		graph.nodes_mut()[0].position = Vector::new(500.0, 500.0);
		graph.nodes_mut()[0].placed = true;
		let mut simulation = ForceSimulation::default();
		simulation.initialize(&mut graph, Vector::ZERO);
		assert_eq!(graph.nodes()[0].position(), Vector::new(500.0, 500.0));
		assert!(graph.nodes().iter().all(|node| node.is_placed()));
		assert_ne!(graph.nodes()[1].position(), graph.nodes()[2].position());
		assert_eq!(simulation.alpha(), DEFAULT_ALPHA);
	}

	#[test]
	fn settles_and_then_stays_still() {
		let mut graph = chain(12);
		let mut simulation = ForceSimulation::default();
		simulation.initialize(&mut graph, Vector::ZERO);
		let ran = simulation.precompute(&mut graph, PRECOMPUTED_TICKS);
		assert!(ran < PRECOMPUTED_TICKS);
		assert!(simulation.is_settled());
		assert!(simulation.alpha() < DEFAULT_ALPHA_MIN);

		let before = graph.nodes().iter().map(|node| node.position()).collect::<Vec<_>>();
		for _ in 0..10 {
			assert!(simulation.tick(&mut graph));
		}
		for (node, old) in graph.nodes().iter().zip(before) {
			assert!(node.position().distance(old) < 1e-9);
			assert!(node.position().is_finite());
		}
	}

	#[test]
	fn linked_nodes_end_up_near_rest_length() {
		let mut graph = chain(2);
		let mut simulation = ForceSimulation::default();
		simulation.initialize(&mut graph, Vector::ZERO);
		simulation.precompute(&mut graph, PRECOMPUTED_TICKS);
		let distance = graph.nodes()[0].position().distance(graph.nodes()[1].position());
		assert!(distance > 50.0, "nodes collapsed to {distance}");
		assert!(distance < 600.0, "nodes drifted to {distance}");
	}

	#[test]
	fn drag_holds_node_and_keeps_simulation_awake() {
		let mut graph = chain(3);
		let mut simulation = ForceSimulation::default();
		simulation.initialize(&mut graph, Vector::ZERO);
		simulation.precompute(&mut graph, PRECOMPUTED_TICKS);
		assert!(simulation.is_settled());

		simulation.start_drag(&mut graph, "1").unwrap();
		simulation.set_dragging(&mut graph, "1", 400.0, -300.0).unwrap();
		assert!(!simulation.is_settled());
		assert_eq!(simulation.alpha(), DRAGGING_ALPHA);
		for _ in 0..20 {
			simulation.tick(&mut graph);
		}
		assert_eq!(graph.nodes()[1].position(), Vector::new(400.0, -300.0));
		assert_eq!(simulation.alpha_target(), DRAGGING_ALPHA_TARGET);

		let cooled = simulation.alpha();
		assert!(cooled < DRAGGING_ALPHA);
		simulation.set_dragging(&mut graph, "1", 400.0, -300.0).unwrap();
		assert_eq!(simulation.alpha(), cooled);

		simulation.end_drag(&mut graph, "1").unwrap();
		assert_eq!(simulation.alpha_target(), DEFAULT_ALPHA_TARGET);
		assert!(graph.nodes()[1].pin.is_none());
		assert!(simulation.start_drag(&mut graph, "missing").is_err());
	}

	#[test]
	fn non_finite_positions_are_recentred() {
		let mut graph = chain(2);
		let mut simulation = ForceSimulation::default();
		simulation.initialize(&mut graph, Vector::new(10.0, 10.0));
		graph.nodes_mut()[0].position = Vector::new(f64::NAN, 1.0);
		simulation.tick(&mut graph);
		assert!(graph.nodes().iter().all(|node| node.position().is_finite()));
	}
}
