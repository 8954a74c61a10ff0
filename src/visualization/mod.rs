//! Framework-agnostic graph visualization core.
//!
//! [`Visualization`] owns the graph, its style, the force simulation, the
//! layout engine and what was last drawn. Hosts feed it data and pointer
//! input and apply the [`Patch`] lists it hands back; they learn about
//! interaction through [`GraphEvent`] listeners.

mod config;
mod error;
mod events;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod render;
pub mod simulation;
pub mod style;

use log::{debug, info};
use serde::Serialize;

pub use config::VisualizationConfig;
pub use error::{Result, VisualizationError};
pub use events::{EventKind, EventRegistry, GraphEvent, Listener, NodeSnapshot, RelationshipSnapshot};

use geometry::{DEFAULT_CACHE_CAPACITY, TextMeasurer, Vector};
use layout::{LayoutEngine, size_nodes};
use model::{
	BasicRelationship, Graph, GraphData, GraphStats, MergeOutcome, Property, apply_display_limit,
	create_graph,
};
use render::{
	Patch, RenderState, Scene, UpdateScope, Viewport, ZoomLimits, bounding_box, reconcile, render_svg,
};
use simulation::{ForceSimulation, PRECOMPUTED_TICKS};
use style::{ColorSet, GraphStyle, Selector};

/// Size a viewport starts with before the host reports its own.
const DEFAULT_VIEW_WIDTH: f64 = 800.0;
const DEFAULT_VIEW_HEIGHT: f64 = 600.0;

/// What an [`update`](Visualization::update) should touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOptions {
	/// Restyle, resize and diff the nodes.
	pub update_nodes: bool,
	/// Lay out and diff the relationships.
	pub update_relationships: bool,
	/// Seed new nodes and reheat the simulation.
	pub restart_simulation: bool,
}

impl UpdateOptions {
	pub const ALL: Self = Self {
		update_nodes: true,
		update_relationships: true,
		restart_simulation: true,
	};

	fn scope(self) -> UpdateScope {
		UpdateScope {
			nodes: self.update_nodes,
			relationships: self.update_relationships,
		}
	}
}

/// Result of one animation frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutcome {
	pub patches: Vec<Patch>,
	/// The simulation has cooled down; no further frames are needed until
	/// something reheats it.
	pub settled: bool,
}

/// Result of merging a neighbour expansion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expansion {
	pub added: MergeOutcome,
	/// The fetched neighbourhood reached `maxNeighbours`, so some neighbours
	/// were probably left out by the query.
	pub neighbour_limit_hit: bool,
	pub patches: Vec<Patch>,
}

/// One label or relationship type in the legend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
	pub name: String,
	pub count: usize,
	pub colors: ColorSet<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
	pub stats: GraphStats,
	pub labels: Vec<LegendEntry>,
	pub relationship_types: Vec<LegendEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InspectorKind {
	Node,
	Relationship,
}

/// The selected element as shown by an inspector panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorItem {
	pub kind: InspectorKind,
	pub id: String,
	/// Node labels, or the relationship type alone.
	pub labels: Vec<String>,
	/// Sorted by key.
	pub properties: Vec<Property>,
}

/// The visualization controller. Every operation runs to completion before
/// the next starts; one [`tick`](Self::tick) is one simulation step plus its
/// render.
pub struct Visualization {
	config: VisualizationConfig,
	graph: Graph,
	style: GraphStyle,
	simulation: ForceSimulation,
	layout: LayoutEngine,
	render_state: RenderState,
	viewport: Viewport,
	events: EventRegistry,
	node_limit_hit: bool,
	hovered_node: Option<String>,
	hovered_relationship: Option<String>,
}

impl Visualization {
	pub fn new(config: VisualizationConfig, mut style: GraphStyle) -> Self {
		style.set_use_generated_default_colors(config.use_generated_default_colors);
		let mut viewport = Viewport::new(DEFAULT_VIEW_WIDTH, DEFAULT_VIEW_HEIGHT);
		viewport.is_fullscreen = config.is_fullscreen;
		Self {
			simulation: ForceSimulation::new(config.simulation.clone()),
			config,
			graph: Graph::default(),
			style,
			layout: LayoutEngine::default(),
			render_state: RenderState::default(),
			viewport,
			events: EventRegistry::default(),
			node_limit_hit: false,
			hovered_node: None,
			hovered_relationship: None,
		}
	}

	/// Swaps the caption measurer, e.g. for one backed by a canvas.
	pub fn with_text_measurer(mut self, measurer: Box<dyn TextMeasurer>) -> Self {
		self.layout = LayoutEngine::new(measurer, DEFAULT_CACHE_CAPACITY);
		self
	}

	pub fn config(&self) -> &VisualizationConfig {
		&self.config
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn style(&self) -> &GraphStyle {
		&self.style
	}

	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn simulation(&self) -> &ForceSimulation {
		&self.simulation
	}

	pub fn render_state(&self) -> &RenderState {
		&self.render_state
	}

	/// Whether the last [`set_graph`](Self::set_graph) cut nodes off at
	/// `initialNodeDisplay`.
	pub fn node_limit_hit(&self) -> bool {
		self.node_limit_hit
	}

	pub fn is_settled(&self) -> bool {
		self.simulation.is_settled()
	}

	pub fn on(&mut self, kind: EventKind, callback: impl Fn(&GraphEvent) + 'static) {
		self.events.on(kind, callback);
	}

	/// Replaces the graph. Nodes that survive keep their positions; new
	/// ones are laid out before the first frame is drawn.
	pub fn set_graph(&mut self, data: &GraphData) -> Result<Vec<Patch>> {
		let (limited, limit_hit) = apply_display_limit(data, self.config.initial_node_display);
		let mut graph = create_graph(&limited)?;
		graph.adopt_layout(&self.graph);
		if limit_hit {
			info!(
				"showing {} of {} nodes",
				limited.nodes.len(),
				data.nodes.len()
			);
		}
		self.graph = graph;
		self.node_limit_hit = limit_hit;
		self.hovered_node = None;
		self.hovered_relationship = None;
		self.simulation.retain_drags(&self.graph);

		self.restyle();
		self.simulation.initialize(&mut self.graph, Vector::ZERO);
		let ticks = self.simulation.precompute(&mut self.graph, PRECOMPUTED_TICKS);
		debug!("precomputed {ticks} ticks for {} nodes", self.graph.node_count());
		self.layout.layout_relationships(&mut self.graph, &self.style);
		if self.config.initial_zoom_to_fit {
			self.zoom_to_fit();
		}

		let patches = self.render(UpdateScope::ALL);
		self.graph_changed();
		Ok(patches)
	}

	/// Adds the neighbourhood fetched for `node_id`, seeding new nodes next
	/// to it.
	pub fn merge_neighbours(&mut self, node_id: &str, data: &GraphData) -> Result<Expansion> {
		let added = self.graph.expand(node_id, data)?;
		let neighbours = data.nodes.iter().filter(|node| node.id != node_id).count();
		let neighbour_limit_hit = neighbours >= self.config.max_neighbours;
		if neighbour_limit_hit {
			info!("neighbour limit of {} reached for {node_id}", self.config.max_neighbours);
		}
		let patches = self.update(UpdateOptions::ALL);
		self.graph_changed();
		Ok(Expansion {
			added,
			neighbour_limit_hit,
			patches,
		})
	}

	/// Adds relationships between nodes already drawn. Does nothing when
	/// auto-completion is off.
	pub fn add_autocompleted(&mut self, relationships: &[BasicRelationship]) -> Result<Vec<Patch>> {
		if !self.config.autocomplete_relationships {
			return Ok(Vec::new());
		}
		let outcome = self.graph.merge_autocompleted(relationships)?;
		if outcome.is_empty() {
			return Ok(Vec::new());
		}
		let patches = self.update(UpdateOptions::ALL);
		self.graph_changed();
		Ok(patches)
	}

	/// Takes away what expanding `node_id` added.
	pub fn collapse(&mut self, node_id: &str) -> Result<Vec<Patch>> {
		let removed = self.graph.collapse(node_id)?;
		debug!("collapsed {} nodes into {node_id}", removed.len());
		Ok(self.after_removal())
	}

	pub fn remove_node(&mut self, node_id: &str) -> Result<Vec<Patch>> {
		self.graph.remove_node(node_id)?;
		Ok(self.after_removal())
	}

	/// Removes everything. The returned patches empty the drawing.
	pub fn clear(&mut self) -> Vec<Patch> {
		self.graph.clear();
		self.node_limit_hit = false;
		self.after_removal()
	}

	/// Re-diffs the collections named by `options`.
	pub fn update(&mut self, options: UpdateOptions) -> Vec<Patch> {
		if options.update_nodes {
			self.restyle();
		}
		if options.restart_simulation {
			let center = self.simulation.center();
			self.simulation.initialize(&mut self.graph, center);
		}
		if options.update_relationships {
			self.layout.layout_relationships(&mut self.graph, &self.style);
		}
		self.render(options.scope())
	}

	/// One animation frame: a simulation step and the patches for what moved.
	pub fn tick(&mut self) -> FrameOutcome {
		if self.simulation.is_settled() {
			return FrameOutcome {
				patches: Vec::new(),
				settled: true,
			};
		}
		let settled = self.simulation.tick(&mut self.graph);
		self.layout.layout_relationships(&mut self.graph, &self.style);
		FrameOutcome {
			patches: self.render(UpdateScope::ALL),
			settled,
		}
	}

	pub fn resize(&mut self, is_fullscreen: bool, width: f64, height: f64) {
		self.config.is_fullscreen = is_fullscreen;
		self.viewport.resize(is_fullscreen, width, height);
	}

	pub fn zoom_in(&mut self) -> ZoomLimits {
		let limits = self.viewport.zoom_in();
		self.report_limits(limits)
	}

	pub fn zoom_out(&mut self) -> ZoomLimits {
		let limits = self.viewport.zoom_out();
		self.report_limits(limits)
	}

	/// Fits the drawn graph into the view. An empty graph leaves the view
	/// alone.
	pub fn zoom_to_fit(&mut self) -> ZoomLimits {
		let scene = Scene::build(&self.graph, &self.style);
		match bounding_box(&scene) {
			Some(bounds) => {
				let limits = self.viewport.zoom_to_fit(bounds);
				self.report_limits(limits)
			}
			None => self.viewport.limits(),
		}
	}

	/// Handles a wheel event at `pointer` (screen space). Returns whether
	/// the event zoomed, so the host knows whether to let the page scroll.
	pub fn wheel(&mut self, pointer: Vector, delta: f64, modifier: bool) -> bool {
		if self.config.wheel_zoom_requires_mod_key && !modifier {
			self.events.emit(&GraphEvent::WheelZoomBlocked);
			return false;
		}
		let limits = self.viewport.wheel(pointer, delta);
		self.report_limits(limits);
		true
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.viewport.pan_by(dx, dy);
	}

	/// Topmost visible node under a screen point.
	pub fn node_at(&self, screen: Vector) -> Option<&str> {
		let world = self.viewport.screen_to_world(screen);
		self.graph
			.nodes()
			.iter()
			.rev()
			.filter(|node| node.visible)
			.find(|node| node.position().distance(world) <= node.radius())
			.map(|node| node.id())
	}

	/// Moves the hover to `node_id` (or nowhere), highlighting its
	/// neighbours and the relationships between them.
	pub fn hover_node(&mut self, node_id: Option<&str>) -> Result<Vec<Patch>> {
		if self.hovered_node.as_deref() == node_id {
			return Ok(Vec::new());
		}
		if let Some(id) = node_id {
			if self.graph.find_node(id).is_none() {
				return Err(VisualizationError::UnknownNode(id.to_owned()));
			}
		}
		if let Some(previous) = self.hovered_node.take() {
			if let Some(node) = self.graph.find_node(&previous) {
				self.events.emit(&GraphEvent::NodeMouseOut(node.into()));
			}
		}

		let neighbours = node_id
			.map(|id| self.graph.neighbour_ids(id))
			.unwrap_or_default();
		for node in self.graph.nodes_mut() {
			node.hovered = Some(node.id()) == node_id;
			node.highlighted = neighbours.iter().any(|id| id == node.id());
		}
		for rel in self.graph.relationships_mut() {
			rel.highlighted = node_id.is_some_and(|id| rel.touches(id));
		}

		if let Some(id) = node_id {
			self.hovered_node = Some(id.to_owned());
			if let Some(node) = self.graph.find_node(id) {
				self.events.emit(&GraphEvent::NodeMouseOver(node.into()));
			}
		}
		Ok(self.render(UpdateScope::ALL))
	}

	pub fn hover_relationship(&mut self, relationship_id: Option<&str>) -> Result<Vec<Patch>> {
		if self.hovered_relationship.as_deref() == relationship_id {
			return Ok(Vec::new());
		}
		if let Some(id) = relationship_id {
			if self.graph.find_relationship(id).is_none() {
				return Err(VisualizationError::UnknownRelationship(id.to_owned()));
			}
		}
		if let Some(previous) = self.hovered_relationship.take() {
			if let Some(rel) = self.graph.find_relationship(&previous) {
				self.events.emit(&GraphEvent::RelationshipMouseOut(rel.into()));
			}
		}
		for rel in self.graph.relationships_mut() {
			rel.hovered = Some(rel.id()) == relationship_id;
		}
		if let Some(id) = relationship_id {
			self.hovered_relationship = Some(id.to_owned());
			if let Some(rel) = self.graph.find_relationship(id) {
				self.events.emit(&GraphEvent::RelationshipMouseOver(rel.into()));
			}
		}
		Ok(self.render(UpdateScope {
			nodes: false,
			relationships: true,
		}))
	}

	/// Selects a node, or deselects it when it already was.
	pub fn click_node(&mut self, node_id: &str) -> Result<Vec<Patch>> {
		let was_selected = self
			.graph
			.find_node(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?
			.selected;
		self.deselect_all();
		if let Some(node) = self.graph.find_node_mut(node_id) {
			node.selected = !was_selected;
		}
		if let Some(node) = self.graph.find_node(node_id) {
			self.events.emit(&GraphEvent::NodeClicked(node.into()));
		}
		Ok(self.render(UpdateScope::ALL))
	}

	/// Collapses an expanded node. For any other node only the event goes
	/// out; the host fetches the neighbours and calls
	/// [`merge_neighbours`](Self::merge_neighbours).
	pub fn double_click_node(&mut self, node_id: &str) -> Result<Vec<Patch>> {
		let node = self
			.graph
			.find_node(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?;
		let expanded = node.expanded;
		self.events.emit(&GraphEvent::NodeDoubleClicked(node.into()));
		if expanded {
			self.collapse(node_id)
		} else {
			Ok(Vec::new())
		}
	}

	pub fn click_relationship(&mut self, relationship_id: &str) -> Result<Vec<Patch>> {
		let was_selected = self
			.graph
			.find_relationship(relationship_id)
			.ok_or_else(|| VisualizationError::UnknownRelationship(relationship_id.to_owned()))?
			.selected;
		self.deselect_all();
		if let Some(rel) = self.graph.find_relationship_mut(relationship_id) {
			rel.selected = !was_selected;
		}
		if let Some(rel) = self.graph.find_relationship(relationship_id) {
			self.events.emit(&GraphEvent::RelationshipClicked(rel.into()));
		}
		Ok(self.render(UpdateScope::ALL))
	}

	/// Clears the selection.
	pub fn click_canvas(&mut self) -> Vec<Patch> {
		self.deselect_all();
		self.events.emit(&GraphEvent::CanvasClicked);
		self.render(UpdateScope::ALL)
	}

	pub fn start_drag(&mut self, node_id: &str) -> Result<()> {
		self.simulation.start_drag(&mut self.graph, node_id)?;
		if let Some(node) = self.graph.find_node(node_id) {
			self.events.emit(&GraphEvent::NodeDragStart(node.into()));
		}
		Ok(())
	}

	/// Holds the dragged node under `screen`. The next frames move it.
	pub fn drag_to(&mut self, node_id: &str, screen: Vector) -> Result<()> {
		let world = self.viewport.screen_to_world(screen);
		self.simulation.set_dragging(&mut self.graph, node_id, world.x, world.y)
	}

	pub fn end_drag(&mut self, node_id: &str) -> Result<()> {
		self.simulation.end_drag(&mut self.graph, node_id)?;
		if let Some(node) = self.graph.find_node(node_id) {
			self.events.emit(&GraphEvent::NodeDragEnd(node.into()));
		}
		Ok(())
	}

	/// Labels and relationship types with their counts and colours.
	pub fn legend(&self) -> Legend {
		let stats = self.graph.stats();
		let labels = stats
			.labels
			.iter()
			.map(|(label, entry)| {
				let element = self.style.for_selector(&Selector::node(std::slice::from_ref(label)));
				LegendEntry {
					name: label.clone(),
					count: entry.count,
					colors: ColorSet {
						color: element.get_or("color", "#A5ABB6").to_owned(),
						border_color: element.get_or("border-color", "#9AA1AC").to_owned(),
						text_color_internal: element.get_or("text-color-internal", "#FFFFFF").to_owned(),
					},
				}
			})
			.collect();
		let relationship_types = stats
			.relationship_types
			.iter()
			.map(|(rel_type, entry)| {
				let element = self.style.for_selector(&Selector::relationship(rel_type));
				let color = element.get_or("color", "#A5ABB6").to_owned();
				LegendEntry {
					name: rel_type.clone(),
					count: entry.count,
					colors: ColorSet {
						border_color: color.clone(),
						color,
						text_color_internal: element.get_or("text-color-internal", "#FFFFFF").to_owned(),
					},
				}
			})
			.collect();
		Legend {
			stats,
			labels,
			relationship_types,
		}
	}

	/// The selected node or relationship, if any.
	pub fn inspect_selected(&self) -> Option<InspectorItem> {
		let sorted = |properties: &[Property]| {
			let mut properties = properties.to_vec();
			properties.sort_by(|a, b| a.key.cmp(&b.key));
			properties
		};
		if let Some(node) = self.graph.nodes().iter().find(|node| node.selected) {
			return Some(InspectorItem {
				kind: InspectorKind::Node,
				id: node.id().to_owned(),
				labels: node.labels.clone(),
				properties: sorted(&node.properties),
			});
		}
		self.graph
			.relationships()
			.iter()
			.find(|rel| rel.selected)
			.map(|rel| InspectorItem {
				kind: InspectorKind::Relationship,
				id: rel.id().to_owned(),
				labels: vec![rel.rel_type.clone()],
				properties: sorted(&rel.properties),
			})
	}

	/// The style sheet as grass text.
	pub fn grass(&self) -> String {
		self.style.grass()
	}

	/// Replaces the style sheet and redraws. `None` when the text parsed
	/// neither as grass nor as JSON; the old style stays in place.
	pub fn set_grass(&mut self, text: &str) -> Option<Vec<Patch>> {
		if !self.style.set_grass(text) {
			return None;
		}
		Some(self.restyled())
	}

	/// Overrides properties for one selector and redraws.
	pub fn change_style(&mut self, selector: &Selector, props: &[(&str, &str)]) -> Vec<Patch> {
		self.style.change_for_selector(selector, props);
		self.restyled()
	}

	/// Standalone SVG of what is currently drawn.
	pub fn svg(&self) -> String {
		render_svg(&self.render_state, &self.viewport, &self.style)
	}

	fn restyled(&mut self) -> Vec<Patch> {
		self.update(UpdateOptions {
			update_nodes: true,
			update_relationships: true,
			restart_simulation: false,
		})
	}

	fn restyle(&mut self) {
		self.style.apply_default_node_styling(&self.graph);
		size_nodes(&mut self.graph, &self.style);
		self.layout.format_node_captions(&mut self.graph, &self.style);
	}

	fn render(&mut self, scope: UpdateScope) -> Vec<Patch> {
		let scene = Scene::build(&self.graph, &self.style);
		let patches = reconcile(&self.render_state, &scene, scope);
		self.render_state.apply(&patches);
		patches
	}

	fn after_removal(&mut self) -> Vec<Patch> {
		self.simulation.retain_drags(&self.graph);
		if self
			.hovered_node
			.as_deref()
			.is_some_and(|id| self.graph.find_node(id).is_none())
		{
			self.hovered_node = None;
			for node in self.graph.nodes_mut() {
				node.hovered = false;
				node.highlighted = false;
			}
			for rel in self.graph.relationships_mut() {
				rel.highlighted = false;
			}
		}
		if self
			.hovered_relationship
			.as_deref()
			.is_some_and(|id| self.graph.find_relationship(id).is_none())
		{
			self.hovered_relationship = None;
		}
		let patches = self.update(UpdateOptions::ALL);
		self.graph_changed();
		patches
	}

	fn deselect_all(&mut self) {
		for node in self.graph.nodes_mut() {
			node.selected = false;
		}
		for rel in self.graph.relationships_mut() {
			rel.selected = false;
		}
	}

	fn report_limits(&self, limits: ZoomLimits) -> ZoomLimits {
		if limits.any() {
			self.events.emit(&GraphEvent::ZoomLimitReached(limits));
		}
		limits
	}

	fn graph_changed(&self) {
		self.events.emit(&GraphEvent::GraphUpdated {
			nodes: self.graph.node_count(),
			relationships: self.graph.relationship_count(),
		});
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use model::BasicNode;

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![
				BasicNode::new("a", &["Person"]).with_property("name", "Ada"),
				BasicNode::new("b", &["Person"]).with_property("name", "Bob"),
				BasicNode::new("c", &["Movie"]).with_property("title", "Heat"),
			],
			relationships: vec![
				BasicRelationship::new("r1", "a", "b", "KNOWS"),
				BasicRelationship::new("r2", "a", "c", "ACTED_IN"),
			],
		}
	}

	fn visualization() -> Visualization {
		Visualization::new(VisualizationConfig::default(), GraphStyle::default())
	}

	#[test]
	fn set_graph_draws_everything_and_settles() {
		let mut vis = visualization();
		let patches = vis.set_graph(&sample()).unwrap();
		assert_eq!(
			patches
				.iter()
				.filter(|patch| matches!(patch, Patch::AddNode(_)))
				.count(),
			3
		);
		assert_eq!(vis.render_state().relationships().len(), 2);
		assert!(vis.is_settled());
		assert!(vis.tick().patches.is_empty());
	}

	#[test]
	fn hovering_highlights_neighbours() {
		let mut vis = visualization();
		vis.set_graph(&sample()).unwrap();
		vis.hover_node(Some("b")).unwrap();
		let state = vis.render_state();
		assert!(state.node("b").is_some_and(|view| view.hovered));
		assert!(state.node("a").is_some_and(|view| view.highlighted));
		assert!(state.node("c").is_some_and(|view| !view.highlighted));
		assert!(state.relationship("r1").is_some_and(|view| view.highlighted));

		vis.hover_node(None).unwrap();
		assert!(vis.render_state().node("a").is_some_and(|view| !view.highlighted));
	}

	#[test]
	fn removing_the_hovered_node_drops_its_highlight() {
		let mut vis = visualization();
		vis.set_graph(&sample()).unwrap();
		vis.hover_node(Some("b")).unwrap();
		vis.remove_node("b").unwrap();
		let a = vis.graph().find_node("a").unwrap();
		assert_eq!((a.hovered, a.highlighted), (false, false));
		assert!(vis.render_state().node("a").is_some_and(|view| !view.highlighted));

		vis.hover_node(None).unwrap();
		assert!(vis.graph().relationships().iter().all(|rel| !rel.highlighted));
	}

	#[test]
	fn click_selects_and_canvas_click_clears() {
		let mut vis = visualization();
		vis.set_graph(&sample()).unwrap();
		vis.click_node("c").unwrap();
		let item = vis.inspect_selected().unwrap();
		assert_eq!(item.kind, InspectorKind::Node);
		assert_eq!(item.labels, vec![String::from("Movie")]);

		vis.click_relationship("r2").unwrap();
		assert_eq!(vis.inspect_selected().map(|item| item.kind), Some(InspectorKind::Relationship));

		vis.click_canvas();
		assert!(vis.inspect_selected().is_none());
	}

	#[test]
	fn blocked_wheel_emits_instead_of_zooming() {
		let config = VisualizationConfig {
			wheel_zoom_requires_mod_key: true,
			..VisualizationConfig::default()
		};
		let mut vis = Visualization::new(config, GraphStyle::default());
		let blocked = Rc::new(RefCell::new(0));
		let counter = blocked.clone();
		vis.on(EventKind::WheelZoomBlocked, move |_| *counter.borrow_mut() += 1);

		let scale = vis.viewport().scale();
		assert!(!vis.wheel(Vector::new(10.0, 10.0), -100.0, false));
		assert_eq!(vis.viewport().scale(), scale);
		assert_eq!(*blocked.borrow(), 1);
		assert!(vis.wheel(Vector::new(10.0, 10.0), -100.0, true));
		assert!(vis.viewport().scale() > scale);
	}

	#[test]
	fn autocompletion_can_be_switched_off() {
		let config = VisualizationConfig {
			autocomplete_relationships: false,
			..VisualizationConfig::default()
		};
		let mut vis = Visualization::new(config, GraphStyle::default());
		vis.set_graph(&sample()).unwrap();
		let extra = [BasicRelationship::new("r3", "b", "c", "LIKES")];
		assert!(vis.add_autocompleted(&extra).unwrap().is_empty());
		assert_eq!(vis.graph().relationship_count(), 2);
	}

	#[test]
	fn clear_removes_every_drawn_element() {
		let mut vis = visualization();
		vis.set_graph(&sample()).unwrap();
		let patches = vis.clear();
		assert_eq!(patches.len(), 5);
		assert!(vis.render_state().is_empty());
	}
}
