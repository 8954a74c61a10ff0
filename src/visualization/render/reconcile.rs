use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::scene::{NodeView, RelationshipView, Scene};

/// Which collections a render pass diffs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateScope {
	pub nodes: bool,
	pub relationships: bool,
}

impl UpdateScope {
	pub const ALL: Self = Self {
		nodes: true,
		relationships: true,
	};
	pub const NONE: Self = Self {
		nodes: false,
		relationships: false,
	};
}

/// One change to the drawn document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", content = "view", rename_all = "camelCase")]
pub enum Patch {
	AddNode(NodeView),
	UpdateNode(NodeView),
	RemoveNode(String),
	AddRelationship(RelationshipView),
	UpdateRelationship(RelationshipView),
	RemoveRelationship(String),
}

/// Views as last drawn, in draw order.
#[derive(Clone, Debug, Default)]
pub struct RenderState {
	nodes: Vec<NodeView>,
	relationships: Vec<RelationshipView>,
	node_index: HashMap<String, usize>,
	relationship_index: HashMap<String, usize>,
}

impl RenderState {
	pub fn nodes(&self) -> &[NodeView] {
		&self.nodes
	}

	pub fn relationships(&self) -> &[RelationshipView] {
		&self.relationships
	}

	pub fn node(&self, id: &str) -> Option<&NodeView> {
		self.node_index.get(id).map(|&index| &self.nodes[index])
	}

	pub fn relationship(&self, id: &str) -> Option<&RelationshipView> {
		self.relationship_index
			.get(id)
			.map(|&index| &self.relationships[index])
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.relationships.is_empty()
	}

	/// Brings the state in line with a patch list from [`reconcile`].
	pub fn apply(&mut self, patches: &[Patch]) {
		let mut removed_nodes = HashSet::new();
		let mut removed_relationships = HashSet::new();
		for patch in patches {
			match patch {
				Patch::AddNode(view) | Patch::UpdateNode(view) => {
					match self.node_index.get(&view.id) {
						Some(&index) => self.nodes[index] = view.clone(),
						None => {
							self.node_index.insert(view.id.clone(), self.nodes.len());
							self.nodes.push(view.clone());
						}
					}
				}
				Patch::AddRelationship(view) | Patch::UpdateRelationship(view) => {
					match self.relationship_index.get(&view.id) {
						Some(&index) => self.relationships[index] = view.clone(),
						None => {
							self.relationship_index
								.insert(view.id.clone(), self.relationships.len());
							self.relationships.push(view.clone());
						}
					}
				}
				Patch::RemoveNode(id) => {
					removed_nodes.insert(id.as_str());
				}
				Patch::RemoveRelationship(id) => {
					removed_relationships.insert(id.as_str());
				}
			}
		}

		if !removed_nodes.is_empty() {
			self.nodes.retain(|view| !removed_nodes.contains(view.id.as_str()));
			self.node_index = index_by_id(self.nodes.iter().map(|view| view.id.as_str()));
		}
		if !removed_relationships.is_empty() {
			self.relationships
				.retain(|view| !removed_relationships.contains(view.id.as_str()));
			self.relationship_index =
				index_by_id(self.relationships.iter().map(|view| view.id.as_str()));
		}
	}
}

fn index_by_id<'a>(ids: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
	ids.enumerate().map(|(index, id)| (id.to_owned(), index)).collect()
}

/// Diffs `scene` against what was last drawn. Collections outside `scope`
/// produce no patches. Removals come first so ids can be reused.
pub fn reconcile(state: &RenderState, scene: &Scene, scope: UpdateScope) -> Vec<Patch> {
	let mut patches = Vec::new();

	if scope.relationships {
		let present = scene
			.relationships
			.iter()
			.map(|view| view.id.as_str())
			.collect::<HashSet<_>>();
		patches.extend(
			state
				.relationships
				.iter()
				.filter(|view| !present.contains(view.id.as_str()))
				.map(|view| Patch::RemoveRelationship(view.id.clone())),
		);
	}
	if scope.nodes {
		let present = scene
			.nodes
			.iter()
			.map(|view| view.id.as_str())
			.collect::<HashSet<_>>();
		patches.extend(
			state
				.nodes
				.iter()
				.filter(|view| !present.contains(view.id.as_str()))
				.map(|view| Patch::RemoveNode(view.id.clone())),
		);
		for view in &scene.nodes {
			match state.node(&view.id) {
				None => patches.push(Patch::AddNode(view.clone())),
				Some(old) if old != view => patches.push(Patch::UpdateNode(view.clone())),
				Some(_) => {}
			}
		}
	}
	if scope.relationships {
		for view in &scene.relationships {
			match state.relationship(&view.id) {
				None => patches.push(Patch::AddRelationship(view.clone())),
				Some(old) if old != view => patches.push(Patch::UpdateRelationship(view.clone())),
				Some(_) => {}
			}
		}
	}
	patches
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::visualization::geometry::Vector;

	fn node(id: &str, x: f64) -> NodeView {
		NodeView {
			id: id.to_owned(),
			x,
			y: 0.0,
			radius: 25.0,
			fill: String::from("#A5ABB6"),
			stroke: String::from("#9AA1AC"),
			stroke_width: 2.0,
			text_color: String::from("#FFFFFF"),
			font_size: 10.0,
			caption_lines: Vec::new(),
			selected: false,
			hovered: false,
			highlighted: false,
			fixed: false,
		}
	}

	fn relationship(id: &str) -> RelationshipView {
		RelationshipView {
			id: id.to_owned(),
			source_id: String::from("a"),
			target_id: String::from("b"),
			x: 0.0,
			y: 0.0,
			angle: 0.0,
			outline: String::from("M 0 0 Z"),
			overlay: String::new(),
			color: String::from("#A5ABB6"),
			caption: String::new(),
			caption_x: 0.0,
			caption_y: 0.0,
			caption_rotation: 0.0,
			caption_color: String::from("#000000"),
			font_size: 8.0,
			mid: Vector::ZERO,
			selected: false,
			hovered: false,
			highlighted: false,
		}
	}

	#[test]
	fn first_render_adds_everything() {
		let scene = Scene {
			nodes: vec![node("a", 0.0), node("b", 1.0)],
			relationships: vec![relationship("r")],
		};
		let patches = reconcile(&RenderState::default(), &scene, UpdateScope::ALL);
		assert_eq!(patches.len(), 3);
		let mut state = RenderState::default();
		state.apply(&patches);
		assert_eq!(state.nodes().len(), 2);
		assert!(reconcile(&state, &scene, UpdateScope::ALL).is_empty());
	}

	#[test]
	fn moved_node_is_updated_and_missing_one_removed() {
		let mut state = RenderState::default();
		state.apply(&reconcile(
			&state,
			&Scene {
				nodes: vec![node("a", 0.0), node("b", 1.0)],
				relationships: Vec::new(),
			},
			UpdateScope::ALL,
		));
		let next = Scene {
			nodes: vec![node("a", 5.0)],
			relationships: Vec::new(),
		};
		let patches = reconcile(&state, &next, UpdateScope::ALL);
		assert_eq!(
			patches,
			vec![Patch::RemoveNode(String::from("b")), Patch::UpdateNode(node("a", 5.0))]
		);
		state.apply(&patches);
		assert_eq!(state.node("a").map(|view| view.x), Some(5.0));
		assert!(state.node("b").is_none());
	}

	#[test]
	fn scope_limits_the_diff() {
		let scene = Scene {
			nodes: vec![node("a", 0.0)],
			relationships: vec![relationship("r")],
		};
		let only_nodes = UpdateScope {
			nodes: true,
			relationships: false,
		};
		let patches = reconcile(&RenderState::default(), &scene, only_nodes);
		assert_eq!(patches, vec![Patch::AddNode(node("a", 0.0))]);
		assert!(reconcile(&RenderState::default(), &scene, UpdateScope::NONE).is_empty());
	}
}
