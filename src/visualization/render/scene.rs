use serde::Serialize;

use crate::visualization::geometry::{BoundingBox, Vector, c};
use crate::visualization::layout::to_world;
use crate::visualization::model::{Graph, VNode, VRelationship};
use crate::visualization::style::GraphStyle;

/// Minimum width of a relationship's pointer hit area.
const OVERLAY_WIDTH: f64 = 16.0;

/// What is drawn for one node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub fill: String,
	pub stroke: String,
	pub stroke_width: f64,
	pub text_color: String,
	pub font_size: f64,
	pub caption_lines: Vec<String>,
	pub selected: bool,
	pub hovered: bool,
	pub highlighted: bool,
	pub fixed: bool,
}

impl NodeView {
	fn build(node: &VNode, style: &GraphStyle) -> Self {
		let element = style.for_node(node);
		Self {
			id: node.id().to_owned(),
			x: c(node.position().x),
			y: c(node.position().y),
			radius: node.radius(),
			fill: element.get_or("color", "#A5ABB6").to_owned(),
			stroke: element.get_or("border-color", "#9AA1AC").to_owned(),
			stroke_width: element.number_or("border-width", 2.0),
			text_color: element.get_or("text-color-internal", "#FFFFFF").to_owned(),
			font_size: element.number_or("font-size", 10.0),
			caption_lines: node.caption_lines.clone(),
			selected: node.selected,
			hovered: node.hovered,
			highlighted: node.highlighted,
			fixed: node.fixed,
		}
	}

	pub fn position(&self) -> Vector {
		Vector::new(self.x, self.y)
	}

	/// CSS classes for the node group.
	pub fn classes(&self) -> String {
		let mut classes = String::from("node");
		for (flag, name) in [
			(self.selected, " selected"),
			(self.hovered, " hovered"),
			(self.highlighted, " highlighted"),
			(self.fixed, " fixed"),
		] {
			if flag {
				classes.push_str(name);
			}
		}
		classes
	}

	/// Vertical offset of caption line `index`, centred on the node.
	pub fn line_offset(&self, index: usize) -> f64 {
		let middle = (self.caption_lines.len() as f64 - 1.0) / 2.0;
		c((index as f64 - middle) * self.font_size)
	}
}

/// What is drawn for one relationship, in its local frame: translated to
/// the source centre and rotated by `angle`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipView {
	pub id: String,
	pub source_id: String,
	pub target_id: String,
	pub x: f64,
	pub y: f64,
	pub angle: f64,
	pub outline: String,
	pub overlay: String,
	pub color: String,
	pub caption: String,
	pub caption_x: f64,
	pub caption_y: f64,
	/// Extra rotation keeping the caption upright.
	pub caption_rotation: f64,
	pub caption_color: String,
	pub font_size: f64,
	/// World position of the caption, for bounds and hit testing.
	pub mid: Vector,
	pub selected: bool,
	pub hovered: bool,
	pub highlighted: bool,
}

impl RelationshipView {
	fn build(graph: &Graph, rel: &VRelationship, style: &GraphStyle) -> Option<Self> {
		let arrow = rel.arrow.as_ref()?;
		let element = style.for_relationship(rel);
		let origin = graph.source(rel).position();
		let padding = element.number_or("padding", 3.0);
		let gap = if rel.short_caption.is_empty() {
			0.0
		} else {
			rel.caption_length + 2.0 * padding
		};
		let caption_at = arrow.mid_shaft_point();
		let upside_down = rel.natural_angle > 90.0 && rel.natural_angle < 270.0;

		Some(Self {
			id: rel.id().to_owned(),
			source_id: rel.source_id().to_owned(),
			target_id: rel.target_id().to_owned(),
			x: c(origin.x),
			y: c(origin.y),
			angle: c(rel.natural_angle),
			outline: arrow.outline(gap),
			overlay: arrow.overlay(OVERLAY_WIDTH),
			color: element.get_or("color", "#A5ABB6").to_owned(),
			caption: rel.short_caption.clone(),
			caption_x: c(caption_at.x),
			caption_y: c(caption_at.y),
			caption_rotation: if upside_down { 180.0 } else { 0.0 },
			caption_color: element.get_or("text-color-external", "#000000").to_owned(),
			font_size: rel.caption_height,
			mid: to_world(origin, rel.natural_angle, caption_at),
			selected: rel.selected,
			hovered: rel.hovered,
			highlighted: rel.highlighted,
		})
	}

	pub fn classes(&self) -> String {
		let mut classes = String::from("relationship");
		for (flag, name) in [
			(self.selected, " selected"),
			(self.hovered, " hovered"),
			(self.highlighted, " highlighted"),
		] {
			if flag {
				classes.push_str(name);
			}
		}
		classes
	}

	/// SVG transform of the relationship group.
	pub fn transform(&self) -> String {
		format!("translate({} {}) rotate({})", self.x, self.y, self.angle)
	}

	pub fn caption_transform(&self) -> String {
		format!(
			"rotate({} {} {})",
			self.caption_rotation, self.caption_x, self.caption_y
		)
	}
}

/// Everything that should currently be on screen.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Scene {
	pub nodes: Vec<NodeView>,
	pub relationships: Vec<RelationshipView>,
}

impl Scene {
	/// Views of every visible element. Relationships without laid-out
	/// arrows are skipped.
	pub fn build(graph: &Graph, style: &GraphStyle) -> Self {
		let nodes = graph
			.nodes()
			.iter()
			.filter(|node| node.visible)
			.map(|node| NodeView::build(node, style))
			.collect();
		let relationships = graph
			.relationships()
			.iter()
			.filter(|rel| graph.source(rel).visible && graph.target(rel).visible)
			.filter_map(|rel| RelationshipView::build(graph, rel, style))
			.collect();
		Self { nodes, relationships }
	}
}

/// Box around every node circle and relationship caption, or `None` for an
/// empty scene.
pub fn bounding_box(scene: &Scene) -> Option<BoundingBox> {
	let nodes = scene
		.nodes
		.iter()
		.map(|node| BoundingBox::around(node.position(), node.radius));
	let captions = scene
		.relationships
		.iter()
		.map(|rel| BoundingBox::around(rel.mid, rel.font_size));
	nodes.chain(captions).reduce(BoundingBox::union)
}
