use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::visualization::render::{NodeView, Patch, RelationshipView, ViewTransform};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// The SVG subtree patches are applied to: one zoomable layer holding the
/// relationships underneath the nodes.
pub struct SvgLayers {
	document: Document,
	root: Element,
	layer: Element,
	relationships: Element,
	nodes: Element,
	node_elements: HashMap<String, Element>,
	relationship_elements: HashMap<String, Element>,
}

impl SvgLayers {
	pub fn mount(document: Document, container: &Element) -> Result<Self, JsValue> {
		let root = create(&document, "svg")?;
		root.set_attribute("class", "graph-view")?;
		root.set_attribute("style", "display: block; cursor: grab; user-select: none;")?;
		let layer = create(&document, "g")?;
		layer.set_attribute("class", "layer")?;
		let relationships = create(&document, "g")?;
		relationships.set_attribute("class", "layer relationships")?;
		let nodes = create(&document, "g")?;
		nodes.set_attribute("class", "layer nodes")?;

		layer.append_child(&relationships)?;
		layer.append_child(&nodes)?;
		root.append_child(&layer)?;
		container.append_child(&root)?;

		Ok(Self {
			document,
			root,
			layer,
			relationships,
			nodes,
			node_elements: HashMap::new(),
			relationship_elements: HashMap::new(),
		})
	}

	pub fn resize(&self, width: f64, height: f64) -> Result<(), JsValue> {
		self.root.set_attribute("width", &width.to_string())?;
		self.root.set_attribute("height", &height.to_string())
	}

	pub fn set_transform(&self, transform: ViewTransform) -> Result<(), JsValue> {
		self.layer.set_attribute(
			"transform",
			&format!("translate({} {}) scale({})", transform.x, transform.y, transform.k),
		)
	}

	pub fn apply(&mut self, patches: &[Patch]) -> Result<(), JsValue> {
		for patch in patches {
			match patch {
				Patch::AddNode(view) | Patch::UpdateNode(view) => {
					let group = match self.node_elements.get(&view.id) {
						Some(group) => group.clone(),
						None => {
							let group = create(&self.document, "g")?;
							self.nodes.append_child(&group)?;
							self.node_elements.insert(view.id.clone(), group.clone());
							group
						}
					};
					self.draw_node(&group, view)?;
				}
				Patch::AddRelationship(view) | Patch::UpdateRelationship(view) => {
					let group = match self.relationship_elements.get(&view.id) {
						Some(group) => group.clone(),
						None => {
							let group = create(&self.document, "g")?;
							self.relationships.append_child(&group)?;
							self.relationship_elements.insert(view.id.clone(), group.clone());
							group
						}
					};
					self.draw_relationship(&group, view)?;
				}
				Patch::RemoveNode(id) => {
					if let Some(group) = self.node_elements.remove(id) {
						group.remove();
					}
				}
				Patch::RemoveRelationship(id) => {
					if let Some(group) = self.relationship_elements.remove(id) {
						group.remove();
					}
				}
			}
		}
		Ok(())
	}

	fn draw_node(&self, group: &Element, view: &NodeView) -> Result<(), JsValue> {
		group.set_attribute("class", &view.classes())?;
		group.set_attribute("data-id", &view.id)?;
		group.set_attribute("transform", &format!("translate({} {})", view.x, view.y))?;
		group.set_inner_html("");

		let circle = create(&self.document, "circle")?;
		circle.set_attribute("class", "b")?;
		circle.set_attribute("r", &view.radius.to_string())?;
		circle.set_attribute("fill", &view.fill)?;
		circle.set_attribute("stroke", &view.stroke)?;
		circle.set_attribute("stroke-width", &view.stroke_width.to_string())?;
		group.append_child(&circle)?;

		for (index, line) in view.caption_lines.iter().enumerate() {
			let text = create(&self.document, "text")?;
			text.set_attribute("class", "caption")?;
			text.set_attribute("text-anchor", "middle")?;
			text.set_attribute("dominant-baseline", "central")?;
			text.set_attribute("pointer-events", "none")?;
			text.set_attribute("y", &view.line_offset(index).to_string())?;
			text.set_attribute("font-size", &view.font_size.to_string())?;
			text.set_attribute("fill", &view.text_color)?;
			text.set_text_content(Some(line));
			group.append_child(&text)?;
		}
		Ok(())
	}

	fn draw_relationship(&self, group: &Element, view: &RelationshipView) -> Result<(), JsValue> {
		group.set_attribute("class", &view.classes())?;
		group.set_attribute("data-id", &view.id)?;
		group.set_attribute("transform", &view.transform())?;
		group.set_inner_html("");

		let outline = create(&self.document, "path")?;
		outline.set_attribute("class", "outline")?;
		outline.set_attribute("fill", &view.color)?;
		outline.set_attribute("stroke", "none")?;
		outline.set_attribute("d", &view.outline)?;
		group.append_child(&outline)?;

		let overlay = create(&self.document, "path")?;
		overlay.set_attribute("class", "overlay")?;
		overlay.set_attribute("fill", &view.color)?;
		overlay.set_attribute("opacity", if view.hovered || view.selected { "0.3" } else { "0" })?;
		overlay.set_attribute("d", &view.overlay)?;
		group.append_child(&overlay)?;

		if !view.caption.is_empty() {
			let text = create(&self.document, "text")?;
			text.set_attribute("text-anchor", "middle")?;
			text.set_attribute("dominant-baseline", "central")?;
			text.set_attribute("pointer-events", "none")?;
			text.set_attribute("x", &view.caption_x.to_string())?;
			text.set_attribute("y", &view.caption_y.to_string())?;
			text.set_attribute("transform", &view.caption_transform())?;
			text.set_attribute("font-size", &view.font_size.to_string())?;
			text.set_attribute("fill", &view.caption_color)?;
			text.set_text_content(Some(&view.caption));
			group.append_child(&text)?;
		}
		Ok(())
	}
}

fn create(document: &Document, tag: &str) -> Result<Element, JsValue> {
	document.create_element_ns(Some(SVG_NS), tag)
}
