use serde::Serialize;

use super::{BasicNode, Property, property_list, property_value};
use crate::visualization::geometry::Vector;

/// Smallest radius any node is drawn with.
pub const MIN_NODE_RADIUS: f64 = 1.0;

/// One graph node in visualization space.
#[derive(Clone, Debug, Serialize)]
pub struct VNode {
	id: String,
	pub labels: Vec<String>,
	pub properties: Vec<Property>,
	pub(crate) position: Vector,
	pub(crate) velocity: Vector,
	/// Pointer position while dragged, or the pinned position when fixed.
	pub(crate) pin: Option<Vector>,
	/// Whether the simulation has seeded a position yet.
	pub(crate) placed: bool,
	/// Where an unplaced node should be seeded, e.g. next to the node it was
	/// expanded from.
	pub(crate) seed_near: Option<Vector>,
	radius: f64,
	pub fixed: bool,
	pub dragged: bool,
	pub visible: bool,
	pub selected: bool,
	pub hovered: bool,
	/// Highlighted as a neighbour of the hovered node.
	pub highlighted: bool,
	pub expanded: bool,
	pub caption_lines: Vec<String>,
}

impl VNode {
	pub(crate) fn from_record(record: &BasicNode) -> Self {
		Self {
			id: record.id.clone(),
			labels: record.labels.clone(),
			properties: property_list(&record.properties, &record.property_types),
			position: Vector::ZERO,
			velocity: Vector::ZERO,
			pin: None,
			placed: false,
			seed_near: None,
			radius: 25.0,
			fixed: false,
			dragged: false,
			visible: true,
			selected: false,
			hovered: false,
			highlighted: false,
			expanded: false,
			caption_lines: Vec::new(),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn position(&self) -> Vector {
		self.position
	}

	pub fn velocity(&self) -> Vector {
		self.velocity
	}

	pub fn radius(&self) -> f64 {
		self.radius
	}

	pub fn is_placed(&self) -> bool {
		self.placed
	}

	/// Clamped to [`MIN_NODE_RADIUS`]; non-finite input falls back to it.
	pub(crate) fn set_radius(&mut self, radius: f64) {
		self.radius = if radius.is_finite() {
			radius.max(MIN_NODE_RADIUS)
		} else {
			MIN_NODE_RADIUS
		};
	}

	pub fn property(&self, key: &str) -> Option<&str> {
		property_value(&self.properties, key)
	}

	/// Pins the node where it is; the simulation will no longer move it.
	pub fn pin(&mut self) {
		self.fixed = true;
		self.pin = Some(self.position);
	}

	pub fn unpin(&mut self) {
		self.fixed = false;
		if !self.dragged {
			self.pin = None;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radius_is_clamped() {
		let mut node = VNode::from_record(&BasicNode::new("1", &[]));
		node.set_radius(-4.0);
		assert_eq!(node.radius(), MIN_NODE_RADIUS);
		node.set_radius(f64::NAN);
		assert_eq!(node.radius(), MIN_NODE_RADIUS);
		node.set_radius(32.5);
		assert_eq!(node.radius(), 32.5);
	}

	#[test]
	fn pin_holds_current_position() {
		let mut node = VNode::from_record(&BasicNode::new("1", &[]));
		node.position = Vector::new(3.0, 4.0);
		node.pin();
		assert_eq!(node.pin, Some(Vector::new(3.0, 4.0)));
		node.unpin();
		assert_eq!(node.pin, None);
	}
}
