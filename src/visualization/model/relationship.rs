use serde::Serialize;

use super::{BasicRelationship, Property, property_list, property_value};
use crate::visualization::geometry::ArrowGeometry;

/// One graph relationship. Endpoints are arena indices into the owning
/// [`Graph`](super::Graph), kept alongside their ids.
#[derive(Clone, Debug, Serialize)]
pub struct VRelationship {
	id: String,
	pub(crate) source: usize,
	pub(crate) target: usize,
	source_id: String,
	target_id: String,
	pub rel_type: String,
	pub properties: Vec<Property>,
	pub caption: String,
	/// Caption as drawn, possibly ellipsised to fit the shaft.
	pub short_caption: String,
	pub caption_length: f64,
	pub caption_height: f64,
	/// Member of a bundle of parallel relationships drawn as arcs.
	pub internal: bool,
	/// Added by relationship auto-completion rather than by a query.
	pub autocompleted: bool,
	/// Direction in degrees the arrow leaves its source.
	pub natural_angle: f64,
	pub centre_distance: f64,
	pub arrow: Option<ArrowGeometry>,
	pub selected: bool,
	pub hovered: bool,
	pub highlighted: bool,
}

impl VRelationship {
	pub(crate) fn from_record(record: &BasicRelationship, source: usize, target: usize) -> Self {
		Self {
			id: record.id.clone(),
			source,
			target,
			source_id: record.start_node_id.clone(),
			target_id: record.end_node_id.clone(),
			rel_type: record.rel_type.clone(),
			properties: property_list(&record.properties, &record.property_types),
			caption: String::new(),
			short_caption: String::new(),
			caption_length: 0.0,
			caption_height: 0.0,
			internal: false,
			autocompleted: false,
			natural_angle: 0.0,
			centre_distance: 0.0,
			arrow: None,
			selected: false,
			hovered: false,
			highlighted: false,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn source_id(&self) -> &str {
		&self.source_id
	}

	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	pub fn source_index(&self) -> usize {
		self.source
	}

	pub fn target_index(&self) -> usize {
		self.target
	}

	pub fn is_loop(&self) -> bool {
		self.source == self.target
	}

	pub fn property(&self, key: &str) -> Option<&str> {
		property_value(&self.properties, key)
	}

	pub(crate) fn touches(&self, node_id: &str) -> bool {
		self.source_id == node_id || self.target_id == node_id
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn loop_iff_same_endpoint() {
		let record = BasicRelationship::new("r", "a", "a", "LIKES");
		assert!(VRelationship::from_record(&record, 3, 3).is_loop());
		let record = BasicRelationship::new("r", "a", "b", "LIKES");
		assert!(!VRelationship::from_record(&record, 3, 4).is_loop());
	}
}
