//! Graph data model: the wire records produced by query execution and the
//! arena-indexed visualization graph built from them.

mod graph;
mod node;
mod relationship;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use graph::{
	Graph, GraphStats, MergeOutcome, NodePair, TypeStats, apply_display_limit, create_graph,
};
pub use node::VNode;
pub use relationship::VRelationship;

/// A node as decoded from a query result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicNode {
	pub id: String,
	pub labels: Vec<String>,
	pub properties: BTreeMap<String, Value>,
	pub property_types: BTreeMap<String, String>,
}

impl BasicNode {
	pub fn new(id: impl Into<String>, labels: &[&str]) -> Self {
		Self {
			id: id.into(),
			labels: labels.iter().map(|label| (*label).to_owned()).collect(),
			..Default::default()
		}
	}

	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}
}

/// A relationship as decoded from a query result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicRelationship {
	pub id: String,
	pub start_node_id: String,
	pub end_node_id: String,
	#[serde(rename = "type")]
	pub rel_type: String,
	pub properties: BTreeMap<String, Value>,
	pub property_types: BTreeMap<String, String>,
}

impl BasicRelationship {
	pub fn new(
		id: impl Into<String>,
		start_node_id: impl Into<String>,
		end_node_id: impl Into<String>,
		rel_type: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			start_node_id: start_node_id.into(),
			end_node_id: end_node_id.into(),
			rel_type: rel_type.into(),
			..Default::default()
		}
	}

	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}
}

/// One batch of records: a query result or a neighbour expansion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
	pub nodes: Vec<BasicNode>,
	pub relationships: Vec<BasicRelationship>,
}

impl GraphData {
	pub fn from_json(json: &str) -> super::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

/// A property flattened for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Property {
	pub key: String,
	pub value: String,
	#[serde(rename = "type")]
	pub kind: String,
}

pub(crate) fn property_list(
	properties: &BTreeMap<String, Value>,
	types: &BTreeMap<String, String>,
) -> Vec<Property> {
	properties
		.iter()
		.map(|(key, value)| Property {
			key: key.clone(),
			value: display_value(value),
			kind: types
				.get(key)
				.cloned()
				.unwrap_or_else(|| value_kind(value).to_owned()),
		})
		.collect()
}

fn display_value(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::from("null"),
		other => other.to_string(),
	}
}

fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(number) if number.is_f64() => "float",
		Value::Number(_) => "integer",
		Value::String(_) => "string",
		Value::Array(_) => "list",
		Value::Object(_) => "map",
	}
}

/// Looks a property up by key.
pub(crate) fn property_value<'a>(properties: &'a [Property], key: &str) -> Option<&'a str> {
	properties
		.iter()
		.find(|property| property.key == key)
		.map(|property| property.value.as_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_deserialize_from_camel_case_json() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [{"id": "1", "labels": ["Person"], "properties": {"name": "Ada", "born": 1815}}],
				"relationships": [{"id": "r", "startNodeId": "1", "endNodeId": "1", "type": "KNOWS"}]
			}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].labels, vec!["Person"]);
		assert_eq!(data.relationships[0].rel_type, "KNOWS");
		assert_eq!(data.relationships[0].start_node_id, "1");

		let list = property_list(&data.nodes[0].properties, &data.nodes[0].property_types);
		assert_eq!(property_value(&list, "name"), Some("Ada"));
		assert_eq!(list[0].kind, "integer");
		assert_eq!(list[0].key, "born");
	}
}
