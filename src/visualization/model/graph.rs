use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use serde::Serialize;

use super::{BasicRelationship, GraphData, VNode, VRelationship};
use crate::visualization::{Result, VisualizationError};

/// Ids that a merge actually added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	pub added_nodes: Vec<String>,
	pub added_relationships: Vec<String>,
}

impl MergeOutcome {
	pub fn is_empty(&self) -> bool {
		self.added_nodes.is_empty() && self.added_relationships.is_empty()
	}
}

/// Relationships sharing one unordered pair of endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePair {
	/// Endpoint with the smaller id.
	pub node_a: usize,
	pub node_b: usize,
	pub relationships: Vec<usize>,
}

impl NodePair {
	pub fn is_loop(&self) -> bool {
		self.node_a == self.node_b
	}
}

/// Count and property keys seen for one label or relationship type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TypeStats {
	pub count: usize,
	pub properties: BTreeSet<String>,
}

/// Per-label and per-type tallies that feed the legend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
	pub node_count: usize,
	pub relationship_count: usize,
	pub labels: BTreeMap<String, TypeStats>,
	pub relationship_types: BTreeMap<String, TypeStats>,
}

/// Arena of nodes and relationships. Relationship endpoints are indices into
/// the node arena; both arenas are re-compacted on removal.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<VNode>,
	relationships: Vec<VRelationship>,
	node_index: HashMap<String, usize>,
	relationship_index: HashMap<String, usize>,
	/// Node ids added by expanding the key node.
	expanded: HashMap<String, Vec<String>>,
}

/// Builds a graph from one result batch. A relationship whose endpoint is not
/// in the batch is a data error.
pub fn create_graph(data: &GraphData) -> Result<Graph> {
	let mut graph = Graph::default();
	graph.merge(data)?;
	Ok(graph)
}

/// Keeps the first `limit` distinct nodes of `data` and the relationships
/// between them. Returns whether anything was cut.
pub fn apply_display_limit(data: &GraphData, limit: usize) -> (GraphData, bool) {
	let mut kept = HashSet::new();
	let mut nodes = Vec::new();
	let mut limit_hit = false;
	for node in &data.nodes {
		if kept.contains(node.id.as_str()) {
			continue;
		}
		if kept.len() >= limit {
			limit_hit = true;
			continue;
		}
		kept.insert(node.id.as_str());
		nodes.push(node.clone());
	}

	let relationships = data
		.relationships
		.iter()
		.filter(|rel| {
			!limit_hit
				|| (kept.contains(rel.start_node_id.as_str()) && kept.contains(rel.end_node_id.as_str()))
		})
		.cloned()
		.collect();

	(GraphData { nodes, relationships }, limit_hit)
}

impl Graph {
	pub fn nodes(&self) -> &[VNode] {
		&self.nodes
	}

	pub fn relationships(&self) -> &[VRelationship] {
		&self.relationships
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [VNode] {
		&mut self.nodes
	}

	pub(crate) fn relationships_mut(&mut self) -> &mut [VRelationship] {
		&mut self.relationships
	}

	/// Split borrow for passes that read nodes while writing relationships.
	pub(crate) fn split_mut(&mut self) -> (&[VNode], &mut [VRelationship]) {
		(&self.nodes, &mut self.relationships)
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn relationship_count(&self) -> usize {
		self.relationships.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node_index_of(&self, id: &str) -> Option<usize> {
		self.node_index.get(id).copied()
	}

	pub fn find_node(&self, id: &str) -> Option<&VNode> {
		self.node_index_of(id).map(|index| &self.nodes[index])
	}

	pub fn find_node_mut(&mut self, id: &str) -> Option<&mut VNode> {
		let index = self.node_index_of(id)?;
		Some(&mut self.nodes[index])
	}

	pub fn find_relationship(&self, id: &str) -> Option<&VRelationship> {
		self.relationship_index.get(id).map(|&index| &self.relationships[index])
	}

	pub fn find_relationship_mut(&mut self, id: &str) -> Option<&mut VRelationship> {
		let index = *self.relationship_index.get(id)?;
		Some(&mut self.relationships[index])
	}

	pub fn source(&self, relationship: &VRelationship) -> &VNode {
		&self.nodes[relationship.source]
	}

	pub fn target(&self, relationship: &VRelationship) -> &VNode {
		&self.nodes[relationship.target]
	}

	/// Adds the records not already present. Merging the same batch twice
	/// changes nothing; nothing is added if any relationship is dangling.
	pub fn merge(&mut self, data: &GraphData) -> Result<MergeOutcome> {
		self.merge_flagged(data, false)
	}

	/// Adds relationships found between nodes already in the graph. They are
	/// flagged so they can be pruned again; present ids are left alone.
	pub fn merge_autocompleted(&mut self, relationships: &[BasicRelationship]) -> Result<MergeOutcome> {
		let data = GraphData {
			nodes: Vec::new(),
			relationships: relationships.to_vec(),
		};
		self.merge_flagged(&data, true)
	}

	/// Removes every auto-completed relationship, returning their ids.
	pub fn prune_autocompleted(&mut self) -> Vec<String> {
		let removed = self
			.relationships
			.iter()
			.filter(|rel| rel.autocompleted)
			.map(|rel| rel.id().to_owned())
			.collect::<Vec<_>>();
		if !removed.is_empty() {
			self.relationships.retain(|rel| !rel.autocompleted);
			self.rebuild_relationship_index();
		}
		removed
	}

	/// Merges the neighbours of `node_id` and remembers them so that
	/// [`Graph::collapse`] can take them away again.
	pub fn expand(&mut self, node_id: &str, data: &GraphData) -> Result<MergeOutcome> {
		let anchor = self
			.find_node(node_id)
			.ok_or_else(|| VisualizationError::UnknownNode(node_id.to_owned()))?;
		let seed = anchor.placed.then_some(anchor.position);

		let outcome = self.merge(data)?;
		for id in &outcome.added_nodes {
			if let Some(node) = self.find_node_mut(id) {
				node.seed_near = seed;
			}
		}
		self.expanded
			.entry(node_id.to_owned())
			.or_default()
			.extend(outcome.added_nodes.iter().cloned());
		if let Some(node) = self.find_node_mut(node_id) {
			node.expanded = true;
		}
		Ok(outcome)
	}

	/// Removes the nodes added by expanding `node_id`, recursively through
	/// their own expansions, and returns their ids.
	pub fn collapse(&mut self, node_id: &str) -> Result<Vec<String>> {
		if self.node_index_of(node_id).is_none() {
			return Err(VisualizationError::UnknownNode(node_id.to_owned()));
		}

		let mut removed = Vec::new();
		let mut pending = self.expanded.remove(node_id).unwrap_or_default();
		while let Some(id) = pending.pop() {
			if id == node_id || removed.contains(&id) {
				continue;
			}
			pending.extend(self.expanded.remove(&id).unwrap_or_default());
			removed.push(id);
		}

		let ids = removed.iter().map(String::as_str).collect::<HashSet<_>>();
		self.remove_nodes(&ids);
		if let Some(node) = self.find_node_mut(node_id) {
			node.expanded = false;
		}
		Ok(removed)
	}

	/// Removes a node and every relationship connected to it.
	pub fn remove_node(&mut self, node_id: &str) -> Result<()> {
		if self.node_index_of(node_id).is_none() {
			return Err(VisualizationError::UnknownNode(node_id.to_owned()));
		}
		self.expanded.remove(node_id);
		for children in self.expanded.values_mut() {
			children.retain(|child| child != node_id);
		}
		self.remove_nodes(&HashSet::from([node_id]));
		Ok(())
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Relationships grouped by unordered endpoint pair, in first-seen order.
	pub fn node_pairs(&self) -> Vec<NodePair> {
		let mut pairs: Vec<NodePair> = Vec::new();
		let mut by_key: HashMap<(usize, usize), usize> = HashMap::new();
		for (index, rel) in self.relationships.iter().enumerate() {
			let (a, b) = if self.nodes[rel.source].id() <= self.nodes[rel.target].id() {
				(rel.source, rel.target)
			} else {
				(rel.target, rel.source)
			};
			let slot = *by_key.entry((a, b)).or_insert_with(|| {
				pairs.push(NodePair {
					node_a: a,
					node_b: b,
					relationships: Vec::new(),
				});
				pairs.len() - 1
			});
			pairs[slot].relationships.push(index);
		}
		pairs
	}

	/// Ids of nodes one relationship away, in relationship order.
	pub fn neighbour_ids(&self, node_id: &str) -> Vec<String> {
		let mut seen = HashSet::new();
		self.relationships
			.iter()
			.filter(|rel| !rel.is_loop())
			.filter_map(|rel| {
				if rel.source_id() == node_id {
					Some(rel.target_id())
				} else if rel.target_id() == node_id {
					Some(rel.source_id())
				} else {
					None
				}
			})
			.filter(|id| seen.insert(*id))
			.map(str::to_owned)
			.collect()
	}

	pub fn stats(&self) -> GraphStats {
		let mut stats = GraphStats {
			node_count: self.nodes.len(),
			relationship_count: self.relationships.len(),
			..Default::default()
		};
		for node in &self.nodes {
			for label in &node.labels {
				let entry = stats.labels.entry(label.clone()).or_default();
				entry.count += 1;
				entry
					.properties
					.extend(node.properties.iter().map(|property| property.key.clone()));
			}
		}
		for rel in &self.relationships {
			let entry = stats.relationship_types.entry(rel.rel_type.clone()).or_default();
			entry.count += 1;
			entry
				.properties
				.extend(rel.properties.iter().map(|property| property.key.clone()));
		}
		stats
	}

	/// Carries positions and pins over from a graph this one replaces, so
	/// nodes present in both do not jump.
	pub(crate) fn adopt_layout(&mut self, previous: &Graph) {
		for node in &mut self.nodes {
			let Some(old) = previous.find_node(node.id()) else {
				continue;
			};
			node.position = old.position;
			node.velocity = old.velocity;
			node.placed = old.placed;
			node.fixed = old.fixed;
			node.pin = if old.fixed { old.pin } else { None };
		}
	}

	fn merge_flagged(&mut self, data: &GraphData, autocompleted: bool) -> Result<MergeOutcome> {
		let incoming = data
			.nodes
			.iter()
			.map(|node| node.id.as_str())
			.collect::<HashSet<_>>();
		for rel in &data.relationships {
			for endpoint in [&rel.start_node_id, &rel.end_node_id] {
				if !self.node_index.contains_key(endpoint) && !incoming.contains(endpoint.as_str()) {
					return Err(VisualizationError::MissingEndpoint {
						relationship: rel.id.clone(),
						node: endpoint.clone(),
					});
				}
			}
		}

		let mut outcome = MergeOutcome::default();
		for record in &data.nodes {
			if self.node_index.contains_key(&record.id) {
				continue;
			}
			self.node_index.insert(record.id.clone(), self.nodes.len());
			self.nodes.push(VNode::from_record(record));
			outcome.added_nodes.push(record.id.clone());
		}

		for record in &data.relationships {
			if let Some(&existing) = self.relationship_index.get(&record.id) {
				// a query result takes ownership of an auto-completed relationship
				if !autocompleted {
					self.relationships[existing].autocompleted = false;
				}
				continue;
			}
			let (Some(&source), Some(&target)) = (
				self.node_index.get(&record.start_node_id),
				self.node_index.get(&record.end_node_id),
			) else {
				continue;
			};
			let mut rel = VRelationship::from_record(record, source, target);
			rel.autocompleted = autocompleted;
			self.relationship_index.insert(record.id.clone(), self.relationships.len());
			self.relationships.push(rel);
			outcome.added_relationships.push(record.id.clone());
		}

		debug!(
			"merged {} nodes and {} relationships ({} / {} total)",
			outcome.added_nodes.len(),
			outcome.added_relationships.len(),
			self.nodes.len(),
			self.relationships.len()
		);
		Ok(outcome)
	}

	fn remove_nodes(&mut self, ids: &HashSet<&str>) {
		if ids.is_empty() {
			return;
		}
		self.nodes.retain(|node| !ids.contains(node.id()));
		self.node_index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(index, node)| (node.id().to_owned(), index))
			.collect();

		let node_index = &self.node_index;
		self.relationships.retain_mut(|rel| {
			match (node_index.get(rel.source_id()), node_index.get(rel.target_id())) {
				(Some(&source), Some(&target)) => {
					rel.source = source;
					rel.target = target;
					true
				}
				_ => false,
			}
		});
		self.rebuild_relationship_index();
	}

	fn rebuild_relationship_index(&mut self) {
		self.relationship_index = self
			.relationships
			.iter()
			.enumerate()
			.map(|(index, rel)| (rel.id().to_owned(), index))
			.collect();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::visualization::model::{BasicNode, BasicRelationship};

	fn data(nodes: &[&str], rels: &[(&str, &str, &str)]) -> GraphData {
		GraphData {
			nodes: nodes.iter().map(|id| BasicNode::new(*id, &["Person"])).collect(),
			relationships: rels
				.iter()
				.map(|(id, from, to)| BasicRelationship::new(*id, *from, *to, "KNOWS"))
				.collect(),
		}
	}

	fn node_ids(graph: &Graph) -> Vec<&str> {
		graph.nodes().iter().map(VNode::id).collect()
	}

	#[test]
	fn dangling_relationship_is_reported() {
		let error = create_graph(&data(&["a"], &[("r", "a", "ghost")])).unwrap_err();
		assert!(matches!(
			error,
			VisualizationError::MissingEndpoint { ref relationship, ref node }
				if relationship == "r" && node == "ghost"
		));
	}

	#[test]
	fn repeated_records_collapse_to_one() {
		let graph = create_graph(&data(&["a", "b", "a"], &[("r", "a", "b"), ("r", "a", "b")])).unwrap();
		assert_eq!(graph.node_count(), 2);
		assert_eq!(graph.relationship_count(), 1);
	}

	#[test]
	fn merge_is_idempotent_on_identity() {
		let mut graph = create_graph(&data(&["a", "b"], &[("r1", "a", "b")])).unwrap();
		let outcome = graph
			.merge(&data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "b", "c")]))
			.unwrap();
		assert_eq!(outcome.added_nodes, vec!["c"]);
		assert_eq!(outcome.added_relationships, vec!["r2"]);

		let again = graph
			.merge(&data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "b", "c")]))
			.unwrap();
		assert!(again.is_empty());
		assert_eq!(node_ids(&graph), vec!["a", "b", "c"]);
	}

	#[test]
	fn failed_merge_leaves_graph_untouched() {
		let mut graph = create_graph(&data(&["a"], &[])).unwrap();
		assert!(graph.merge(&data(&["b"], &[("r", "b", "zzz")])).is_err());
		assert_eq!(graph.node_count(), 1);
	}

	#[test]
	fn removing_a_node_removes_its_relationships_and_reindexes() {
		let mut graph =
			create_graph(&data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "b", "c"), ("r3", "a", "c")]))
				.unwrap();
		graph.remove_node("b").unwrap();
		assert_eq!(node_ids(&graph), vec!["a", "c"]);
		assert_eq!(graph.relationship_count(), 1);
		let rel = graph.find_relationship("r3").unwrap();
		assert_eq!(graph.source(rel).id(), "a");
		assert_eq!(graph.target(rel).id(), "c");
		assert!(matches!(graph.remove_node("b"), Err(VisualizationError::UnknownNode(_))));
	}

	#[test]
	fn collapse_removes_nested_expansions() {
		let mut graph = create_graph(&data(&["a"], &[])).unwrap();
		graph.expand("a", &data(&["b", "c"], &[("r1", "a", "b"), ("r2", "a", "c")])).unwrap();
		graph.expand("b", &data(&["d"], &[("r3", "b", "d")])).unwrap();
		assert!(graph.find_node("a").unwrap().expanded);

		let mut removed = graph.collapse("a").unwrap();
		removed.sort();
		assert_eq!(removed, vec!["b", "c", "d"]);
		assert_eq!(node_ids(&graph), vec!["a"]);
		assert_eq!(graph.relationship_count(), 0);
		assert!(!graph.find_node("a").unwrap().expanded);
	}

	#[test]
	fn autocompleted_relationships_can_be_pruned() {
		let mut graph = create_graph(&data(&["a", "b", "c"], &[("r1", "a", "b")])).unwrap();
		let outcome = graph
			.merge_autocompleted(&[
				BasicRelationship::new("r1", "a", "b", "KNOWS"),
				BasicRelationship::new("r9", "b", "c", "KNOWS"),
			])
			.unwrap();
		assert_eq!(outcome.added_relationships, vec!["r9"]);
		assert!(!graph.find_relationship("r1").unwrap().autocompleted);
		assert_eq!(graph.prune_autocompleted(), vec!["r9"]);
		assert_eq!(graph.relationship_count(), 1);
	}

	#[test]
	fn node_pairs_group_both_directions_and_loops() {
		let graph = create_graph(&data(
			&["a", "b"],
			&[("r1", "a", "b"), ("r2", "b", "a"), ("r3", "a", "a")],
		))
		.unwrap();
		let pairs = graph.node_pairs();
		assert_eq!(pairs.len(), 2);
		assert_eq!(pairs[0].relationships, vec![0, 1]);
		assert!(!pairs[0].is_loop());
		assert!(pairs[1].is_loop());
	}

	#[test]
	fn neighbours_skip_self_loops_and_duplicates() {
		let graph = create_graph(&data(
			&["a", "b", "c"],
			&[("r1", "a", "b"), ("r2", "b", "a"), ("r3", "a", "a"), ("r4", "c", "a")],
		))
		.unwrap();
		assert_eq!(graph.neighbour_ids("a"), vec!["b", "c"]);
	}

	#[test]
	fn display_limit_drops_nodes_and_their_relationships() {
		let (limited, hit) =
			apply_display_limit(&data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "b", "c")]), 2);
		assert!(hit);
		assert_eq!(limited.nodes.len(), 2);
		assert_eq!(limited.relationships.len(), 1);
		assert!(create_graph(&limited).is_ok());

		let (unchanged, hit) = apply_display_limit(&data(&["a"], &[]), 2);
		assert!(!hit);
		assert_eq!(unchanged.nodes.len(), 1);
	}

	#[test]
	fn stats_count_labels_and_types() {
		let graph = create_graph(&data(&["a", "b"], &[("r1", "a", "b")])).unwrap();
		let stats = graph.stats();
		assert_eq!(stats.labels["Person"].count, 2);
		assert_eq!(stats.relationship_types["KNOWS"].count, 1);
	}
}
