//! Interaction callbacks.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::geometry::Vector;
use super::model::{Property, VNode, VRelationship};
use super::render::ZoomLimits;

/// Copy of a node handed to listeners.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSnapshot {
	pub id: String,
	pub labels: Vec<String>,
	/// Sorted by key.
	pub properties: Vec<Property>,
	/// World position when the event fired.
	pub position: Vector,
}

impl From<&VNode> for NodeSnapshot {
	fn from(node: &VNode) -> Self {
		Self {
			id: node.id().to_owned(),
			labels: node.labels.clone(),
			properties: node.properties.clone(),
			position: node.position(),
		}
	}
}

/// Copy of a relationship handed to listeners.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSnapshot {
	pub id: String,
	/// Relationship type, `type` on the wire.
	#[serde(rename = "type")]
	pub rel_type: String,
	/// Start node id.
	pub source_id: String,
	/// End node id.
	pub target_id: String,
	/// Sorted by key.
	pub properties: Vec<Property>,
}

impl From<&VRelationship> for RelationshipSnapshot {
	fn from(rel: &VRelationship) -> Self {
		Self {
			id: rel.id().to_owned(),
			rel_type: rel.rel_type.clone(),
			source_id: rel.source_id().to_owned(),
			target_id: rel.target_id().to_owned(),
			properties: rel.properties.clone(),
		}
	}
}

/// Something the user did to the graph, or a change the host should know of.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GraphEvent {
	/// The pointer entered a node.
	NodeMouseOver(NodeSnapshot),
	/// The pointer left the hovered node.
	NodeMouseOut(NodeSnapshot),
	/// Emitted after the selection changed.
	NodeClicked(NodeSnapshot),
	/// The host may answer with [`merge_neighbours`](super::Visualization::merge_neighbours).
	NodeDoubleClicked(NodeSnapshot),
	/// A node was grabbed.
	NodeDragStart(NodeSnapshot),
	/// A grabbed node was let go.
	NodeDragEnd(NodeSnapshot),
	/// The pointer entered a relationship.
	RelationshipMouseOver(RelationshipSnapshot),
	/// The pointer left the hovered relationship.
	RelationshipMouseOut(RelationshipSnapshot),
	/// Emitted after the selection changed.
	RelationshipClicked(RelationshipSnapshot),
	/// A click on empty canvas; clears the selection.
	CanvasClicked,
	/// A zoom ran into the scale bounds.
	ZoomLimitReached(ZoomLimits),
	/// A plain wheel scroll was ignored because zooming needs a modifier.
	WheelZoomBlocked,
	/// The drawn data changed. Counts are after the change.
	GraphUpdated { nodes: usize, relationships: usize },
}

impl GraphEvent {
	/// Key the event is dispatched under.
	pub fn kind(&self) -> EventKind {
		match self {
			Self::NodeMouseOver(_) => EventKind::NodeMouseOver,
			Self::NodeMouseOut(_) => EventKind::NodeMouseOut,
			Self::NodeClicked(_) => EventKind::NodeClicked,
			Self::NodeDoubleClicked(_) => EventKind::NodeDoubleClicked,
			Self::NodeDragStart(_) => EventKind::NodeDragStart,
			Self::NodeDragEnd(_) => EventKind::NodeDragEnd,
			Self::RelationshipMouseOver(_) => EventKind::RelationshipMouseOver,
			Self::RelationshipMouseOut(_) => EventKind::RelationshipMouseOut,
			Self::RelationshipClicked(_) => EventKind::RelationshipClicked,
			Self::CanvasClicked => EventKind::CanvasClicked,
			Self::ZoomLimitReached(_) => EventKind::ZoomLimitReached,
			Self::WheelZoomBlocked => EventKind::WheelZoomBlocked,
			Self::GraphUpdated { .. } => EventKind::GraphUpdated,
		}
	}
}

/// Payload-free twin of [`GraphEvent`], used to register listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	NodeMouseOver,
	NodeMouseOut,
	NodeClicked,
	NodeDoubleClicked,
	NodeDragStart,
	NodeDragEnd,
	RelationshipMouseOver,
	RelationshipMouseOut,
	RelationshipClicked,
	CanvasClicked,
	ZoomLimitReached,
	WheelZoomBlocked,
	GraphUpdated,
}

/// Callback registered with [`EventRegistry::on`].
pub type Listener = Box<dyn Fn(&GraphEvent)>;

/// Listeners per event kind, called in registration order.
#[derive(Default)]
pub struct EventRegistry {
	listeners: HashMap<EventKind, Vec<Listener>>,
}

impl fmt::Debug for EventRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(self.listeners.iter().map(|(kind, list)| (kind, list.len())))
			.finish()
	}
}

impl EventRegistry {
	/// Adds a listener behind the ones already registered for `kind`.
	pub fn on(&mut self, kind: EventKind, callback: impl Fn(&GraphEvent) + 'static) {
		self.listeners.entry(kind).or_default().push(Box::new(callback));
	}

	/// Calls every listener of the event's kind, oldest first.
	pub fn emit(&self, event: &GraphEvent) {
		if let Some(listeners) = self.listeners.get(&event.kind()) {
			for listener in listeners {
				listener(event);
			}
		}
	}

	/// Listeners registered for `kind`.
	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.get(&kind).map_or(0, Vec::len)
	}
}
