use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use graph_visualization::visualization::geometry::{
	AngleEntry, AngleList, ArrowGeometry, ArrowKind, Vector, find_runs,
};
use graph_visualization::visualization::model::{BasicNode, BasicRelationship, GraphData};
use graph_visualization::visualization::render::{Patch, ZOOM_MAX_SCALE, ZOOM_MIN_SCALE};
use graph_visualization::visualization::style::{
	GraphStyle, Selector, selector_array_to_string, selector_string_to_array,
};
use graph_visualization::visualization::{
	EventKind, GraphEvent, Visualization, VisualizationConfig,
};

fn data(nodes: &[&str], relationships: &[(&str, &str, &str)]) -> GraphData {
	GraphData {
		nodes: nodes
			.iter()
			.map(|id| BasicNode::new(*id, &["Thing"]).with_property("name", *id))
			.collect(),
		relationships: relationships
			.iter()
			.map(|(id, start, end)| BasicRelationship::new(*id, *start, *end, "LINKS"))
			.collect(),
	}
}

fn loaded(graph: &GraphData) -> Result<Visualization> {
	let mut vis = Visualization::new(VisualizationConfig::default(), GraphStyle::default());
	vis.set_graph(graph)?;
	Ok(vis)
}

/// Where a point of a relationship's local frame ends up in the world.
fn world_point(vis: &Visualization, id: &str, local: Vector) -> Result<Vector> {
	let rel = vis.graph().find_relationship(id).context("relationship")?;
	let source = vis.graph().source(rel).position();
	Ok(source + local.rotate(rel.natural_angle.to_radians()))
}

fn arrow<'a>(vis: &'a Visualization, id: &str) -> Result<&'a ArrowGeometry> {
	vis.graph()
		.find_relationship(id)
		.and_then(|rel| rel.arrow.as_ref())
		.context("laid-out arrow")
}

#[test]
fn single_relationship_is_straight() -> Result<()> {
	let vis = loaded(&data(&["a", "b"], &[("r", "a", "b")]))?;
	assert_eq!(arrow(&vis, "r")?.kind(), ArrowKind::Straight);
	assert!(vis.render_state().relationship("r").is_some());
	Ok(())
}

#[test]
fn parallel_pair_bends_to_opposite_sides() -> Result<()> {
	let vis = loaded(&data(&["a", "b"], &[("r1", "a", "b"), ("r2", "a", "b")]))?;
	let a = vis.graph().find_node("a").context("a")?.position();
	let b = vis.graph().find_node("b").context("b")?.position();
	let axis = b - a;

	let mut sides = Vec::new();
	for id in ["r1", "r2"] {
		let arrow = arrow(&vis, id)?;
		assert_eq!(arrow.kind(), ArrowKind::Arc);
		let mid = world_point(&vis, id, arrow.mid_shaft_point())?;
		sides.push(axis.cross(mid - a));
	}
	assert!(sides[0] * sides[1] < 0.0, "{sides:?}");
	Ok(())
}

#[test]
fn self_relationship_is_a_loop_on_the_boundary() -> Result<()> {
	let vis = loaded(&data(&["a"], &[("self", "a", "a")]))?;
	let ArrowGeometry::Loop { points, .. } = arrow(&vis, "self")? else {
		anyhow::bail!("expected a loop");
	};
	let node = vis.graph().find_node("a").context("a")?;
	for point in [points[0], points[4]] {
		let world = world_point(&vis, "self", point)?;
		assert!((world.distance(node.position()) - node.radius()).abs() < 1e-6);
	}
	Ok(())
}

#[test]
fn merging_known_records_adds_nothing() -> Result<()> {
	let first = data(&["a", "b"], &[("r1", "a", "b")]);
	let mut vis = loaded(&first)?;

	let mut neighbours = data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "a", "c")]);
	let expansion = vis.merge_neighbours("a", &neighbours)?;
	assert_eq!(expansion.added.added_nodes, vec![String::from("c")]);
	assert_eq!(expansion.added.added_relationships, vec![String::from("r2")]);
	assert!(!expansion.neighbour_limit_hit);

	neighbours.nodes.reverse();
	let again = vis.merge_neighbours("a", &neighbours)?;
	assert!(again.added.is_empty());
	assert_eq!(vis.graph().node_count(), 3);
	assert_eq!(vis.graph().relationship_count(), 2);
	Ok(())
}

#[test]
fn collapsing_takes_back_an_expansion() -> Result<()> {
	let mut vis = loaded(&data(&["a"], &[]))?;
	vis.merge_neighbours("a", &data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "a", "c")]))?;
	assert!(vis.graph().find_node("a").is_some_and(|node| node.expanded));

	let patches = vis.double_click_node("a")?;
	assert!(patches.contains(&Patch::RemoveNode(String::from("b"))));
	assert_eq!(vis.graph().node_count(), 1);
	assert!(vis.render_state().relationship("r1").is_none());
	Ok(())
}

#[test]
fn neighbour_limit_is_reported() -> Result<()> {
	let config = VisualizationConfig {
		max_neighbours: 2,
		..VisualizationConfig::default()
	};
	let mut vis = Visualization::new(config, GraphStyle::default());
	vis.set_graph(&data(&["a"], &[]))?;
	let expansion = vis.merge_neighbours("a", &data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "a", "c")]))?;
	assert!(expansion.neighbour_limit_hit);
	assert_eq!(vis.graph().node_count(), 3);
	Ok(())
}

#[test]
fn dangling_relationship_is_rejected() -> Result<()> {
	let mut vis = Visualization::new(VisualizationConfig::default(), GraphStyle::default());
	assert!(vis.set_graph(&data(&["a"], &[("r", "a", "ghost")])).is_err());
	assert!(vis.graph().is_empty());
	Ok(())
}

#[test]
fn display_limit_cuts_large_results() -> Result<()> {
	let config = VisualizationConfig {
		initial_node_display: 2,
		..VisualizationConfig::default()
	};
	let mut vis = Visualization::new(config, GraphStyle::default());
	vis.set_graph(&data(&["a", "b", "c"], &[("r1", "a", "b"), ("r2", "b", "c")]))?;
	assert!(vis.node_limit_hit());
	assert_eq!(vis.graph().node_count(), 2);
	assert_eq!(vis.graph().relationship_count(), 1);
	Ok(())
}

#[test]
fn settled_layout_stays_put() -> Result<()> {
	let mut vis = loaded(&data(&["a", "b", "c", "d"], &[("r1", "a", "b"), ("r2", "b", "c"), ("r3", "c", "d")]))?;
	assert!(vis.is_settled());
	let before = vis.graph().nodes().iter().map(|node| node.position()).collect::<Vec<_>>();
	for _ in 0..10 {
		assert!(vis.tick().settled);
	}
	for (node, old) in vis.graph().nodes().iter().zip(before) {
		assert!(node.position().distance(old) < 1e-9);
	}
	Ok(())
}

#[test]
fn dragging_keeps_the_layout_warm() -> Result<()> {
	let mut vis = loaded(&data(&["a", "b"], &[("r", "a", "b")]))?;
	let screen = vis.viewport().world_to_screen(vis.graph().find_node("a").context("a")?.position());
	assert_eq!(vis.node_at(screen), Some("a"));

	vis.start_drag("a")?;
	let target = screen + Vector::new(40.0, 0.0);
	vis.drag_to("a", target)?;
	let frame = vis.tick();
	assert!(!frame.settled);
	let world = vis.viewport().screen_to_world(target);
	assert!(vis.graph().find_node("a").context("a")?.position().distance(world) < 1e-9);

	vis.end_drag("a")?;
	assert!(!vis.graph().find_node("a").context("a")?.fixed);
	Ok(())
}

#[test]
fn zoom_stays_within_limits_and_reports_them() -> Result<()> {
	let mut vis = loaded(&data(&["a"], &[]))?;
	let reached = Rc::new(RefCell::new(Vec::new()));
	let seen = reached.clone();
	vis.on(EventKind::ZoomLimitReached, move |event| {
		if let GraphEvent::ZoomLimitReached(limits) = event {
			seen.borrow_mut().push(*limits);
		}
	});

	for _ in 0..40 {
		vis.zoom_in();
	}
	assert_eq!(vis.viewport().scale(), ZOOM_MAX_SCALE);
	for _ in 0..40 {
		vis.zoom_out();
	}
	assert_eq!(vis.viewport().scale(), ZOOM_MIN_SCALE);
	let reached = reached.borrow();
	assert!(reached.iter().any(|limits| limits.in_reached));
	assert!(reached.iter().any(|limits| limits.out_reached));
	Ok(())
}

#[test]
fn interaction_events_reach_every_listener_in_order() -> Result<()> {
	let mut vis = loaded(&data(&["a", "b"], &[("r", "a", "b")]))?;
	let log = Rc::new(RefCell::new(Vec::new()));
	for tag in ["first", "second"] {
		let log = log.clone();
		vis.on(EventKind::NodeClicked, move |event| {
			if let GraphEvent::NodeClicked(node) = event {
				log.borrow_mut().push(format!("{tag}:{}", node.id));
			}
		});
	}
	vis.click_node("b")?;
	assert_eq!(*log.borrow(), vec!["first:b", "second:b"]);
	Ok(())
}

#[test]
fn grass_survives_a_round_trip() -> Result<()> {
	let text = "node {\n  color: #FFE081;\n  caption: '{name}';\n}\n\nrelationship.KNOWS {\n  shaft-width: 3px;\n}\n";
	let mut style = GraphStyle::default();
	assert!(style.import_grass(text));
	assert_eq!(style.to_sheet(), text);

	let mut vis = loaded(&data(&["a"], &[]))?;
	vis.set_grass(text).context("grass should parse")?;
	let sheet = vis.grass();
	// the unstyled label picks up a default rule after the imported ones
	assert!(sheet.starts_with(text), "{sheet}");
	assert!(sheet.contains("node.Thing {"));
	assert!(vis.svg().contains("caption: &apos;{name}&apos;"));

	assert!(vis.set_grass("node { color").is_none());
	assert_eq!(vis.grass(), sheet);
	Ok(())
}

#[test]
fn style_changes_reach_the_drawing() -> Result<()> {
	let mut vis = loaded(&data(&["a"], &[]))?;
	let patches = vis.change_style(&Selector::parse("node.Thing"), &[("color", "#123456")]);
	assert!(patches.iter().any(|patch| matches!(patch, Patch::UpdateNode(view) if view.fill == "#123456")));
	let legend = vis.legend();
	assert_eq!(legend.labels[0].colors.color, "#123456");
	assert_eq!(legend.labels[0].count, 1);
	Ok(())
}

#[test]
fn selector_escaping_round_trips() {
	let segments = vec![
		String::from("node"),
		String::from("foo.bar.baz"),
		String::from("bax"),
	];
	let text = selector_array_to_string(&segments);
	assert_eq!(text, "node.foo\\.bar\\.baz.bax");
	assert_eq!(selector_string_to_array(&text), segments);
}

#[test]
fn angle_run_search_is_bounded() {
	for count in [1, 2, 7, 40] {
		let list = AngleList::new(vec![
			AngleEntry {
				angle: 90.0,
				fixed: false,
			};
			count
		]);
		let search = find_runs(&list, 30.0);
		assert!(search.steps <= 10 * count + 1, "{count}: {}", search.steps);
	}
}
