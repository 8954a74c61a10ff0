use leptos::prelude::*;

use crate::components::graph_view::GraphView;
use crate::visualization::VisualizationConfig;
use crate::visualization::model::{BasicNode, BasicRelationship, GraphData};

const SAMPLE_GRASS: &str = "node {
  diameter: 50px;
  color: #A5ABB6;
  border-color: #9AA1AC;
  border-width: 2px;
  text-color-internal: #FFFFFF;
  font-size: 10px;
}

relationship {
  color: #A5ABB6;
  shaft-width: 1px;
  font-size: 8px;
  padding: 3px;
  text-color-external: #000000;
  text-color-internal: #FFFFFF;
  caption: '<type>';
}

node.Movie {
  diameter: 65px;
  caption: '{title}';
}
";

/// A small movie graph: parallel relationships between two people, a
/// self-loop and a few movies.
fn sample_data() -> GraphData {
	let people = [
		("keanu", "Keanu Reeves", 1964),
		("carrie", "Carrie-Anne Moss", 1967),
		("laurence", "Laurence Fishburne", 1961),
	];
	let movies = [("matrix", "The Matrix", 1999), ("reloaded", "The Matrix Reloaded", 2003)];

	let mut nodes = people
		.iter()
		.map(|(id, name, born)| {
			BasicNode::new(*id, &["Person"])
				.with_property("name", *name)
				.with_property("born", *born)
		})
		.collect::<Vec<_>>();
	nodes.extend(movies.iter().map(|(id, title, released)| {
		BasicNode::new(*id, &["Movie"])
			.with_property("title", *title)
			.with_property("released", *released)
	}));

	let mut relationships = Vec::new();
	for (person, _, _) in &people {
		for (movie, _, _) in &movies {
			relationships.push(BasicRelationship::new(
				format!("{person}-{movie}"),
				*person,
				*movie,
				"ACTED_IN",
			));
		}
	}
	relationships.extend([
		BasicRelationship::new("knows-1", "keanu", "carrie", "KNOWS"),
		BasicRelationship::new("knows-2", "carrie", "keanu", "KNOWS"),
		BasicRelationship::new("admires", "keanu", "carrie", "ADMIRES"),
		BasicRelationship::new("mentors", "laurence", "laurence", "MENTORS"),
	]);

	GraphData { nodes, relationships }
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(sample_data);
	let config = VisualizationConfig {
		is_fullscreen: true,
		wheel_zoom_requires_mod_key: false,
		..VisualizationConfig::default()
	};

	view! {
		<div class="fullscreen-graph">
			<GraphView data=graph_data config=config grass=SAMPLE_GRASS />
			<div class="graph-overlay">
				<h1>"Graph Visualization"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag the background to pan. Double-click an expanded node to collapse it."
				</p>
			</div>
		</div>
	}
}
