use serde::{Deserialize, Serialize};

use super::Result;
use super::simulation::SimulationConfig;

/// Host-facing switches of a [`Visualization`](super::Visualization).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizationConfig {
	/// The view fills the window and follows its size.
	pub is_fullscreen: bool,
	/// Plain wheel scrolling pans the page; zoom needs ctrl, meta or shift.
	pub wheel_zoom_requires_mod_key: bool,
	/// Unstyled labels get generated colours instead of the fixed palette.
	pub use_generated_default_colors: bool,
	/// Fit the whole graph into view after loading it.
	pub initial_zoom_to_fit: bool,
	/// Neighbour count at which an expansion reports its limit as hit.
	pub max_neighbours: usize,
	/// Accept relationships found between nodes already on screen.
	pub autocomplete_relationships: bool,
	/// Nodes drawn from a new result before the rest is cut off.
	pub initial_node_display: usize,
	/// Force and alpha settings.
	pub simulation: SimulationConfig,
}

impl Default for VisualizationConfig {
	fn default() -> Self {
		Self {
			is_fullscreen: false,
			wheel_zoom_requires_mod_key: false,
			use_generated_default_colors: true,
			initial_zoom_to_fit: true,
			max_neighbours: 100,
			autocomplete_relationships: true,
			initial_node_display: 300,
			simulation: SimulationConfig::default(),
		}
	}
}

impl VisualizationConfig {
	/// Reads camelCase JSON; missing keys take their defaults and the
	/// simulation block is sanitised.
	pub fn from_json(json: &str) -> Result<Self> {
		let mut config: Self = serde_json::from_str(json)?;
		config.simulation = config.simulation.sanitized();
		Ok(config)
	}
}
