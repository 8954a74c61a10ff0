use log::warn;

use crate::visualization::geometry::Vector;
use crate::visualization::render::Patch;
use crate::visualization::{Result, Visualization};

/// Pointer travel in pixels after which a press counts as a drag.
pub const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub last_x: f64,
	pub last_y: f64,
	pub moved: bool,
}

/// The controller plus what the pointer is doing to it.
pub struct GraphViewState {
	pub vis: Visualization,
	pub drag: DragState,
	pub pan: PanState,
	pub animation_running: bool,
}

impl GraphViewState {
	pub fn new(vis: Visualization) -> Self {
		Self {
			vis,
			drag: DragState::default(),
			pan: PanState::default(),
			animation_running: true,
		}
	}

	/// Advances the layout by one frame while it is moving. Returns the
	/// patches and whether another frame is wanted.
	pub fn frame(&mut self) -> (Vec<Patch>, bool) {
		if !self.animation_running {
			return (Vec::new(), false);
		}
		let frame = self.vis.tick();
		self.animation_running = !frame.settled;
		(frame.patches, self.animation_running)
	}

	/// Pointer down at screen `(x, y)`: grabs the node under it or starts
	/// panning.
	pub fn press(&mut self, x: f64, y: f64) {
		let hit = self.vis.node_at(Vector::new(x, y)).map(str::to_owned);
		match hit {
			Some(id) => {
				if let Err(err) = self.vis.start_drag(&id) {
					warn!("cannot drag: {err}");
					return;
				}
				self.drag = DragState {
					node_id: Some(id),
					start_x: x,
					start_y: y,
					moved: false,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: x,
					start_y: y,
					last_x: x,
					last_y: y,
					moved: false,
				};
			}
		}
	}

	/// Pointer moved. `relationship` is the relationship element under the
	/// pointer, if any.
	pub fn move_to(&mut self, x: f64, y: f64, relationship: Option<&str>) -> Vec<Patch> {
		if let Some(id) = self.drag.node_id.clone() {
			self.drag.moved |= travelled(self.drag.start_x, self.drag.start_y, x, y);
			if self.drag.moved {
				if let Err(err) = self.vis.drag_to(&id, Vector::new(x, y)) {
					warn!("drag lost its node: {err}");
				}
				self.animation_running = true;
			}
			return Vec::new();
		}
		if self.pan.active {
			self.pan.moved |= travelled(self.pan.start_x, self.pan.start_y, x, y);
			self.vis.pan_by(x - self.pan.last_x, y - self.pan.last_y);
			self.pan.last_x = x;
			self.pan.last_y = y;
			return Vec::new();
		}

		let node = self.vis.node_at(Vector::new(x, y)).map(str::to_owned);
		let relationship = if node.is_some() { None } else { relationship };
		let mut patches = logged(self.vis.hover_node(node.as_deref()));
		patches.extend(logged(self.vis.hover_relationship(relationship)));
		patches
	}

	/// Pointer up. A press that did not travel is a click.
	pub fn release(&mut self, relationship: Option<&str>) -> Vec<Patch> {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		if let Some(id) = drag.node_id {
			if let Err(err) = self.vis.end_drag(&id) {
				warn!("cannot release drag: {err}");
			}
			if !drag.moved {
				return logged(self.vis.click_node(&id));
			}
			return Vec::new();
		}
		if pan.active && !pan.moved {
			return match relationship {
				Some(id) => logged(self.vis.click_relationship(id)),
				None => self.vis.click_canvas(),
			};
		}
		Vec::new()
	}

	pub fn double_click(&mut self, x: f64, y: f64) -> Vec<Patch> {
		let hit = self.vis.node_at(Vector::new(x, y)).map(str::to_owned);
		match hit {
			Some(id) => {
				self.animation_running = true;
				logged(self.vis.double_click_node(&id))
			}
			None => Vec::new(),
		}
	}

	/// Pointer left the view: drops any drag, pan and hover.
	pub fn leave(&mut self) -> Vec<Patch> {
		if let Some(id) = std::mem::take(&mut self.drag).node_id {
			if let Err(err) = self.vis.end_drag(&id) {
				warn!("cannot release drag: {err}");
			}
		}
		self.pan = PanState::default();
		let mut patches = logged(self.vis.hover_node(None));
		patches.extend(logged(self.vis.hover_relationship(None)));
		patches
	}
}

fn travelled(start_x: f64, start_y: f64, x: f64, y: f64) -> bool {
	Vector::new(x - start_x, y - start_y).length() > CLICK_TOLERANCE
}

/// Patches of a controller call; errors are logged and draw nothing.
pub fn logged(result: Result<Vec<Patch>>) -> Vec<Patch> {
	result.unwrap_or_else(|err| {
		warn!("{err}");
		Vec::new()
	})
}
