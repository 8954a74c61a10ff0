use log::debug;
use serde::Serialize;

use crate::visualization::geometry::{BoundingBox, Vector};

pub const ZOOM_MIN_SCALE: f64 = 0.1;
pub const ZOOM_MAX_SCALE: f64 = 2.0;
/// Scale change of one zoom button press.
pub const ZOOM_FACTOR: f64 = 1.3;
/// Margin left around the graph by zoom-to-fit, as a fraction of the view.
pub const FIT_PADDING: f64 = 0.05;

/// Screen = world × `k` + (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

/// Whether the scale sits at either limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomLimits {
	pub in_reached: bool,
	pub out_reached: bool,
}

impl ZoomLimits {
	pub fn any(self) -> bool {
		self.in_reached || self.out_reached
	}
}

/// Pan and zoom of the drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	pub is_fullscreen: bool,
}

impl Viewport {
	/// A viewport with the world origin in the middle.
	pub fn new(width: f64, height: f64) -> Self {
		let (width, height) = (sane_extent(width), sane_extent(height));
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			width,
			height,
			is_fullscreen: false,
		}
	}

	pub fn scale(&self) -> f64 {
		self.transform.k
	}

	pub fn limits(&self) -> ZoomLimits {
		ZoomLimits {
			in_reached: self.transform.k >= ZOOM_MAX_SCALE - 1e-9,
			out_reached: self.transform.k <= ZOOM_MIN_SCALE + 1e-9,
		}
	}

	/// Resizes, keeping the world point in the middle of the view in the
	/// middle.
	pub fn resize(&mut self, is_fullscreen: bool, width: f64, height: f64) {
		let centre = self.screen_to_world(self.screen_centre());
		self.is_fullscreen = is_fullscreen;
		self.width = sane_extent(width);
		self.height = sane_extent(height);
		let screen = self.screen_centre();
		self.transform.x = screen.x - centre.x * self.transform.k;
		self.transform.y = screen.y - centre.y * self.transform.k;
	}

	pub fn screen_centre(&self) -> Vector {
		Vector::new(self.width / 2.0, self.height / 2.0)
	}

	pub fn screen_to_world(&self, point: Vector) -> Vector {
		Vector::new(
			(point.x - self.transform.x) / self.transform.k,
			(point.y - self.transform.y) / self.transform.k,
		)
	}

	pub fn world_to_screen(&self, point: Vector) -> Vector {
		Vector::new(
			point.x * self.transform.k + self.transform.x,
			point.y * self.transform.k + self.transform.y,
		)
	}

	/// Scales by `factor` around `pointer` (screen space), keeping the world
	/// point under it fixed. The result is clamped to the zoom limits.
	pub fn zoom_at(&mut self, pointer: Vector, factor: f64) -> ZoomLimits {
		if !factor.is_finite() || factor <= 0.0 || !pointer.is_finite() {
			return self.limits();
		}
		let anchor = self.screen_to_world(pointer);
		let k = (self.transform.k * factor).clamp(ZOOM_MIN_SCALE, ZOOM_MAX_SCALE);
		self.transform = ViewTransform {
			x: pointer.x - anchor.x * k,
			y: pointer.y - anchor.y * k,
			k,
		};
		let limits = self.limits();
		if limits.any() {
			debug!("zoom limit reached at scale {k}");
		}
		limits
	}

	pub fn zoom_in(&mut self) -> ZoomLimits {
		self.zoom_at(self.screen_centre(), ZOOM_FACTOR)
	}

	pub fn zoom_out(&mut self) -> ZoomLimits {
		self.zoom_at(self.screen_centre(), 1.0 / ZOOM_FACTOR)
	}

	/// Zoom for a wheel event with vertical `delta` in pixels.
	pub fn wheel(&mut self, pointer: Vector, delta: f64) -> ZoomLimits {
		self.zoom_at(pointer, 2_f64.powf(-delta * 0.002))
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		if dx.is_finite() && dy.is_finite() {
			self.transform.x += dx;
			self.transform.y += dy;
		}
	}

	/// Centres `bounds` and scales it to fill the view, less padding.
	pub fn zoom_to_fit(&mut self, bounds: BoundingBox) -> ZoomLimits {
		let (width, height) = (bounds.width().max(1.0), bounds.height().max(1.0));
		let fill = 1.0 - FIT_PADDING;
		let k = (fill * (self.width / width).min(self.height / height))
			.clamp(ZOOM_MIN_SCALE, ZOOM_MAX_SCALE);
		let centre = bounds.center();
		if !k.is_finite() || !centre.is_finite() {
			return self.limits();
		}
		self.transform = ViewTransform {
			x: self.width / 2.0 - centre.x * k,
			y: self.height / 2.0 - centre.y * k,
			k,
		};
		self.limits()
	}
}

fn sane_extent(value: f64) -> f64 {
	if value.is_finite() && value > 0.0 { value } else { 1.0 }
}
