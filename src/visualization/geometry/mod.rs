//! Pure geometry used by the layout engine: vectors, angle runs, arrow
//! shapes and text measurement.

mod angles;
mod arrows;
mod text;

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::Serialize;

pub use angles::{AngleEntry, AngleList, Run, RunSearch, find_runs};
pub use arrows::{ArrowGeometry, ArrowKind, ArrowParams};
pub use text::{
	DEFAULT_CACHE_CAPACITY, HeuristicMeasurer, TextMeasurementCache, TextMeasurer, font_size,
};

/// A 2D point or displacement in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vector {
	pub x: f64,
	pub y: f64,
}

impl Vector {
	pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Unit vector at `radians` from the +x axis.
	pub fn from_angle(radians: f64) -> Self {
		Self::new(radians.cos(), radians.sin())
	}

	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}

	pub fn dot(self, other: Self) -> f64 {
		self.x * other.x + self.y * other.y
	}

	pub fn cross(self, other: Self) -> f64 {
		self.x * other.y - self.y * other.x
	}

	/// Returns the unit vector, or `fallback` when the length is ~0.
	pub fn normalized_or(self, fallback: Self) -> Self {
		let length = self.length();
		if length > 1e-9 { self * (1.0 / length) } else { fallback }
	}

	/// Counter-clockwise perpendicular.
	pub fn perp(self) -> Self {
		Self::new(-self.y, self.x)
	}

	pub fn rotate(self, radians: f64) -> Self {
		let (sin, cos) = radians.sin_cos();
		Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	pub fn distance(self, other: Self) -> f64 {
		(self - other).length()
	}
}

impl Add for Vector {
	type Output = Vector;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vector {
	type Output = Vector;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vector {
	type Output = Vector;
	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs)
	}
}

impl Neg for Vector {
	type Output = Vector;
	fn neg(self) -> Self {
		Self::new(-self.x, -self.y)
	}
}

impl AddAssign for Vector {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl SubAssign for Vector {
	fn sub_assign(&mut self, rhs: Self) {
		self.x -= rhs.x;
		self.y -= rhs.y;
	}
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
	pub min: Vector,
	pub max: Vector,
}

impl BoundingBox {
	pub fn around(center: Vector, radius: f64) -> Self {
		Self {
			min: Vector::new(center.x - radius, center.y - radius),
			max: Vector::new(center.x + radius, center.y + radius),
		}
	}

	pub fn union(self, other: Self) -> Self {
		Self {
			min: Vector::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
			max: Vector::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
		}
	}

	pub fn width(self) -> f64 {
		self.max.x - self.min.x
	}

	pub fn height(self) -> f64 {
		self.max.y - self.min.y
	}

	pub fn center(self) -> Vector {
		(self.min + self.max) * 0.5
	}
}

/// Normalises an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
	let wrapped = angle % 360.0;
	if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}

/// Formats a coordinate for SVG attributes, rounded to two decimals.
pub(crate) fn c(value: f64) -> f64 {
	let rounded = (value * 100.0).round() / 100.0;
	if rounded == 0.0 { 0.0 } else { rounded }
}
