use std::f64::consts::PI;
use std::fmt::Write as FmtWrite;

use serde::Serialize;

use super::{Vector, c};

/// Below this many degrees an arc is drawn straight.
const MIN_ARC_DEFLECTION: f64 = 0.5;

/// Shaft and head dimensions shared by every arrow kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArrowParams {
	pub shaft_width: f64,
	pub head_width: f64,
	pub head_height: f64,
}

impl ArrowParams {
	/// Head dimensions follow the shaft width.
	pub fn for_shaft(shaft_width: f64) -> Self {
		let shaft_width = if shaft_width.is_finite() { shaft_width.max(0.5) } else { 1.0 };
		let head_width = shaft_width + 6.0;
		Self {
			shaft_width,
			head_width,
			head_height: head_width,
		}
	}
}

/// Discriminant of [`ArrowGeometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowKind {
	Straight,
	Arc,
	Loop,
}

/// Resolved arrow shape of one relationship, in the relationship's local
/// frame: source centre at the origin and the target (or, for loops, the
/// loop direction) along +x.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArrowGeometry {
	Straight {
		start: f64,
		shaft_end: f64,
		tip: f64,
		params: ArrowParams,
	},
	Arc {
		deflection: f64,
		centre: Vector,
		radius: f64,
		start_attach: Vector,
		shaft_end: Vector,
		tip: Vector,
		/// SVG sweep flag for travelling from start to tip.
		sweep: bool,
		mid: Vector,
		shaft_length: f64,
		params: ArrowParams,
	},
	Loop {
		spread: f64,
		centre: Vector,
		radius: f64,
		/// Boundary point, tangent point, tangent point, head base, tip.
		points: [Vector; 5],
		params: ArrowParams,
	},
}

impl ArrowGeometry {
	pub fn straight(start_radius: f64, end_radius: f64, centre_distance: f64, params: ArrowParams) -> Self {
		let start = start_radius.max(0.0);
		let tip = (centre_distance - end_radius.max(0.0)).max(start);
		let shaft_end = (tip - params.head_height).max(start);
		Self::Straight {
			start,
			shaft_end,
			tip,
			params,
		}
	}

	/// Circular arc leaving the source boundary `deflection` degrees off the
	/// centre line and entering the target at the mirrored angle.
	pub fn arc(
		start_radius: f64,
		end_radius: f64,
		centre_distance: f64,
		deflection: f64,
		params: ArrowParams,
	) -> Self {
		if deflection.abs() < MIN_ARC_DEFLECTION {
			return Self::straight(start_radius, end_radius, centre_distance, params);
		}

		let theta = deflection.to_radians();
		let direction = Vector::from_angle(theta);
		let start_attach = direction * start_radius;
		let tip = Vector::new(centre_distance - end_radius * theta.cos(), end_radius * theta.sin());

		// Centre lies on the normal through the start attachment, equidistant
		// from the start attachment and the tip.
		let normal = direction.perp();
		let chord = start_attach - tip;
		let denominator = 2.0 * normal.dot(chord);
		if denominator.abs() < 1e-9 {
			return Self::straight(start_radius, end_radius, centre_distance, params);
		}
		let offset = -chord.length_sq() / denominator;
		let centre = start_attach + normal * offset;
		let radius = offset.abs();

		let from_start = start_attach - centre;
		let from_tip = tip - centre;
		let sweep = from_start.cross(from_tip) > 0.0;
		let travel = if sweep { 1.0 } else { -1.0 };
		let total_angle = (from_start.dot(from_tip) / (radius * radius)).clamp(-1.0, 1.0).acos();

		let head_angle = (params.head_height / radius).min(total_angle);
		let shaft_end = centre + from_tip.rotate(-travel * head_angle);
		let shaft_length = (total_angle - head_angle) * radius;
		let mid = centre
			+ from_start
				.rotate(travel * (total_angle - head_angle) / 2.0)
				.normalized_or(Vector::new(0.0, 1.0))
				* radius;

		Self::Arc {
			deflection,
			centre,
			radius,
			start_attach,
			shaft_end,
			tip,
			sweep,
			mid,
			shaft_length,
			params,
		}
	}

	/// Loop leaving and re-entering a node's own boundary, `spread` degrees
	/// wide, reaching `straight_length` past the boundary before turning.
	pub fn looped(node_radius: f64, straight_length: f64, spread: f64, params: ArrowParams) -> Self {
		let half = (spread.clamp(5.0, 170.0) / 2.0).to_radians();
		let r1 = node_radius.max(0.0);
		let r2 = r1 + params.head_height;
		let r3 = r1 + straight_length.max(params.head_height + 1.0);

		let out_ray = Vector::from_angle(-half);
		let in_ray = Vector::from_angle(half);
		let centre = Vector::new(r3 / half.cos(), 0.0);
		let radius = r3 * half.tan();

		Self::Loop {
			spread,
			centre,
			radius,
			points: [out_ray * r1, out_ray * r3, in_ray * r3, in_ray * r2, in_ray * r1],
			params,
		}
	}

	pub fn kind(&self) -> ArrowKind {
		match self {
			Self::Straight { .. } => ArrowKind::Straight,
			Self::Arc { .. } => ArrowKind::Arc,
			Self::Loop { .. } => ArrowKind::Loop,
		}
	}

	pub fn deflection(&self) -> f64 {
		match self {
			Self::Arc { deflection, .. } => *deflection,
			_ => 0.0,
		}
	}

	pub fn params(&self) -> ArrowParams {
		match self {
			Self::Straight { params, .. } | Self::Arc { params, .. } | Self::Loop { params, .. } => {
				*params
			}
		}
	}

	/// Length of the shaft available for a caption.
	pub fn shaft_length(&self) -> f64 {
		match self {
			Self::Straight { start, shaft_end, .. } => shaft_end - start,
			Self::Arc { shaft_length, .. } => *shaft_length,
			Self::Loop { radius, points, .. } => {
				let half = points[2].y.atan2(points[2].x);
				(points[1].length() - points[0].length())
					+ (points[2].length() - points[3].length())
					+ radius * (PI + 2.0 * half)
			}
		}
	}

	/// Where the caption sits.
	pub fn mid_shaft_point(&self) -> Vector {
		match self {
			Self::Straight { start, shaft_end, .. } => Vector::new((start + shaft_end) / 2.0, 0.0),
			Self::Arc { mid, .. } => *mid,
			Self::Loop { centre, radius, .. } => Vector::new(centre.x + radius, 0.0),
		}
	}

	/// Filled outline as SVG path data. A positive `caption_gap` breaks the
	/// shaft around the mid point to leave room for an external caption.
	pub fn outline(&self, caption_gap: f64) -> String {
		let mut path = PathData::default();
		match self {
			Self::Straight {
				start,
				shaft_end,
				tip,
				params,
			} => {
				let shaft = params.shaft_width / 2.0;
				let head = params.head_width / 2.0;
				if tip - start <= 0.0 {
					return String::new();
				}
				let shaft_len = shaft_end - start;
				if caption_gap > 0.0 && shaft_len > caption_gap {
					let mid = (start + shaft_end) / 2.0;
					let start_break = mid - caption_gap / 2.0;
					let end_break = mid + caption_gap / 2.0;
					path.rect(*start, start_break, shaft);
					path.move_to(Vector::new(end_break, shaft));
				} else {
					path.move_to(Vector::new(*start, shaft));
				}
				path.line_to(Vector::new(*shaft_end, shaft));
				path.line_to(Vector::new(*shaft_end, head));
				path.line_to(Vector::new(*tip, 0.0));
				path.line_to(Vector::new(*shaft_end, -head));
				path.line_to(Vector::new(*shaft_end, -shaft));
				if caption_gap > 0.0 && shaft_len > caption_gap {
					let end_break = (start + shaft_end) / 2.0 + caption_gap / 2.0;
					path.line_to(Vector::new(end_break, -shaft));
				} else {
					path.line_to(Vector::new(*start, -shaft));
				}
				path.close();
			}
			Self::Arc {
				centre,
				radius,
				start_attach,
				shaft_end,
				tip,
				sweep,
				mid,
				shaft_length,
				params,
				..
			} => {
				let shaft = params.shaft_width / 2.0;
				let head = params.head_width / 2.0;
				let ring = Ring {
					centre: *centre,
					radius: *radius,
					sweep: *sweep,
				};
				let mut band_start = *start_attach;
				if caption_gap > 0.0 && *shaft_length > caption_gap {
					let travel = if *sweep { 1.0 } else { -1.0 };
					let half_gap = caption_gap / (2.0 * radius);
					let before = *centre + (*mid - *centre).rotate(-travel * half_gap);
					let after = *centre + (*mid - *centre).rotate(travel * half_gap);
					ring.band(&mut path, *start_attach, before, shaft);
					band_start = after;
				}
				let outward = (*shaft_end - *centre).normalized_or(Vector::new(0.0, 1.0));
				if *shaft_length > 0.0 {
					path.move_to(ring.offset(band_start, shaft));
					path.arc_to(radius + shaft, false, *sweep, ring.offset(*shaft_end, shaft));
				} else {
					path.move_to(ring.offset(*shaft_end, shaft));
				}
				path.line_to(*shaft_end + outward * head);
				path.line_to(*tip);
				path.line_to(*shaft_end - outward * head);
				path.line_to(ring.offset(*shaft_end, -shaft));
				if *shaft_length > 0.0 {
					path.arc_to(radius - shaft, false, !*sweep, ring.offset(band_start, -shaft));
				}
				path.close();
			}
			Self::Loop {
				centre,
				radius,
				points,
				params,
				..
			} => {
				let shaft = params.shaft_width / 2.0;
				let head = params.head_width / 2.0;
				let out_normal = (points[1] - *centre).normalized_or(Vector::new(0.0, -1.0));
				let in_normal = (points[2] - *centre).normalized_or(Vector::new(0.0, 1.0));
				path.move_to(points[0] + out_normal * shaft);
				path.line_to(points[1] + out_normal * shaft);
				path.arc_large(radius + shaft, true, points[2] + in_normal * shaft);
				path.line_to(points[3] + in_normal * shaft);
				path.line_to(points[3] + in_normal * head);
				path.line_to(points[4]);
				path.line_to(points[3] - in_normal * head);
				path.line_to(points[3] - in_normal * shaft);
				path.line_to(points[2] - in_normal * shaft);
				path.arc_large((radius - shaft).max(0.0), false, points[1] - out_normal * shaft);
				path.line_to(points[0] - out_normal * shaft);
				path.close();
			}
		}
		path.finish()
	}

	/// Hit area at least `min_width` wide following the shaft.
	pub fn overlay(&self, min_width: f64) -> String {
		let mut path = PathData::default();
		match self {
			Self::Straight { start, tip, params, .. } => {
				let half = min_width.max(params.shaft_width) / 2.0;
				path.rect(*start, *tip, half);
			}
			Self::Arc {
				centre,
				radius,
				start_attach,
				tip,
				sweep,
				params,
				..
			} => {
				let half = min_width.max(params.shaft_width) / 2.0;
				let ring = Ring {
					centre: *centre,
					radius: *radius,
					sweep: *sweep,
				};
				ring.band(&mut path, *start_attach, *tip, half);
			}
			Self::Loop {
				centre,
				radius,
				points,
				params,
				..
			} => {
				let half = min_width.max(params.shaft_width) / 2.0;
				let out_normal = (points[1] - *centre).normalized_or(Vector::new(0.0, -1.0));
				let in_normal = (points[2] - *centre).normalized_or(Vector::new(0.0, 1.0));
				path.move_to(points[0] + out_normal * half);
				path.line_to(points[1] + out_normal * half);
				path.arc_large(radius + half, true, points[2] + in_normal * half);
				path.line_to(points[4] + in_normal * half);
				path.line_to(points[4] - in_normal * half);
				path.line_to(points[2] - in_normal * half);
				path.arc_large((radius - half).max(0.0), false, points[1] - out_normal * half);
				path.line_to(points[0] - out_normal * half);
				path.close();
			}
		}
		path.finish()
	}
}

struct Ring {
	centre: Vector,
	radius: f64,
	sweep: bool,
}

impl Ring {
	fn offset(&self, point: Vector, by: f64) -> Vector {
		let outward = (point - self.centre).normalized_or(Vector::new(0.0, 1.0));
		self.centre + outward * (self.radius + by)
	}

	/// Closed band of half-width `half` along the ring from `from` to `to`.
	fn band(&self, path: &mut PathData, from: Vector, to: Vector, half: f64) {
		path.move_to(self.offset(from, half));
		path.arc_to(self.radius + half, false, self.sweep, self.offset(to, half));
		path.line_to(self.offset(to, -half));
		path.arc_to((self.radius - half).max(0.0), false, !self.sweep, self.offset(from, -half));
		path.close();
	}
}

#[derive(Default)]
struct PathData {
	data: String,
}

impl PathData {
	fn push(&mut self, command: &str) {
		if !self.data.is_empty() {
			self.data.push(' ');
		}
		self.data.push_str(command);
	}

	fn move_to(&mut self, point: Vector) {
		self.push(&format!("M {} {}", c(point.x), c(point.y)));
	}

	fn line_to(&mut self, point: Vector) {
		self.push(&format!("L {} {}", c(point.x), c(point.y)));
	}

	fn arc_to(&mut self, radius: f64, large: bool, sweep: bool, point: Vector) {
		let mut command = String::new();
		let _ = write!(
			command,
			"A {r} {r} 0 {} {} {} {}",
			u8::from(large),
			u8::from(sweep),
			c(point.x),
			c(point.y),
			r = c(radius)
		);
		self.push(&command);
	}

	fn arc_large(&mut self, radius: f64, sweep: bool, point: Vector) {
		self.arc_to(radius, true, sweep, point);
	}

	fn rect(&mut self, from: f64, to: f64, half: f64) {
		self.move_to(Vector::new(from, half));
		self.line_to(Vector::new(to, half));
		self.line_to(Vector::new(to, -half));
		self.line_to(Vector::new(from, -half));
		self.close();
	}

	fn close(&mut self) {
		self.push("Z");
	}

	fn finish(self) -> String {
		self.data
	}
}
