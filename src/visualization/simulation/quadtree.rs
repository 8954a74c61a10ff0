use crate::visualization::geometry::Vector;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
	pub(super) center: Vector,
	pub(super) half_extent: f64,
}

impl QuadBounds {
	fn from_points(points: &[Vector]) -> Option<Self> {
		let mut min = Vector::new(f64::INFINITY, f64::INFINITY);
		let mut max = Vector::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
		for point in points {
			min.x = min.x.min(point.x);
			min.y = min.y.min(point.y);
			max.x = max.x.max(point.x);
			max.y = max.y.max(point.y);
		}
		if !min.is_finite() || !max.is_finite() {
			return None;
		}

		let span = (max.x - min.x).max(max.y - min.y).max(1.0);
		Some(Self {
			center: (min + max) * 0.5,
			half_extent: span * 0.5 + 1.0,
		})
	}

	pub(super) fn contains(self, point: Vector) -> bool {
		(point.x - self.center.x).abs() <= self.half_extent
			&& (point.y - self.center.y).abs() <= self.half_extent
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let offset = match quadrant {
			0 => Vector::new(-quarter, -quarter),
			1 => Vector::new(quarter, -quarter),
			2 => Vector::new(-quarter, quarter),
			_ => Vector::new(quarter, quarter),
		};
		Self {
			center: self.center + offset,
			half_extent: quarter,
		}
	}

	fn quadrant_for(self, point: Vector) -> usize {
		match (point.x >= self.center.x, point.y >= self.center.y) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}

	pub(super) fn side_length(self) -> f64 {
		self.half_extent * 2.0
	}

	/// Squared gap between two boxes; zero when they overlap.
	pub(super) fn distance_sq_to(self, other: Self) -> f64 {
		let reach = self.half_extent + other.half_extent;
		let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
		let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
		dx * dx + dy * dy
	}
}

/// Barnes–Hut cell: aggregate charge position and body count, with the
/// bodies themselves kept only in leaves.
pub(super) struct QuadNode {
	pub(super) bounds: QuadBounds,
	pub(super) center_of_mass: Vector,
	pub(super) mass: f64,
	/// Largest body radius in the cell, for collision pruning.
	pub(super) max_radius: f64,
	pub(super) indices: Vec<usize>,
	pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	pub(super) fn build(positions: &[Vector], radii: &[f64]) -> Option<Self> {
		let bounds = QuadBounds::from_points(positions)?;
		let indices = (0..positions.len()).collect();
		Some(Self::build_node(bounds, indices, positions, radii, 0))
	}

	fn build_node(
		bounds: QuadBounds,
		indices: Vec<usize>,
		positions: &[Vector],
		radii: &[f64],
		depth: usize,
	) -> Self {
		let mut center_of_mass = Vector::ZERO;
		let mut max_radius = 0.0_f64;
		for &index in &indices {
			center_of_mass += positions[index];
			max_radius = max_radius.max(radii[index]);
		}
		let mass = indices.len() as f64;
		if mass > 0.0 {
			center_of_mass = center_of_mass * (1.0 / mass);
		}

		let mut node = Self {
			bounds,
			center_of_mass,
			mass,
			max_radius,
			indices,
			children: std::array::from_fn(|_| None),
		};
		if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
		for &index in &node.indices {
			buckets[bounds.quadrant_for(positions[index])].push(index);
		}
		// coincident bodies cannot be split further
		if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				positions,
				radii,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	pub(super) fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}

	pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
		self.children.iter().filter_map(|child| child.as_deref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn count_bodies(node: &QuadNode) -> usize {
		node.indices.len() + node.children().map(count_bodies).sum::<usize>()
	}

	#[test]
	fn every_body_lands_in_exactly_one_leaf() {
		let positions = (0..100)
			.map(|i| Vector::new((i % 10) as f64 * 13.0, (i / 10) as f64 * 7.0))
			.collect::<Vec<_>>();
		let radii = vec![5.0; positions.len()];
		let tree = QuadNode::build(&positions, &radii).unwrap();
		assert!(!tree.is_leaf());
		assert_eq!(tree.mass, 100.0);
		assert_eq!(count_bodies(&tree), 100);
	}

	#[test]
	fn coincident_bodies_stay_in_one_leaf() {
		let positions = vec![Vector::new(1.0, 1.0); 20];
		let radii = vec![1.0; 20];
		let tree = QuadNode::build(&positions, &radii).unwrap();
		assert!(tree.is_leaf());
		assert_eq!(tree.indices.len(), 20);
	}

	#[test]
	fn non_finite_positions_build_nothing() {
		assert!(QuadNode::build(&[Vector::new(f64::NAN, 0.0)], &[1.0]).is_none());
	}
}
