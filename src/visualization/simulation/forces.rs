use super::quadtree::QuadNode;
use crate::visualization::geometry::Vector;

/// Approximation threshold: a cell is treated as one body when
/// `side / distance` is below this.
const BARNES_HUT_THETA: f64 = 0.9;
/// Closest distance the charge force is evaluated at.
const MIN_CHARGE_DISTANCE_SQ: f64 = 1.0;

/// Small deterministic offset for coincident bodies, so that two nodes at
/// the same spot separate the same way every run.
pub(super) fn jiggle(a: usize, b: usize) -> Vector {
	let angle = (a as f64 * 0.618_034 + b as f64 * 0.414_214) * std::f64::consts::TAU;
	Vector::from_angle(angle) * 1e-6
}

/// Many-body charge: adds `strength × alpha / d` along the separating
/// vector, approximating distant cells by their centre of charge.
pub(super) fn apply_charge(
	tree: &QuadNode,
	positions: &[Vector],
	strength: f64,
	alpha: f64,
	velocities: &mut [Vector],
) {
	for (index, velocity) in velocities.iter_mut().enumerate() {
		accumulate_charge(tree, index, positions, strength * alpha, velocity);
	}
}

fn accumulate_charge(node: &QuadNode, index: usize, positions: &[Vector], weight: f64, velocity: &mut Vector) {
	if node.mass <= 0.0 {
		return;
	}
	let point = positions[index];

	if node.is_leaf() {
		for &other in &node.indices {
			if other == index {
				continue;
			}
			let mut delta = positions[other] - point;
			if delta.length_sq() == 0.0 {
				delta = jiggle(index, other);
			}
			*velocity += delta * (weight / charge_distance_sq(delta));
		}
		return;
	}

	let delta = node.center_of_mass - point;
	let distance_sq = delta.length_sq();
	let far = !node.bounds.contains(point)
		&& node.bounds.side_length() * node.bounds.side_length() < BARNES_HUT_THETA * BARNES_HUT_THETA * distance_sq;
	if far {
		*velocity += delta * (weight * node.mass / charge_distance_sq(delta));
		return;
	}

	for child in node.children() {
		accumulate_charge(child, index, positions, weight, velocity);
	}
}

fn charge_distance_sq(delta: Vector) -> f64 {
	let distance_sq = delta.length_sq();
	if distance_sq < MIN_CHARGE_DISTANCE_SQ {
		(MIN_CHARGE_DISTANCE_SQ * distance_sq).sqrt().max(f64::EPSILON)
	} else {
		distance_sq
	}
}

/// One spring between two bodies.
#[derive(Clone, Copy, Debug)]
pub(super) struct Link {
	pub(super) source: usize,
	pub(super) target: usize,
	pub(super) distance: f64,
	/// `1 / min(degree)`, so hubs are not dragged around by every leaf.
	pub(super) strength: f64,
	/// Share of the correction applied to the source.
	pub(super) bias: f64,
}

/// Builds springs for every non-loop pair, weighted by node degree.
pub(super) fn links(pairs: &[(usize, usize, f64)], node_count: usize) -> Vec<Link> {
	let mut degree = vec![0_usize; node_count];
	for &(source, target, _) in pairs {
		degree[source] += 1;
		degree[target] += 1;
	}
	pairs
		.iter()
		.map(|&(source, target, distance)| {
			let (from, to) = (degree[source] as f64, degree[target] as f64);
			Link {
				source,
				target,
				distance,
				strength: 1.0 / from.min(to).max(1.0),
				bias: from / (from + to).max(1.0),
			}
		})
		.collect()
}

pub(super) fn apply_links(links: &[Link], positions: &[Vector], alpha: f64, velocities: &mut [Vector]) {
	for link in links {
		let mut delta = (positions[link.target] + velocities[link.target])
			- (positions[link.source] + velocities[link.source]);
		if delta.length_sq() == 0.0 {
			delta = jiggle(link.source, link.target);
		}
		let length = delta.length();
		let correction = delta * ((length - link.distance) / length * alpha * link.strength);
		velocities[link.target] -= correction * link.bias;
		velocities[link.source] += correction * (1.0 - link.bias);
	}
}

/// Pushes apart bodies whose collision circles overlap, using predicted
/// positions and a quadtree to skip distant cells.
pub(super) fn apply_collide(tree: &QuadNode, positions: &[Vector], radii: &[f64], velocities: &mut [Vector]) {
	let predicted = positions
		.iter()
		.zip(velocities.iter())
		.map(|(position, velocity)| *position + *velocity)
		.collect::<Vec<_>>();
	collide_cells(tree, tree, true, &predicted, radii, velocities);
}

fn collide_cells(
	node_a: &QuadNode,
	node_b: &QuadNode,
	same_node: bool,
	positions: &[Vector],
	radii: &[f64],
	velocities: &mut [Vector],
) {
	let reach = node_a.max_radius + node_b.max_radius;
	if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
		return;
	}

	if node_a.is_leaf() && node_b.is_leaf() {
		for (i, &from) in node_a.indices.iter().enumerate() {
			let others = if same_node { &node_a.indices[i + 1..] } else { &node_b.indices[..] };
			for &to in others {
				separate(from, to, positions, radii, velocities);
			}
		}
		return;
	}

	if same_node {
		let children = node_a.children().collect::<Vec<_>>();
		for (first, child_a) in children.iter().enumerate() {
			collide_cells(child_a, child_a, true, positions, radii, velocities);
			for child_b in &children[first + 1..] {
				collide_cells(child_a, child_b, false, positions, radii, velocities);
			}
		}
		return;
	}

	let split_a = !node_a.is_leaf() && (node_b.is_leaf() || node_a.bounds.half_extent >= node_b.bounds.half_extent);
	if split_a {
		for child in node_a.children() {
			collide_cells(child, node_b, false, positions, radii, velocities);
		}
	} else {
		for child in node_b.children() {
			collide_cells(node_a, child, false, positions, radii, velocities);
		}
	}
}

fn separate(from: usize, to: usize, positions: &[Vector], radii: &[f64], velocities: &mut [Vector]) {
	let min_distance = radii[from] + radii[to];
	let mut delta = positions[from] - positions[to];
	if delta.length_sq() == 0.0 {
		delta = jiggle(from, to);
	}
	let distance = delta.length();
	if distance >= min_distance {
		return;
	}
	let push = delta * ((min_distance - distance) / distance);
	let (r_from, r_to) = (radii[from] * radii[from], radii[to] * radii[to]);
	let share = r_to / (r_from + r_to).max(f64::EPSILON);
	velocities[from] += push * share;
	velocities[to] -= push * (1.0 - share);
}

/// Pulls every body toward `center` by `strength × alpha` of the offset.
pub(super) fn apply_center(center: Vector, strength: f64, alpha: f64, positions: &[Vector], velocities: &mut [Vector]) {
	for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
		*velocity += (center - *position) * (strength * alpha);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn charge_pushes_bodies_apart() {
		let positions = vec![Vector::new(-10.0, 0.0), Vector::new(10.0, 0.0)];
		let tree = QuadNode::build(&positions, &[1.0, 1.0]).unwrap();
		let mut velocities = vec![Vector::ZERO; 2];
		apply_charge(&tree, &positions, -400.0, 1.0, &mut velocities);
		assert!(velocities[0].x < 0.0);
		assert!(velocities[1].x > 0.0);
	}

	#[test]
	fn stretched_link_pulls_endpoints_together() {
		let positions = vec![Vector::new(0.0, 0.0), Vector::new(300.0, 0.0)];
		let springs = links(&[(0, 1, 100.0)], 2);
		assert_eq!(springs[0].strength, 1.0);
		assert_eq!(springs[0].bias, 0.5);
		let mut velocities = vec![Vector::ZERO; 2];
		apply_links(&springs, &positions, 1.0, &mut velocities);
		assert!(velocities[0].x > 0.0);
		assert!(velocities[1].x < 0.0);
	}

	#[test]
	fn overlapping_bodies_are_separated() {
		let positions = vec![Vector::new(0.0, 0.0), Vector::new(5.0, 0.0)];
		let radii = [10.0, 10.0];
		let tree = QuadNode::build(&positions, &radii).unwrap();
		let mut velocities = vec![Vector::ZERO; 2];
		apply_collide(&tree, &positions, &radii, &mut velocities);
		assert!((velocities[0].x + 7.5).abs() < 1e-9);
		assert!((velocities[1].x - 7.5).abs() < 1e-9);
	}
}
