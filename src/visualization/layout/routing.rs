use super::{LayoutEngine, font};
use crate::visualization::geometry::{AngleEntry, AngleList, ArrowGeometry, ArrowParams, Vector, find_runs, normalize_degrees};
use crate::visualization::model::Graph;
use crate::visualization::style::GraphStyle;

/// Angle between neighbouring arcs of one bundle, in degrees.
pub const ARC_DEFLECTION_STEP: f64 = 30.0;
/// Largest angle between the outermost arcs of a bundle.
pub const MAX_TOTAL_DEFLECTION: f64 = 150.0;
/// Opening angle of a self-loop.
pub const LOOP_SPREAD: f64 = 30.0;
/// How far a self-loop reaches past the node boundary.
pub const LOOP_STRAIGHT_LENGTH: f64 = 40.0;

const DEFAULT_SHAFT_WIDTH: f64 = 1.0;
const DEFAULT_REL_FONT_SIZE: f64 = 8.0;
const DEFAULT_CAPTION_PADDING: f64 = 3.0;

/// Caption text and line height per relationship.
pub(super) fn resolve_captions(graph: &mut Graph, style: &GraphStyle) {
	for rel in graph.relationships_mut() {
		let element = style.for_relationship(rel);
		rel.caption = element.caption(&*rel);
		rel.caption_height = element.number_or("font-size", DEFAULT_REL_FONT_SIZE).max(1.0);
	}
}

/// Direction and centre distance from source to target.
pub(super) fn compute_natural_angles(graph: &mut Graph) {
	let (nodes, relationships) = graph.split_mut();
	for rel in relationships.iter_mut().filter(|rel| !rel.is_loop()) {
		let delta = nodes[rel.target_index()].position() - nodes[rel.source_index()].position();
		rel.natural_angle = normalize_degrees(delta.y.atan2(delta.x).to_degrees());
		rel.centre_distance = delta.length();
	}
}

/// Points self-loops into the free sectors around their node, each loop
/// going where it leaves the most room, then spreads loops that still sit
/// closer than [`LOOP_SPREAD`] between their fixed neighbours. If the spread
/// pass gives up, the loops keep the angles they had before this pass.
pub(super) fn distribute_loop_angles(graph: &mut Graph) {
	let (nodes, relationships) = graph.split_mut();
	let mut incident = vec![Vec::new(); nodes.len()];
	for (index, rel) in relationships.iter().enumerate() {
		incident[rel.source_index()].push(index);
		if !rel.is_loop() {
			incident[rel.target_index()].push(index);
		}
	}

	for (node_index, rel_indices) in incident.iter().enumerate() {
		let loops = rel_indices
			.iter()
			.copied()
			.filter(|&index| relationships[index].is_loop())
			.collect::<Vec<_>>();
		if loops.is_empty() {
			continue;
		}

		let mut angles = rel_indices
			.iter()
			.map(|&index| &relationships[index])
			.filter(|rel| !rel.is_loop())
			.map(|rel| {
				if rel.source_index() == node_index {
					rel.natural_angle
				} else {
					normalize_degrees(rel.natural_angle + 180.0)
				}
			})
			.collect::<Vec<_>>();
		angles.sort_by(f64::total_cmp);

		let previous = loops
			.iter()
			.map(|&index| relationships[index].natural_angle)
			.collect::<Vec<_>>();
		for (&index, angle) in loops.iter().zip(loop_slots(&angles, loops.len())) {
			relationships[index].natural_angle = angle;
		}

		// Owner of each sorted entry: None for fixed angles, else the loop.
		let mut tagged = angles
			.iter()
			.map(|&angle| (angle, None))
			.chain(loops.iter().map(|&index| (relationships[index].natural_angle, Some(index))))
			.collect::<Vec<_>>();
		tagged.sort_by(|a, b| a.0.total_cmp(&b.0));
		let list = AngleList::new(
			tagged
				.iter()
				.map(|&(angle, owner)| AngleEntry {
					angle,
					fixed: owner.is_none(),
				})
				.collect(),
		);

		let search = find_runs(&list, LOOP_SPREAD);
		if search.aborted {
			for (&index, &angle) in loops.iter().zip(&previous) {
				relationships[index].natural_angle = angle;
			}
			continue;
		}
		for run in search.runs {
			for (entry, angle) in list.spread(run, LOOP_SPREAD) {
				if let Some(index) = tagged[entry].1 {
					relationships[index].natural_angle = angle;
				}
			}
		}
	}
}

/// Free sectors between consecutive sorted angles, as `(start, end)` with
/// `end` possibly past 360. With no angles the one sector starts pointing
/// down so a lone loop points up.
fn free_sectors(sorted: &[f64]) -> Vec<(f64, f64)> {
	if sorted.is_empty() {
		return vec![(90.0, 450.0)];
	}
	sorted
		.iter()
		.enumerate()
		.map(|(i, &start)| (start, sorted.get(i + 1).copied().unwrap_or(sorted[0] + 360.0)))
		.collect()
}

/// Angles for `count` loops: each loop goes to the sector where it leaves
/// the most room, and every sector spaces its loops evenly.
fn loop_slots(sorted: &[f64], count: usize) -> Vec<f64> {
	let sectors = free_sectors(sorted);
	let mut filled = vec![0usize; sectors.len()];
	for _ in 0..count {
		let room = |i: usize| (sectors[i].1 - sectors[i].0) / (filled[i] + 2) as f64;
		let best = (0..sectors.len()).fold(0, |best, i| if room(i) > room(best) { i } else { best });
		filled[best] += 1;
	}
	sectors
		.iter()
		.zip(&filled)
		.flat_map(|(&(start, end), &n)| {
			let slot = (end - start) / (n + 1) as f64;
			(1..=n).map(move |k| normalize_degrees(start + k as f64 * slot))
		})
		.collect()
}

/// Straight arrow for a lone relationship, a fan of arcs for a bundle and
/// loops for self-relationships; then shortens captions to the shaft.
pub(super) fn assign_arrows(engine: &mut LayoutEngine, graph: &mut Graph, style: &GraphStyle) {
	let pairs = graph.node_pairs();
	let radii = graph.nodes().iter().map(|node| node.radius()).collect::<Vec<_>>();

	for pair in pairs {
		let count = pair.relationships.len();
		let steps = count.saturating_sub(1) as f64;
		let middle = steps / 2.0;
		let step = if ARC_DEFLECTION_STEP * steps > MAX_TOTAL_DEFLECTION {
			MAX_TOTAL_DEFLECTION / steps
		} else {
			ARC_DEFLECTION_STEP
		};

		for (position, &index) in pair.relationships.iter().enumerate() {
			let Some(rel) = graph.relationships_mut().get_mut(index) else {
				continue;
			};
			let element = style.for_relationship(rel);
			let params = ArrowParams::for_shaft(element.number_or("shaft-width", DEFAULT_SHAFT_WIDTH));
			let source_radius = radii[rel.source_index()];
			let target_radius = radii[rel.target_index()];

			let arrow = if pair.is_loop() {
				ArrowGeometry::looped(source_radius, LOOP_STRAIGHT_LENGTH, LOOP_SPREAD, params)
			} else if position as f64 == middle {
				ArrowGeometry::straight(source_radius, target_radius, rel.centre_distance, params)
			} else {
				let mut deflection = step * (position as f64 - middle);
				if rel.source_index() != pair.node_a {
					deflection = -deflection;
				}
				ArrowGeometry::arc(source_radius, target_radius, rel.centre_distance, deflection, params)
			};
			rel.internal = !pair.is_loop() && count > 1;

			let padding = element.number_or("padding", DEFAULT_CAPTION_PADDING);
			let font = font(rel.caption_height);
			let available = arrow.shaft_length() - 2.0 * padding;
			rel.short_caption = engine.ellipsize(&rel.caption, available, &font);
			rel.caption_length = if rel.short_caption.is_empty() {
				0.0
			} else {
				engine.measure(&rel.short_caption, &font)
			};
			rel.arrow = Some(arrow);
		}
	}
}

/// World position of a point given in a relationship's local frame.
pub(crate) fn to_world(origin: Vector, angle_degrees: f64, local: Vector) -> Vector {
	origin + local.rotate(angle_degrees.to_radians())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::visualization::geometry::ArrowKind;
	use crate::visualization::model::{BasicNode, BasicRelationship, GraphData, create_graph};

	fn graph(nodes: &[(&str, f64, f64)], rels: &[(&str, &str, &str)]) -> Graph {
		let mut graph = create_graph(&GraphData {
			nodes: nodes.iter().map(|(id, _, _)| BasicNode::new(*id, &[])).collect(),
			relationships: rels
				.iter()
				.map(|(id, from, to)| BasicRelationship::new(*id, *from, *to, "LINKS"))
				.collect(),
		})
		.unwrap();
		for (node, (_, x, y)) in graph.nodes_mut().iter_mut().zip(nodes) {
			node.position = Vector::new(*x, *y);
		}
		graph
	}

	fn layout(graph: &mut Graph) {
		LayoutEngine::default().layout_relationships(graph, &GraphStyle::default());
	}

	fn arrow_mid_world(graph: &Graph, id: &str) -> Vector {
		let rel = graph.find_relationship(id).unwrap();
		let arrow = rel.arrow.as_ref().unwrap();
		to_world(graph.source(rel).position(), rel.natural_angle, arrow.mid_shaft_point())
	}

	#[test]
	fn lone_relationship_is_straight() {
		let mut graph = graph(&[("a", 0.0, 0.0), ("b", 0.0, 200.0)], &[("r", "a", "b")]);
		layout(&mut graph);
		let rel = graph.find_relationship("r").unwrap();
		assert_eq!(rel.natural_angle, 90.0);
		assert_eq!(rel.centre_distance, 200.0);
		assert_eq!(rel.arrow.as_ref().unwrap().kind(), ArrowKind::Straight);
		assert!(!rel.internal);
		assert_eq!(rel.short_caption, "LINKS");
		assert!(rel.caption_length > 0.0);
	}

	#[test]
	fn opposite_relationships_bulge_to_opposite_sides() {
		let mut graph = graph(&[("a", 0.0, 0.0), ("b", 200.0, 0.0)], &[("r1", "a", "b"), ("r2", "b", "a")]);
		layout(&mut graph);
		for id in ["r1", "r2"] {
			let rel = graph.find_relationship(id).unwrap();
			assert_eq!(rel.arrow.as_ref().unwrap().kind(), ArrowKind::Arc);
			assert!(rel.internal);
		}
		let first = arrow_mid_world(&graph, "r1");
		let second = arrow_mid_world(&graph, "r2");
		assert!(first.y * second.y < 0.0, "{first:?} {second:?}");
	}

	#[test]
	fn odd_bundle_keeps_a_straight_middle() {
		let mut graph = graph(
			&[("a", 0.0, 0.0), ("b", 200.0, 0.0)],
			&[("r1", "a", "b"), ("r2", "a", "b"), ("r3", "a", "b")],
		);
		layout(&mut graph);
		let kinds = ["r1", "r2", "r3"]
			.iter()
			.map(|id| graph.find_relationship(id).unwrap().arrow.as_ref().unwrap().deflection())
			.collect::<Vec<_>>();
		assert_eq!(kinds, vec![-30.0, 0.0, 30.0]);
	}

	#[test]
	fn wide_bundles_are_capped() {
		let rels = (0..8).map(|i| format!("r{i}")).collect::<Vec<_>>();
		let rel_refs = rels.iter().map(|id| (id.as_str(), "a", "b")).collect::<Vec<_>>();
		let mut graph = graph(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)], &rel_refs);
		layout(&mut graph);
		let first = graph.find_relationship("r0").unwrap().arrow.as_ref().unwrap().deflection();
		let last = graph.find_relationship("r7").unwrap().arrow.as_ref().unwrap().deflection();
		assert!((last - first - MAX_TOTAL_DEFLECTION).abs() < 1e-9);
	}

	#[test]
	fn self_loop_points_away_from_its_neighbour() {
		let mut graph = graph(&[("a", 0.0, 0.0), ("b", 200.0, 0.0)], &[("r", "a", "b"), ("self", "a", "a")]);
		layout(&mut graph);
		let rel = graph.find_relationship("self").unwrap();
		assert!(rel.is_loop());
		assert_eq!(rel.arrow.as_ref().unwrap().kind(), ArrowKind::Loop);
		assert!((rel.natural_angle - 180.0).abs() < 1e-9);
	}

	#[test]
	fn lone_loop_points_up() {
		let mut graph = graph(&[("a", 0.0, 0.0)], &[("self", "a", "a")]);
		layout(&mut graph);
		assert_eq!(graph.find_relationship("self").unwrap().natural_angle, 270.0);
	}

	#[test]
	fn crowded_loops_are_spread() {
		let nodes = [
			("hub", 0.0, 0.0),
			("n1", 100.0, 0.0),
			("n2", 0.0, 100.0),
			("n3", -100.0, 0.0),
			("n4", 70.0, -70.0),
			("n5", -70.0, -70.0),
		];
		let rels = [
			("r1", "hub", "n1"),
			("r2", "hub", "n2"),
			("r3", "hub", "n3"),
			("r4", "hub", "n4"),
			("r5", "hub", "n5"),
			("l1", "hub", "hub"),
			("l2", "hub", "hub"),
			("l3", "hub", "hub"),
		];
		let mut graph = graph(&nodes, &rels);
		layout(&mut graph);
		let mut loop_angles = ["l1", "l2", "l3"]
			.iter()
			.map(|id| graph.find_relationship(id).unwrap().natural_angle)
			.collect::<Vec<_>>();
		loop_angles.sort_by(f64::total_cmp);
		for pair in loop_angles.windows(2) {
			assert!(pair[1] - pair[0] >= LOOP_SPREAD - 1e-9, "{loop_angles:?}");
		}

		let fixed = ["r1", "r2", "r3", "r4", "r5"]
			.iter()
			.map(|id| graph.find_relationship(id).unwrap().natural_angle)
			.collect::<Vec<_>>();
		for &loop_angle in &loop_angles {
			for &angle in &fixed {
				let apart = (loop_angle - angle).abs() % 360.0;
				let clearance = apart.min(360.0 - apart);
				assert!(clearance >= LOOP_SPREAD / 2.0, "loop {loop_angle} against {angle}");
			}
		}
	}

	#[test]
	fn loops_packed_into_one_sector_keep_clear_of_its_edges() {
		let mut graph = graph(
			&[("hub", 0.0, 0.0), ("n1", 100.0, 0.0), ("n2", -100.0, 0.0)],
			&[
				("r1", "hub", "n1"),
				("r2", "hub", "n2"),
				("l1", "hub", "hub"),
				("l2", "hub", "hub"),
				("l3", "hub", "hub"),
				("l4", "hub", "hub"),
				("l5", "hub", "hub"),
				("l6", "hub", "hub"),
				("l7", "hub", "hub"),
			],
		);
		layout(&mut graph);
		for id in ["l1", "l2", "l3", "l4", "l5", "l6", "l7"] {
			let angle = graph.find_relationship(id).unwrap().natural_angle;
			let clearance = angle.min((angle - 180.0).abs()).min(360.0 - angle);
			assert!(clearance >= 180.0 / 5.0 - 1e-9, "{id} at {angle}");
		}
	}

	#[test]
	fn sectors_wrap_around() {
		assert_eq!(free_sectors(&[10.0, 20.0, 30.0])[2], (30.0, 370.0));
		assert_eq!(loop_slots(&[0.0, 180.0, 200.0], 1), vec![90.0]);
		assert_eq!(loop_slots(&[0.0, 90.0, 180.0, 225.0, 315.0], 3), vec![45.0, 135.0, 270.0]);
	}
}
