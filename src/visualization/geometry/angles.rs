use log::warn;

use super::normalize_degrees;

/// One occupied direction around a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleEntry {
	pub angle: f64,
	/// Fixed entries belong to straight/arc relationships and never move.
	pub fixed: bool,
}

/// Inclusive index range into an [`AngleList`], possibly wrapping past the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
	pub start: usize,
	pub end: usize,
}

/// Angles around a node, sorted ascending in `[0, 360)`.
#[derive(Clone, Debug, Default)]
pub struct AngleList {
	entries: Vec<AngleEntry>,
}

impl AngleList {
	pub fn new(mut entries: Vec<AngleEntry>) -> Self {
		for entry in &mut entries {
			entry.angle = normalize_degrees(entry.angle);
		}
		entries.sort_by(|a, b| a.angle.total_cmp(&b.angle));
		Self { entries }
	}

	pub fn total_length(&self) -> usize {
		self.entries.len()
	}

	pub fn angle_at(&self, index: usize) -> f64 {
		self.entries[index].angle
	}

	pub fn is_fixed(&self, index: usize) -> bool {
		self.entries[index].fixed
	}

	pub fn entries(&self) -> &[AngleEntry] {
		&self.entries
	}

	/// Number of gaps the run spans. A run whose start equals its end spans
	/// the full circle.
	pub fn length(&self, run: Run) -> usize {
		if run.start < run.end {
			run.end - run.start
		} else {
			run.end + self.entries.len() - run.start
		}
	}

	/// Angular span of the run in degrees.
	pub fn angle(&self, run: Run) -> f64 {
		if run.start < run.end {
			self.angle_at(run.end) - self.angle_at(run.start)
		} else {
			360.0 - (self.angle_at(run.start) - self.angle_at(run.end))
		}
	}

	pub fn wrap_index(&self, index: isize) -> usize {
		let len = self.entries.len().max(1) as isize;
		index.rem_euclid(len) as usize
	}

	/// New angles for the movable entries of `run`.
	///
	/// Fixed entries never move, so every stretch of movable entries the run
	/// touches is spaced evenly inside the gap between its two fixed
	/// neighbours. Without any fixed entry the run is spaced `min_separation`
	/// apart around its current centre.
	pub fn spread(&self, run: Run, min_separation: f64) -> Vec<(usize, f64)> {
		let steps = self.length(run);
		if !self.entries.iter().any(|entry| entry.fixed) {
			let centre = self.angle_at(run.start) + self.angle(run) / 2.0;
			let first = centre - (steps as f64 * min_separation) / 2.0;
			return (0..=steps)
				.map(|offset| {
					let index = self.wrap_index((run.start + offset) as isize);
					(index, normalize_degrees(first + offset as f64 * min_separation))
				})
				.collect();
		}

		let mut moved: Vec<(usize, f64)> = Vec::new();
		let mut offset = 0;
		while offset <= steps {
			let index = self.wrap_index((run.start + offset) as isize);
			if self.is_fixed(index) {
				offset += 1;
				continue;
			}
			if moved.iter().any(|&(seen, _)| seen == index) {
				break;
			}
			let mut lower = index;
			while !self.is_fixed(lower) {
				lower = self.wrap_index(lower as isize - 1);
			}
			let mut upper = index;
			while !self.is_fixed(upper) {
				upper = self.wrap_index(upper as isize + 1);
			}

			let gap = Run { start: lower, end: upper };
			let count = self.length(gap) - 1;
			let slot = self.angle(gap) / (count + 1) as f64;
			for k in 1..=count {
				let entry = self.wrap_index((lower + k) as isize);
				moved.push((entry, normalize_degrees(self.angle_at(lower) + k as f64 * slot)));
			}
			offset += self.length(Run { start: index, end: upper });
		}
		moved
	}

	fn too_dense(&self, start: usize, end: usize, min_separation: f64) -> bool {
		let run = Run { start, end };
		self.angle(run) < self.length(run) as f64 * min_separation
	}
}

/// Outcome of [`find_runs`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSearch {
	pub runs: Vec<Run>,
	/// State machine steps taken.
	pub steps: usize,
	/// Set when the step bound was exceeded and the search gave up.
	pub aborted: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
	ScanForDensePair,
	ExtendEnd,
	ExtendStart,
	Done,
}

/// Finds maximal runs of angles packed closer than `min_separation` degrees.
///
/// The scan starts at index 0, grows each dense pair forward then backward,
/// and stops once it wraps back to the first emitted run. The walk is
/// bounded at ten steps per angle; past that it logs and returns what it
/// has with `aborted` set.
pub fn find_runs(list: &AngleList, min_separation: f64) -> RunSearch {
	let total = list.total_length();
	let mut search = RunSearch::default();
	if total == 0 {
		return search;
	}

	let wrap = |index: usize| list.wrap_index(index as isize);
	let mut p = 0usize;
	let mut start = 0usize;
	let mut end = 0usize;
	let mut step = Step::ScanForDensePair;

	while step != Step::Done {
		if search.steps > total * 10 {
			let angles = list.entries.iter().map(|entry| entry.angle).collect::<Vec<_>>();
			warn!("failed to lay out arrows, angle runs did not settle: {angles:?}");
			search.aborted = true;
			break;
		}
		search.steps += 1;

		let min_start = search.runs.first().map_or(0, |run| run.start);
		step = match step {
			Step::ScanForDensePair => {
				start = p;
				end = wrap(p + 1);
				if end == min_start {
					Step::Done
				} else {
					p = end;
					if list.too_dense(start, end, min_separation) {
						Step::ExtendEnd
					} else {
						Step::ScanForDensePair
					}
				}
			}
			Step::ExtendEnd => {
				if p == min_start {
					Step::Done
				} else if list.too_dense(start, wrap(p + 1), min_separation) {
					end = wrap(p + 1);
					p = end;
					Step::ExtendEnd
				} else {
					p = start;
					Step::ExtendStart
				}
			}
			Step::ExtendStart => {
				let candidate = list.wrap_index(p as isize - 1);
				if candidate != end && list.too_dense(candidate, end, min_separation) {
					start = candidate;
					p = start;
					Step::ExtendStart
				} else {
					search.runs.push(Run { start, end });
					p = end;
					Step::ScanForDensePair
				}
			}
			Step::Done => Step::Done,
		};
	}

	search
}
