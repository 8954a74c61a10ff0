//! Turns positions into drawable geometry: node sizes and captions,
//! relationship arrows and captions.

mod routing;

use super::geometry::{DEFAULT_CACHE_CAPACITY, HeuristicMeasurer, TextMeasurementCache, TextMeasurer};
use super::model::Graph;
use super::style::GraphStyle;

pub(crate) use routing::to_world;
pub use routing::{ARC_DEFLECTION_STEP, LOOP_SPREAD, LOOP_STRAIGHT_LENGTH, MAX_TOTAL_DEFLECTION};

pub const FONT_FAMILY: &str = "Helvetica Neue, Helvetica, Arial, sans-serif";
pub const ELLIPSIS: char = '\u{2026}';
/// Most lines a node caption is wrapped onto.
pub const MAX_CAPTION_LINES: usize = 3;

const DEFAULT_DIAMETER: f64 = 50.0;
const DEFAULT_NODE_FONT_SIZE: f64 = 10.0;

/// CSS font shorthand for a size in the caption font.
pub fn font(size: f64) -> String {
	format!("{size}px {FONT_FAMILY}")
}

/// Sets every node's radius from its style diameter.
pub fn size_nodes(graph: &mut Graph, style: &GraphStyle) {
	for node in graph.nodes_mut() {
		let diameter = style.for_node(node).number_or("diameter", DEFAULT_DIAMETER);
		node.set_radius(diameter / 2.0);
	}
}

/// Owns the text measurement cache, so repeated layouts of the same captions
/// do not measure again.
pub struct LayoutEngine {
	cache: TextMeasurementCache,
}

impl Default for LayoutEngine {
	fn default() -> Self {
		Self::new(Box::new(HeuristicMeasurer), DEFAULT_CACHE_CAPACITY)
	}
}

impl LayoutEngine {
	pub fn new(measurer: Box<dyn TextMeasurer>, cache_capacity: usize) -> Self {
		Self {
			cache: TextMeasurementCache::new(measurer, cache_capacity),
		}
	}

	pub fn cache(&self) -> &TextMeasurementCache {
		&self.cache
	}

	pub fn measure(&mut self, text: &str, font: &str) -> f64 {
		self.cache.measure(text, font)
	}

	/// Computes natural angles, loop directions, arrow shapes and captions
	/// for every relationship.
	pub fn layout_relationships(&mut self, graph: &mut Graph, style: &GraphStyle) {
		routing::resolve_captions(graph, style);
		routing::compute_natural_angles(graph);
		routing::distribute_loop_angles(graph);
		routing::assign_arrows(self, graph, style);
	}

	/// Wraps each node caption into centred lines that fit inside the
	/// circle. Words that do not fit end the last line with an ellipsis.
	pub fn format_node_captions(&mut self, graph: &mut Graph, style: &GraphStyle) {
		for node in graph.nodes_mut() {
			let element = style.for_node(node);
			let caption = element.caption(&*node);
			let font_size = element.number_or("font-size", DEFAULT_NODE_FONT_SIZE).max(1.0);
			node.caption_lines = self.fit_caption(&caption, node.radius(), font_size);
		}
	}

	fn fit_caption(&mut self, caption: &str, radius: f64, font_size: f64) -> Vec<String> {
		let words = caption.split_whitespace().collect::<Vec<_>>();
		if words.is_empty() {
			return Vec::new();
		}
		let font = font(font_size);
		let max_lines = ((radius * 2.0 / font_size) as usize).clamp(1, MAX_CAPTION_LINES);

		let mut best: Vec<String> = Vec::new();
		let mut consumed = 0;
		for line_count in 1..=max_lines {
			let (lines, used) = self.fill_lines(&words, line_count, radius, font_size, &font);
			if lines.iter().any(String::is_empty) {
				continue;
			}
			best = lines;
			consumed = used;
			if consumed == words.len() {
				return best;
			}
		}

		if best.is_empty() {
			// not even the first word fits on one line
			let width = line_width(0, 1, radius, font_size);
			best.push(self.ellipsize(caption.trim(), width, &font));
		} else {
			let count = best.len();
			let width = line_width(count - 1, count, radius, font_size);
			let remainder = words[consumed..].join(" ");
			if let Some(last) = best.last_mut() {
				*last = self.ellipsize(&format!("{last} {remainder}"), width, &font);
			}
		}
		best.retain(|line| !line.is_empty());
		best
	}

	fn fill_lines(
		&mut self,
		words: &[&str],
		line_count: usize,
		radius: f64,
		font_size: f64,
		font: &str,
	) -> (Vec<String>, usize) {
		let mut lines = Vec::with_capacity(line_count);
		let mut next = 0;
		for line in 0..line_count {
			let mut remaining = line_width(line, line_count, radius, font_size);
			let mut text = String::new();
			while next < words.len() {
				let candidate = if text.is_empty() {
					words[next].to_owned()
				} else {
					format!(" {}", words[next])
				};
				let width = self.measure(&candidate, font);
				if width > remaining {
					break;
				}
				remaining -= width;
				text.push_str(&candidate);
				next += 1;
			}
			lines.push(text);
		}
		(lines, next)
	}

	/// Drops characters from the end, adding an ellipsis, until `text` fits
	/// in `max_width`. Returns an empty string when not even two characters
	/// fit.
	pub fn ellipsize(&mut self, text: &str, max_width: f64, font: &str) -> String {
		if self.measure(text, font) <= max_width {
			return text.to_owned();
		}
		let chars = text.chars().collect::<Vec<_>>();
		for kept in (2..chars.len()).rev() {
			let prefix = chars[..kept].iter().collect::<String>();
			let candidate = format!("{}{ELLIPSIS}", prefix.trim_end());
			if self.measure(&candidate, font) <= max_width {
				return candidate;
			}
		}
		String::new()
	}
}

/// Chord width available to caption line `line` of `line_count` inside a
/// circle of `radius`.
fn line_width(line: usize, line_count: usize, radius: f64, line_height: f64) -> f64 {
	let baseline = (1.0 + line as f64 - line_count as f64 / 2.0) * line_height;
	let containing = if (line as f64) < line_count as f64 / 2.0 {
		baseline - line_height
	} else {
		baseline
	};
	(radius * radius - containing * containing).max(0.0).sqrt() * 2.0
}
