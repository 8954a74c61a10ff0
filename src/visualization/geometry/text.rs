//! Caption width measurement with a bounded memo table.

use std::collections::{HashMap, VecDeque};

/// Default number of `(text, font)` widths kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Average glyph width as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;

/// Measures rendered text width in pixels.
pub trait TextMeasurer {
	fn measure(&self, text: &str, font: &str) -> f64;
}

/// Width estimate from average glyph width. Used natively and in tests,
/// where no canvas is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
	fn measure(&self, text: &str, font: &str) -> f64 {
		text.chars().count() as f64 * font_size(font) * CHAR_WIDTH_FACTOR
	}
}

/// Pixel size from a CSS font shorthand such as `"bold 10px sans-serif"`.
pub fn font_size(font: &str) -> f64 {
	font.split_whitespace()
		.find_map(|part| part.strip_suffix("px")?.parse::<f64>().ok())
		.filter(|size| size.is_finite() && *size > 0.0)
		.unwrap_or(10.0)
}

/// Memoizes widths by `(text, font)`. Once full, the oldest entry is evicted
/// first.
pub struct TextMeasurementCache {
	measurer: Box<dyn TextMeasurer>,
	entries: HashMap<(String, String), f64>,
	order: VecDeque<(String, String)>,
	capacity: usize,
}

impl TextMeasurementCache {
	pub fn new(measurer: Box<dyn TextMeasurer>, capacity: usize) -> Self {
		Self {
			measurer,
			entries: HashMap::new(),
			order: VecDeque::new(),
			capacity: capacity.max(1),
		}
	}

	pub fn measure(&mut self, text: &str, font: &str) -> f64 {
		let key = (text.to_owned(), font.to_owned());
		if let Some(width) = self.entries.get(&key) {
			return *width;
		}

		let width = self.measurer.measure(text, font);
		while self.entries.len() >= self.capacity {
			let Some(oldest) = self.order.pop_front() else {
				break;
			};
			self.entries.remove(&oldest);
		}
		self.order.push_back(key.clone());
		self.entries.insert(key, width);
		width
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.order.clear();
	}
}

impl Default for TextMeasurementCache {
	fn default() -> Self {
		Self::new(Box::new(HeuristicMeasurer), DEFAULT_CACHE_CAPACITY)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	struct CountingMeasurer(Rc<Cell<usize>>);

	impl TextMeasurer for CountingMeasurer {
		fn measure(&self, text: &str, _font: &str) -> f64 {
			self.0.set(self.0.get() + 1);
			text.len() as f64
		}
	}

	#[test]
	fn font_size_is_read_from_shorthand() {
		assert_eq!(font_size("bold 12px sans-serif"), 12.0);
		assert_eq!(font_size("sans-serif"), 10.0);
	}

	#[test]
	fn repeated_measurements_hit_the_cache() {
		let calls = Rc::new(Cell::new(0));
		let mut cache = TextMeasurementCache::new(Box::new(CountingMeasurer(calls.clone())), 8);
		assert_eq!(cache.measure("KNOWS", "8px sans-serif"), 5.0);
		assert_eq!(cache.measure("KNOWS", "8px sans-serif"), 5.0);
		assert_eq!(calls.get(), 1);
		cache.measure("KNOWS", "10px sans-serif");
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn oldest_entry_is_evicted_first() {
		let calls = Rc::new(Cell::new(0));
		let mut cache = TextMeasurementCache::new(Box::new(CountingMeasurer(calls.clone())), 2);
		cache.measure("a", "f");
		cache.measure("b", "f");
		cache.measure("a", "f");
		cache.measure("c", "f");
		assert_eq!(cache.len(), 2);
		assert_eq!(calls.get(), 3);
		// "a" was the oldest insertion, so measuring it again misses.
		cache.measure("a", "f");
		assert_eq!(calls.get(), 4);
		cache.measure("c", "f");
		assert_eq!(calls.get(), 4);
	}
}
