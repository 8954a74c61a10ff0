use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::visualization::geometry::{HeuristicMeasurer, TextMeasurer};

/// Measures captions with an offscreen 2d canvas, the way the browser will
/// draw them.
pub struct CanvasMeasurer {
	ctx: CanvasRenderingContext2d,
}

impl CanvasMeasurer {
	/// `None` when the document cannot hand out a 2d context.
	pub fn new() -> Option<Self> {
		let document = web_sys::window()?.document()?;
		let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
		let ctx = canvas.get_context("2d").ok()??.dyn_into().ok()?;
		Some(Self { ctx })
	}
}

impl TextMeasurer for CanvasMeasurer {
	fn measure(&self, text: &str, font: &str) -> f64 {
		self.ctx.set_font(font);
		match self.ctx.measure_text(text) {
			Ok(metrics) => metrics.width(),
			Err(_) => HeuristicMeasurer.measure(text, font),
		}
	}
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
	use wasm_bindgen_test::*;

	use super::*;

	wasm_bindgen_test_configure!(run_in_browser);

	#[wasm_bindgen_test]
	fn longer_text_measures_wider() {
		let measurer = CanvasMeasurer::new().expect("2d canvas");
		let font = "10px sans-serif";
		assert!(measurer.measure("abcdef", font) > measurer.measure("a", font));
		assert_eq!(measurer.measure("", font), 0.0);
	}
}
