use std::fmt::Write as FmtWrite;

use super::reconcile::RenderState;
use super::scene::{NodeView, RelationshipView};
use super::viewport::Viewport;
use crate::visualization::geometry::c;
use crate::visualization::layout::FONT_FAMILY;
use crate::visualization::style::GraphStyle;

/// Standalone SVG document of what is drawn, under the current pan and zoom.
/// The style sheet travels along as grass text in `<metadata>`.
pub fn render_svg(state: &RenderState, viewport: &Viewport, style: &GraphStyle) -> String {
	let transform = viewport.transform;
	let mut svg = String::new();
	let _ = writeln!(
		svg,
		"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"{}\">",
		xml_escape(FONT_FAMILY),
		w = c(viewport.width),
		h = c(viewport.height),
	);
	let _ = writeln!(svg, "<metadata class=\"grass\">{}</metadata>", xml_escape(&style.grass()));
	let _ = writeln!(
		svg,
		"<g class=\"layer\" transform=\"translate({} {}) scale({})\">",
		c(transform.x),
		c(transform.y),
		transform.k
	);

	svg.push_str("<g class=\"layer relationships\">\n");
	for view in state.relationships() {
		write_relationship(&mut svg, view);
	}
	svg.push_str("</g>\n<g class=\"layer nodes\">\n");
	for view in state.nodes() {
		write_node(&mut svg, view);
	}
	svg.push_str("</g>\n</g>\n</svg>\n");
	svg
}

fn write_relationship(svg: &mut String, view: &RelationshipView) {
	let _ = writeln!(
		svg,
		"<g class=\"{}\" transform=\"{}\">",
		view.classes(),
		view.transform()
	);
	let _ = writeln!(
		svg,
		"<path class=\"outline\" fill=\"{}\" stroke=\"none\" d=\"{}\"/>",
		xml_escape(&view.color),
		view.outline
	);
	if !view.caption.is_empty() {
		let _ = writeln!(
			svg,
			"<text text-anchor=\"middle\" dominant-baseline=\"central\" x=\"{}\" y=\"{}\" transform=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
			view.caption_x,
			view.caption_y,
			view.caption_transform(),
			c(view.font_size),
			xml_escape(&view.caption_color),
			xml_escape(&view.caption)
		);
	}
	svg.push_str("</g>\n");
}

fn write_node(svg: &mut String, view: &NodeView) {
	let _ = writeln!(
		svg,
		"<g class=\"{}\" transform=\"translate({} {})\">",
		view.classes(),
		view.x,
		view.y
	);
	let _ = writeln!(
		svg,
		"<circle class=\"b\" r=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
		c(view.radius),
		xml_escape(&view.fill),
		xml_escape(&view.stroke),
		c(view.stroke_width)
	);
	for (index, line) in view.caption_lines.iter().enumerate() {
		let _ = writeln!(
			svg,
			"<text class=\"caption\" text-anchor=\"middle\" dominant-baseline=\"central\" y=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
			view.line_offset(index),
			c(view.font_size),
			xml_escape(&view.text_color),
			xml_escape(line)
		);
	}
	svg.push_str("</g>\n");
}

pub(crate) fn xml_escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&apos;"),
			other => escaped.push(other),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_markup() {
		assert_eq!(xml_escape("a < b & 'c'"), "a &lt; b &amp; &apos;c&apos;");
	}

	#[test]
	fn empty_state_is_a_valid_document() {
		let svg = render_svg(&RenderState::default(), &Viewport::new(640.0, 480.0), &GraphStyle::default());
		assert!(svg.starts_with("<svg"));
		assert!(svg.contains("viewBox=\"0 0 640 480\""));
		assert!(svg.contains("node {"));
		assert!(svg.trim_end().ends_with("</svg>"));
	}
}
