use serde::Serialize;

/// Fill, border and internal text colour of one node style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSet<S> {
	/// Node fill.
	pub color: S,
	pub border_color: S,
	/// Caption colour inside the node.
	pub text_color_internal: S,
}

impl ColorSet<&'static str> {
	/// Owned copy, for styles built at runtime.
	pub fn to_owned_set(&self) -> ColorSet<String> {
		ColorSet {
			color: self.color.to_owned(),
			border_color: self.border_color.to_owned(),
			text_color_internal: self.text_color_internal.to_owned(),
		}
	}
}

const fn set(color: &'static str, border_color: &'static str, text: &'static str) -> ColorSet<&'static str> {
	ColorSet {
		color,
		border_color,
		text_color_internal: text,
	}
}

/// Colours handed out to labels in order of first appearance.
pub const DEFAULT_COLORS: [ColorSet<&str>; 12] = [
	set("#FFE081", "#9AA1AC", "#604A0E"),
	set("#C990C0", "#b261a5", "#FFFFFF"),
	set("#F79767", "#f36924", "#FFFFFF"),
	set("#57C7E3", "#23b3d7", "#2A2C34"),
	set("#F16667", "#eb2728", "#FFFFFF"),
	set("#D9C8AE", "#c0a378", "#604A0E"),
	set("#8DCC93", "#5db665", "#2A2C34"),
	set("#ECB5C9", "#da7298", "#2A2C34"),
	set("#4C8EDA", "#2870c2", "#FFFFFF"),
	set("#FFC454", "#d7a013", "#2A2C34"),
	set("#DA7194", "#cc3c6c", "#FFFFFF"),
	set("#569480", "#447666", "#FFFFFF"),
];

/// Colour derived from a stable hash of `label`, so the same label gets the
/// same colour in every session.
pub fn generated_color(label: &str) -> ColorSet<String> {
	// FNV-1a
	let hash = label.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
		(hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
	});
	let hue = f64::from(hash % 360);
	let color = hsl_to_hex(hue, 0.55, 0.7);
	let border_color = hsl_to_hex(hue, 0.55, 0.5);
	let text_color_internal = String::from("#2A2C34");
	ColorSet {
		color,
		border_color,
		text_color_internal,
	}
}

fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
	let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
	let sector = hue / 60.0;
	let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
	let (r, g, b) = match sector as u32 {
		0 => (chroma, x, 0.0),
		1 => (x, chroma, 0.0),
		2 => (0.0, chroma, x),
		3 => (0.0, x, chroma),
		4 => (x, 0.0, chroma),
		_ => (chroma, 0.0, x),
	};
	let m = lightness - chroma / 2.0;
	let channel = |value: f64| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
	format!("#{:02X}{:02X}{:02X}", channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_colors_are_stable_hex() {
		let first = generated_color("Person");
		assert_eq!(first, generated_color("Person"));
		assert_eq!(first.color.len(), 7);
		assert!(first.color.starts_with('#'));
	}

	#[test]
	fn hsl_primaries() {
		assert_eq!(hsl_to_hex(0.0, 1.0, 0.5), "#FF0000");
		assert_eq!(hsl_to_hex(120.0, 1.0, 0.5), "#00FF00");
		assert_eq!(hsl_to_hex(240.0, 1.0, 0.5), "#0000FF");
	}
}
