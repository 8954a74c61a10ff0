//! Graph style sheet: selectors, rule precedence, default palette and the
//! grass/JSON formats.

mod grass;
mod palette;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::{Captures, Regex};

use super::model::{Graph, Property, VNode, VRelationship};
use super::{Result, VisualizationError};
pub use palette::{ColorSet, DEFAULT_COLORS, generated_color};

/// Tag matching every element.
pub const ANY_TAG: &str = "*";
pub const NODE_TAG: &str = "node";
pub const RELATIONSHIP_TAG: &str = "relationship";

const DEFAULT_NODE_STYLE: &[(&str, &str)] = &[
	("diameter", "50px"),
	("color", "#A5ABB6"),
	("border-color", "#9AA1AC"),
	("border-width", "2px"),
	("text-color-internal", "#FFFFFF"),
	("font-size", "10px"),
];

const DEFAULT_RELATIONSHIP_STYLE: &[(&str, &str)] = &[
	("color", "#A5ABB6"),
	("shaft-width", "1px"),
	("font-size", "8px"),
	("padding", "3px"),
	("text-color-external", "#000000"),
	("text-color-internal", "#FFFFFF"),
	("caption", "'<type>'"),
];

/// Joins selector segments with `.`, escaping dots and backslashes inside a
/// segment.
pub fn selector_array_to_string(segments: &[String]) -> String {
	segments
		.iter()
		.map(|segment| segment.replace('\\', "\\\\").replace('.', "\\."))
		.collect::<Vec<_>>()
		.join(".")
}

/// Inverse of [`selector_array_to_string`].
pub fn selector_string_to_array(selector: &str) -> Vec<String> {
	let mut segments = Vec::new();
	let mut current = String::new();
	let mut chars = selector.chars();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => current.extend(chars.next()),
			'.' => segments.push(std::mem::take(&mut current)),
			other => current.push(other),
		}
	}
	segments.push(current);
	segments
}

/// Element tag plus classes (labels or relationship type).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selector {
	pub tag: String,
	pub classes: Vec<String>,
}

impl Selector {
	pub fn new(tag: impl Into<String>, classes: Vec<String>) -> Self {
		Self {
			tag: tag.into(),
			classes,
		}
	}

	pub fn node(labels: &[String]) -> Self {
		Self::new(NODE_TAG, labels.to_vec())
	}

	pub fn relationship(rel_type: &str) -> Self {
		let classes = if rel_type.is_empty() {
			Vec::new()
		} else {
			vec![rel_type.to_owned()]
		};
		Self::new(RELATIONSHIP_TAG, classes)
	}

	pub fn parse(selector: &str) -> Self {
		let mut segments = selector_string_to_array(selector.trim());
		let tag = segments.remove(0);
		segments.retain(|class| !class.is_empty());
		Self::new(tag, segments)
	}

	/// Whether a rule with this selector applies to an element selector.
	pub fn matches(&self, element: &Selector) -> bool {
		(self.tag == ANY_TAG || self.tag == element.tag)
			&& self
				.classes
				.iter()
				.filter(|class| class.as_str() != ANY_TAG)
				.all(|class| element.classes.contains(class))
	}

	fn specificity(&self) -> (bool, usize) {
		(self.tag != ANY_TAG, self.classes.len())
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut segments = Vec::with_capacity(self.classes.len() + 1);
		segments.push(self.tag.clone());
		segments.extend(self.classes.iter().cloned());
		f.write_str(&selector_array_to_string(&segments))
	}
}

/// A selector and its properties, in the order they were written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
	pub selector: Selector,
	pub props: Vec<(String, String)>,
}

impl StyleRule {
	pub fn new(selector: Selector, props: &[(&str, &str)]) -> Self {
		let mut rule = Self {
			selector,
			props: Vec::new(),
		};
		for (key, value) in props {
			rule.set(key, value);
		}
		rule
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.props
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.as_str())
	}

	pub fn set(&mut self, key: &str, value: &str) {
		match self.props.iter_mut().find(|(name, _)| name == key) {
			Some((_, existing)) => *existing = value.to_owned(),
			None => self.props.push((key.to_owned(), value.to_owned())),
		}
	}
}

/// Anything a caption template can be interpolated against.
pub trait StyleItem {
	fn item_id(&self) -> &str;
	fn item_type(&self) -> Option<&str>;
	fn item_property(&self, key: &str) -> Option<&str>;
}

impl StyleItem for VNode {
	fn item_id(&self) -> &str {
		self.id()
	}

	fn item_type(&self) -> Option<&str> {
		None
	}

	fn item_property(&self, key: &str) -> Option<&str> {
		self.property(key)
	}
}

impl StyleItem for VRelationship {
	fn item_id(&self) -> &str {
		self.id()
	}

	fn item_type(&self) -> Option<&str> {
		Some(&self.rel_type)
	}

	fn item_property(&self, key: &str) -> Option<&str> {
		self.property(key)
	}
}

/// Resolved style of one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleElement {
	props: BTreeMap<String, String>,
}

impl StyleElement {
	/// Property value with surrounding quotes removed.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.props.get(key).map(|value| strip_quotes(value))
	}

	pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
		self.get(key).unwrap_or(default)
	}

	/// Numeric value of a property such as `"50px"`.
	pub fn number(&self, key: &str) -> Option<f64> {
		let value = self.get(key)?.trim();
		let value = value.strip_suffix("px").unwrap_or(value).trim();
		value.parse::<f64>().ok().filter(|number| number.is_finite())
	}

	pub fn number_or(&self, key: &str, default: f64) -> f64 {
		self.number(key).unwrap_or(default)
	}

	/// Fills `{property}`, `<id>` and `<type>` placeholders from `item`.
	/// Unknown property placeholders are left as written.
	pub fn interpolate(&self, template: &str, item: &dyn StyleItem) -> String {
		let filled = match placeholder_pattern() {
			Some(pattern) => pattern
				.replace_all(template, |caps: &Captures<'_>| {
					item.item_property(&caps[1])
						.map(str::to_owned)
						.unwrap_or_else(|| caps[0].to_owned())
				})
				.into_owned(),
			None => template.to_owned(),
		};
		filled
			.replace("<id>", item.item_id())
			.replace("<type>", item.item_type().unwrap_or_default())
	}

	/// Caption for `item`, interpolated from the `caption` property.
	pub fn caption(&self, item: &dyn StyleItem) -> String {
		self.get("caption")
			.map(|template| self.interpolate(template, item))
			.unwrap_or_default()
	}
}

fn placeholder_pattern() -> Option<&'static Regex> {
	static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
	PATTERN
		.get_or_init(|| Regex::new(r"\{([^{}]*)\}").ok())
		.as_ref()
}

fn strip_quotes(value: &str) -> &str {
	let trimmed = value.trim();
	for quote in ['\'', '"'] {
		if let Some(inner) = trimmed
			.strip_prefix(quote)
			.and_then(|rest| rest.strip_suffix(quote))
		{
			return inner;
		}
	}
	trimmed
}

/// Ordered rule set with precedence-based resolution.
#[derive(Clone, Debug)]
pub struct GraphStyle {
	rules: Vec<StyleRule>,
	use_generated_default_colors: bool,
}

impl Default for GraphStyle {
	fn default() -> Self {
		Self::new(false)
	}
}

impl GraphStyle {
	pub fn new(use_generated_default_colors: bool) -> Self {
		Self {
			rules: default_rules(),
			use_generated_default_colors,
		}
	}

	pub fn rules(&self) -> &[StyleRule] {
		&self.rules
	}

	pub fn set_use_generated_default_colors(&mut self, enabled: bool) {
		self.use_generated_default_colors = enabled;
	}

	/// Resolves the properties for an element selector. Rules apply from
	/// least to most specific, so later properties win.
	pub fn for_selector(&self, element: &Selector) -> StyleElement {
		let mut matching = self
			.rules
			.iter()
			.enumerate()
			.filter(|(_, rule)| rule.selector.matches(element))
			.collect::<Vec<_>>();
		matching.sort_by_key(|(index, rule)| (rule.selector.specificity(), *index));

		let mut props = BTreeMap::new();
		for (_, rule) in matching {
			for (key, value) in &rule.props {
				props.insert(key.clone(), value.clone());
			}
		}
		StyleElement { props }
	}

	pub fn for_node(&self, node: &VNode) -> StyleElement {
		self.for_selector(&Selector::node(&node.labels))
	}

	pub fn for_relationship(&self, relationship: &VRelationship) -> StyleElement {
		self.for_selector(&Selector::relationship(&relationship.rel_type))
	}

	/// Gives every labelled node without a label rule for colour or caption
	/// a rule for its first label, with the next palette colour and a caption
	/// picked from its properties.
	pub fn apply_default_node_styling(&mut self, graph: &Graph) {
		for node in graph.nodes() {
			self.default_node_styling(node);
		}
	}

	fn default_node_styling(&mut self, node: &VNode) {
		if node.labels.is_empty() {
			return;
		}
		let element = Selector::node(&node.labels);
		let mut needs_color = true;
		let mut needs_caption = true;
		for rule in &self.rules {
			if rule.selector.classes.is_empty() || !rule.selector.matches(&element) {
				continue;
			}
			needs_color &= rule.get("color").is_none();
			needs_caption &= rule.get("caption").is_none();
		}
		if !needs_color && !needs_caption {
			return;
		}

		let mut labels = node.labels.clone();
		labels.sort();
		labels.truncate(1);
		let minimal = Selector::node(&labels);
		let mut props: Vec<(&str, String)> = Vec::new();
		if needs_color {
			let colors = self.next_default_color(&labels[0]);
			props.push(("color", colors.color));
			props.push(("border-color", colors.border_color));
			props.push(("text-color-internal", colors.text_color_internal));
		}
		if needs_caption {
			props.push(("caption", default_caption(&node.properties)));
		}
		let refs = props
			.iter()
			.map(|(key, value)| (*key, value.as_str()))
			.collect::<Vec<_>>();
		debug!("default style for {minimal}");
		self.change_for_selector(&minimal, &refs);
	}

	fn next_default_color(&self, label: &str) -> ColorSet<String> {
		if self.use_generated_default_colors {
			return generated_color(label);
		}
		let used = self
			.rules
			.iter()
			.filter_map(|rule| rule.get("color"))
			.map(|color| strip_quotes(color).to_ascii_uppercase())
			.collect::<Vec<_>>();
		DEFAULT_COLORS
			.iter()
			.find(|colors| !used.contains(&colors.color.to_ascii_uppercase()))
			.unwrap_or(&DEFAULT_COLORS[0])
			.to_owned_set()
	}

	/// Sets properties on the rule for exactly `selector`, creating it if
	/// needed. Re-applying the same properties changes nothing.
	pub fn change_for_selector(&mut self, selector: &Selector, props: &[(&str, &str)]) {
		match self.rules.iter_mut().find(|rule| &rule.selector == selector) {
			Some(rule) => {
				for (key, value) in props {
					rule.set(key, value);
				}
			}
			None => self.rules.push(StyleRule::new(selector.clone(), props)),
		}
	}

	pub fn destroy_rule(&mut self, selector: &Selector) {
		self.rules.retain(|rule| &rule.selector != selector);
	}

	pub fn reset_to_default(&mut self) {
		self.rules = default_rules();
	}

	/// Replaces the rule set from grass text, falling back to the JSON form.
	/// When neither parses the rules are left alone and `false` is returned.
	pub fn import_grass(&mut self, text: &str) -> bool {
		match grass::parse(text) {
			Ok(rules) => {
				self.rules = rules;
				true
			}
			Err(grass_error) => match grass::parse_json(text) {
				Ok(rules) => {
					self.rules = rules;
					true
				}
				Err(json_error) => {
					warn!("ignoring style sheet: {grass_error}; as JSON: {json_error}");
					false
				}
			},
		}
	}

	/// Serializes the rule set as grass text.
	pub fn to_sheet(&self) -> String {
		grass::to_sheet(&self.rules)
	}

	pub fn to_json(&self) -> Result<String> {
		grass::to_json(&self.rules)
	}

	pub fn load_json(&mut self, json: &str) -> Result<()> {
		self.rules = grass::parse_json(json)?;
		Ok(())
	}

	pub fn grass(&self) -> String {
		self.to_sheet()
	}

	pub fn set_grass(&mut self, text: &str) -> bool {
		self.import_grass(text)
	}
}

fn default_rules() -> Vec<StyleRule> {
	vec![
		StyleRule::new(Selector::new(NODE_TAG, Vec::new()), DEFAULT_NODE_STYLE),
		StyleRule::new(Selector::new(RELATIONSHIP_TAG, Vec::new()), DEFAULT_RELATIONSHIP_STYLE),
	]
}

/// Caption template for a node: the first property matching `name`,
/// `title`, `label`, `*name`, `*description`, else any property, else the id.
fn default_caption(properties: &[Property]) -> String {
	static PRIORITIES: OnceLock<Vec<Regex>> = OnceLock::new();
	let priorities = PRIORITIES.get_or_init(|| {
		["(?i)^name$", "(?i)^title$", "(?i)^label$", "(?i)name$", "(?i)description$", "^.+"]
			.iter()
			.filter_map(|pattern| Regex::new(pattern).ok())
			.collect()
	});
	priorities
		.iter()
		.find_map(|pattern| {
			properties
				.iter()
				.find(|property| pattern.is_match(&property.key))
		})
		.map(|property| format!("{{{}}}", property.key))
		.unwrap_or_else(|| String::from("<id>"))
}

pub(crate) fn parse_error(message: impl Into<String>) -> VisualizationError {
	VisualizationError::StyleParse(message.into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::visualization::model::{BasicNode, GraphData, create_graph};

	fn segments(parts: &[&str]) -> Vec<String> {
		parts.iter().map(|part| (*part).to_owned()).collect()
	}

	#[test]
	fn selector_escaping_round_trips() {
		for parts in [
			segments(&["node"]),
			segments(&["node", "Person"]),
			segments(&["relationship", "HAS.PART"]),
			segments(&["node", "a\\", ".b", ""]),
		] {
			let text = selector_array_to_string(&parts);
			assert_eq!(selector_string_to_array(&text), parts);
		}
		assert_eq!(selector_array_to_string(&segments(&["node", "A.B"])), "node.A\\.B");
	}

	#[test]
	fn specific_rules_beat_general_ones() {
		let mut style = GraphStyle::default();
		style.change_for_selector(&Selector::parse("node.Person.Admin"), &[("color", "#111111")]);
		style.change_for_selector(&Selector::parse("node.Person"), &[("color", "#222222")]);
		style.change_for_selector(&Selector::parse("*"), &[("color", "#333333")]);

		let admin = style.for_selector(&Selector::node(&segments(&["Person", "Admin"])));
		assert_eq!(admin.get("color"), Some("#111111"));
		let person = style.for_selector(&Selector::node(&segments(&["Person"])));
		assert_eq!(person.get("color"), Some("#222222"));
		let plain = style.for_selector(&Selector::node(&[]));
		assert_eq!(plain.get("color"), Some("#A5ABB6"));
		assert_eq!(plain.number("diameter"), Some(50.0));
	}

	#[test]
	fn change_for_selector_is_idempotent() {
		let mut style = GraphStyle::default();
		let selector = Selector::parse("node.City");
		style.change_for_selector(&selector, &[("color", "#123456")]);
		let once = style.to_sheet();
		style.change_for_selector(&selector, &[("color", "#123456")]);
		assert_eq!(style.to_sheet(), once);
		style.destroy_rule(&selector);
		assert_eq!(style.rules().len(), 2);
	}

	#[test]
	fn labelled_nodes_get_palette_color_and_caption() {
		let graph = create_graph(&GraphData {
			nodes: vec![
				BasicNode::new("1", &["Person"]).with_property("name", "Ada"),
				BasicNode::new("2", &["Movie"]).with_property("tagline", "Hi"),
				BasicNode::new("3", &["Person"]),
			],
			relationships: Vec::new(),
		})
		.unwrap();
		let mut style = GraphStyle::default();
		style.apply_default_node_styling(&graph);

		let ada = style.for_node(&graph.nodes()[0]);
		assert_eq!(ada.get("color"), Some(DEFAULT_COLORS[0].color));
		assert_eq!(ada.caption(&graph.nodes()[0]), "Ada");
		let movie = style.for_node(&graph.nodes()[1]);
		assert_eq!(movie.get("color"), Some(DEFAULT_COLORS[1].color));
		assert_eq!(movie.get("caption"), Some("{tagline}"));
		// one rule per label, not per node
		assert_eq!(style.rules().len(), 4);
	}

	#[test]
	fn caption_priority_prefers_name_like_keys() {
		let props = |keys: &[&str]| {
			keys.iter()
				.map(|key| Property {
					key: (*key).to_owned(),
					value: String::new(),
					kind: String::from("string"),
				})
				.collect::<Vec<_>>()
		};
		assert_eq!(default_caption(&props(&["born", "Title"])), "{Title}");
		assert_eq!(default_caption(&props(&["age", "username"])), "{username}");
		assert_eq!(default_caption(&props(&["age"])), "{age}");
		assert_eq!(default_caption(&[]), "<id>");
	}

	#[test]
	fn interpolation_fills_known_placeholders() {
		let graph = create_graph(&GraphData {
			nodes: vec![BasicNode::new("7", &[]).with_property("name", "Ada")],
			relationships: Vec::new(),
		})
		.unwrap();
		let element = StyleElement::default();
		let node = &graph.nodes()[0];
		assert_eq!(element.interpolate("{name} (<id>)", node), "Ada (7)");
		assert_eq!(element.interpolate("{missing}", node), "{missing}");
	}

	#[test]
	fn broken_sheet_leaves_rules_alone() {
		let mut style = GraphStyle::default();
		let before = style.to_sheet();
		assert!(!style.import_grass("node { color: red"));
		assert_eq!(style.to_sheet(), before);
	}

	#[test]
	fn json_form_is_accepted_by_import() {
		let mut style = GraphStyle::default();
		let json = style.to_json().unwrap();
		style.change_for_selector(&Selector::parse("node.X"), &[("color", "#000000")]);
		assert!(style.import_grass(&json));
		assert_eq!(style.rules().len(), 2);
	}
}
