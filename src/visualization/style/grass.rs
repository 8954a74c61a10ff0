//! Grass text and JSON forms of the rule set.
//!
//! ```text
//! node.Person {
//!   color: #FFE081;
//!   caption: '{name}';
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::{Selector, StyleRule, parse_error};
use crate::visualization::Result;

/// Parses brace-delimited blocks. Values are kept exactly as written,
/// quotes included; braces and separators inside quotes are literal.
pub(super) fn parse(text: &str) -> Result<Vec<StyleRule>> {
	let mut rules = Vec::new();
	let mut rest = text;
	loop {
		rest = rest.trim_start();
		if rest.is_empty() {
			break;
		}
		let open = find_unquoted(rest, '{').ok_or_else(|| parse_error("expected `{`"))?;
		let selector = rest[..open].trim();
		if selector.is_empty() || selector.contains(['}', ';', ':', '"', '\'']) {
			return Err(parse_error(format!("invalid selector `{selector}`")));
		}
		let body_start = open + 1;
		let close = find_unquoted(&rest[body_start..], '}')
			.ok_or_else(|| parse_error(format!("unterminated block `{selector}`")))?;
		let body = &rest[body_start..body_start + close];
		if find_unquoted(body, '{').is_some() {
			return Err(parse_error(format!("nested block in `{selector}`")));
		}

		let mut rule = StyleRule::new(Selector::parse(selector), &[]);
		for declaration in split_unquoted(body, ';') {
			let declaration = declaration.trim();
			if declaration.is_empty() {
				continue;
			}
			let colon = find_unquoted(declaration, ':')
				.ok_or_else(|| parse_error(format!("expected `key: value`, found `{declaration}`")))?;
			let key = declaration[..colon].trim();
			if key.is_empty() {
				return Err(parse_error(format!("missing property name in `{selector}`")));
			}
			rule.set(key, declaration[colon + 1..].trim());
		}
		rules.push(rule);
		rest = &rest[body_start + close + 1..];
	}
	if rules.is_empty() {
		return Err(parse_error("empty style sheet"));
	}
	Ok(rules)
}

pub(super) fn to_sheet(rules: &[StyleRule]) -> String {
	rules
		.iter()
		.map(|rule| {
			let mut block = format!("{} {{\n", rule.selector);
			for (key, value) in &rule.props {
				block.push_str(&format!("  {key}: {};\n", quote_if_needed(value)));
			}
			block.push_str("}\n");
			block
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub(super) fn to_json(rules: &[StyleRule]) -> Result<String> {
	Ok(serde_json::to_string_pretty(&Sheet(rules))?)
}

/// Reads `{"selector": {"key": value}}`, keeping document order.
pub(super) fn parse_json(text: &str) -> Result<Vec<StyleRule>> {
	let sheet: Ordered<Ordered<Value>> = serde_json::from_str(text)?;
	Ok(sheet
		.0
		.into_iter()
		.map(|(selector, props)| StyleRule {
			selector: Selector::parse(&selector),
			props: props
				.0
				.into_iter()
				.map(|(key, value)| {
					let value = match value {
						Value::String(text) => text,
						other => other.to_string(),
					};
					(key, value)
				})
				.collect(),
		})
		.collect())
}

fn quote_if_needed(value: &str) -> String {
	let already_quoted = ['\'', '"']
		.iter()
		.any(|quote| value.len() >= 2 && value.starts_with(*quote) && value.ends_with(*quote));
	if already_quoted || !value.contains(['{', '}', ';', ':']) {
		return value.to_owned();
	}
	if value.contains('\'') {
		format!("\"{value}\"")
	} else {
		format!("'{value}'")
	}
}

fn find_unquoted(text: &str, target: char) -> Option<usize> {
	let mut quote = None;
	for (index, ch) in text.char_indices() {
		match quote {
			Some(open) if ch == open => quote = None,
			Some(_) => {}
			None if ch == '\'' || ch == '"' => quote = Some(ch),
			None if ch == target => return Some(index),
			None => {}
		}
	}
	None
}

fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut rest = text;
	while let Some(index) = find_unquoted(rest, separator) {
		parts.push(&rest[..index]);
		rest = &rest[index + separator.len_utf8()..];
	}
	parts.push(rest);
	parts
}

struct Sheet<'a>(&'a [StyleRule]);

impl Serialize for Sheet<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for rule in self.0 {
			map.serialize_entry(&rule.selector.to_string(), &Props(&rule.props))?;
		}
		map.end()
	}
}

struct Props<'a>(&'a [(String, String)]);

impl Serialize for Props<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (key, value) in self.0 {
			map.serialize_entry(key, value)?;
		}
		map.end()
	}
}

/// A JSON object read as ordered entries.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		struct OrderedVisitor<V>(PhantomData<V>);

		impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
			type Value = Ordered<V>;

			fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
				formatter.write_str("a map")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
				let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
				while let Some(entry) = access.next_entry::<String, V>()? {
					entries.push(entry);
				}
				Ok(Ordered(entries))
			}
		}

		deserializer.deserialize_map(OrderedVisitor(PhantomData))
	}
}
