//! Syntax tree queries for `registerColor` calls.

use themecolors_catalog::{ColorDefault, ThemedDefault};
use tree_sitter::{Node, Tree};

/// Name of the registration function.
const REGISTER_COLOR: &str = "registerColor";

/// One `registerColor` call with a literal identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Registration {
	pub name: String,
	pub description: Option<String>,
	pub default: Option<ColorDefault>,
	/// Zero-based line of the call.
	pub row: usize,
}

/// What the walk found at a `registerColor` call.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Found {
	/// A registration with a literal identifier.
	Color(Registration),
	/// A call whose identifier is not a string literal, at the given line.
	DynamicName(usize),
}

/// Collects `registerColor` calls in document order.
///
/// Arguments of a recognized call are not searched further. Calls with a non-literal name are
/// reported and their arguments are searched.
pub(crate) fn registrations(tree: &Tree, source: &str) -> Vec<Found> {
	let mut found = Vec::new();
	let mut stack = vec![tree.root_node()];
	while let Some(node) = stack.pop() {
		if let Some(args) = register_color_arguments(node, source) {
			match registration(&args, source) {
				Some(color) => {
					found.push(Found::Color(Registration {
						row: node.start_position().row,
						..color
					}));
					continue;
				}
				None => found.push(Found::DynamicName(node.start_position().row)),
			}
		}

		let mut cursor = node.walk();
		let children: Vec<_> = node.named_children(&mut cursor).collect();
		stack.extend(children.into_iter().rev());
	}
	found
}

fn text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
	&source[node.byte_range()]
}

/// Arguments of a direct `registerColor(...)` call, comments excluded.
fn register_color_arguments<'t>(node: Node<'t>, source: &str) -> Option<Vec<Node<'t>>> {
	if node.kind() != "call_expression" {
		return None;
	}
	let function = node.child_by_field_name("function")?;
	if function.kind() != "identifier" || text(function, source) != REGISTER_COLOR {
		return None;
	}
	arguments(node)
}

fn arguments<'t>(call: Node<'t>) -> Option<Vec<Node<'t>>> {
	let args = call.child_by_field_name("arguments")?;
	let mut cursor = args.walk();
	Some(args.named_children(&mut cursor).filter(|n| n.kind() != "comment").collect())
}

fn registration(args: &[Node<'_>], source: &str) -> Option<Registration> {
	let name = args.first().filter(|n| n.kind() == "string")?;
	let name = string_value(*name, source)?;
	Some(Registration {
		name,
		default: args.get(1).and_then(|n| default_value(*n, source)),
		description: args.get(2).and_then(|n| description(*n, source)),
		row: 0,
	})
}

/// A string literal, or the second string argument of a call such as
/// `localize('key', "text")`.
fn description(node: Node<'_>, source: &str) -> Option<String> {
	if let Some(value) = string_like(node, source) {
		return Some(value);
	}
	if node.kind() == "call_expression" {
		let args = arguments(node)?;
		return string_like(*args.get(1)?, source);
	}
	None
}

/// A literal string, `null`, or an object of per-theme literals. Anything computed is `None`.
fn default_value(node: Node<'_>, source: &str) -> Option<ColorDefault> {
	if let Some(value) = string_like(node, source) {
		return Some(ColorDefault::Literal(value));
	}
	if node.kind() != "object" {
		return None;
	}

	let mut themed = ThemedDefault::default();
	let mut cursor = node.walk();
	for child in node.named_children(&mut cursor) {
		match child.kind() {
			"comment" => continue,
			"pair" => {}
			_ => return None,
		}
		let key = child.child_by_field_name("key")?;
		let key = match key.kind() {
			"property_identifier" => text(key, source).to_string(),
			"string" => string_value(key, source)?,
			_ => return None,
		};
		let value = child.child_by_field_name("value")?;
		let value = match value.kind() {
			"null" => None,
			_ => Some(string_like(value, source)?),
		};
		match key.as_str() {
			"light" => themed.light = value,
			"dark" => themed.dark = value,
			"hc" | "hcDark" => themed.hc = value,
			"hcLight" => themed.hc_light = value,
			_ => {}
		}
	}
	Some(ColorDefault::Themed(themed))
}

/// Value of a quoted string or of a template string without substitutions.
fn string_like(node: Node<'_>, source: &str) -> Option<String> {
	match node.kind() {
		"string" | "template_string" => string_value(node, source),
		_ => None,
	}
}

fn string_value(node: Node<'_>, source: &str) -> Option<String> {
	let mut value = String::new();
	let mut cursor = node.walk();
	for part in node.named_children(&mut cursor) {
		match part.kind() {
			"string_fragment" => value.push_str(text(part, source)),
			"escape_sequence" => unescape(text(part, source), &mut value),
			"template_substitution" => return None,
			_ => {}
		}
	}
	Some(value)
}

/// Appends the character an escape sequence such as `\n` or `\u{1F600}` stands for.
fn unescape(sequence: &str, out: &mut String) {
	let body = sequence.strip_prefix('\\').unwrap_or(sequence);
	let mut chars = body.chars();
	let Some(first) = chars.next() else {
		return;
	};
	let rest = chars.as_str();
	let decoded = match first {
		'n' => Some('\n'),
		't' => Some('\t'),
		'r' => Some('\r'),
		'b' => Some('\u{8}'),
		'f' => Some('\u{c}'),
		'v' => Some('\u{b}'),
		'0' if rest.is_empty() => Some('\0'),
		'x' | 'u' => {
			let hex = rest.trim_start_matches('{').trim_end_matches('}');
			u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
		}
		// Line continuation.
		'\n' | '\r' | '\u{2028}' | '\u{2029}' => return,
		other => Some(other),
	};
	match decoded {
		Some(ch) => out.push(ch),
		None => out.push_str(sequence),
	}
}
