//! Detection of a partially typed `var(--...)` reference on the current line.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Opening of a CSS variable reference. Matched ignoring ASCII case.
pub const VAR_PREFIX: &str = "var(";

/// Optional whitespace, then an optional partial custom property name.
static PARTIAL_NAME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(\s*)(-{1,2}[A-Za-z0-9_-]*)?").expect("valid pattern"));

fn is_ident(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || ch == '_'
}

/// Finds the partial variable name the cursor at byte offset `cursor` is completing.
///
/// Returns the byte range of the typed name, empty right after `var(`, or `None` when the
/// nearest `var(` before the cursor is followed by something other than a custom property
/// name, or when the cursor sits past that name. The range always contains the cursor: with
/// the cursor in the whitespace before the name, it starts at the cursor.
pub fn detect(line: &str, cursor: usize) -> Option<Range<usize>> {
	let mut cursor = cursor.min(line.len());
	while !line.is_char_boundary(cursor) {
		cursor -= 1;
	}

	let var_end = line[..cursor].to_ascii_lowercase().rfind(VAR_PREFIX)? + VAR_PREFIX.len();
	let rest = &line[var_end..];
	let caps = PARTIAL_NAME.captures(rest)?;
	let matched = caps.get(0)?;
	if rest[matched.end()..].starts_with(is_ident) {
		return None;
	}

	let start = var_end + caps.get(1).map_or(0, |ws| ws.end());
	let end = var_end + matched.end();
	(cursor <= end).then_some(start.min(cursor)..end)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn at_end(line: &str) -> Option<Range<usize>> {
		detect(line, line.len())
	}

	#[test]
	fn partial_name_at_end_of_line() {
		let line = "  color: var(--vsc";
		assert_eq!(line.find(VAR_PREFIX), Some(9));
		assert_eq!(at_end(line), Some(13..18));
	}

	#[test]
	fn bare_prefix_gives_empty_range() {
		assert_eq!(at_end("color: var("), Some(11..11));
		assert_eq!(at_end("color: var(-"), Some(11..12));
	}

	#[test]
	fn leading_whitespace_is_not_replaced() {
		assert_eq!(at_end("var(  --a"), Some(6..9));
	}

	#[test]
	fn cursor_in_leading_whitespace_starts_the_range() {
		assert_eq!(detect("var(  --a", 4), Some(4..9));
		assert_eq!(detect("var(  --a", 5), Some(5..9));
	}

	#[test]
	fn range_always_contains_cursor() {
		let line = "a { color: var(  --ed";
		for cursor in 0..=line.len() {
			if let Some(range) = detect(line, cursor) {
				assert!(range.start <= cursor && cursor <= range.end, "{cursor} outside {range:?}");
			}
		}
		assert_eq!(detect(line, 16), Some(16..21));
	}

	#[test]
	fn prefix_is_case_insensitive() {
		assert_eq!(at_end("color: VAR(--x"), Some(11..14));
		assert_eq!(at_end("color: Var("), Some(11..11));
	}

	#[test]
	fn identifier_without_dashes_is_not_a_variable() {
		assert_eq!(at_end("color: var(foo"), None);
		assert_eq!(at_end("var( x"), None);
	}

	#[test]
	fn no_prefix_before_cursor() {
		assert_eq!(at_end("color: red"), None);
		assert_eq!(detect("x var(--a)", 3), None);
		assert_eq!(at_end(""), None);
	}

	#[test]
	fn cursor_inside_name_and_before_close() {
		let line = "background: var(--vscode-editor-background);";
		let cursor = line.find(')').unwrap();
		assert_eq!(detect(line, cursor), Some(16..cursor));
		assert_eq!(detect(line, 20), Some(16..cursor));
	}

	#[test]
	fn cursor_past_the_name_is_ignored() {
		assert_eq!(at_end("var(--a), b"), None);
	}

	#[test]
	fn nearest_prefix_wins() {
		let line = "border: 1px solid var(--a) var(--b";
		assert_eq!(at_end(line), Some(31..34));
	}

	#[test]
	fn cursor_is_clamped_to_line_and_char_boundary() {
		assert_eq!(detect("var(--a", 100), Some(4..7));
		// 'é' is two bytes; offset 9 falls inside it.
		assert_eq!(detect("var(--a)\u{00E9}", 9), None);
	}
}
