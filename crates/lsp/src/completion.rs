//! Conversion of a color catalog into completion items.

use lsp_types::{CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, Range, TextEdit};
use themecolors_catalog::{ColorCatalog, ColorDescriptor, ThemeKind};

/// Prefix the host puts in front of every theme color custom property.
pub const THEME_VAR_PREFIX: &str = "--vscode-";

/// Custom property name of a catalog key.
pub fn variable_name(key: &str) -> String {
	format!("{THEME_VAR_PREFIX}{key}")
}

/// One completion item per descriptor, in catalog order, each replacing `range`.
pub fn build_items(catalog: &ColorCatalog, range: Range, theme: ThemeKind) -> Vec<CompletionItem> {
	catalog.iter().map(|color| build_item(color, range, theme)).collect()
}

fn build_item(color: &ColorDescriptor, range: Range, theme: ThemeKind) -> CompletionItem {
	let label = variable_name(&color.key);
	CompletionItem {
		kind: Some(CompletionItemKind::COLOR),
		detail: color.description.clone().filter(|d| !d.is_empty()),
		documentation: color.resolve(theme).map(|value| Documentation::String(value.to_string())),
		filter_text: Some(label.clone()),
		text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(range, label.clone()))),
		label,
		..CompletionItem::default()
	}
}
