//! Conversion of the host's workbench color schema into descriptors.
//!
//! The schema is a JSON schema document whose `properties` map dotted color identifiers
//! (`editor.background`) to property schemas. Only the identifier and description are used;
//! the schema carries no per-theme defaults.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::descriptor::{ColorCatalog, ColorDescriptor};
use crate::error::Result;

/// URI of the workbench color schema inside the host.
pub const WORKBENCH_COLORS_URI: &str = "vscode://schemas/workbench-colors";

#[derive(Deserialize)]
struct WorkbenchSchema {
	properties: IndexMap<String, PropertySchema>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertySchema {
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	markdown_description: Option<String>,
}

/// Converts a dotted color identifier into a CSS variable key.
pub fn color_key(id: &str) -> String {
	id.replace('.', "-")
}

/// Parses the schema text into a catalog, in schema order.
///
/// # Errors
///
/// [`crate::CatalogError::Malformed`] when the text is not a schema with a `properties` object,
/// and the validation errors of [`ColorCatalog::new`] when two identifiers collapse onto the same
/// key.
pub fn parse_workbench_schema(text: &str) -> Result<ColorCatalog> {
	let schema: WorkbenchSchema = serde_json::from_str(text)?;
	ColorCatalog::new(schema.properties.into_iter().map(|(id, property)| ColorDescriptor {
		key: color_key(&id),
		description: property.description.or(property.markdown_description),
		default: None,
	}))
}
