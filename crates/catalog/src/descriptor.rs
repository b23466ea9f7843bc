//! Color descriptors and the validated catalog built from them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CatalogError, Result};

/// A named theme color variable.
///
/// `key` is the identifier as it appears after the `--vscode-` prefix, with dots already
/// converted to dashes (`editor-background`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDescriptor {
	/// Unique identifier within a catalog.
	pub key: String,
	/// Human readable description, if the source had one.
	#[serde(default)]
	pub description: Option<String>,
	/// Default value, literal or per theme.
	#[serde(default)]
	pub default: Option<ColorDefault>,
}

impl ColorDescriptor {
	/// Creates a descriptor with no description and no default.
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			description: None,
			default: None,
		}
	}

	/// Sets the description.
	#[must_use]
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Sets the default value.
	#[must_use]
	pub fn with_default(mut self, default: ColorDefault) -> Self {
		self.default = Some(default);
		self
	}
}

/// Default value of a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorDefault {
	/// One value for every theme.
	Literal(String),
	/// Values that differ per theme kind.
	Themed(ThemedDefault),
}

/// Per-theme default values. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemedDefault {
	/// Value for light themes.
	#[serde(default)]
	pub light: Option<String>,
	/// Value for dark themes.
	#[serde(default)]
	pub dark: Option<String>,
	/// Value for high contrast (dark) themes.
	#[serde(default, alias = "hcDark")]
	pub hc: Option<String>,
	/// Value for high contrast light themes.
	#[serde(default, rename = "hcLight", skip_serializing_if = "Option::is_none")]
	pub hc_light: Option<String>,
}

/// An ordered set of descriptors with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCatalog {
	entries: IndexMap<String, ColorDescriptor>,
}

impl ColorCatalog {
	/// Returns an empty catalog.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a catalog, rejecting empty or whitespace-bearing keys and duplicates.
	///
	/// # Errors
	///
	/// [`CatalogError::InvalidKey`] or [`CatalogError::DuplicateKey`] for the first offending
	/// descriptor.
	pub fn new(descriptors: impl IntoIterator<Item = ColorDescriptor>) -> Result<Self> {
		let mut entries = IndexMap::new();
		for descriptor in descriptors {
			if descriptor.key.is_empty() || descriptor.key.chars().any(char::is_whitespace) {
				return Err(CatalogError::InvalidKey(descriptor.key));
			}
			if entries.contains_key(&descriptor.key) {
				return Err(CatalogError::DuplicateKey(descriptor.key));
			}
			entries.insert(descriptor.key.clone(), descriptor);
		}
		Ok(Self { entries })
	}

	/// Parses and validates the JSON array format of the data artifact.
	///
	/// # Errors
	///
	/// [`CatalogError::Malformed`] if the text is not an array of descriptors, plus the
	/// validation errors of [`ColorCatalog::new`].
	pub fn from_json(text: &str) -> Result<Self> {
		let descriptors: Vec<ColorDescriptor> = serde_json::from_str(text)?;
		Self::new(descriptors)
	}

	/// Serializes the catalog back to the JSON array format.
	///
	/// # Errors
	///
	/// Only if serialization itself fails, which plain strings never do.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Number of descriptors.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the catalog has no descriptors.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up a descriptor by key.
	pub fn get(&self, key: &str) -> Option<&ColorDescriptor> {
		self.entries.get(key)
	}

	/// Iterates descriptors in catalog order.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &ColorDescriptor> {
		self.entries.values()
	}
}

impl Serialize for ColorCatalog {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_seq(self.entries.values())
	}
}
