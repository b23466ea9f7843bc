//! Accumulation of registrations across a source tree.

use std::collections::HashSet;
use std::path::Path;

use themecolors_catalog::schema::color_key;
use themecolors_catalog::{ColorCatalog, ColorDefault, ColorDescriptor};
use tracing::{debug, info, warn};
use tree_sitter::Parser;
use walkdir::WalkDir;

use crate::extract::{Found, registrations};
use crate::{HarvestError, Result};

/// Font variables the host defines outside `registerColor`, as `(key, default)`.
pub const SEED_COLORS: [(&str, &str); 6] = [
	("font-family", "sans-serif"),
	("font-weight", "400"),
	("font-size", "14"),
	("editor-font-family", "monospace"),
	("editor-font-weight", "400"),
	("editor-font-size", "14"),
];

/// Collects color descriptors from TypeScript sources, seeded with [`SEED_COLORS`].
pub struct Harvester {
	parser: Parser,
	keys: HashSet<String>,
	colors: Vec<ColorDescriptor>,
}

impl Harvester {
	/// Creates a harvester holding only the seed colors.
	///
	/// # Errors
	///
	/// [`HarvestError::Grammar`] if the TypeScript grammar does not match the parser version.
	pub fn new() -> Result<Self> {
		let mut parser = Parser::new();
		parser.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;

		let mut harvester = Self {
			parser,
			keys: HashSet::new(),
			colors: Vec::new(),
		};
		for (key, default) in SEED_COLORS {
			harvester.push(
				ColorDescriptor::new(key)
					.with_description("")
					.with_default(ColorDefault::Literal(default.to_string())),
			);
		}
		Ok(harvester)
	}

	/// Adds the registrations of one source file and returns how many were new.
	///
	/// `path` is only used in log records.
	///
	/// # Errors
	///
	/// [`HarvestError::Parse`] if the parser gives up on the file.
	pub fn add_source(&mut self, path: &Path, source: &str) -> Result<usize> {
		let tree = self
			.parser
			.parse(source, None)
			.ok_or_else(|| HarvestError::Parse(path.to_path_buf()))?;

		let before = self.colors.len();
		for found in registrations(&tree, source) {
			let color = match found {
				Found::Color(color) => color,
				Found::DynamicName(row) => {
					debug!(path = %path.display(), line = row + 1, "harvest.name_not_literal");
					continue;
				}
			};
			if color.description.is_none() {
				debug!(path = %path.display(), line = color.row + 1, name = %color.name, "harvest.no_description");
			}

			let key = color_key(&color.name);
			if key.is_empty() || key.chars().any(char::is_whitespace) {
				warn!(path = %path.display(), line = color.row + 1, name = %color.name, "harvest.invalid_name");
				continue;
			}
			self.push(ColorDescriptor {
				key,
				description: color.description,
				default: color.default,
			});
		}
		Ok(self.colors.len() - before)
	}

	/// Adds every `.ts` file below `<root>/src/vs`, in sorted path order.
	///
	/// Files that are not valid UTF-8 are skipped with a warning.
	///
	/// # Errors
	///
	/// [`HarvestError::Layout`] if `src/vs` is missing, and walk or parse failures.
	pub fn add_checkout(&mut self, root: &Path) -> Result<()> {
		let base = root.join("src").join("vs");
		if !base.is_dir() {
			return Err(HarvestError::Layout(format!("{} is not a directory", base.display())));
		}

		let mut files = 0usize;
		for entry in WalkDir::new(&base).sort_by_file_name() {
			let entry = entry?;
			let path = entry.path();
			if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "ts") {
				continue;
			}
			let source = match std::fs::read_to_string(path) {
				Ok(source) => source,
				Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
					warn!(path = %path.display(), "harvest.not_utf8");
					continue;
				}
				Err(e) => return Err(HarvestError::io(path, e)),
			};
			files += 1;
			self.add_source(path, &source)?;
		}
		info!(files, colors = self.colors.len(), "harvest.checkout.done");
		Ok(())
	}

	/// Builds the catalog in collection order.
	///
	/// # Errors
	///
	/// Catalog validation errors, which the key checks in [`Harvester::add_source`] rule out.
	pub fn finish(self) -> Result<ColorCatalog> {
		Ok(ColorCatalog::new(self.colors)?)
	}

	/// Keeps the first color registered under each key.
	fn push(&mut self, color: ColorDescriptor) {
		if self.keys.insert(color.key.clone()) {
			self.colors.push(color);
		} else {
			debug!(key = %color.key, "harvest.duplicate");
		}
	}
}

/// Harvests a source checkout rooted at `root`.
///
/// # Errors
///
/// See [`Harvester::new`] and [`Harvester::add_checkout`].
pub fn harvest_checkout(root: &Path) -> Result<ColorCatalog> {
	let mut harvester = Harvester::new()?;
	harvester.add_checkout(root)?;
	harvester.finish()
}
