//! Harvesting of theme color registrations from the editor's TypeScript sources.
//!
//! The editor declares every theme color with a `registerColor(id, default, description)` call.
//! This crate finds those calls in a source checkout and turns them into the data artifact the
//! completion server downloads:
//!
//! 1. [`archive`] downloads and unpacks a source archive, or a local checkout is used as is.
//! 2. [`Harvester`] walks `src/vs`, parses each `.ts` file with tree-sitter and collects the
//!    registrations, after a fixed set of font variables.
//! 3. [`write_catalog`] emits the JSON array.
#![warn(missing_docs)]

use std::path::PathBuf;

pub mod archive;
mod extract;
mod harvester;
mod output;

pub use harvester::{Harvester, SEED_COLORS, harvest_checkout};
pub use output::write_catalog;

/// Upstream source archive harvested by default.
pub const DEFAULT_ARCHIVE_URL: &str = "https://github.com/microsoft/vscode/archive/main.zip";

/// Errors raised by the harvesting job.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
	/// The archive download failed.
	#[error("download failed: {0}")]
	Download(#[from] reqwest::Error),
	/// The archive could not be read.
	#[error("invalid archive: {0}")]
	Archive(#[from] zip::result::ZipError),
	/// The checkout does not have the expected layout.
	#[error("unexpected source layout: {0}")]
	Layout(String),
	/// Walking the source tree failed.
	#[error("walking sources failed: {0}")]
	Walk(#[from] walkdir::Error),
	/// The TypeScript grammar could not be loaded.
	#[error("incompatible grammar: {0}")]
	Grammar(#[from] tree_sitter::LanguageError),
	/// The parser gave up on a file.
	#[error("failed to parse {0}")]
	Parse(PathBuf),
	/// A filesystem operation failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path involved.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
	/// The harvested colors do not form a valid catalog.
	#[error(transparent)]
	Catalog(#[from] themecolors_catalog::CatalogError),
}

impl HarvestError {
	pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			error,
		}
	}
}

/// Result type for harvesting.
pub type Result<T, E = HarvestError> = std::result::Result<T, E>;
