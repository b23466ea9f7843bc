//! Emission of the harvested catalog.

use std::io::Write;
use std::path::Path;

use themecolors_catalog::ColorCatalog;
use tracing::info;

use crate::{HarvestError, Result};

/// Writes `catalog` as a JSON array to `path`, or to stdout when `path` is `None`.
///
/// File output goes through a sibling temporary file that is renamed into place, so readers
/// never see a partial document.
///
/// # Errors
///
/// [`HarvestError::Io`] when writing fails.
pub fn write_catalog(catalog: &ColorCatalog, path: Option<&Path>) -> Result<()> {
	let json = catalog.to_json()?;
	let Some(path) = path else {
		let mut stdout = std::io::stdout().lock();
		return writeln!(stdout, "{json}").map_err(|e| HarvestError::io("<stdout>", e));
	};

	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	std::fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;
	let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| HarvestError::io(dir, e))?;
	tmp.write_all(json.as_bytes()).map_err(|e| HarvestError::io(tmp.path(), e))?;
	tmp.persist(path).map_err(|e| HarvestError::io(path, e.error))?;
	info!(path = %path.display(), colors = catalog.len(), "harvest.output.written");
	Ok(())
}
