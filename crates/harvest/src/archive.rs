//! Download and unpacking of source archives.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipArchive;

use crate::{HarvestError, Result};

/// Downloads the archive at `url` into memory.
///
/// # Errors
///
/// [`HarvestError::Download`] on connection failures and non-success statuses.
pub async fn download(url: &str) -> Result<Vec<u8>> {
	info!(%url, "harvest.download.start");
	let response = reqwest::get(url).await?.error_for_status()?;
	let bytes = response.bytes().await?;
	info!(%url, bytes = bytes.len(), "harvest.download.done");
	Ok(bytes.to_vec())
}

/// Unpacks a zip archive into `dir` and returns its single top-level directory.
///
/// # Errors
///
/// [`HarvestError::Archive`] for unreadable archives, [`HarvestError::Layout`] when the archive
/// does not hold exactly one top-level directory.
pub fn unpack(bytes: &[u8], dir: &Path) -> Result<PathBuf> {
	let mut archive = ZipArchive::new(Cursor::new(bytes))?;
	archive.extract(dir)?;
	info!(entries = archive.len(), dir = %dir.display(), "harvest.unpack.done");
	source_root(dir)
}

/// The single directory directly below `dir`.
fn source_root(dir: &Path) -> Result<PathBuf> {
	let entries = std::fs::read_dir(dir).map_err(|e| HarvestError::io(dir, e))?;
	let mut roots = Vec::new();
	for entry in entries {
		let entry = entry.map_err(|e| HarvestError::io(dir, e))?;
		roots.push(entry.path());
	}
	match roots.as_slice() {
		[root] if root.is_dir() => Ok(root.clone()),
		_ => Err(HarvestError::Layout(format!(
			"expected one top-level directory in the archive, found {} entries",
			roots.len()
		))),
	}
}
