//! On-disk cache of the color data artifact.
//!
//! The storage directory holds two files: `data.json`, the raw artifact exactly as validated
//! after download, and `state.json`, which records when it was last refreshed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::descriptor::ColorCatalog;
use crate::error::{CatalogError, Result};

const DATA_FILE: &str = "data.json";
const STATE_FILE: &str = "state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreState {
	/// Unix timestamp in milliseconds.
	#[serde(default)]
	last_updated: u64,
}

/// Handle on the storage directory of the file-cache strategy.
#[derive(Debug, Clone)]
pub struct CatalogStore {
	dir: PathBuf,
}

impl CatalogStore {
	/// Creates a store rooted at `dir`. The directory is created on first write.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Storage directory.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Path of the cached artifact.
	pub fn data_path(&self) -> PathBuf {
		self.dir.join(DATA_FILE)
	}

	fn state_path(&self) -> PathBuf {
		self.dir.join(STATE_FILE)
	}

	/// Reads the cached catalog. A missing artifact is `Ok(None)`.
	///
	/// # Errors
	///
	/// [`CatalogError::Io`] when the artifact exists but cannot be read, and the parse errors of
	/// [`ColorCatalog::from_json`].
	pub async fn read_catalog(&self) -> Result<Option<ColorCatalog>> {
		let path = self.data_path();
		match tokio::fs::read_to_string(&path).await {
			Ok(text) => ColorCatalog::from_json(&text).map(Some),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(CatalogError::io(path, e)),
		}
	}

	/// Replaces the cached artifact with `contents`.
	///
	/// # Errors
	///
	/// [`CatalogError::Io`] if the directory or file cannot be written.
	pub async fn write_catalog(&self, contents: &str) -> Result<()> {
		write_atomic(&self.data_path(), contents.as_bytes()).await
	}

	/// Time of the last successful refresh, if one was ever recorded.
	///
	/// # Errors
	///
	/// [`CatalogError::Io`] on unreadable state and [`CatalogError::Malformed`] on corrupt state.
	pub async fn last_updated(&self) -> Result<Option<SystemTime>> {
		let path = self.state_path();
		let text = match tokio::fs::read_to_string(&path).await {
			Ok(text) => text,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(CatalogError::io(path, e)),
		};
		let state: StoreState = serde_json::from_str(&text)?;
		Ok(Some(UNIX_EPOCH + Duration::from_millis(state.last_updated)))
	}

	/// Records `at` as the time of the last successful refresh.
	///
	/// # Errors
	///
	/// [`CatalogError::Io`] if the state file cannot be written.
	pub async fn set_last_updated(&self, at: SystemTime) -> Result<()> {
		let millis = at.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
		let state = StoreState {
			last_updated: u64::try_from(millis).unwrap_or(u64::MAX),
		};
		let text = serde_json::to_string(&state)?;
		write_atomic(&self.state_path(), text.as_bytes()).await
	}
}

/// Writes through a sibling temporary file and renames it into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await.map_err(|e| CatalogError::io(parent, e))?;
	}

	let mut tmp = path.as_os_str().to_owned();
	tmp.push(".tmp");
	let tmp = PathBuf::from(tmp);

	tokio::fs::write(&tmp, contents).await.map_err(|e| CatalogError::io(&tmp, e))?;
	tokio::fs::rename(&tmp, path).await.map_err(|e| CatalogError::io(path, e))
}
