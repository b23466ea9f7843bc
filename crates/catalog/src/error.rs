//! Error types for catalog loading and retrieval.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, fetching or validating color data.
///
/// None of these reach a completion request: retrievers log them and fall back to the previous
/// catalog. They surface directly only from the lower level constructors and the harvester.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// The remote document could not be fetched.
	#[error("fetch failed: {0}")]
	Network(String),

	/// The remote server answered with a non-success status.
	#[error("fetch of {url} returned status {status}: {body}")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status code.
		status: u16,
		/// Response body, for diagnostics.
		body: String,
	},

	/// A JSON payload did not match the expected shape.
	#[error("malformed color data: {0}")]
	Malformed(#[from] serde_json::Error),

	/// Two descriptors in one payload share a key.
	#[error("duplicate color key: {0}")]
	DuplicateKey(String),

	/// A descriptor key is empty or contains whitespace.
	#[error("invalid color key: {0:?}")]
	InvalidKey(String),

	/// Reading or writing the on-disk cache failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path of the artifact.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The host could not provide its color schema.
	#[error("schema query failed: {0}")]
	Schema(String),
}

impl CatalogError {
	/// Wraps an I/O error with the path it happened on.
	pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			error,
		}
	}
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
