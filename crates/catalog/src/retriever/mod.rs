//! Memoized catalog retrieval.
//!
//! Two strategies exist, one per deployment:
//!
//! * [`FileCacheRetriever`]: serves an on-disk copy of a remote document and refreshes it in the
//!   background once it is older than the freshness window.
//! * [`LiveSchemaRetriever`]: asks the host for its color schema once per process.
//!
//! Both share the same contract. Retrieval never fails, concurrent callers share a single
//! in-flight fetch, and that fetch runs on a detached task so abandoning a request does not
//! abort it.

use std::sync::Arc;

use crate::descriptor::ColorCatalog;

mod file_cache;
mod live_schema;

pub use file_cache::{FileCacheOptions, FileCacheRetriever};
pub use live_schema::{LiveSchemaRetriever, SchemaSource};

/// The retrieval strategy selected at startup.
#[derive(Clone)]
pub enum CatalogRetriever {
	/// Remote document cached on disk.
	FileCache(FileCacheRetriever),
	/// Host color schema, memoized for the process lifetime.
	LiveSchema(LiveSchemaRetriever),
}

impl CatalogRetriever {
	/// Returns the current catalog, possibly stale, possibly empty.
	pub async fn retrieve(&self) -> Arc<ColorCatalog> {
		match self {
			Self::FileCache(retriever) => retriever.retrieve().await,
			Self::LiveSchema(retriever) => retriever.retrieve().await,
		}
	}

	/// Applies new remote source options. The live schema strategy has none.
	pub fn set_options(&self, options: FileCacheOptions) {
		if let Self::FileCache(retriever) = self {
			retriever.set_options(options);
		}
	}
}

impl From<FileCacheRetriever> for CatalogRetriever {
	fn from(retriever: FileCacheRetriever) -> Self {
		Self::FileCache(retriever)
	}
}

impl From<LiveSchemaRetriever> for CatalogRetriever {
	fn from(retriever: LiveSchemaRetriever) -> Self {
		Self::LiveSchema(retriever)
	}
}

#[cfg(test)]
mod tests;
