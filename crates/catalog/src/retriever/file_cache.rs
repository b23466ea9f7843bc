use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::descriptor::ColorCatalog;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::flight::{SingleFlight, land};
use crate::store::CatalogStore;

/// Where the remote document lives and how long a downloaded copy stays fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCacheOptions {
	/// URL of the JSON data document.
	pub data_url: String,
	/// Age after which a background refresh is started.
	pub refresh_interval: Duration,
}

#[derive(Default)]
struct CacheState {
	catalog: Option<Arc<ColorCatalog>>,
	updated_at: Option<SystemTime>,
}

struct Inner {
	store: CatalogStore,
	fetcher: Arc<dyn Fetch>,
	options: RwLock<FileCacheOptions>,
	state: RwLock<CacheState>,
	loaded: OnceCell<()>,
	refresh: SingleFlight<Option<Arc<ColorCatalog>>>,
}

/// Retriever serving a disk-cached copy of a remote document.
///
/// The artifact is read from disk once. A copy younger than the refresh interval is served as
/// is. An older copy is still served immediately while a single background refresh replaces it.
/// Callers only wait for the network when nothing is cached at all.
#[derive(Clone)]
pub struct FileCacheRetriever {
	inner: Arc<Inner>,
}

impl FileCacheRetriever {
	/// Creates a retriever over `store`, downloading through `fetcher`.
	pub fn new(store: CatalogStore, fetcher: Arc<dyn Fetch>, options: FileCacheOptions) -> Self {
		Self {
			inner: Arc::new(Inner {
				store,
				fetcher,
				options: RwLock::new(options),
				state: RwLock::new(CacheState::default()),
				loaded: OnceCell::new(),
				refresh: SingleFlight::default(),
			}),
		}
	}

	/// Replaces the source options. Takes effect on the next freshness check.
	pub fn set_options(&self, options: FileCacheOptions) {
		*self.inner.options.write() = options;
	}

	/// Whether a background refresh is running.
	pub fn is_refreshing(&self) -> bool {
		self.inner.refresh.is_running()
	}

	/// Returns the cached catalog, refreshing it when stale.
	pub async fn retrieve(&self) -> Arc<ColorCatalog> {
		self.load().await;

		let interval = self.inner.options.read().refresh_interval;
		let (cached, fresh) = {
			let state = self.inner.state.read();
			let fresh = state.updated_at.is_some_and(|at| is_fresh(at, interval));
			(state.catalog.clone(), fresh)
		};

		if let Some(catalog) = &cached
			&& fresh
		{
			return catalog.clone();
		}

		let inner = self.inner.clone();
		let (flight, started) = self.inner.refresh.join_or_start(move || refresh(inner));
		if started {
			debug!(stale = cached.is_some(), "catalog.refresh.start");
		}

		if let Some(catalog) = cached {
			return catalog;
		}

		land(flight)
			.await
			.flatten()
			.or_else(|| self.inner.state.read().catalog.clone())
			.unwrap_or_default()
	}

	/// Loads the on-disk artifact and timestamp into memory, once.
	async fn load(&self) {
		self.inner
			.loaded
			.get_or_init(|| async {
				let store = &self.inner.store;
				let catalog = match store.read_catalog().await {
					Ok(catalog) => catalog,
					Err(e) => {
						warn!(path = %store.data_path().display(), error = %e, "Ignoring unreadable color cache");
						None
					}
				};
				let updated_at = match store.last_updated().await {
					Ok(at) => at,
					Err(e) => {
						warn!(dir = %store.dir().display(), error = %e, "Ignoring unreadable cache state");
						None
					}
				};

				debug!(colors = catalog.as_ref().map_or(0, ColorCatalog::len), ?updated_at, "catalog.cache.loaded");
				let mut state = self.inner.state.write();
				if state.catalog.is_none() {
					state.catalog = catalog.map(Arc::new);
					state.updated_at = updated_at;
				}
			})
			.await;
	}
}

fn is_fresh(updated_at: SystemTime, interval: Duration) -> bool {
	match SystemTime::now().duration_since(updated_at) {
		Ok(age) => age < interval,
		// Timestamp from the future: treat as just refreshed.
		Err(_) => true,
	}
}

/// Downloads, validates and persists a new catalog, then publishes it in memory.
async fn refresh(inner: Arc<Inner>) -> Option<Arc<ColorCatalog>> {
	let url = inner.options.read().data_url.clone();
	let catalog = match download(&inner, &url).await {
		Ok(catalog) => Arc::new(catalog),
		Err(e) => {
			warn!(url = %url, error = %e, "Error fetching updated theme colors");
			return None;
		}
	};

	let now = SystemTime::now();
	{
		let mut state = inner.state.write();
		state.catalog = Some(catalog.clone());
		state.updated_at = Some(now);
	}
	info!(url = %url, colors = catalog.len(), "Theme colors updated");
	Some(catalog)
}

async fn download(inner: &Inner, url: &str) -> Result<ColorCatalog> {
	let text = inner.fetcher.fetch(url).await?;
	let catalog = ColorCatalog::from_json(&text)?;

	// The fresh copy is served from memory even if persisting it fails.
	if let Err(e) = inner.store.write_catalog(&text).await {
		warn!(error = %e, "Failed to persist color cache");
	} else if let Err(e) = inner.store.set_last_updated(SystemTime::now()).await {
		warn!(error = %e, "Failed to persist cache timestamp");
	}

	Ok(catalog)
}
