use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::descriptor::ColorCatalog;
use crate::error::Result;
use crate::flight::{SingleFlight, land};
use crate::schema::parse_workbench_schema;

/// Host-side provider of the workbench color schema.
#[async_trait]
pub trait SchemaSource: Send + Sync {
	/// Returns the raw JSON text of the color schema.
	async fn workbench_colors(&self) -> Result<String>;
}

struct Inner {
	source: Arc<dyn SchemaSource>,
	memo: RwLock<Option<Arc<ColorCatalog>>>,
	flight: SingleFlight<Arc<ColorCatalog>>,
}

/// Retriever that queries the host schema once and keeps the result until restart.
///
/// A failed query is memoized as an empty catalog as well.
#[derive(Clone)]
pub struct LiveSchemaRetriever {
	inner: Arc<Inner>,
}

impl LiveSchemaRetriever {
	/// Creates a retriever over `source`.
	pub fn new(source: Arc<dyn SchemaSource>) -> Self {
		Self {
			inner: Arc::new(Inner {
				source,
				memo: RwLock::new(None),
				flight: SingleFlight::default(),
			}),
		}
	}

	/// Returns the memoized catalog, querying the host on first use.
	pub async fn retrieve(&self) -> Arc<ColorCatalog> {
		if let Some(catalog) = self.inner.memo.read().clone() {
			return catalog;
		}

		let inner = self.inner.clone();
		let (flight, _) = self.inner.flight.join_or_start(move || query(inner));
		land(flight).await.unwrap_or_default()
	}
}

async fn query(inner: Arc<Inner>) -> Arc<ColorCatalog> {
	let catalog = match inner.source.workbench_colors().await.and_then(|text| parse_workbench_schema(&text)) {
		Ok(catalog) => {
			debug!(colors = catalog.len(), "catalog.schema.loaded");
			catalog
		}
		Err(e) => {
			warn!(error = %e, "Error fetching theme colors from host schema");
			ColorCatalog::empty()
		}
	};

	let catalog = Arc::new(catalog);
	*inner.memo.write() = Some(catalog.clone());
	catalog
}
