use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use super::*;
use crate::{CatalogError, CatalogStore, Fetch, Result};

const OLD_DATA: &str = r#"[{"key": "old-color", "description": "old", "default": null}]"#;
const NEW_DATA: &str = r##"[{"key": "foo-bar", "description": "d", "default": "#fff"}, {"key": "baz", "description": null, "default": null}]"##;
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct MockFetcher {
	calls: AtomicUsize,
	urls: Mutex<Vec<String>>,
	body: Mutex<std::result::Result<String, String>>,
	gate: Option<Arc<Notify>>,
}

impl MockFetcher {
	fn ok(body: &str) -> Arc<Self> {
		Arc::new(Self::with(Ok(body.to_string()), None))
	}

	fn failing() -> Arc<Self> {
		Arc::new(Self::with(Err("connection refused".to_string()), None))
	}

	fn gated(body: &str, gate: Arc<Notify>) -> Arc<Self> {
		Arc::new(Self::with(Ok(body.to_string()), Some(gate)))
	}

	fn with(body: std::result::Result<String, String>, gate: Option<Arc<Notify>>) -> Self {
		Self {
			calls: AtomicUsize::new(0),
			urls: Mutex::new(Vec::new()),
			body: Mutex::new(body),
			gate,
		}
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Fetch for MockFetcher {
	async fn fetch(&self, url: &str) -> Result<String> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.urls.lock().push(url.to_string());
		if let Some(gate) = &self.gate {
			gate.notified().await;
		}
		let body = self.body.lock().clone();
		body.map_err(CatalogError::Network)
	}
}

fn options() -> FileCacheOptions {
	FileCacheOptions {
		data_url: "https://example.test/latest.json".to_string(),
		refresh_interval: WEEK,
	}
}

async fn seeded_store(dir: &std::path::Path, updated_at: SystemTime) -> CatalogStore {
	let store = CatalogStore::new(dir);
	store.write_catalog(OLD_DATA).await.unwrap();
	store.set_last_updated(updated_at).await.unwrap();
	store
}

fn keys(catalog: &crate::ColorCatalog) -> Vec<String> {
	catalog.iter().map(|d| d.key.clone()).collect()
}

async fn wait_for_refresh(retriever: &FileCacheRetriever) {
	for _ in 0..200 {
		if !retriever.is_refreshing() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	panic!("background refresh did not finish");
}

#[tokio::test]
async fn fresh_cache_is_served_without_fetching() {
	let dir = tempfile::tempdir().unwrap();
	let store = seeded_store(dir.path(), SystemTime::now()).await;
	let fetcher = MockFetcher::ok(NEW_DATA);
	let retriever = FileCacheRetriever::new(store, fetcher.clone(), options());

	let catalog = retriever.retrieve().await;
	assert_eq!(keys(&catalog), ["old-color"]);
	let catalog = retriever.retrieve().await;
	assert_eq!(keys(&catalog), ["old-color"]);
	assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn stale_cache_is_served_while_refreshing() {
	let dir = tempfile::tempdir().unwrap();
	let store = seeded_store(dir.path(), UNIX_EPOCH + Duration::from_secs(86_400)).await;
	let gate = Arc::new(Notify::new());
	let fetcher = MockFetcher::gated(NEW_DATA, gate.clone());
	let retriever = FileCacheRetriever::new(store.clone(), fetcher.clone(), options());

	let stale = retriever.retrieve().await;
	assert_eq!(keys(&stale), ["old-color"]);
	assert!(retriever.is_refreshing());

	// Still stale and still a single refresh while the fetch is blocked.
	let stale = retriever.retrieve().await;
	assert_eq!(keys(&stale), ["old-color"]);

	gate.notify_one();
	wait_for_refresh(&retriever).await;

	let refreshed = retriever.retrieve().await;
	assert_eq!(keys(&refreshed), ["foo-bar", "baz"]);
	assert_eq!(fetcher.calls(), 1);

	let on_disk = store.read_catalog().await.unwrap().unwrap();
	assert_eq!(keys(&on_disk), ["foo-bar", "baz"]);
	let updated_at = store.last_updated().await.unwrap().unwrap();
	assert!(SystemTime::now().duration_since(updated_at).unwrap() < Duration::from_secs(60));
}

#[tokio::test]
async fn empty_cache_blocks_on_a_single_fetch() {
	let dir = tempfile::tempdir().unwrap();
	let gate = Arc::new(Notify::new());
	let fetcher = MockFetcher::gated(NEW_DATA, gate.clone());
	let retriever = FileCacheRetriever::new(CatalogStore::new(dir.path()), fetcher.clone(), options());

	let handles: Vec<_> = (0..5)
		.map(|_| {
			let retriever = retriever.clone();
			tokio::spawn(async move { retriever.retrieve().await })
		})
		.collect();

	while fetcher.calls() == 0 {
		tokio::task::yield_now().await;
	}
	for _ in 0..10 {
		tokio::task::yield_now().await;
	}
	gate.notify_one();

	for handle in handles {
		let catalog = handle.await.unwrap();
		assert_eq!(keys(&catalog), ["foo-bar", "baz"]);
	}
	assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn failed_fetch_without_cache_yields_empty_and_retries() {
	let dir = tempfile::tempdir().unwrap();
	let fetcher = MockFetcher::failing();
	let retriever = FileCacheRetriever::new(CatalogStore::new(dir.path()), fetcher.clone(), options());

	assert!(retriever.retrieve().await.is_empty());
	assert!(retriever.retrieve().await.is_empty());
	assert_eq!(fetcher.calls(), 2);
	assert!(!dir.path().join("data.json").exists());
}

#[tokio::test]
async fn failed_refresh_keeps_stale_copy() {
	let dir = tempfile::tempdir().unwrap();
	let store = seeded_store(dir.path(), UNIX_EPOCH).await;
	let fetcher = MockFetcher::failing();
	let retriever = FileCacheRetriever::new(store.clone(), fetcher.clone(), options());

	assert_eq!(keys(&*retriever.retrieve().await), ["old-color"]);
	wait_for_refresh(&retriever).await;
	assert_eq!(keys(&*retriever.retrieve().await), ["old-color"]);
	assert_eq!(keys(&store.read_catalog().await.unwrap().unwrap()), ["old-color"]);
}

#[tokio::test]
async fn malformed_remote_data_is_not_persisted() {
	let dir = tempfile::tempdir().unwrap();
	let store = seeded_store(dir.path(), UNIX_EPOCH).await;
	let fetcher = MockFetcher::ok(r#"{"error": "not an array"}"#);
	let retriever = FileCacheRetriever::new(store.clone(), fetcher.clone(), options());

	assert_eq!(keys(&*retriever.retrieve().await), ["old-color"]);
	wait_for_refresh(&retriever).await;
	assert_eq!(keys(&store.read_catalog().await.unwrap().unwrap()), ["old-color"]);
	assert_eq!(store.last_updated().await.unwrap(), Some(UNIX_EPOCH));
}

#[tokio::test]
async fn corrupt_artifact_counts_as_missing() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("data.json"), "{{{").unwrap();
	let fetcher = MockFetcher::ok(NEW_DATA);
	let retriever = FileCacheRetriever::new(CatalogStore::new(dir.path()), fetcher.clone(), options());

	assert_eq!(keys(&*retriever.retrieve().await), ["foo-bar", "baz"]);
	assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn updated_options_change_url_and_window() {
	let dir = tempfile::tempdir().unwrap();
	let store = seeded_store(dir.path(), SystemTime::now()).await;
	let fetcher = MockFetcher::ok(NEW_DATA);
	let retriever = CatalogRetriever::from(FileCacheRetriever::new(store, fetcher.clone(), options()));

	assert_eq!(keys(&*retriever.retrieve().await), ["old-color"]);
	retriever.set_options(FileCacheOptions {
		data_url: "https://mirror.test/colors.json".to_string(),
		refresh_interval: Duration::ZERO,
	});

	assert_eq!(keys(&*retriever.retrieve().await), ["old-color"]);
	let CatalogRetriever::FileCache(inner) = &retriever else {
		unreachable!();
	};
	wait_for_refresh(inner).await;
	assert_eq!(fetcher.urls.lock().as_slice(), ["https://mirror.test/colors.json"]);
}

struct MockSchema {
	calls: AtomicUsize,
	response: std::result::Result<&'static str, &'static str>,
	gate: Arc<Notify>,
}

#[async_trait]
impl SchemaSource for MockSchema {
	async fn workbench_colors(&self) -> Result<String> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.gate.notified().await;
		self.response.map(str::to_string).map_err(|e| CatalogError::Schema(e.to_string()))
	}
}

#[tokio::test]
async fn live_schema_is_queried_once() {
	let gate = Arc::new(Notify::new());
	let source = Arc::new(MockSchema {
		calls: AtomicUsize::new(0),
		response: Ok(r#"{"properties": {"editor.background": {"description": "Editor background color."}}}"#),
		gate: gate.clone(),
	});
	let retriever = CatalogRetriever::from(LiveSchemaRetriever::new(source.clone()));

	let first = tokio::spawn({
		let retriever = retriever.clone();
		async move { retriever.retrieve().await }
	});
	let second = tokio::spawn({
		let retriever = retriever.clone();
		async move { retriever.retrieve().await }
	});

	while source.calls.load(Ordering::SeqCst) == 0 {
		tokio::task::yield_now().await;
	}
	gate.notify_one();

	for handle in [first, second] {
		let catalog = handle.await.unwrap();
		assert_eq!(keys(&catalog), ["editor-background"]);
	}
	assert_eq!(keys(&*retriever.retrieve().await), ["editor-background"]);
	assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn live_schema_failure_is_memoized_as_empty() {
	let gate = Arc::new(Notify::new());
	gate.notify_one();
	let source = Arc::new(MockSchema {
		calls: AtomicUsize::new(0),
		response: Err("no schema"),
		gate,
	});
	let retriever = LiveSchemaRetriever::new(source.clone());

	assert!(retriever.retrieve().await.is_empty());
	assert!(retriever.retrieve().await.is_empty());
	assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}
