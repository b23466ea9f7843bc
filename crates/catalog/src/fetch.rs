//! Remote document fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{CatalogError, Result};

/// Source of remote documents, abstracted so retrieval can be tested without a network.
#[async_trait]
pub trait Fetch: Send + Sync {
	/// Fetches the body of `url` as text.
	async fn fetch(&self, url: &str) -> Result<String>;
}

/// [`Fetch`] implementation backed by a shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: Client,
	timeout: Duration,
}

impl HttpFetcher {
	/// Creates a fetcher with a 30 second request timeout.
	pub fn new() -> Self {
		Self {
			client: Client::new(),
			timeout: Duration::from_secs(30),
		}
	}
}

impl Default for HttpFetcher {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Fetch for HttpFetcher {
	async fn fetch(&self, url: &str) -> Result<String> {
		let response = self
			.client
			.get(url)
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| CatalogError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(CatalogError::Status {
				url: url.to_string(),
				status: status.as_u16(),
				body,
			});
		}

		response.text().await.map_err(|e| CatalogError::Network(e.to_string()))
	}
}
