//! Workbench color schema queried from the client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use themecolors_catalog::schema::WORKBENCH_COLORS_URI;
use themecolors_catalog::{CatalogError, SchemaSource};

use crate::socket::ClientSocket;
use crate::{Error, JsonValue};

/// Custom request answered by the client with the text of a schema.
pub const SCHEMA_CONTENT_METHOD: &str = "cssThemeCompletions/schemaContent";

/// How long the client gets to answer.
pub const SCHEMA_TIMEOUT: Duration = Duration::from_secs(10);

/// [`SchemaSource`] asking the connected client for the workbench color schema.
#[derive(Debug, Clone)]
pub struct ClientSchemaSource {
	socket: ClientSocket,
	timeout: Duration,
}

impl ClientSchemaSource {
	/// Creates a source sending its requests through `socket`.
	pub fn new(socket: ClientSocket) -> Self {
		Self {
			socket,
			timeout: SCHEMA_TIMEOUT,
		}
	}

	/// Overrides the reply timeout.
	#[must_use]
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	async fn query(&self) -> Result<String, Error> {
		let params = json!({ "uri": WORKBENCH_COLORS_URI });
		let result = tokio::time::timeout(self.timeout, self.socket.request_raw(SCHEMA_CONTENT_METHOD, params))
			.await
			.map_err(|_| Error::RequestTimeout(SCHEMA_CONTENT_METHOD.to_string()))??;
		match result {
			JsonValue::String(text) => Ok(text),
			other => Err(Error::Protocol(format!("schema content is not a string: {other}"))),
		}
	}
}

#[async_trait]
impl SchemaSource for ClientSchemaSource {
	async fn workbench_colors(&self) -> themecolors_catalog::Result<String> {
		self.query().await.map_err(|e| CatalogError::Schema(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::socket::MainLoopEvent;
	use crate::types::{AnyResponse, ErrorCode, ResponseError};

	#[tokio::test]
	async fn sends_request_and_returns_text() {
		let (socket, mut rx) = ClientSocket::detached();
		let source = ClientSchemaSource::new(socket);

		let client = tokio::spawn(async move {
			let Some(MainLoopEvent::OutgoingRequest(req, tx)) = rx.recv().await else {
				panic!("expected outgoing request");
			};
			assert_eq!(req.method, SCHEMA_CONTENT_METHOD);
			assert_eq!(req.params, json!({ "uri": "vscode://schemas/workbench-colors" }));
			tx.send(AnyResponse::new(req.id, Ok(json!("{\"properties\":{}}")))).unwrap();
		});

		assert_eq!(source.workbench_colors().await.unwrap(), "{\"properties\":{}}");
		client.await.unwrap();
	}

	#[tokio::test]
	async fn error_reply_becomes_schema_error() {
		let (socket, mut rx) = ClientSocket::detached();
		let source = ClientSchemaSource::new(socket);

		tokio::spawn(async move {
			if let Some(MainLoopEvent::OutgoingRequest(req, tx)) = rx.recv().await {
				let err = ResponseError::new(ErrorCode::METHOD_NOT_FOUND, "unhandled method");
				let _ = tx.send(AnyResponse::new(req.id, Err(err)));
			}
		});

		assert!(matches!(source.workbench_colors().await, Err(CatalogError::Schema(_))));
	}

	#[tokio::test]
	async fn unanswered_request_times_out() {
		let (socket, _rx) = ClientSocket::detached();
		let source = ClientSchemaSource::new(socket).timeout(Duration::from_millis(20));
		assert!(matches!(source.query().await, Err(Error::RequestTimeout(_))));
	}
}
