//! The theme color language server.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use lsp_types::notification::{self, Notification as _, ShowMessage};
use lsp_types::request::{self, Request as _};
use lsp_types::{
	CompletionOptions, CompletionParams, CompletionResponse, DidChangeConfigurationParams, DidChangeTextDocumentParams,
	DidCloseTextDocumentParams, DidOpenTextDocumentParams, InitializeParams, InitializeResult, MessageType, Position,
	Range, ServerCapabilities, ServerInfo, ShowMessageParams, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use serde::de::DeserializeOwned;
use themecolors_catalog::{CatalogRetriever, CatalogStore, Fetch, FileCacheRetriever, LiveSchemaRetriever};
use tracing::{debug, info, warn};

use crate::completion::build_items;
use crate::config::{Settings, SourceKind};
use crate::documents::DocumentStore;
use crate::encoding::OffsetEncoding;
use crate::schema_source::ClientSchemaSource;
use crate::socket::{ClientSocket, decode};
use crate::types::{AnyNotification, AnyRequest, ErrorCode, ResponseError};
use crate::{Error, JsonValue, LspService, Result, trigger};

/// Characters after which the client should ask for completions.
pub const TRIGGER_CHARACTERS: [&str; 2] = ["(", "-"];

/// Initialization option naming the storage directory for the data cache.
const STORAGE_PATH_OPTION: &str = "storagePath";

type ResponseFuture = BoxFuture<'static, Result<JsonValue, ResponseError>>;

/// Process-level options the client cannot change.
#[derive(Clone)]
pub struct ServerOptions {
	/// Directory holding the cached data document, unless the client names one.
	pub storage_dir: PathBuf,
	/// Downloader for the remote data document.
	pub fetcher: Arc<dyn Fetch>,
}

/// State created by `initialize`.
struct Session {
	encoding: OffsetEncoding,
	settings: Settings,
	retriever: CatalogRetriever,
}

enum State {
	Uninitialized,
	Running(Session),
	ShuttingDown,
}

/// [`LspService`] implementing the completion server.
pub struct Server {
	client: ClientSocket,
	options: ServerOptions,
	documents: DocumentStore,
	state: State,
}

impl Server {
	/// Creates a server talking to the client through `client`.
	pub fn new(client: ClientSocket, options: ServerOptions) -> Self {
		Self {
			client,
			options,
			documents: DocumentStore::new(),
			state: State::Uninitialized,
		}
	}

	/// Active settings, once initialized.
	pub fn settings(&self) -> Option<&Settings> {
		match &self.state {
			State::Running(session) => Some(&session.settings),
			_ => None,
		}
	}

	fn initialize(&mut self, params: InitializeParams) -> Result<InitializeResult, ResponseError> {
		if !matches!(self.state, State::Uninitialized) {
			return Err(ResponseError::new(ErrorCode::INVALID_REQUEST, "server already initialized"));
		}

		let encoding = OffsetEncoding::negotiate(
			params
				.capabilities
				.general
				.as_ref()
				.and_then(|general| general.position_encodings.as_deref()),
		);
		let init_options = params.initialization_options.unwrap_or_default();
		let storage_dir = init_options
			.get(STORAGE_PATH_OPTION)
			.and_then(JsonValue::as_str)
			.map_or_else(|| self.options.storage_dir.clone(), PathBuf::from);

		let settings = Settings::from_value(init_options).unwrap_or_else(|e| {
			self.warn_client(format!("Ignoring invalid theme color settings: {e}"));
			Settings::default()
		});

		let retriever = match settings.source {
			SourceKind::Remote => FileCacheRetriever::new(
				CatalogStore::new(&storage_dir),
				self.options.fetcher.clone(),
				settings.file_cache_options(),
			)
			.into(),
			SourceKind::Schema => {
				LiveSchemaRetriever::new(Arc::new(ClientSchemaSource::new(self.client.clone()))).into()
			}
		};
		info!(
			source = ?settings.source,
			storage = %storage_dir.display(),
			encoding = ?encoding,
			"lsp.initialize"
		);

		self.state = State::Running(Session {
			encoding,
			settings,
			retriever,
		});

		Ok(InitializeResult {
			capabilities: ServerCapabilities {
				position_encoding: Some(encoding.to_lsp()),
				text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
				completion_provider: Some(CompletionOptions {
					trigger_characters: Some(TRIGGER_CHARACTERS.iter().map(|c| (*c).to_string()).collect()),
					..CompletionOptions::default()
				}),
				..ServerCapabilities::default()
			},
			server_info: Some(ServerInfo {
				name: env!("CARGO_PKG_NAME").to_string(),
				version: Some(env!("CARGO_PKG_VERSION").to_string()),
			}),
		})
	}

	/// Resolves the completion context synchronously and defers catalog retrieval to the
	/// returned future.
	fn completion(&self, session: &Session, params: CompletionParams) -> ResponseFuture {
		let position = params.text_document_position;
		let uri = &position.text_document.uri;

		let handled = self
			.documents
			.language_id(uri)
			.is_some_and(|lang| session.settings.handles_language(&lang));
		if !handled {
			debug!(uri = uri.as_str(), "lsp.completion.unhandled_document");
			return future::ready(Ok(JsonValue::Null)).boxed();
		}

		let Some(line) = self.documents.line(uri, position.position.line) else {
			return future::ready(Ok(JsonValue::Null)).boxed();
		};
		let encoding = session.encoding;
		let cursor = encoding.byte_offset(&line, position.position.character);
		let Some(span) = trigger::detect(&line, cursor) else {
			return future::ready(Ok(JsonValue::Null)).boxed();
		};

		let line_idx = position.position.line;
		let range = Range::new(
			Position::new(line_idx, encoding.character(&line, span.start)),
			Position::new(line_idx, encoding.character(&line, span.end)),
		);
		let retriever = session.retriever.clone();
		let theme = session.settings.theme;

		async move {
			let catalog = retriever.retrieve().await;
			let items = build_items(&catalog, range, theme);
			debug!(items = items.len(), "lsp.completion.items");
			serde_json::to_value(CompletionResponse::Array(items))
				.map_err(|e| ResponseError::new(ErrorCode::INTERNAL_ERROR, e))
		}
		.boxed()
	}

	fn did_change_configuration(&mut self, params: DidChangeConfigurationParams) {
		let State::Running(session) = &mut self.state else {
			return;
		};
		let Some(section) = Settings::section(params.settings) else {
			debug!("lsp.config.no_section");
			return;
		};

		match Settings::from_value(section) {
			Ok(mut settings) => {
				if settings.source != session.settings.source {
					warn!(
						current = ?session.settings.source,
						requested = ?settings.source,
						"lsp.config.source_change_needs_restart"
					);
					settings.source = session.settings.source;
				}
				session.retriever.set_options(settings.file_cache_options());
				info!(theme = ?settings.theme, url = %settings.data_url, "lsp.config.updated");
				session.settings = settings;
			}
			Err(e) => self.warn_client(format!("Keeping previous theme color settings: {e}")),
		}
	}

	/// Logs `message` and shows it to the user.
	fn warn_client(&self, message: String) {
		warn!(%message, "lsp.config.invalid");
		let params = ShowMessageParams {
			typ: MessageType::WARNING,
			message,
		};
		if let Err(e) = self.client.notify::<ShowMessage>(params) {
			debug!(error = %e, "lsp.show_message.failed");
		}
	}
}

fn params<T: DeserializeOwned>(raw: JsonValue) -> Result<T, ResponseError> {
	decode(raw).map_err(|e| ResponseError::new(ErrorCode::INVALID_PARAMS, e))
}

fn respond<T: serde::Serialize>(outcome: Result<T, ResponseError>) -> ResponseFuture {
	let value = outcome.and_then(|v| {
		serde_json::to_value(v).map_err(|e| ResponseError::new(ErrorCode::INTERNAL_ERROR, e))
	});
	future::ready(value).boxed()
}

impl LspService for Server {
	fn call(&mut self, req: AnyRequest) -> ResponseFuture {
		debug!(id = %req.id, method = %req.method, "lsp.request");
		if req.method == request::Initialize::METHOD {
			return respond(params(req.params).and_then(|p| self.initialize(p)));
		}

		let session = match &self.state {
			State::Running(session) => session,
			State::Uninitialized => {
				return respond::<()>(Err(ResponseError::new(
					ErrorCode::SERVER_NOT_INITIALIZED,
					"server not initialized",
				)));
			}
			State::ShuttingDown => {
				return respond::<()>(Err(ResponseError::new(ErrorCode::INVALID_REQUEST, "server is shutting down")));
			}
		};

		match req.method.as_str() {
			request::Completion::METHOD => match params(req.params) {
				Ok(p) => self.completion(session, p),
				Err(e) => respond::<()>(Err(e)),
			},
			request::Shutdown::METHOD => {
				info!("lsp.shutdown");
				self.state = State::ShuttingDown;
				respond(Ok(JsonValue::Null))
			}
			method => respond::<()>(Err(ResponseError::new(
				ErrorCode::METHOD_NOT_FOUND,
				format!("unhandled method: {method}"),
			))),
		}
	}

	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>> {
		if notif.method == notification::Exit::METHOD {
			return ControlFlow::Break(match self.state {
				State::ShuttingDown => Ok(()),
				_ => Err(Error::Protocol("exit without shutdown".into())),
			});
		}

		let encoding = match &self.state {
			State::Running(session) => session.encoding,
			_ => {
				debug!(method = %notif.method, "lsp.notification.dropped");
				return ControlFlow::Continue(());
			}
		};

		let outcome = match notif.method.as_str() {
			notification::Initialized::METHOD => {
				debug!("lsp.initialized");
				Ok(())
			}
			notification::DidOpenTextDocument::METHOD => {
				decode::<DidOpenTextDocumentParams>(notif.params).map(|p| {
					let doc = p.text_document;
					self.documents.open(doc.uri, doc.language_id, doc.version, doc.text);
				})
			}
			notification::DidChangeTextDocument::METHOD => {
				decode::<DidChangeTextDocumentParams>(notif.params).map(|p| {
					let doc = p.text_document;
					self.documents.change(&doc.uri, doc.version, p.content_changes, encoding);
				})
			}
			notification::DidCloseTextDocument::METHOD => {
				decode::<DidCloseTextDocumentParams>(notif.params).map(|p| self.documents.close(&p.text_document.uri))
			}
			notification::DidChangeConfiguration::METHOD => {
				decode::<DidChangeConfigurationParams>(notif.params).map(|p| self.did_change_configuration(p))
			}
			method => {
				debug!(%method, "lsp.notification.ignored");
				Ok(())
			}
		};

		if let Err(e) = outcome {
			warn!(method = %notif.method, error = %e, "lsp.notification.invalid_params");
		}
		ControlFlow::Continue(())
	}
}
