//! Language server offering `--vscode-*` theme color completions inside `var(...)`.
//!
//! The crate is split the same way as the request flow:
//!
//! - [`MainLoop`]: JSON-RPC message pump over any async byte stream. Notifications are handled
//!   in order, requests run concurrently on a task set so a slow catalog retrieval never blocks
//!   the loop.
//! - [`LspService`]: the seam between the pump and the server logic.
//! - [`Server`]: lifecycle, document store, settings and the completion pipeline.
//! - [`trigger`]: detection of a partially typed variable reference on the current line.
//! - [`completion`]: conversion of a color catalog into completion items.
//!
//! Color data comes from [`themecolors_catalog`]; the live schema variant queries the client
//! through [`ClientSchemaSource`].
#![warn(missing_docs)]
use std::io;
use std::ops::ControlFlow;

use futures::future::BoxFuture;
/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
pub use serde_json::Value as JsonValue;

pub mod completion;
pub mod config;
mod documents;
mod encoding;
mod mainloop;
mod message;
mod schema_source;
mod server;
mod socket;
pub mod trigger;
mod types;

pub use config::{ConfigError, Settings, SourceKind};
pub use documents::DocumentStore;
pub use encoding::OffsetEncoding;
pub use mainloop::MainLoop;
pub use message::Message;
pub use schema_source::ClientSchemaSource;
pub use server::{Server, ServerOptions};
pub use socket::ClientSocket;
pub use types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, RequestId, ResponseError};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The service main loop stopped.
	#[error("service stopped")]
	ServiceStopped,
	/// The peer sent an undecodable or invalid message.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// The peer replied with an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// An outgoing request got no reply in time.
	#[error("request timed out: {0}")]
	RequestTimeout(String),
	/// The peer violates the Language Server Protocol.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// Input/output errors from the underlying channels.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// The underlying channel reached EOF (end of file).
	#[error("the underlying channel reached EOF")]
	Eof,
}

/// The core service abstraction driven by [`MainLoop`].
pub trait LspService {
	/// Handles a request.
	///
	/// Runs synchronously on the main loop up to the returned future, which is then spawned.
	/// Anything order-sensitive, such as reading the document the request refers to, belongs
	/// before the future.
	fn call(&mut self, req: AnyRequest) -> BoxFuture<'static, Result<JsonValue, ResponseError>>;

	/// Handles a notification.
	///
	/// Notifications are delivered in order and synchronously since they can change the
	/// interpretation of later notifications or requests.
	///
	/// # Return
	///
	/// The return value decides the action to either break or continue the main loop.
	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>>;
}
