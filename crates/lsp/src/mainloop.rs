//! Service main loop driver for the language server.

use std::collections::HashMap;
use std::ops::ControlFlow;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, warn};

use crate::message::Message;
use crate::socket::{ClientSocket, MainLoopEvent};
use crate::types::{AnyResponse, ErrorCode, RequestId, ResponseError};
use crate::{Error, LspService, Result};

/// Messages buffered between the reader task and the loop.
const INBOUND_BUFFER: usize = 32;

/// Service main loop driver.
pub struct MainLoop<S: LspService> {
	/// The wrapped LSP service.
	service: S,
	/// Receiver for internal events from sockets.
	rx: mpsc::UnboundedReceiver<MainLoopEvent>,
	/// Counter for generating outgoing request IDs.
	outgoing_id: i32,
	/// Pending outgoing requests awaiting responses.
	outgoing: HashMap<RequestId, oneshot::Sender<AnyResponse>>,
	/// Concurrent request handlers in flight.
	tasks: JoinSet<AnyResponse>,
	/// Abort handles of incoming requests not answered yet.
	incoming: HashMap<RequestId, AbortHandle>,
}

#[derive(Deserialize)]
struct CancelParams {
	id: RequestId,
}

impl<S: LspService> MainLoop<S> {
	/// Create a Language Server main loop.
	#[must_use]
	pub fn new_server(builder: impl FnOnce(ClientSocket) -> S) -> (Self, ClientSocket) {
		let (tx, rx) = mpsc::unbounded_channel();
		let socket = ClientSocket { tx };
		let this = Self {
			service: builder(socket.clone()),
			rx,
			outgoing_id: 0,
			outgoing: HashMap::new(),
			tasks: JoinSet::new(),
			incoming: HashMap::new(),
		};
		(this, socket)
	}

	/// Drive the service main loop to provide the service.
	///
	/// Shortcut to [`MainLoop::run`] that accepts an `impl AsyncRead` and wraps it in a
	/// [`BufReader`].
	#[allow(clippy::missing_errors_doc, reason = "errors documented in Self::run")]
	pub async fn run_buffered(
		self,
		input: impl AsyncRead + Unpin + Send + 'static,
		output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		self.run(BufReader::new(input), output).await
	}

	/// Drive the service main loop to provide the service.
	///
	/// Input is read on a separate task so that a partially read message is never lost when
	/// another event wins the race. Undecodable message bodies are logged and skipped.
	///
	/// # Errors
	///
	/// - `Error::Io` when the underlying `input` or `output` raises an error.
	/// - `Error::Eof` when the input ends without an `exit` notification.
	/// - `Error::Protocol` when the peer violates the message framing.
	/// - Errors returned by the service from [`LspService::notify`].
	pub async fn run(
		mut self,
		mut input: impl AsyncBufRead + Unpin + Send + 'static,
		mut output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_BUFFER);
		let reader = tokio::spawn(async move {
			loop {
				let msg = Message::read(&mut input).await;
				let fatal = matches!(&msg, Err(e) if !matches!(e, Error::Deserialize(_)));
				if inbound_tx.send(msg).await.is_err() || fatal {
					break;
				}
			}
		});

		let ret = loop {
			let ctl = tokio::select! {
				biased;

				Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
					// A response already answered by a cancellation is dropped.
					Ok(resp) if self.incoming.remove(&resp.id).is_some() => {
						ControlFlow::Continue(Some(Message::Response(resp)))
					}
					Ok(resp) => {
						debug!(id = %resp.id, "lsp.request.late_response_dropped");
						ControlFlow::Continue(None)
					}
					Err(e) if e.is_cancelled() => ControlFlow::Continue(None),
					Err(e) => {
						error!(error = %e, "LSP task panicked");
						ControlFlow::Continue(None)
					}
				},

				event = self.rx.recv() => match event {
					Some(e) => self.dispatch_event(e),
					None => break Ok(()),
				},

				msg = inbound_rx.recv() => match msg {
					Some(Ok(msg)) => self.dispatch_message(msg),
					Some(Err(Error::Deserialize(e))) => {
						warn!(error = %e, "Skipping undecodable message");
						ControlFlow::Continue(None)
					}
					Some(Err(e)) => break Err(e),
					None => break Err(Error::Eof),
				},
			};

			let msg = match ctl {
				ControlFlow::Continue(Some(msg)) => msg,
				ControlFlow::Continue(None) => continue,
				ControlFlow::Break(ret) => break ret,
			};

			if let Err(e) = msg.write(&mut output).await {
				break Err(e);
			}
		};

		reader.abort();
		self.tasks.abort_all();
		output.shutdown().await?;
		ret
	}

	/// Routes an incoming message to the appropriate handler.
	fn dispatch_message(&mut self, msg: Message) -> ControlFlow<Result<()>, Option<Message>> {
		match msg {
			Message::Request(req) => {
				if self.incoming.contains_key(&req.id) {
					warn!(id = %req.id, "Duplicate request id");
				}
				let id = req.id.clone();
				let fut = self.service.call(req);
				let handle = self.tasks.spawn({
					let id = id.clone();
					async move { AnyResponse::new(id, fut.await) }
				});
				self.incoming.insert(id, handle);
			}
			Message::Response(resp) => {
				if let Some(resp_tx) = self.outgoing.remove(&resp.id) {
					// The requester may have given up already.
					let _: Result<_, _> = resp_tx.send(resp);
				} else {
					debug!(id = %resp.id, "lsp.response.unmatched");
				}
			}
			Message::Notification(notif) if notif.method == "$/cancelRequest" => {
				return ControlFlow::Continue(self.cancel(notif.params));
			}
			Message::Notification(notif) => {
				self.service.notify(notif)?;
			}
		}
		ControlFlow::Continue(None)
	}

	/// Aborts a pending incoming request and produces its cancellation response.
	fn cancel(&mut self, params: serde_json::Value) -> Option<Message> {
		let CancelParams { id } = serde_json::from_value(params).ok()?;
		let handle = self.incoming.remove(&id)?;
		handle.abort();
		debug!(%id, "lsp.request.cancelled");
		Some(Message::Response(AnyResponse::new(
			id,
			Err(ResponseError::new(ErrorCode::REQUEST_CANCELLED, "request cancelled")),
		)))
	}

	/// Routes an internal event.
	fn dispatch_event(&mut self, event: MainLoopEvent) -> ControlFlow<Result<()>, Option<Message>> {
		match event {
			MainLoopEvent::OutgoingRequest(mut req, resp_tx) => {
				req.id = RequestId::Number(self.outgoing_id);
				self.outgoing_id = self.outgoing_id.wrapping_add(1);
				self.outgoing.insert(req.id.clone(), resp_tx);
				ControlFlow::Continue(Some(Message::Request(req)))
			}
			MainLoopEvent::Outgoing(msg) => ControlFlow::Continue(Some(msg)),
		}
	}
}
