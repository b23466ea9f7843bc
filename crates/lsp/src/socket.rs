//! Handle for talking back to the client from inside the server.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, oneshot};

use crate::message::Message;
use crate::types::{AnyNotification, AnyRequest, AnyResponse, RequestId};
use crate::{Error, Result};

/// Events delivered to the main loop.
#[derive(Debug)]
pub(crate) enum MainLoopEvent {
	/// A message to write as is.
	Outgoing(Message),
	/// A request whose id the loop assigns, with the channel for its response.
	OutgoingRequest(AnyRequest, oneshot::Sender<AnyResponse>),
}

/// Cloneable handle to send requests and notifications to the client.
#[derive(Debug, Clone)]
pub struct ClientSocket {
	pub(crate) tx: mpsc::UnboundedSender<MainLoopEvent>,
}

impl ClientSocket {
	/// Sends a typed request and waits for the reply.
	///
	/// # Errors
	///
	/// - `Error::ServiceStopped` if the main loop is gone.
	/// - `Error::Response` if the client answered with an error.
	/// - `Error::Deserialize` if the result does not match `R::Result`.
	pub async fn request<R>(&self, params: R::Params) -> Result<R::Result>
	where
		R: lsp_types::request::Request,
	{
		let result = self.request_raw(R::METHOD, serde_json::to_value(params)?).await?;
		Ok(serde_json::from_value(result)?)
	}

	/// Sends a request with arbitrary method and parameters.
	///
	/// # Errors
	///
	/// Same as [`ClientSocket::request`], minus result decoding.
	pub async fn request_raw(&self, method: &str, params: JsonValue) -> Result<JsonValue> {
		let (tx, rx) = oneshot::channel();
		let req = AnyRequest {
			// Replaced by the main loop.
			id: RequestId::Number(0),
			method: method.to_string(),
			params,
		};
		self.tx
			.send(MainLoopEvent::OutgoingRequest(req, tx))
			.map_err(|_| Error::ServiceStopped)?;

		let resp = rx.await.map_err(|_| Error::ServiceStopped)?;
		match resp.error {
			Some(error) => Err(Error::Response(error)),
			None => Ok(resp.result.unwrap_or(JsonValue::Null)),
		}
	}

	/// Sends a typed notification.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` if the main loop is gone.
	pub fn notify<N>(&self, params: N::Params) -> Result<()>
	where
		N: lsp_types::notification::Notification,
	{
		self.notify_raw(N::METHOD, &params)
	}

	fn notify_raw(&self, method: &str, params: &impl Serialize) -> Result<()> {
		let notif = AnyNotification {
			method: method.to_string(),
			params: serde_json::to_value(params)?,
		};
		self.tx
			.send(MainLoopEvent::Outgoing(Message::Notification(notif)))
			.map_err(|_| Error::ServiceStopped)
	}

	/// Creates a socket whose receiving end is returned to the caller, for tests.
	#[cfg(test)]
	pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<MainLoopEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

/// Decodes request parameters into their typed form.
pub(crate) fn decode<T: DeserializeOwned>(params: JsonValue) -> Result<T> {
	Ok(serde_json::from_value(params)?)
}
