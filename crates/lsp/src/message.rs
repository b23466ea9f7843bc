//! `Content-Length` framed JSON-RPC messages.

use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{AnyNotification, AnyRequest, AnyResponse, RequestId};
use crate::{Error, Result};

/// Largest accepted message body, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 << 20;

/// A JSON-RPC message in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// A request expecting a response.
	Request(AnyRequest),
	/// A response to an earlier request.
	Response(AnyResponse),
	/// A fire-and-forget notification.
	Notification(AnyNotification),
}

impl Message {
	/// Reads one framed message.
	///
	/// # Errors
	///
	/// - `Error::Eof` when the stream ends before a header.
	/// - `Error::Protocol` on a missing, invalid or oversized `Content-Length`, or a body that is
	///   not a JSON-RPC message.
	/// - `Error::Deserialize` when the body is not JSON. The body has been consumed, so the
	///   stream stays usable.
	/// - `Error::Io` from the underlying reader.
	pub async fn read(input: &mut (impl AsyncBufRead + Unpin)) -> Result<Self> {
		let mut content_length: Option<usize> = None;
		let mut seen_header = false;
		let mut line = String::new();
		loop {
			line.clear();
			if input.read_line(&mut line).await? == 0 {
				return Err(Error::Eof);
			}

			let header = line.trim_end();
			if header.is_empty() {
				if !seen_header {
					// Stray blank line between messages.
					continue;
				}
				break;
			}
			seen_header = true;

			if let Some((name, value)) = header.split_once(':')
				&& name.trim().eq_ignore_ascii_case("content-length")
			{
				let value = value.trim();
				let length = value
					.parse()
					.map_err(|_| Error::Protocol(format!("invalid Content-Length: {value}")))?;
				content_length = Some(length);
			}
		}

		let length = content_length.ok_or_else(|| Error::Protocol("missing Content-Length".into()))?;
		if length > MAX_MESSAGE_SIZE {
			return Err(Error::Protocol(format!(
				"Content-Length {length} exceeds the {MAX_MESSAGE_SIZE} byte limit"
			)));
		}
		let mut body = vec![0u8; length];
		input.read_exact(&mut body).await?;

		let json: JsonValue = serde_json::from_slice(&body)?;
		Self::from_json(json)
	}

	/// Writes the message with its header and flushes.
	///
	/// # Errors
	///
	/// `Error::Io` from the underlying writer.
	pub async fn write(&self, output: &mut (impl AsyncWrite + Unpin)) -> Result<()> {
		let json = serde_json::to_string(&self.to_json())?;
		let framed = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
		output.write_all(framed.as_bytes()).await?;
		output.flush().await?;
		Ok(())
	}

	/// Classifies a decoded JSON-RPC object.
	fn from_json(json: JsonValue) -> Result<Self> {
		let has_id = json.get("id").is_some_and(|id| !id.is_null());
		let has_method = json.get("method").is_some();
		let message = match (has_id, has_method) {
			(true, true) => Self::Request(serde_json::from_value(json)?),
			(false, true) => Self::Notification(serde_json::from_value(json)?),
			(true, false) => Self::Response(serde_json::from_value(json)?),
			(false, false) => return Err(Error::Protocol(format!("not a JSON-RPC message: {json}"))),
		};
		Ok(message)
	}

	fn to_json(&self) -> JsonValue {
		match self {
			Self::Request(req) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": req.id,
				"method": req.method,
				"params": req.params,
			}),
			Self::Notification(notif) => serde_json::json!({
				"jsonrpc": "2.0",
				"method": notif.method,
				"params": notif.params,
			}),
			Self::Response(AnyResponse {
				id,
				error: Some(error),
				..
			}) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": id,
				"error": error,
			}),
			Self::Response(AnyResponse { id, result, .. }) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": id,
				"result": result.clone().unwrap_or(JsonValue::Null),
			}),
		}
	}

	/// Request identifier carried by requests and responses.
	pub fn id(&self) -> Option<&RequestId> {
		match self {
			Self::Request(req) => Some(&req.id),
			Self::Response(resp) => Some(&resp.id),
			Self::Notification(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tokio::io::BufReader;

	use super::*;
	use crate::types::{ErrorCode, ResponseError};

	fn frame(body: &str) -> String {
		format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
	}

	#[tokio::test]
	async fn reads_each_message_kind() {
		let input = [
			frame(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#),
			frame(r#"{"jsonrpc":"2.0","method":"initialized"}"#),
			frame(r#"{"jsonrpc":"2.0","id":"abc","result":null}"#),
		]
		.concat();
		let mut reader = BufReader::new(input.as_bytes());

		let Message::Request(req) = Message::read(&mut reader).await.unwrap() else {
			panic!("expected request");
		};
		assert_eq!(req.id, RequestId::Number(1));
		assert_eq!(req.method, "initialize");

		let Message::Notification(notif) = Message::read(&mut reader).await.unwrap() else {
			panic!("expected notification");
		};
		assert_eq!(notif.method, "initialized");
		assert_eq!(notif.params, JsonValue::Null);

		let Message::Response(resp) = Message::read(&mut reader).await.unwrap() else {
			panic!("expected response");
		};
		assert_eq!(resp.id, RequestId::String("abc".into()));

		assert!(matches!(Message::read(&mut reader).await, Err(Error::Eof)));
	}

	#[tokio::test]
	async fn accepts_extra_headers_and_any_case() {
		let body = r#"{"jsonrpc":"2.0","method":"exit"}"#;
		let input = format!(
			"content-length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
			body.len(),
			body
		);
		let mut reader = BufReader::new(input.as_bytes());
		assert!(matches!(Message::read(&mut reader).await.unwrap(), Message::Notification(n) if n.method == "exit"));
	}

	#[tokio::test]
	async fn bad_json_leaves_stream_usable() {
		let input = [frame("{not json"), frame(r#"{"jsonrpc":"2.0","method":"exit"}"#)].concat();
		let mut reader = BufReader::new(input.as_bytes());
		assert!(matches!(Message::read(&mut reader).await, Err(Error::Deserialize(_))));
		assert!(matches!(Message::read(&mut reader).await, Ok(Message::Notification(_))));
	}

	#[tokio::test]
	async fn missing_length_is_a_protocol_error() {
		let mut reader = BufReader::new("Content-Type: x\r\n\r\n{}".as_bytes());
		assert!(matches!(Message::read(&mut reader).await, Err(Error::Protocol(_))));
	}

	#[tokio::test]
	async fn stray_blank_lines_before_headers_are_skipped() {
		let input = format!("\r\n\r\n{}", frame(r#"{"jsonrpc":"2.0","method":"exit"}"#));
		let mut reader = BufReader::new(input.as_bytes());
		assert!(matches!(Message::read(&mut reader).await, Ok(Message::Notification(_))));
	}

	#[tokio::test]
	async fn oversized_length_is_rejected_before_reading() {
		let mut reader = BufReader::new("Content-Length: 99999999999999\r\n\r\n{}".as_bytes());
		assert!(matches!(Message::read(&mut reader).await, Err(Error::Protocol(_))));

		let over_limit = format!("Content-Length: {}\r\n\r\n", MAX_MESSAGE_SIZE + 1);
		let mut reader = BufReader::new(over_limit.as_bytes());
		assert!(matches!(Message::read(&mut reader).await, Err(Error::Protocol(_))));
	}

	#[tokio::test]
	async fn writes_null_result_and_errors() {
		let mut out = Vec::new();
		Message::Response(AnyResponse::new(RequestId::Number(3), Ok(JsonValue::Null)))
			.write(&mut out)
			.await
			.unwrap();
		Message::Response(AnyResponse::new(
			RequestId::Number(4),
			Err(ResponseError::new(ErrorCode::METHOD_NOT_FOUND, "no such method")),
		))
		.write(&mut out)
		.await
		.unwrap();

		let mut reader = BufReader::new(out.as_slice());
		let Message::Response(ok) = Message::read(&mut reader).await.unwrap() else {
			panic!("expected response");
		};
		assert_eq!(ok.result, None);
		assert_eq!(ok.error, None);

		let Message::Response(err) = Message::read(&mut reader).await.unwrap() else {
			panic!("expected response");
		};
		assert_eq!(err.error.unwrap().code, ErrorCode::METHOD_NOT_FOUND);
	}
}
