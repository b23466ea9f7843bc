//! JSON-RPC message payload types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Identifier of a request, chosen by its sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// Numeric identifier.
	Number(i32),
	/// String identifier.
	String(String),
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(id) => write!(f, "{id}"),
			Self::String(id) => write!(f, "{id:?}"),
		}
	}
}

/// A request with untyped parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyRequest {
	/// Request identifier.
	pub id: RequestId,
	/// Method name.
	pub method: String,
	/// Raw parameters, `null` when absent.
	#[serde(default)]
	pub params: JsonValue,
}

/// A notification with untyped parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyNotification {
	/// Method name.
	pub method: String,
	/// Raw parameters, `null` when absent.
	#[serde(default)]
	pub params: JsonValue,
}

/// A response to a request. Exactly one of `result` and `error` is meaningful.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnyResponse {
	/// Identifier of the request being answered.
	pub id: RequestId,
	/// Successful result.
	#[serde(default)]
	pub result: Option<JsonValue>,
	/// Failure.
	#[serde(default)]
	pub error: Option<ResponseError>,
}

impl AnyResponse {
	/// Builds a response from a handler outcome.
	pub fn new(id: RequestId, outcome: Result<JsonValue, ResponseError>) -> Self {
		match outcome {
			Ok(result) => Self {
				id,
				result: Some(result),
				error: None,
			},
			Err(error) => Self {
				id,
				result: None,
				error: Some(error),
			},
		}
	}
}

/// Error object of a failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({code})")]
pub struct ResponseError {
	/// Error code.
	pub code: ErrorCode,
	/// Short description.
	pub message: String,
	/// Additional information.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// Creates an error without data.
	pub fn new(code: ErrorCode, message: impl fmt::Display) -> Self {
		Self {
			code,
			message: message.to_string(),
			data: None,
		}
	}
}

/// JSON-RPC and LSP error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
	/// Invalid JSON was received.
	pub const PARSE_ERROR: Self = Self(-32700);
	/// The JSON sent is not a valid request object.
	pub const INVALID_REQUEST: Self = Self(-32600);
	/// The method does not exist or is not available.
	pub const METHOD_NOT_FOUND: Self = Self(-32601);
	/// Invalid method parameters.
	pub const INVALID_PARAMS: Self = Self(-32602);
	/// Internal error.
	pub const INTERNAL_ERROR: Self = Self(-32603);
	/// A request arrived before `initialize`.
	pub const SERVER_NOT_INITIALIZED: Self = Self(-32002);
	/// The client cancelled the request.
	pub const REQUEST_CANCELLED: Self = Self(-32800);
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}
