//! JSON-RPC 2.0 framing for the stdio transport

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision reported by `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Invalid JSON was received
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i64 = -32602;
/// Internal error
pub const INTERNAL_ERROR: i64 = -32603;

/// An incoming request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Must be `"2.0"`
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Parameters
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    /// Notifications get no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Params, or an empty object when absent or null
    pub fn params_or_empty(&self) -> Value {
        match &self.params {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(params) => params.clone(),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
}

/// An outgoing response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

impl Response {
    /// Successful response
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }

    /// Result payload, if any
    pub fn result_value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Error payload, if any
    pub fn error_object(&self) -> Option<&ErrorObject> {
        self.error.as_ref()
    }
}
