//! JSON-RPC 2.0 framing for the stdio tool protocol: one message per line.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const RESOURCE_NOT_FOUND: i64 = -32002;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

pub fn parse_error(message: impl Into<String>) -> RpcError {
    RpcError::new(PARSE_ERROR, message)
}

pub fn invalid_request(message: impl Into<String>) -> RpcError {
    RpcError::new(INVALID_REQUEST, message)
}

pub fn method_not_found(method: &str) -> RpcError {
    RpcError::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
}

pub fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError::new(INVALID_PARAMS, message)
}

pub fn internal_error(message: impl Into<String>) -> RpcError {
    RpcError::new(INTERNAL_ERROR, message)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Request {
        id: RequestId,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    /// Reply to a server-initiated request. The server never sends any, so
    /// these are dropped.
    Response { id: Option<RequestId> },
}

/// A line that could not be turned into a [`ClientMessage`]. `id` is set when
/// the envelope got far enough to carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub id: Option<RequestId>,
    pub error: RpcError,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    jsonrpc: String,
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, ParseFailure> {
    let value: Value = serde_json::from_str(line).map_err(|err| ParseFailure {
        id: None,
        error: parse_error(format!("invalid JSON: {err}")),
    })?;
    if !value.is_object() {
        return Err(ParseFailure {
            id: None,
            error: invalid_request("message must be a JSON object"),
        });
    }

    let null_id = value.get("id").is_some_and(Value::is_null);
    let salvaged_id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    let wire: WireMessage = serde_json::from_value(value).map_err(|err| ParseFailure {
        id: salvaged_id.clone(),
        error: invalid_request(format!("malformed message: {err}")),
    })?;

    if wire.jsonrpc != JSONRPC_VERSION {
        return Err(ParseFailure {
            id: wire.id,
            error: invalid_request(format!("unsupported jsonrpc version '{}'", wire.jsonrpc)),
        });
    }

    let params = wire.params.unwrap_or(Value::Null);
    match (wire.method, wire.id) {
        (Some(method), Some(id)) => Ok(ClientMessage::Request { id, method, params }),
        (Some(_), None) if null_id => Err(ParseFailure {
            id: None,
            error: invalid_request("request id must not be null"),
        }),
        (Some(method), None) => Ok(ClientMessage::Notification { method, params }),
        (None, id) if wire.result.is_some() || wire.error.is_some() => {
            Ok(ClientMessage::Response { id })
        }
        (None, id) => Err(ParseFailure {
            id,
            error: invalid_request("message has no method"),
        }),
    }
}

pub fn encode_result(id: &RequestId, result: Value) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
    .to_string()
}

pub fn encode_error(id: Option<&RequestId>, error: &RpcError) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": error,
    })
    .to_string()
}
