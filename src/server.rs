use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};

use crate::{
    prompts::{prompt_descriptors, render_prompt},
    protocol::{
        ClientMessage, RESOURCE_NOT_FOUND, RequestId, RpcError, encode_error, encode_result,
        internal_error, invalid_params, method_not_found, parse_client_message,
    },
    reference::ReferenceErrorKind,
    tools::{ToolCall, Toolbox, tool_descriptors},
};

pub const SERVER_NAME: &str = "aws-service-authorization-reference";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const RESOURCE_SCHEME: &str = "serviceAuthorizationReference://";

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

fn params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params)
        .map_err(|err| invalid_params(format!("invalid params for {method}: {err}")))
}

/// Answers tool-protocol requests. Transport-agnostic; see [`serve`].
pub struct McpServer {
    toolbox: Toolbox,
}

impl McpServer {
    pub fn new(toolbox: Toolbox) -> Self {
        Self { toolbox }
    }

    pub async fn handle_request(&self, method: &str, params_value: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_result(&params_value)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_descriptors() })),
            "tools/call" => {
                let request: ToolCallParams = params(method, params_value)?;
                let call = ToolCall::parse(&request.name, request.arguments)?;
                let output = self.toolbox.call(call).await;
                Ok(tool_result(&output))
            }
            "prompts/list" => Ok(json!({ "prompts": prompt_descriptors() })),
            "prompts/get" => {
                let request: PromptGetParams = params(method, params_value)?;
                render_prompt(&request.name)
            }
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({
                "resourceTemplates": [{
                    "uriTemplate": format!("{RESOURCE_SCHEME}{{service}}"),
                    "name": "service_authorization_reference",
                    "description": "Full authorization reference (IAM actions, resources and condition keys) of one AWS service",
                    "mimeType": "application/json",
                }]
            })),
            "resources/read" => {
                let request: ResourceReadParams = params(method, params_value)?;
                self.read_resource(&request.uri).await
            }
            other => Err(method_not_found(other)),
        }
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, RpcError> {
        let service = uri
            .strip_prefix(RESOURCE_SCHEME)
            .filter(|service| !service.is_empty())
            .ok_or_else(|| {
                RpcError::new(RESOURCE_NOT_FOUND, format!("unknown resource: {uri}"))
                    .with_data(json!({ "uri": uri }))
            })?;

        let document = match self.toolbox.catalog().service_document(service).await {
            Ok(document) => document,
            Err(err) if err.kind == ReferenceErrorKind::ServiceNotFound => {
                return Err(RpcError::new(RESOURCE_NOT_FOUND, err.to_string())
                    .with_data(json!({ "uri": uri })));
            }
            Err(err) => {
                tracing::warn!(target: "server", uri, error = %err, "resource_read_failed");
                return Err(internal_error(err.to_string()));
            }
        };

        let text = serde_json::to_string(&document)
            .map_err(|err| internal_error(format!("failed to encode {uri}: {err}")))?;
        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": "application/json",
                "text": text,
            }]
        }))
    }
}

fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": { "listChanged": false },
            "prompts": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Tool output as protocol content: strings verbatim, `null` for no result,
/// anything else pretty-printed.
pub fn tool_result(output: &Value) -> Value {
    let text = match output {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false,
    })
}

/// Serves newline-delimited JSON-RPC from `reader` to `writer` until EOF.
/// Requests run concurrently; each reply is written as one whole line.
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (line_tx, line_rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_lines(writer, line_rx));

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from client")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_client_message(line) {
            Ok(ClientMessage::Request { id, method, params }) => {
                let server = Arc::clone(&server);
                let line_tx = line_tx.clone();
                tokio::spawn(async move {
                    let reply = dispatch(&server, &id, &method, params).await;
                    let _ = line_tx.send(reply);
                });
            }
            Ok(ClientMessage::Notification { method, .. }) => {
                tracing::debug!(target: "server", method = %method, "notification_received");
            }
            Ok(ClientMessage::Response { id }) => {
                tracing::debug!(target: "server", id = ?id, "client_response_ignored");
            }
            Err(failure) => {
                tracing::warn!(target: "server", error = %failure.error, "invalid_protocol_message");
                let _ = line_tx.send(encode_error(failure.id.as_ref(), &failure.error));
            }
        }
    }

    tracing::info!(target: "server", "client_input_closed");
    drop(line_tx);
    writer_task.await.context("writer task join failed")?
}

async fn dispatch(server: &McpServer, id: &RequestId, method: &str, params: Value) -> String {
    tracing::debug!(target: "server", id = ?id, method, "request_received");
    match server.handle_request(method, params).await {
        Ok(result) => encode_result(id, result),
        Err(err) => {
            tracing::info!(target: "server", id = ?id, method, error = %err, "request_failed");
            encode_error(Some(id), &err)
        }
    }
}

async fn write_lines<W>(mut writer: W, mut line_rx: mpsc::UnboundedReceiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = line_rx.recv().await {
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("failed to write to client")?;
        writer.flush().await.context("failed to flush client output")?;
    }
    Ok(())
}
