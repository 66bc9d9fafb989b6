//! Request dispatch and the stdio loop

use std::io;
use std::sync::Arc;

use chainpay::PaymentEngine;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::prompts;
use crate::protocol::{
    Request, Response, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;

/// Server name reported by `initialize`
pub const SERVER_NAME: &str = "chainpay";

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct PromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

type Outcome = std::result::Result<Value, (i64, String)>;

fn invalid_params(err: serde_json::Error) -> (i64, String) {
    (INVALID_PARAMS, format!("invalid params: {err}"))
}

/// Wraps a tool payload into a `tools/call` result
pub fn tool_content(payload: Value) -> Value {
    let is_error = payload.get("error").is_some();
    let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": payload,
        "isError": is_error,
    })
}

/// Protocol server over a [`PaymentEngine`]
pub struct Server {
    engine: PaymentEngine,
    tools: ToolRegistry,
}

impl Server {
    /// Creates a server with the built-in tools
    pub fn new(engine: PaymentEngine) -> Self {
        Self {
            engine,
            tools: ToolRegistry::new(),
        }
    }

    /// The engine
    pub fn engine(&self) -> &PaymentEngine {
        &self.engine
    }

    /// The tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handles one request; `None` for notifications
    pub async fn handle(&self, request: Request) -> Option<Response> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(Response::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
        }

        Some(match self.dispatch(&request).await {
            Ok(result) => Response::result(id, result),
            Err((code, message)) => {
                tracing::debug!(method = %request.method, code, %message, "request failed");
                Response::error(id, code, message)
            }
        })
    }

    async fn dispatch(&self, request: &Request) -> Outcome {
        let params = request.params_or_empty();
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {}, "prompts": {} },
                "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => {
                let call: CallParams = serde_json::from_value(params).map_err(invalid_params)?;
                let args = call.arguments.unwrap_or_else(|| Value::Object(Map::new()));
                let payload = self.tools.call(&self.engine, &call.name, args).await;
                Ok(tool_content(payload))
            }
            "prompts/list" => Ok(prompts::list()),
            "prompts/get" => {
                let get: PromptParams = serde_json::from_value(params).map_err(invalid_params)?;
                let args = get.arguments.unwrap_or_default();
                prompts::get(&get.name, &args, self.engine.config()).map_err(|e| (INVALID_PARAMS, e.to_string()))
            }
            method if self.tools.get(method).is_some() => {
                Ok(self.tools.call(&self.engine, method, params).await)
            }
            other => Err((METHOD_NOT_FOUND, format!("method not found: {other}"))),
        }
    }

    /// Handles one input line, returning the serialized response
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Err(err) => Some(Response::error(Value::Null, PARSE_ERROR, format!("parse error: {err}"))),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<Request>(value) {
                    Ok(request) => self.handle(request).await,
                    Err(err) => Some(Response::error(id, INVALID_REQUEST, format!("invalid request: {err}"))),
                }
            }
        }?;

        match serde_json::to_string(&response) {
            Ok(out) => Some(out),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response");
                let fallback = Response::error(Value::Null, INTERNAL_ERROR, "internal error");
                serde_json::to_string(&fallback).ok()
            }
        }
    }

    /// Serves newline-delimited requests until `reader` is exhausted
    ///
    /// Requests run concurrently; responses are written as they complete.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, io::Error>(())
        });

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(out) = server.handle_line(&line).await {
                    let _ = tx.send(out);
                }
            });
        }
        drop(tx);

        tracing::info!("input closed, draining in-flight requests");
        writer_task.await.map_err(io::Error::other)?
    }
}
