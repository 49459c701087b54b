//! JSON-RPC-lite message dispatch.
//!
//! One handler per transport method plus one per tool. Handlers parse
//! their own params and return `(code, message)` tuples for protocol
//! errors; tool failures are serialized error payloads, not protocol
//! errors.

use docshelf_core::IndexError;
use docshelf_core::Ops;
use docshelf_protocol::ERR_INVALID_PARAMS;
use docshelf_protocol::ERR_INVALID_REQUEST;
use docshelf_protocol::ERR_METHOD_NOT_FOUND;
use docshelf_protocol::ERR_UNKNOWN_TOOL;
use docshelf_protocol::HelloParams;
use docshelf_protocol::HelloResult;
use docshelf_protocol::PROTOCOL_VERSION;
use docshelf_protocol::RequestId;
use docshelf_protocol::RpcError;
use docshelf_protocol::RpcErrorDetail;
use docshelf_protocol::RpcRequest;
use docshelf_protocol::RpcResponse;
use docshelf_protocol::ToolCallParams;
use docshelf_protocol::ToolsListResult;
use docshelf_protocol::tool_descriptors;
use serde_json::Value;

use crate::validation;

/// Parse and dispatch a single message, producing the response value.
pub async fn dispatch_message(ops: &Ops, raw: &str) -> Value {
    let request: RpcRequest = match serde_json::from_str(raw) {
        Ok(req) => req,
        Err(e) => {
            return serde_json::to_value(RpcError {
                id: RequestId::Integer(0),
                error: RpcErrorDetail {
                    code: ERR_INVALID_REQUEST,
                    message: format!("Invalid request: {e}"),
                    data: None,
                },
            })
            .unwrap_or_default();
        }
    };

    let id = request.id.clone();
    match dispatch_method(ops, &request.method, request.params).await {
        Ok(result) => serde_json::to_value(RpcResponse { id, result }).unwrap_or_default(),
        Err((code, message)) => serde_json::to_value(RpcError {
            id,
            error: RpcErrorDetail {
                code,
                message,
                data: None,
            },
        })
        .unwrap_or_default(),
    }
}

/// Dispatch to the appropriate handler based on method name.
async fn dispatch_method(
    ops: &Ops,
    method: &str,
    params: Option<Value>,
) -> Result<Value, (i64, String)> {
    match method {
        "hello" => handle_hello(params),
        "tools.list" => handle_tools_list(),
        "tools.call" => handle_tools_call(ops, params).await,
        _ => Err((ERR_METHOD_NOT_FOUND, format!("Unknown method: {method}"))),
    }
}

/// Handle the `hello` handshake.
fn handle_hello(params: Option<Value>) -> Result<Value, (i64, String)> {
    let hello: HelloParams = params
        .ok_or_else(|| (ERR_INVALID_PARAMS, "Missing params".to_string()))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| (ERR_INVALID_PARAMS, format!("Invalid hello params: {e}")))
        })?;

    if hello.protocol_version != PROTOCOL_VERSION {
        return Err((
            ERR_INVALID_PARAMS,
            format!(
                "Incompatible protocol version: client={}, server={PROTOCOL_VERSION}",
                hello.protocol_version
            ),
        ));
    }

    let result = HelloResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        tools: tool_descriptors().into_iter().map(|t| t.name).collect(),
    };
    Ok(serde_json::to_value(result).unwrap_or_default())
}

/// Handle `tools.list`.
fn handle_tools_list() -> Result<Value, (i64, String)> {
    let result = ToolsListResult {
        tools: tool_descriptors(),
    };
    Ok(serde_json::to_value(result).unwrap_or_default())
}

/// Handle `tools.call`.
async fn handle_tools_call(ops: &Ops, params: Option<Value>) -> Result<Value, (i64, String)> {
    let call: ToolCallParams = params
        .ok_or_else(|| (ERR_INVALID_PARAMS, "Missing params".to_string()))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| (ERR_INVALID_PARAMS, format!("Invalid tools.call params: {e}")))
        })?;

    let arguments = call
        .arguments
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    match run_tool(ops, &call.name, arguments).await {
        Ok(value) => Ok(value),
        Err(ToolCallError::UnknownTool) => {
            Err((ERR_UNKNOWN_TOOL, format!("Unknown tool: {}", call.name)))
        }
        Err(ToolCallError::Failed(err)) => {
            tracing::debug!(
                tool = %call.name,
                kind = err.kind.as_str(),
                retryable = err.retryable,
                "tool call failed: {}",
                err.message
            );
            Ok(serde_json::to_value(err.to_payload()).unwrap_or_default())
        }
    }
}

enum ToolCallError {
    UnknownTool,
    Failed(IndexError),
}

impl From<IndexError> for ToolCallError {
    fn from(err: IndexError) -> Self {
        Self::Failed(err)
    }
}

async fn run_tool(ops: &Ops, name: &str, arguments: Value) -> Result<Value, ToolCallError> {
    match name {
        "create_collection" => handle_create_collection(ops, arguments).await,
        "add_document" => handle_add_document(ops, arguments).await,
        "search" => handle_search(ops, arguments).await,
        "get_passages" => handle_get_passages(ops, arguments).await,
        "list_documents" => handle_list_documents(ops, arguments).await,
        "delete_document" => handle_delete_document(ops, arguments).await,
        _ => Err(ToolCallError::UnknownTool),
    }
}

/// Deserialize tool arguments; a shape mismatch is a validation failure
/// carried in the payload, not a protocol error.
fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: Value,
) -> Result<T, ToolCallError> {
    serde_json::from_value(arguments).map_err(|e| {
        ToolCallError::Failed(IndexError::validation(format!(
            "invalid {tool} arguments: {e}"
        )))
    })
}

fn to_result<T: serde::Serialize>(result: T) -> Value {
    serde_json::to_value(result).unwrap_or_default()
}

async fn handle_create_collection(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("create_collection", arguments)?;
    validation::create_collection(&params)?;
    Ok(to_result(ops.create_collection(params).await?))
}

async fn handle_add_document(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("add_document", arguments)?;
    validation::add_document(&params)?;
    Ok(to_result(ops.add_document(params).await?))
}

async fn handle_search(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("search", arguments)?;
    validation::search(&params)?;
    Ok(to_result(ops.search(params).await?))
}

async fn handle_get_passages(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("get_passages", arguments)?;
    validation::get_passages(&params)?;
    Ok(to_result(ops.get_passages(params).await?))
}

async fn handle_list_documents(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("list_documents", arguments)?;
    validation::list_documents(&params)?;
    Ok(to_result(ops.list_documents(params).await?))
}

async fn handle_delete_document(ops: &Ops, arguments: Value) -> Result<Value, ToolCallError> {
    let params = parse_arguments("delete_document", arguments)?;
    validation::delete_document(&params)?;
    Ok(to_result(ops.delete_document(params).await?))
}
