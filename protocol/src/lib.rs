//! Wire vocabulary shared by the docshelf server and its clients.
//!
//! Defines the JSON-RPC-lite envelope, the tool parameter/result types,
//! and the classified-error payload rendered for every failed tool call.
//! Field names are camelCase on the wire.

mod error;
mod rpc;
mod tools;

pub use error::{ErrorKind, ErrorPayload};
pub use rpc::{
    ERR_INTERNAL, ERR_INVALID_PARAMS, ERR_INVALID_REQUEST, ERR_METHOD_NOT_FOUND, ERR_UNKNOWN_TOOL,
    RequestId, RpcError, RpcErrorDetail, RpcRequest, RpcResponse,
};
pub use tools::{
    AddDocumentParams, AddDocumentResult, CollectionInfo, CreateCollectionParams,
    CreateCollectionResult, DeleteDocumentParams, DeleteDocumentResult, DocumentInfo,
    DocumentMetadata, FingerprintInfo, GetPassagesParams, GetPassagesResult, HelloParams,
    HelloResult, ListDocumentsParams, ListDocumentsResult, ListFilters, PageSpan, Passage,
    SearchHit, SearchParams, SearchResult, ToolCallParams, ToolDescriptor, ToolsListResult,
    tool_descriptors,
};

/// Protocol version exchanged in the `hello` handshake.
pub const PROTOCOL_VERSION: &str = "1.0";
