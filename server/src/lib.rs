//! Stdio front end for the document-index operations.
//!
//! Reads newline-delimited JSON-RPC-lite requests on stdin, dispatches to
//! the operations layer, and writes exactly one response line on stdout per
//! request. Logging goes to stderr so the protocol stream stays clean.
//!
//! Transport failures (malformed JSON, unknown methods or tools, bad
//! envelope params) come back as protocol errors; operation failures come
//! back as successful responses whose result is the classified error
//! payload, so callers can branch on `errorCode` and `retryable`.

pub mod processor;
pub mod validation;

use std::sync::Arc;

use docshelf_core::Ops;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::processor::dispatch_message;

/// Serve requests from stdin until EOF.
pub async fn serve(ops: Arc<Ops>) -> std::io::Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = dispatch_message(&ops, trimmed).await;
        let mut response_bytes = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
        response_bytes.push(b'\n');
        writer.write_all(&response_bytes).await?;
        writer.flush().await?;
    }

    Ok(())
}
