//! Retrieval operations: grounded search and passage extraction.
//!
//! Both operations prompt the index service's grounded-generation endpoint
//! for a strict-JSON reply and parse it leniently (models occasionally wrap
//! JSON in a code fence or a sentence of prose).

use std::fmt::Write as _;
use std::time::Instant;

use docshelf_protocol::{
    ErrorKind, GetPassagesParams, GetPassagesResult, PageSpan, Passage, SearchHit, SearchParams,
    SearchResult,
};
use serde::Deserialize;
use serde_json::json;

use super::{Ops, apply_filters};
use crate::client::RemoteFile;
use crate::error::{IndexError, OpResult};
use crate::retry::retry_remote;

const DEFAULT_TOP_K: u32 = 5;
const MAX_TOP_K: u32 = 25;
const REPLY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    passages: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntry {
    file_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    page_start: Option<u32>,
    #[serde(default)]
    page_end: Option<u32>,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PassagesReply {
    #[serde(default)]
    passages: Vec<PassageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassageEntry {
    #[serde(default)]
    page_start: u32,
    #[serde(default)]
    page_end: u32,
    #[serde(default)]
    text: String,
}

impl Ops {
    /// Search the active collection and return up to `topK` scored hits.
    pub async fn search(&self, params: SearchParams) -> OpResult<SearchResult> {
        let start = Instant::now();
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err(IndexError::invalid_input("query must not be empty"));
        }
        let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K);

        let collection_id = self.resolver.resolve().await?;
        let files = retry_remote("files.list", || self.client.list_files(&collection_id)).await?;
        let candidates = apply_filters(files, params.filters.as_ref());
        if candidates.is_empty() {
            tracing::debug!("search over an empty collection, skipping generation");
            return Ok(SearchResult {
                query,
                collection_id,
                hits: Vec::new(),
            });
        }

        let prompt = build_search_prompt(&query, top_k, &candidates);
        let uris: Vec<String> = candidates.iter().map(|f| f.uri.clone()).collect();
        let reply =
            retry_remote("generate.search", || self.client.generate(&prompt, &uris)).await?;
        let parsed: SearchReply = parse_reply("search", &reply)?;

        let mut hits: Vec<SearchHit> = parsed
            .passages
            .into_iter()
            .map(|entry| {
                let known_name = candidates
                    .iter()
                    .find(|f| f.id == entry.file_id)
                    .map(|f| f.display_name.clone());
                SearchHit {
                    display_name: known_name
                        .or(entry.display_name)
                        .unwrap_or_else(|| entry.file_id.clone()),
                    doc_id: entry.file_id,
                    page_start: entry.page_start,
                    page_end: entry.page_end,
                    snippet: entry.snippet,
                    score: entry.score,
                }
            })
            .collect();
        hits.truncate(top_k as usize);

        tracing::info!(
            hits = hits.len(),
            candidates = uris.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(SearchResult {
            query,
            collection_id,
            hits,
        })
    }

    /// Extract the verbatim text of the requested page ranges of one document.
    pub async fn get_passages(&self, params: GetPassagesParams) -> OpResult<GetPassagesResult> {
        let start = Instant::now();
        let file = retry_remote("files.get", || self.client.get_file(&params.doc_id)).await?;

        let prompt = build_passages_prompt(&file.display_name, &params.page_spans);
        let uris = [file.uri.clone()];
        let reply =
            retry_remote("generate.passages", || self.client.generate(&prompt, &uris)).await?;
        let parsed: PassagesReply = parse_reply("passage", &reply)?;

        let passages: Vec<Passage> = parsed
            .passages
            .into_iter()
            .map(|entry| Passage {
                page_start: entry.page_start,
                page_end: entry.page_end,
                text: entry.text,
            })
            .collect();
        tracing::info!(
            doc_id = %params.doc_id,
            passages = passages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "passages extracted"
        );
        Ok(GetPassagesResult {
            doc_id: params.doc_id,
            display_name: file.display_name,
            passages,
        })
    }
}

fn build_search_prompt(query: &str, top_k: u32, candidates: &[RemoteFile]) -> String {
    let mut prompt = String::from("You search an indexed document collection.\n\nDocuments:\n");
    for file in candidates {
        let _ = writeln!(prompt, "- id: {} name: {}", file.id, file.display_name);
    }
    let _ = write!(
        prompt,
        "\nFind the {top_k} passages most relevant to this query:\n{query}\n\n\
         Reply with JSON only, in exactly this shape:\n\
         {{\"passages\":[{{\"fileId\":\"...\",\"displayName\":\"...\",\"pageStart\":1,\"pageEnd\":1,\"snippet\":\"...\",\"score\":0.9}}]}}\n\
         Use the document ids listed above for fileId. Order entries best first, \
         score between 0 and 1. Omit pageStart and pageEnd when the document has no pages."
    );
    prompt
}

fn build_passages_prompt(display_name: &str, spans: &[PageSpan]) -> String {
    let mut prompt = format!(
        "Extract the exact text of the requested pages from the document \"{display_name}\".\n\nPages requested:\n"
    );
    for span in spans {
        let _ = writeln!(prompt, "- pages {} to {}", span.start_page, span.end_page);
    }
    let _ = write!(
        prompt,
        "\nReply with JSON only, in exactly this shape:\n\
         {{\"passages\":[{{\"pageStart\":1,\"pageEnd\":2,\"text\":\"...\"}}]}}\n\
         Return one entry per requested range, in the order listed, with the text verbatim."
    );
    prompt
}

/// Parse a model reply that should be a single JSON object.
///
/// Tries the raw reply first, then a stripped ```json fence, then the
/// outermost brace-delimited slice.
fn parse_reply<T: serde::de::DeserializeOwned>(op: &str, reply: &str) -> OpResult<T> {
    for candidate in json_candidates(reply) {
        if let Ok(parsed) = serde_json::from_str(candidate) {
            return Ok(parsed);
        }
    }
    let snippet: String = reply.chars().take(REPLY_SNIPPET_CHARS).collect();
    Err(IndexError::new(
        ErrorKind::QueryFailed,
        format!("{op} reply was not the expected JSON"),
    )
    .with_detail(json!({ "replySnippet": snippet })))
}

fn json_candidates(reply: &str) -> Vec<&str> {
    let trimmed = reply.trim();
    let mut candidates = vec![trimmed];
    if let Some(fenced) = strip_code_fence(trimmed) {
        candidates.push(fenced);
    }
    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}'))
        && open < close
    {
        candidates.push(&trimmed[open..=close]);
    }
    candidates
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.rfind("```")?;
    Some(rest[..end].trim())
}
