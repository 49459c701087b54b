//! Semantic argument checks, applied after deserialization and before any
//! operation runs. Shape mismatches are `VALIDATION_FAILED` (raised by the
//! dispatcher); the range and emptiness rules here are `INVALID_INPUT`.

use docshelf_core::IndexError;
use docshelf_core::OpResult;
use docshelf_protocol::AddDocumentParams;
use docshelf_protocol::CreateCollectionParams;
use docshelf_protocol::DeleteDocumentParams;
use docshelf_protocol::GetPassagesParams;
use docshelf_protocol::ListDocumentsParams;
use docshelf_protocol::SearchParams;

const MAX_TOP_K: u32 = 25;
const MAX_PAGE_SIZE: u32 = 100;

pub fn create_collection(params: &CreateCollectionParams) -> OpResult<()> {
    if let Some(name) = params.display_name.as_deref()
        && name.trim().is_empty()
    {
        return Err(IndexError::invalid_input("displayName must not be blank"));
    }
    Ok(())
}

pub fn add_document(params: &AddDocumentParams) -> OpResult<()> {
    if params.source.trim().is_empty() {
        return Err(IndexError::invalid_input("source must not be empty"));
    }
    Ok(())
}

pub fn search(params: &SearchParams) -> OpResult<()> {
    if params.query.trim().is_empty() {
        return Err(IndexError::invalid_input("query must not be empty"));
    }
    if let Some(top_k) = params.top_k
        && !(1..=MAX_TOP_K).contains(&top_k)
    {
        return Err(IndexError::invalid_input(format!(
            "topK must be between 1 and {MAX_TOP_K}"
        )));
    }
    Ok(())
}

pub fn get_passages(params: &GetPassagesParams) -> OpResult<()> {
    if params.doc_id.trim().is_empty() {
        return Err(IndexError::invalid_input("docId must not be empty"));
    }
    if params.page_spans.is_empty() {
        return Err(IndexError::invalid_input("pageSpans must not be empty"));
    }
    for span in &params.page_spans {
        if span.start_page < 1 {
            return Err(IndexError::invalid_input("startPage must be at least 1"));
        }
        if span.end_page < span.start_page {
            return Err(IndexError::invalid_input(format!(
                "endPage {} precedes startPage {}",
                span.end_page, span.start_page
            )));
        }
    }
    Ok(())
}

pub fn list_documents(params: &ListDocumentsParams) -> OpResult<()> {
    if let Some(page) = params.page
        && page < 1
    {
        return Err(IndexError::invalid_input("page must be at least 1"));
    }
    if let Some(page_size) = params.page_size
        && !(1..=MAX_PAGE_SIZE).contains(&page_size)
    {
        return Err(IndexError::invalid_input(format!(
            "pageSize must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

pub fn delete_document(params: &DeleteDocumentParams) -> OpResult<()> {
    if params.doc_id.trim().is_empty() {
        return Err(IndexError::invalid_input("docId must not be empty"));
    }
    Ok(())
}
