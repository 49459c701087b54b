//! The externally callable operations.
//!
//! Six operations over the shared [`Ops`] context. Every remote call goes
//! through the retry executor; every failure leaves as a classified
//! [`IndexError`](crate::error::IndexError).

mod collections;
mod documents;
mod query;

use std::sync::Arc;

use docshelf_protocol::{DocumentInfo, ListFilters};

use crate::client::{IndexClient, RemoteFile};
use crate::config::Config;
use crate::error::OpResult;
use crate::resolver::CollectionResolver;

pub use documents::ALLOWED_MIME_TYPES;

/// Shared operation context, built once at the composition root.
pub struct Ops {
    client: Arc<IndexClient>,
    resolver: CollectionResolver,
    config: Config,
}

impl Ops {
    pub fn new(config: Config) -> OpResult<Self> {
        let client = Arc::new(IndexClient::new(&config)?);
        let resolver = CollectionResolver::new(client.clone(), config.collection.clone());
        Ok(Self {
            client,
            resolver,
            config,
        })
    }

    pub fn resolver(&self) -> &CollectionResolver {
        &self.resolver
    }
}

/// Project a remote file descriptor onto the wire document shape.
pub(crate) fn document_info(file: RemoteFile) -> DocumentInfo {
    DocumentInfo {
        id: file.id,
        uri: file.uri,
        display_name: file.display_name,
        mime_type: file.mime_type,
        size_bytes: file.size_bytes,
        create_time: file.create_time,
    }
}

/// Apply the shared candidate filters.
pub(crate) fn apply_filters(
    files: Vec<RemoteFile>,
    filters: Option<&ListFilters>,
) -> Vec<RemoteFile> {
    let Some(filters) = filters else {
        return files;
    };
    let needle = filters.name_contains.as_deref().map(str::to_lowercase);
    files
        .into_iter()
        .filter(|file| {
            if let Some(mime) = filters.mime_type.as_deref()
                && file.mime_type != mime
            {
                return false;
            }
            if let Some(needle) = needle.as_deref()
                && !file.display_name.to_lowercase().contains(needle)
            {
                return false;
            }
            true
        })
        .collect()
}
