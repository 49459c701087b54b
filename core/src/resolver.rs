//! Collection resolution: map the configured display name to the service's
//! opaque collection id, creating the collection on first use.
//!
//! The resolver is owned by the composition root and shared by every
//! operation that needs a target collection. The memo cell lives behind a
//! `tokio::sync::Mutex` held across the whole find-or-create sequence, so
//! two concurrent first callers in one process cannot both observe "absent"
//! and double-create. Across processes the race is inherent to list-then-
//! create against a service with no name-uniqueness constraint; two
//! processes can still each create one collection with the same display
//! name. That limitation is documented, not fixed.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::IndexClient;
use crate::error::{IndexError, OpResult};
use crate::retry::retry_remote;

pub struct CollectionResolver {
    client: Arc<IndexClient>,
    display_name: Option<String>,
    resolved: Mutex<Option<String>>,
}

impl CollectionResolver {
    pub fn new(client: Arc<IndexClient>, display_name: Option<String>) -> Self {
        Self {
            client,
            display_name,
            resolved: Mutex::new(None),
        }
    }

    /// The configured display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Resolve the configured collection to its id, creating it if absent.
    ///
    /// The network sequence runs at most once per process; later calls
    /// return the memoized id without touching the network, until
    /// [`invalidate`](Self::invalidate) clears it.
    pub async fn resolve(&self) -> OpResult<String> {
        let Some(name) = self.display_name.as_deref() else {
            return Err(IndexError::collection_not_found(
                "no collection configured; set a collection display name",
            ));
        };

        let mut resolved = self.resolved.lock().await;
        if let Some(id) = resolved.as_ref() {
            return Ok(id.clone());
        }

        let id = match find_by_name(&self.client, name).await? {
            Some(existing) => {
                tracing::debug!(collection = name, id = %existing, "resolved existing collection");
                existing
            }
            None => {
                let created =
                    retry_remote("collections.create", || self.client.create_collection(name))
                        .await?;
                tracing::info!(collection = name, id = %created.id, "created collection");
                created.id
            }
        };

        *resolved = Some(id.clone());
        Ok(id)
    }

    /// Drop the memoized id; the next [`resolve`](Self::resolve) re-runs the
    /// network sequence.
    pub async fn invalidate(&self) {
        let mut resolved = self.resolved.lock().await;
        *resolved = None;
    }

    /// Seed the memo with a known id, e.g. right after an explicit create.
    pub(crate) async fn prime(&self, id: String) {
        let mut resolved = self.resolved.lock().await;
        *resolved = Some(id);
    }
}

/// One bounded list call; exact, case-sensitive display-name match.
pub(crate) async fn find_by_name(
    client: &IndexClient,
    display_name: &str,
) -> OpResult<Option<String>> {
    let collections = retry_remote("collections.list", || client.list_collections()).await?;
    Ok(collections
        .into_iter()
        .find(|c| c.display_name == display_name)
        .map(|c| c.id))
}
