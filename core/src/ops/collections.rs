//! Explicit collection creation.

use std::time::Instant;

use docshelf_protocol::{CollectionInfo, CreateCollectionParams, CreateCollectionResult};
use serde_json::json;

use super::Ops;
use crate::error::{IndexError, OpResult};
use crate::resolver;
use crate::retry::retry_remote;

impl Ops {
    /// Create a collection with explicit intent: an existing collection with
    /// the same display name is a failure carrying the existing id, never a
    /// silent reuse, and no create call is issued on collision.
    pub async fn create_collection(
        &self,
        params: CreateCollectionParams,
    ) -> OpResult<CreateCollectionResult> {
        let start = Instant::now();
        let name = match params.display_name.as_deref() {
            Some(name) => name,
            None => self.resolver.display_name().ok_or_else(|| {
                IndexError::collection_not_found(
                    "no collection configured; pass displayName or set a default",
                )
            })?,
        };

        if let Some(existing) = resolver::find_by_name(&self.client, name).await? {
            return Err(
                IndexError::invalid_input(format!("collection '{name}' already exists"))
                    .with_detail(json!({ "existingCollectionId": existing })),
            );
        }

        let created =
            retry_remote("collections.create", || self.client.create_collection(name)).await?;

        // An explicit create of the configured collection also settles
        // resolution for the rest of the process.
        if self.resolver.display_name() == Some(name) {
            self.resolver.prime(created.id.clone()).await;
        }

        tracing::info!(
            collection = name,
            id = %created.id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "created collection"
        );
        Ok(CreateCollectionResult {
            collection: CollectionInfo {
                id: created.id,
                display_name: created.display_name,
            },
            created: true,
        })
    }
}
