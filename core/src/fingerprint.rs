//! Content fingerprints for upload deduplication.
//!
//! The dedupe key binds raw content to the identity-bearing metadata subset
//! (title and identifier) and nothing else, so re-tagging a document never
//! changes its identity. The key is advisory: the index service stores it
//! but does not enforce uniqueness on it.

use docshelf_protocol::{DocumentMetadata, FingerprintInfo};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identity-bearing metadata subset. Field order here is the canonical
/// serialization order; changing it changes every derived key.
#[derive(Serialize)]
struct CanonicalIdentity<'a> {
    identifier: Option<&'a str>,
    title: Option<&'a str>,
}

/// Derive the fingerprint for an upload.
pub fn derive(bytes: &[u8], metadata: Option<&DocumentMetadata>) -> FingerprintInfo {
    let content_hash = sha256_hex(bytes);
    let identity = CanonicalIdentity {
        identifier: metadata.and_then(|m| m.identifier.as_deref()),
        title: metadata.and_then(|m| m.title.as_deref()),
    };
    let identity_json = serde_json::to_string(&identity).unwrap_or_default();
    let dedupe_key = sha256_hex(format!("{content_hash}{identity_json}").as_bytes());
    FingerprintInfo {
        content_hash,
        dedupe_key,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
