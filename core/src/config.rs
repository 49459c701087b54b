//! Runtime configuration.
//!
//! Read from environment variables at startup, with CLI overrides applied by
//! the server binary. There is no config file; stdio tool servers are
//! configured by whoever spawns them.

use std::time::Duration;

pub const ENV_API_KEY: &str = "DOCSHELF_API_KEY";
pub const ENV_BASE_URL: &str = "DOCSHELF_BASE_URL";
pub const ENV_COLLECTION: &str = "DOCSHELF_COLLECTION";
pub const ENV_TIMEOUT_SECS: &str = "DOCSHELF_TIMEOUT_SECS";
pub const ENV_MAX_FILE_BYTES: &str = "DOCSHELF_MAX_FILE_BYTES";

const DEFAULT_BASE_URL: &str = "https://api.docshelf.dev";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Index API credential, sent as the `x-api-key` header. When absent the
    /// server still starts; calls fail at the service with AUTH_FAILED.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Display name of the collection operations act on. When absent,
    /// collection-dependent operations fail with COLLECTION_NOT_FOUND.
    pub collection: Option<String>,
    pub request_timeout: Duration,
    /// Local pre-upload size cap.
    pub max_file_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            collection: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(key) = non_empty_var(ENV_API_KEY) {
            cfg.api_key = Some(key);
        }
        if let Some(url) = non_empty_var(ENV_BASE_URL) {
            cfg.base_url = url;
        }
        if let Some(name) = non_empty_var(ENV_COLLECTION) {
            cfg.collection = Some(name);
        }
        if let Some(secs) = parsed_var::<u64>(ENV_TIMEOUT_SECS) {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = parsed_var::<u64>(ENV_MAX_FILE_BYTES) {
            cfg.max_file_bytes = bytes;
        }
        cfg
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = non_empty_var(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}
