//! Engine behind the docshelf tool server.
//!
//! Talks to the remote managed document index over HTTPS and wraps every
//! remote call in the resilience layer: error classification
//! ([`classify`]), bounded retry with jittered backoff ([`retry`]),
//! memoized collection resolution ([`resolver`]), and content
//! fingerprinting for dedupe ([`fingerprint`]). The six user-facing
//! operations live in [`ops`].

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ops;
pub mod resolver;
pub mod retry;

pub use classify::Classify;
pub use config::Config;
pub use error::IndexError;
pub use error::OpResult;
pub use ops::Ops;
pub use retry::RetryPolicy;
