// Aggregates the integration tests as modules.
mod collections;
mod common;
mod documents;
