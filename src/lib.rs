//! vecdex: named vector-similarity indexes with durable local or object-store persistence.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod metadata;
pub mod metrics;
pub mod persistence;
pub mod registry;
pub mod server;
pub mod storage;
pub mod types;
