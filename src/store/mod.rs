//! Graph store: engine abstraction, Kuzu client, schema cache and the
//! transactional executor

pub mod cache;
pub mod client;
pub mod executor;
pub mod models;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::SchemaCache;
pub use client::KuzuHttpEngine;
pub use executor::TransactionalExecutor;
pub use models::*;
pub use traits::{GraphEngine, StoreError};
