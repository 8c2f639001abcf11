//! Backing store access.
//!
//! [`StoreClient`] is the boundary to the vector store: a batch insert and
//! a hybrid search, nothing else. [`WeaviateClient`] implements it over
//! Weaviate's REST and GraphQL endpoints. [`StoreGateway`] sits on top and
//! turns store responses into the adapter's result payloads.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher
//!   ↓ insert_one(collection, properties) / query(collection, text, fields)
//! StoreGateway
//!   ├── batch-of-one insert, nested error aggregation
//!   └── field projection, canonical JSON
//!   ↓
//! dyn StoreClient (WeaviateClient)
//!   ├── POST /v1/batch/objects
//!   └── POST /v1/graphql  (Get + hybrid)
//! ```

pub mod gateway;
pub mod weaviate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use gateway::StoreGateway;
pub use weaviate::WeaviateClient;

/// Prefix for fields read from a result row's `_additional` block.
pub const ADDITIONAL_PREFIX: &str = "_additional.";

/// One object submitted to a batch insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchObject {
    /// Target collection.
    #[serde(rename = "class")]
    pub collection: String,
    /// Object properties.
    pub properties: Map<String, Value>,
}

/// Per-object outcome of a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchItemResult {
    /// Store-assigned identifier, when the store reported one.
    pub id: Option<String>,
    /// Nested error messages, in store order.
    pub errors: Vec<String>,
}

/// Rows returned by a hybrid search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HybridResult {
    /// Collection name as the store reports it.
    pub collection: String,
    /// Result rows, ranked by the store.
    pub rows: Vec<Map<String, Value>>,
}

/// Operations the adapter needs from a vector store.
///
/// Implementations must be safe for concurrent use: one client is shared
/// by every in-flight invocation.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Store name (e.g. `"weaviate"`).
    fn name(&self) -> &'static str;

    /// Inserts objects in one round trip, returning one result per object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the request itself fails. Per-object
    /// failures are reported inside the returned results.
    async fn batch_insert(&self, objects: &[BatchObject])
    -> Result<Vec<BatchItemResult>, StoreError>;

    /// Runs a hybrid (keyword + vector) search projecting `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on transport or query failures.
    async fn hybrid_search(
        &self,
        collection: &str,
        query_text: &str,
        fields: &[String],
    ) -> Result<HybridResult, StoreError>;
}
