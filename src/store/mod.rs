//! Boundary to the remote, multi-writer document store.

mod models;
mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

/// Field map of one document.
pub type Fields = serde_json::Map<String, Value>;

/// A document as stored: its store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub fields: Fields,
}

/// Per-list refresh bookkeeping, kept apart from the item documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMeta {
    pub last_refreshed: DateTime<Utc>,
    pub next_refresh_due: DateTime<Utc>,
}

/// Operations the list core needs from the store.
///
/// Every mutation publishes the collection name on [`DocumentStore::changes`];
/// readers then re-read the whole collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> Result<u64, StoreError>;

    /// Create a document with a generated id and return that id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Every document currently in the collection.
    async fn get_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Merge `patch` into an existing document in one atomic step.
    ///
    /// Top-level keys in `patch` replace the stored ones; a `null` value
    /// removes the key. Fails with `NotFound` when the document is missing.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Documents whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<RawDocument>, StoreError>;

    async fn get_meta(&self, collection: &str) -> Result<Option<ListMeta>, StoreError>;

    async fn put_meta(&self, collection: &str, meta: ListMeta) -> Result<(), StoreError>;

    /// Stream of changed collection names.
    fn changes(&self) -> broadcast::Receiver<String>;
}
