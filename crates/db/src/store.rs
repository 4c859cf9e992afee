//! The document store contract.

use async_trait::async_trait;
use livestream_core::types::{DocId, Timestamp};
use serde_json::{Map, Value};

/// Error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document body must be a JSON object")]
    NotAnObject,

    #[error("Malformed document {id} in '{collection}': {reason}")]
    Malformed {
        collection: String,
        id: DocId,
        reason: String,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A stored document: store-managed identity and timestamps around a
/// free-form JSON object body.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Document {
    pub id: DocId,
    pub body: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Deserialize the body into a typed model, reporting which document was
    /// malformed on failure.
    pub fn parse_body<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone()).map_err(|e| StoreError::Malformed {
            collection: collection.to_string(),
            id: self.id,
            reason: e.to_string(),
        })
    }
}

/// Create/read/update/delete and singleton-upsert over named collections.
///
/// Implementations assign ids and timestamps. `updated_at` must strictly
/// increase on every mutation of a document and never precede `created_at`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return it with its assigned id.
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError>;

    /// All documents in a collection, oldest first.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// A single document, or `None` when absent.
    async fn find_by_id(&self, collection: &str, id: DocId)
        -> Result<Option<Document>, StoreError>;

    /// Merge `fields` into the top level of a document's body (fields not
    /// named are left untouched). Returns `None` when the document is absent.
    async fn update_fields(
        &self,
        collection: &str,
        id: DocId,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// Delete a document. Returns `false` when it did not exist.
    async fn delete(&self, collection: &str, id: DocId) -> Result<bool, StoreError>;

    /// The sole document of a singleton collection, if any.
    async fn find_singleton(&self, collection: &str) -> Result<Option<Document>, StoreError>;

    /// Replace the body of a singleton collection's sole document, creating
    /// it when absent. Afterwards the collection holds exactly one document.
    async fn replace_singleton(&self, collection: &str, body: Value)
        -> Result<Document, StoreError>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Reject non-object bodies before they reach a backend.
pub(crate) fn ensure_object(body: &Value) -> Result<(), StoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}
