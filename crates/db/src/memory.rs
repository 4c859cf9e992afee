//! In-process document store.
//!
//! Same contract as the PostgreSQL backend, without persistence. Used by the
//! test suites and handy for running the API without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use livestream_core::types::{DocId, Timestamp};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::store::{ensure_object, Document, DocumentStore, StoreError};

/// Document store held in memory behind an async lock.
#[derive(Default)]
pub struct MemoryDocumentStore {
    /// Documents per collection, in insertion order.
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

/// Next `updated_at` for a document last touched at `previous`.
fn next_timestamp(previous: Timestamp) -> Timestamp {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        ensure_object(&body)?;
        let now = Utc::now();
        let doc = Document {
            id: DocId::now_v7(),
            body,
            created_at: now,
            updated_at: now,
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: DocId,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: DocId,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };

        let body = doc.body.as_object_mut().ok_or(StoreError::NotAnObject)?;
        body.extend(fields);
        doc.updated_at = next_timestamp(doc.updated_at);
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: DocId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }

    async fn find_singleton(&self, collection: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.first().cloned()))
    }

    async fn replace_singleton(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        ensure_object(&body)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let doc = match docs.first() {
            Some(existing) => Document {
                id: existing.id,
                body,
                created_at: existing.created_at,
                updated_at: next_timestamp(existing.updated_at),
            },
            None => {
                let now = Utc::now();
                Document {
                    id: DocId::now_v7(),
                    body,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        docs.clear();
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
