//! PostgreSQL-backed document store (`documents` table, JSONB bodies).

use async_trait::async_trait;
use livestream_core::types::DocId;
use serde_json::{Map, Value};

use crate::store::{ensure_object, Document, DocumentStore, StoreError};
use crate::DbPool;

/// Column list for `documents` queries.
const COLUMNS: &str = "id, body, created_at, updated_at";

/// Bumps `updated_at` so it strictly increases even within one clock tick.
const TOUCH_UPDATED_AT: &str = "updated_at = GREATEST(now(), updated_at + interval '1 microsecond')";

/// Document store over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        ensure_object(&body)?;
        let query = format!(
            "INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        let doc = sqlx::query_as::<_, Document>(&query)
            .bind(DocId::now_v7())
            .bind(collection)
            .bind(&body)
            .fetch_one(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 ORDER BY created_at, id"
        );
        let docs = sqlx::query_as::<_, Document>(&query)
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: DocId,
    ) -> Result<Option<Document>, StoreError> {
        let query =
            format!("SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2");
        let doc = sqlx::query_as::<_, Document>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: DocId,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "UPDATE documents SET body = body || $3, {TOUCH_UPDATED_AT} \
             WHERE collection = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        let doc = sqlx::query_as::<_, Document>(&query)
            .bind(collection)
            .bind(id)
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: DocId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_singleton(&self, collection: &str) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 \
             ORDER BY created_at, id LIMIT 1"
        );
        let doc = sqlx::query_as::<_, Document>(&query)
            .bind(collection)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// Serialized per collection with a transaction-scoped advisory lock, so
    /// two concurrent first writes cannot both insert.
    async fn replace_singleton(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        ensure_object(&body)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        let existing: Option<(DocId,)> = sqlx::query_as(
            "SELECT id FROM documents WHERE collection = $1 ORDER BY created_at, id LIMIT 1",
        )
        .bind(collection)
        .fetch_optional(&mut *tx)
        .await?;

        let doc = match existing {
            Some((id,)) => {
                let query = format!(
                    "UPDATE documents SET body = $2, {TOUCH_UPDATED_AT} \
                     WHERE id = $1 RETURNING {COLUMNS}"
                );
                let doc = sqlx::query_as::<_, Document>(&query)
                    .bind(id)
                    .bind(&body)
                    .fetch_one(&mut *tx)
                    .await?;

                let removed = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id <> $2")
                    .bind(collection)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                if removed > 0 {
                    tracing::warn!(collection, removed, "Removed duplicate singleton documents");
                }
                doc
            }
            None => {
                let query = format!(
                    "INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3) \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, Document>(&query)
                    .bind(DocId::now_v7())
                    .bind(collection)
                    .bind(&body)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
