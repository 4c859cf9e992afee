//! `PgDocumentStore` against a real Postgres database.
//!
//! Each test gets a fresh database with the crate migrations applied.

use assert_matches::assert_matches;
use livestream_db::pg::PgDocumentStore;
use livestream_db::store::{DocumentStore, StoreError};
use serde_json::{json, Map, Value};
use sqlx::PgPool;

const COLLECTION: &str = "overlays";
const SINGLETON: &str = "settings";

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Insert / find
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn insert_then_find_returns_the_document(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let body = json!({ "name": "Logo", "position": { "x": 10, "y": 10 } });

    let inserted = store.insert(COLLECTION, body.clone()).await.unwrap();
    assert_eq!(inserted.body, body);
    assert_eq!(inserted.created_at, inserted.updated_at);

    let found = store.find_by_id(COLLECTION, inserted.id).await.unwrap();
    assert_eq!(found, Some(inserted.clone()));

    let all = store.find_all(COLLECTION).await.unwrap();
    assert_eq!(all, vec![inserted.clone()]);

    assert!(store
        .find_by_id(SINGLETON, inserted.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn non_object_body_is_refused(pool: PgPool) {
    let store = PgDocumentStore::new(pool);

    let err = store.insert(COLLECTION, json!([1, 2])).await.unwrap_err();
    assert_matches!(err, StoreError::NotAnObject);
    assert!(store.find_all(COLLECTION).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn find_all_is_oldest_first(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    for name in ["first", "second", "third"] {
        store.insert(COLLECTION, json!({ "name": name })).await.unwrap();
    }

    let names: Vec<Value> = store
        .find_all(COLLECTION)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.body["name"].clone())
        .collect();
    assert_eq!(names, [json!("first"), json!("second"), json!("third")]);
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn update_merges_named_fields_only(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let doc = store
        .insert(
            COLLECTION,
            json!({ "name": "Logo", "visible": true, "style": { "opacity": 1 } }),
        )
        .await
        .unwrap();

    let updated = store
        .update_fields(COLLECTION, doc.id, fields(json!({ "name": "Banner" })))
        .await
        .unwrap()
        .expect("document exists");

    assert_eq!(
        updated.body,
        json!({ "name": "Banner", "visible": true, "style": { "opacity": 1 } })
    );
    assert_eq!(updated.created_at, doc.created_at);

    let reread = store.find_by_id(COLLECTION, doc.id).await.unwrap();
    assert_eq!(reread, Some(updated));
}

#[sqlx::test(migrations = "./migrations")]
async fn back_to_back_updates_strictly_advance_updated_at(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let doc = store.insert(COLLECTION, json!({ "n": 0 })).await.unwrap();

    let mut last = doc.updated_at;
    for n in 1..=5 {
        let updated = store
            .update_fields(COLLECTION, doc.id, fields(json!({ "n": n })))
            .await
            .unwrap()
            .expect("document exists");
        assert!(
            updated.updated_at > last,
            "update {n}: {} is not after {last}",
            updated.updated_at
        );
        last = updated.updated_at;
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn update_of_absent_document_is_none(pool: PgPool) {
    let store = PgDocumentStore::new(pool);

    let result = store
        .update_fields(COLLECTION, uuid::Uuid::now_v7(), fields(json!({ "name": "x" })))
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Singleton replace
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn replace_singleton_twice_keeps_one_row_with_latest_body(pool: PgPool) {
    let store = PgDocumentStore::new(pool.clone());

    assert!(store.find_singleton(SINGLETON).await.unwrap().is_none());

    let first = store
        .replace_singleton(SINGLETON, json!({ "rtsp_url": "rtsp://cam-a/feed" }))
        .await
        .unwrap();
    let second = store
        .replace_singleton(SINGLETON, json!({ "rtsp_url": "rtsp://cam-b/feed" }))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.body, json!({ "rtsp_url": "rtsp://cam-b/feed" }));
    assert!(second.updated_at > first.updated_at);

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(SINGLETON)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(store.find_singleton(SINGLETON).await.unwrap(), Some(second));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_singleton_replaces_leave_one_row(pool: PgPool) {
    let store = std::sync::Arc::new(PgDocumentStore::new(pool.clone()));

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let store = std::sync::Arc::clone(&store);
            let body = json!({ "rtsp_url": format!("rtsp://cam-{n}/feed") });
            tokio::spawn(async move { store.replace_singleton(SINGLETON, body).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(SINGLETON)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

// ---------------------------------------------------------------------------
// Delete / ping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn delete_then_find_is_none(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let doc = store.insert(COLLECTION, json!({ "name": "Logo" })).await.unwrap();

    assert!(store.delete(COLLECTION, doc.id).await.unwrap());
    assert!(store.find_by_id(COLLECTION, doc.id).await.unwrap().is_none());
    assert!(!store.delete(COLLECTION, doc.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn ping_succeeds_on_live_pool(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    store.ping().await.unwrap();
}
