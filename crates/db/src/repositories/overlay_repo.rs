//! Repository for the `overlays` collection.

use livestream_core::overlay::NewOverlay;
use livestream_core::types::DocId;
use serde_json::{Map, Value};

use crate::models::overlay::{Overlay, OVERLAYS};
use crate::store::{DocumentStore, StoreError};

/// Provides typed CRUD operations for overlays.
pub struct OverlayRepo;

impl OverlayRepo {
    /// List all overlays, oldest first.
    pub async fn list(store: &dyn DocumentStore) -> Result<Vec<Overlay>, StoreError> {
        store
            .find_all(OVERLAYS)
            .await?
            .into_iter()
            .map(Overlay::try_from)
            .collect()
    }

    /// Store a new overlay.
    pub async fn create(
        store: &dyn DocumentStore,
        overlay: &NewOverlay,
    ) -> Result<Overlay, StoreError> {
        let body = serde_json::to_value(overlay).map_err(|_| StoreError::NotAnObject)?;
        store.insert(OVERLAYS, body).await?.try_into()
    }

    /// Find an overlay by id.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: DocId,
    ) -> Result<Option<Overlay>, StoreError> {
        store
            .find_by_id(OVERLAYS, id)
            .await?
            .map(Overlay::try_from)
            .transpose()
    }

    /// Apply a partial update. Returns `None` if the overlay does not exist.
    ///
    /// An empty field set still bumps `updated_at`.
    pub async fn update(
        store: &dyn DocumentStore,
        id: DocId,
        fields: Map<String, Value>,
    ) -> Result<Option<Overlay>, StoreError> {
        store
            .update_fields(OVERLAYS, id, fields)
            .await?
            .map(Overlay::try_from)
            .transpose()
    }

    /// Delete an overlay. Returns `true` if a document was removed.
    pub async fn delete(store: &dyn DocumentStore, id: DocId) -> Result<bool, StoreError> {
        store.delete(OVERLAYS, id).await
    }
}
