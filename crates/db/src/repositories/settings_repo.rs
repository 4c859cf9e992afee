//! Repository for the singleton `settings` collection.

use crate::models::settings::{Settings, UpsertSettings, SETTINGS};
use crate::store::{DocumentStore, StoreError};

/// Provides read and upsert access to the settings document.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Get the settings document. Returns `None` if it was never saved.
    pub async fn get(store: &dyn DocumentStore) -> Result<Option<Settings>, StoreError> {
        store
            .find_singleton(SETTINGS)
            .await?
            .map(Settings::try_from)
            .transpose()
    }

    /// Replace the settings document, creating it on first save.
    pub async fn upsert(
        store: &dyn DocumentStore,
        dto: &UpsertSettings,
    ) -> Result<Settings, StoreError> {
        let body = serde_json::to_value(dto).map_err(|_| StoreError::NotAnObject)?;
        store.replace_singleton(SETTINGS, body).await?.try_into()
    }
}
