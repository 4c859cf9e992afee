pub mod overlay;
pub mod settings;
pub mod stream;

use livestream_core::error::CoreError;
use livestream_core::types::DocId;

use crate::error::{AppError, AppResult};

/// Parse a path id. A string that is not a valid id cannot name an existing
/// record, so it is reported as not found rather than as a bad request.
pub(crate) fn parse_id(entity: &'static str, raw: &str) -> AppResult<DocId> {
    raw.parse::<DocId>().map_err(|_| {
        AppError::Core(CoreError::NotFound {
            entity,
            id: raw.to_string(),
        })
    })
}
