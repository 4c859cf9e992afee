/// Document identifiers are store-assigned UUIDs (v7, time-ordered).
pub type DocId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
