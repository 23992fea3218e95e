use super::{Fields, ListMeta, RawDocument};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database representation of a document
#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub collection: String,
    pub id: String,
    pub data: String,
    pub updated_at: i64, // Unix timestamp, milliseconds
}

/// Database representation of a list's refresh metadata
#[derive(Debug, Clone, FromRow)]
pub struct DbListMeta {
    pub collection: String,
    pub last_refreshed: i64,
    pub next_refresh_due: i64,
}

impl DbDocument {
    pub fn new(collection: &str, id: &str, fields: &Fields) -> Result<Self, StoreError> {
        Ok(Self {
            collection: collection.to_string(),
            id: id.to_string(),
            data: serde_json::to_string(fields)?,
            updated_at: Utc::now().timestamp_millis(),
        })
    }

    pub fn fields(&self) -> Result<Fields, StoreError> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

impl TryFrom<DbDocument> for RawDocument {
    type Error = StoreError;

    fn try_from(doc: DbDocument) -> Result<Self, Self::Error> {
        let fields = doc.fields()?;
        Ok(RawDocument { id: doc.id, fields })
    }
}

impl DbListMeta {
    pub fn new(collection: &str, meta: ListMeta) -> Self {
        Self {
            collection: collection.to_string(),
            last_refreshed: meta.last_refreshed.timestamp_millis(),
            next_refresh_due: meta.next_refresh_due.timestamp_millis(),
        }
    }
}

impl From<DbListMeta> for ListMeta {
    fn from(row: DbListMeta) -> Self {
        ListMeta {
            last_refreshed: from_millis(row.last_refreshed),
            next_refresh_due: from_millis(row.next_refresh_due),
        }
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
