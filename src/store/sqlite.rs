use super::models::{DbDocument, DbListMeta};
use super::{DocumentStore, Fields, ListMeta, RawDocument};
use crate::error::StoreError;
use crate::identity::IdentityProvider;
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

const DOCUMENT_ID_LEN: usize = 20;
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// SQLite-backed document store with in-process change notification.
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<String>,
    identity: RwLock<Option<String>>,
}

impl SqliteStore {
    /// Open (or create) the store and initialize the schema
    pub async fn new(database_path: &str) -> Result<Self, StoreError> {
        let in_memory = database_path.contains(":memory:");
        let db_exists = !in_memory && std::path::Path::new(database_path).exists();

        if in_memory {
            info!("Using in-memory document store");
        } else if db_exists {
            info!("Using existing database at: {}", database_path);
        } else {
            info!("Creating new database at: {}", database_path);
        }

        let options = SqliteConnectOptions::from_str(database_path)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection, so keep
        // exactly one and never recycle it.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        let store = Self {
            pool,
            changes,
            identity: RwLock::new(None),
        };
        store.run_migrations().await?;

        if db_exists {
            let stats = store.get_stats().await?;
            info!(
                "Store loaded: {} collections with {} total documents",
                stats.total_collections, stats.total_documents
            );
        }

        Ok(store)
    }

    /// Create tables
    async fn run_migrations(&self) -> Result<(), StoreError> {
        debug!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS list_meta (
                collection TEXT PRIMARY KEY,
                last_refreshed INTEGER NOT NULL,
                next_refresh_due INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                uid TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Database migrations completed");
        Ok(())
    }

    /// Shut the connection pool down. Every later call fails as unavailable.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Document store closed");
    }

    /// Store statistics
    pub async fn get_stats(&self) -> Result<StoreStats, StoreError> {
        let total_collections: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT collection) FROM documents")
                .fetch_one(&self.pool)
                .await?;

        let total_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            total_collections: total_collections as usize,
            total_documents: total_documents as usize,
        })
    }

    async fn require_identity(&self) -> Result<(), StoreError> {
        if self.identity.read().await.is_some() {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied(
                "write requires a signed-in identity".to_string(),
            ))
        }
    }

    fn publish(&self, collection: &str) {
        // No receivers is fine; nobody is watching yet.
        let _ = self.changes.send(collection.to_string());
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.require_identity().await?;

        let id = random_id(DOCUMENT_ID_LEN);
        let doc = DbDocument::new(collection, &id, &fields)?;

        sqlx::query(
            "INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&doc.collection)
        .bind(&doc.id)
        .bind(&doc.data)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Created document {}/{}", collection, id);
        self.publish(collection);
        Ok(id)
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let rows = sqlx::query_as::<_, DbDocument>(
            "SELECT collection, id, data, updated_at FROM documents WHERE collection = ? ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RawDocument::try_from).collect()
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError> {
        self.require_identity().await?;

        let patch = serde_json::to_string(&patch)?;

        // Merged inside SQLite so concurrent patches of different fields
        // never overwrite each other.
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = json_patch(data, ?), updated_at = ?
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(&patch)
        .bind(Utc::now().timestamp_millis())
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        debug!("Updated document {}/{}", collection, id);
        self.publish(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.require_identity().await?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!("Deleted document {}/{}", collection, id);
            self.publish(collection);
        }
        Ok(())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let docs = self.get_all(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }

    async fn get_meta(&self, collection: &str) -> Result<Option<ListMeta>, StoreError> {
        let row = sqlx::query_as::<_, DbListMeta>(
            "SELECT collection, last_refreshed, next_refresh_due FROM list_meta WHERE collection = ?",
        )
        .bind(collection)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ListMeta::from))
    }

    async fn put_meta(&self, collection: &str, meta: ListMeta) -> Result<(), StoreError> {
        self.require_identity().await?;

        let row = DbListMeta::new(collection, meta);
        sqlx::query(
            r#"
            INSERT INTO list_meta (collection, last_refreshed, next_refresh_due)
            VALUES (?, ?, ?)
            ON CONFLICT(collection) DO UPDATE SET
                last_refreshed = excluded.last_refreshed,
                next_refresh_due = excluded.next_refresh_due
            "#,
        )
        .bind(&row.collection)
        .bind(row.last_refreshed)
        .bind(row.next_refresh_due)
        .execute(&self.pool)
        .await?;

        debug!("Stamped list metadata for {}", collection);
        self.publish(collection);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl IdentityProvider for SqliteStore {
    async fn sign_in_anonymously(&self) -> Result<String, StoreError> {
        let mut identity = self.identity.write().await;
        if let Some(uid) = identity.as_ref() {
            return Ok(uid.clone());
        }

        let existing: Option<String> =
            sqlx::query_scalar("SELECT uid FROM identities ORDER BY created_at LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        let uid = match existing {
            Some(uid) => uid,
            None => {
                let uid = random_id(28);
                sqlx::query("INSERT INTO identities (uid, created_at) VALUES (?, ?)")
                    .bind(&uid)
                    .bind(Utc::now().timestamp_millis())
                    .execute(&self.pool)
                    .await?;
                info!("Created anonymous identity {}", uid);
                uid
            }
        };

        *identity = Some(uid.clone());
        Ok(uid)
    }
}

/// Store statistics
pub struct StoreStats {
    pub total_collections: usize,
    pub total_documents: usize,
}

fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
