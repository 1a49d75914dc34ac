//! Preference Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    preferences::PreferenceStore,
};
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS preferences (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed preference store implementation
///
/// Persists plugin preferences outside the host, for running the sync core
/// from a desktop shell or integration tests.
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
}

impl SqlitePreferenceStore {
    /// Open (or create) the store at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs want forward slashes on Windows too
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(db_error("failed to connect to DB"))?;

        Self::create_table(&pool).await?;
        debug!(path = ?db_path, "Initialized preference store");

        Ok(Self { pool })
    }

    /// Throwaway store, used by tests
    pub async fn in_memory() -> Result<Self> {
        // Every in-memory connection is its own database; keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error("failed to connect to DB"))?;

        Self::create_table(&pool).await?;
        Ok(Self { pool })
    }

    /// Default on-disk location under the user's config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refsync")
            .join("preferences.db")
    }

    async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(db_error("failed to create table"))?;
        Ok(())
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> BridgeError {
    move |e| BridgeError::DatabaseError(format!("{}: {}", context, e))
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to get preference"))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(db_error("failed to set preference"))?;

        debug!(key = key, "Stored preference");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error("failed to delete preference"))?;

        debug!(key = key, "Deleted preference");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to check key"))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM preferences ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("failed to list keys"))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqlitePreferenceStore::in_memory().await.unwrap();

        store
            .set_string("notionDatabaseID", "db-123")
            .await
            .unwrap();
        let value = store.get_string("notionDatabaseID").await.unwrap();
        assert_eq!(value, Some("db-123".to_string()));

        store.set_string("notionDatabaseID", "db-456").await.unwrap();
        let value = store.get_string("notionDatabaseID").await.unwrap();
        assert_eq!(value, Some("db-456".to_string()));

        store.delete("notionDatabaseID").await.unwrap();
        let value = store.get_string("notionDatabaseID").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_has_key_and_list_keys() {
        let store = SqlitePreferenceStore::in_memory().await.unwrap();

        store.set_string("pageTitleFormat", "itemTitle").await.unwrap();
        store.set_string("notionToken", "secret").await.unwrap();

        assert!(store.has_key("pageTitleFormat").await.unwrap());
        assert!(!store.has_key("missing").await.unwrap());

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["notionToken", "pageTitleFormat"]);
    }
}
