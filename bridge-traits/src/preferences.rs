//! Preference Storage Abstraction
//!
//! Plugin preferences live in the host's preference system. The sync core only
//! needs string values; typed interpretation (enums, defaults) happens in
//! `core-runtime`.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value preference storage trait
///
/// Abstracts the host's preference branch:
/// - Plugin host: the application preference service
/// - Desktop shim: SQLite-backed key-value table
/// - Tests: in-memory map
///
/// # Example
///
/// ```ignore
/// use bridge_traits::preferences::PreferenceStore;
///
/// async fn database_id(store: &dyn PreferenceStore) -> Result<Option<String>> {
///     store.get_string("notionDatabaseID").await
/// }
/// ```
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a preference
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a preference exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all preference keys
    async fn list_keys(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl PreferenceStore for MapStore {
        async fn get_string(&self, key: &str) -> Result<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn set_string(&self, key: &str, value: &str) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.0.lock().unwrap().keys().cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_has_key_default() {
        let store = MapStore::default();
        assert!(!store.has_key("pageTitleFormat").await.unwrap());

        store.set_string("pageTitleFormat", "itemTitle").await.unwrap();
        assert!(store.has_key("pageTitleFormat").await.unwrap());
    }
}
