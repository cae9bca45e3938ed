//! Key-value storage backends.
//!
//! Everything the site keeps locally goes through [`KeyValueStore`]: string keys,
//! string values, plain get/set/remove. Two backends exist:
//!
//! - [`SqliteKv`]: persistent, one namespace per logical store (local storage, cookies)
//! - [`MemoryKv`]: lives as long as the process, used for session storage and tests

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key was never set or has been removed.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key in this store.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Persistent store backed by the `kv_entries` table, scoped to one namespace.
#[derive(Clone)]
pub struct SqliteKv {
    pool: SqlitePool,
    namespace: &'static str,
}

impl SqliteKv {
    pub fn new(pool: SqlitePool, namespace: &'static str) -> Self {
        Self { pool, namespace }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_entries (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value,
             updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
        )
        .bind(self.namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(namespace = self.namespace, key = %key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE namespace = ?")
            .bind(self.namespace)
            .execute(&self.pool)
            .await?;
        debug!(namespace = self.namespace, removed = result.rows_affected(), "cleared namespace");
        Ok(())
    }
}

/// Process-lifetime store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKv {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.data.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.data.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn memory_get_set_remove() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("k").await.unwrap(), None);

        kv.set("k", "v1").await.unwrap();
        kv.set("k", "v2").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v2"));

        kv.remove("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let pool = db::open_pool(&dir.path().join("profile.db")).await.unwrap();

        let local = SqliteKv::new(pool.clone(), "local_storage");
        let cookies = SqliteKv::new(pool.clone(), "cookies");

        local.set("shared", "local").await.unwrap();
        cookies.set("shared", "cookie").await.unwrap();
        assert_eq!(local.get("shared").await.unwrap().as_deref(), Some("local"));
        assert_eq!(cookies.get("shared").await.unwrap().as_deref(), Some("cookie"));

        local.clear().await.unwrap();
        assert_eq!(local.get("shared").await.unwrap(), None);
        assert_eq!(cookies.get("shared").await.unwrap().as_deref(), Some("cookie"));
    }

    #[tokio::test]
    async fn sqlite_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.db");

        let pool = db::open_pool(&path).await.unwrap();
        SqliteKv::new(pool.clone(), "local_storage")
            .set("station_config", "{}")
            .await
            .unwrap();
        pool.close().await;

        let pool = db::open_pool(&path).await.unwrap();
        let kv = SqliteKv::new(pool, "local_storage");
        assert_eq!(kv.get("station_config").await.unwrap().as_deref(), Some("{}"));
    }
}
