//! The browser-profile abstraction every caller receives explicitly.
//!
//! A [`BrowserSession`] bundles the three storage mechanisms the site uses:
//! persistent local storage, session storage (gone when the session ends) and
//! the cookie jar. Nothing reads ambient global state; flags are checked and set
//! through the handle.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::kv::{KeyValueStore, MemoryKv, SqliteKv};

pub const LOCAL_NAMESPACE: &str = "local_storage";
pub const COOKIE_NAMESPACE: &str = "cookies";

const JAR_KEY: &str = "jar";

#[derive(Clone)]
pub struct BrowserSession {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    cookies: CookieJar,
}

impl BrowserSession {
    /// Session backed by the profile database. Session storage starts empty.
    pub fn open(pool: &SqlitePool) -> Self {
        Self::with_stores(
            Arc::new(SqliteKv::new(pool.clone(), LOCAL_NAMESPACE)),
            Arc::new(MemoryKv::new()),
            Arc::new(SqliteKv::new(pool.clone(), COOKIE_NAMESPACE)),
        )
    }

    pub fn with_stores(
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        cookie_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            local,
            session,
            cookies: CookieJar::new(cookie_store),
        }
    }

    /// Fully in-memory session, nothing persisted.
    #[cfg(test)]
    pub fn ephemeral() -> Self {
        Self::with_stores(
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryKv::new()),
        )
    }

    pub fn local(&self) -> &dyn KeyValueStore {
        self.local.as_ref()
    }

    pub fn session_storage(&self) -> &dyn KeyValueStore {
        self.session.as_ref()
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Tear down session-scoped state. Local storage and cookies are untouched.
    pub async fn end(&self) -> Result<(), StoreError> {
        self.session.clear().await?;
        info!("browser session ended");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    path: String,
    expires_at: DateTime<Utc>,
}

/// Cookie jar persisted as one JSON map in its own store.
#[derive(Clone)]
pub struct CookieJar {
    store: Arc<dyn KeyValueStore>,
}

impl CookieJar {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<BTreeMap<String, StoredCookie>, StoreError> {
        match self.store.get(JAR_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                key: format!("{COOKIE_NAMESPACE}/{JAR_KEY}"),
                source,
            }),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn persist(&self, jar: &BTreeMap<String, StoredCookie>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(jar).map_err(|source| StoreError::Encode {
            key: format!("{COOKIE_NAMESPACE}/{JAR_KEY}"),
            source,
        })?;
        self.store.set(JAR_KEY, &raw).await
    }

    /// Set (or replace) a cookie that expires `max_age` from `now`.
    pub async fn set(
        &self,
        name: &str,
        value: &str,
        path: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut jar = self.load().await?;
        let expires_at = now + max_age;
        jar.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                path: path.to_string(),
                expires_at,
            },
        );
        self.persist(&jar).await?;
        debug!(cookie = %name, expires = %expires_at.to_rfc2822(), "cookie set");
        Ok(())
    }

    /// `name=value` pairs of unexpired cookies joined with `"; "`, the way
    /// `document.cookie` reads.
    pub async fn document_cookie(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let jar = self.load().await?;
        Ok(jar
            .iter()
            .filter(|(_, cookie)| cookie.expires_at > now)
            .map(|(name, cookie)| format!("{name}={}", cookie.value))
            .collect::<Vec<_>>()
            .join("; "))
    }

    #[cfg(test)]
    pub async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut jar = self.load().await?;
        if jar.remove(name).is_some() {
            self.persist(&jar).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn document_cookie_skips_expired() {
        let session = BrowserSession::ephemeral();
        let now = Utc::now();
        let jar = session.cookies();

        jar.set("visual_access", "true", "/", Duration::days(7), now).await.unwrap();
        jar.set("theme", "void", "/", Duration::hours(1), now).await.unwrap();

        assert_eq!(
            jar.document_cookie(now).await.unwrap(),
            "theme=void; visual_access=true"
        );
        assert_eq!(
            jar.document_cookie(now + Duration::hours(2)).await.unwrap(),
            "visual_access=true"
        );
        assert_eq!(jar.document_cookie(now + Duration::days(8)).await.unwrap(), "");
    }

    #[tokio::test]
    async fn remove_cookie() {
        let session = BrowserSession::ephemeral();
        let now = Utc::now();
        session
            .cookies()
            .set("visual_access", "true", "/", Duration::days(7), now)
            .await
            .unwrap();
        session.cookies().remove("visual_access").await.unwrap();
        assert_eq!(session.cookies().document_cookie(now).await.unwrap(), "");
    }

    #[tokio::test]
    async fn end_clears_only_session_storage() {
        let session = BrowserSession::ephemeral();
        session.session_storage().set("station_auth", "granted").await.unwrap();
        session.local().set("station_visual_access", "true").await.unwrap();

        session.end().await.unwrap();

        assert_eq!(session.session_storage().get("station_auth").await.unwrap(), None);
        assert_eq!(
            session.local().get("station_visual_access").await.unwrap().as_deref(),
            Some("true")
        );
    }
}
