use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::ConnectionManager, Client};
use serde_json::Value;

use super::ServiceError;
use crate::models::SessionRecord;

/// Server-side session storage. Writes belong to the login flows; the auth
/// core only reads.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session regardless of expiry. `None` when absent.
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, ServiceError>;

    async fn save(&self, session: &SessionRecord) -> Result<(), ServiceError>;

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;

    /// Present and not yet expired.
    async fn exists_and_unexpired(&self, session_id: &str) -> Result<bool, ServiceError> {
        Ok(self
            .load(session_id)
            .await?
            .is_some_and(|session| !session.is_expired()))
    }

    /// Read a single key from a live session.
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self
            .load(session_id)
            .await?
            .filter(|session| !session.is_expired())
            .and_then(|session| session.data.get(key).cloned()))
    }
}

#[derive(Clone)]
pub struct RedisSessionStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis session store");
        let client = Client::open(config.url.clone())?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis session store");

        Ok(Self {
            _client: client,
            manager,
        })
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, ServiceError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(session_id))
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SessionRecord) -> Result<(), ServiceError> {
        let ttl_seconds = (session.expiry - Utc::now()).num_seconds();
        if ttl_seconds <= 0 {
            return self.delete(&session.session_id).await;
        }

        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(Self::key(&session.session_id))
            .arg(serde_json::to_string(session)?)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        redis::cmd("DEL")
            .arg(Self::key(session_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(ServiceError::from)
    }
}

pub struct MockSessionStore {
    pub sessions: std::sync::Mutex<std::collections::HashMap<String, SessionRecord>>,
    /// Makes every read fail, for exercising store outages.
    pub fail_reads: std::sync::atomic::AtomicBool,
}

impl Default for MockSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::Mutex::new(std::collections::HashMap::new()),
            fail_reads: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_session(self, session: SessionRecord) -> Self {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(session.session_id.clone(), session);
        }
        self
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, ServiceError> {
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Mock session store unavailable"
            )));
        }
        let session = self
            .sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock session store mutex poisoned: {}", e))?
            .get(session_id)
            .cloned();
        Ok(session)
    }

    async fn save(&self, session: &SessionRecord) -> Result<(), ServiceError> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock session store mutex poisoned: {}", e))?
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), ServiceError> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock session store mutex poisoned: {}", e))?
            .remove(session_id);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::keys;
    use chrono::Duration;

    #[tokio::test]
    async fn test_exists_and_unexpired() {
        let store = MockSessionStore::new()
            .with_session(SessionRecord::new("live", Duration::minutes(5)))
            .with_session(SessionRecord::new("stale", Duration::seconds(-5)));

        assert!(store.exists_and_unexpired("live").await.unwrap());
        assert!(!store.exists_and_unexpired("stale").await.unwrap());
        assert!(!store.exists_and_unexpired("absent").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_reads_only_live_sessions() {
        let store = MockSessionStore::new()
            .with_session(
                SessionRecord::new("live", Duration::minutes(5))
                    .with(keys::GITHUB_USERNAME, "octocat"),
            )
            .with_session(
                SessionRecord::new("stale", Duration::seconds(-5))
                    .with(keys::GITHUB_USERNAME, "octocat"),
            );

        assert_eq!(
            store.get("live", keys::GITHUB_USERNAME).await.unwrap(),
            Some(Value::from("octocat"))
        );
        assert_eq!(store.get("stale", keys::GITHUB_USERNAME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let store = MockSessionStore::new();
        store
            .fail_reads
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(store.load("any").await.is_err());
    }
}
