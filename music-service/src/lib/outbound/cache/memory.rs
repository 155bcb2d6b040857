use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::auth::errors::TokenCacheError;
use crate::domain::auth::ports::TokenCache;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Process-local TokenCache for single-instance deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), TokenCacheError> {
        let entry = Entry {
            value,
            expires_at: Utc::now() + ttl,
        };

        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, TokenCacheError> {
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it lazily, re-checking in case it was replaced meanwhile.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn invalidate(&self, key: &str) -> Result<(), TokenCacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, TokenCacheError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));

        Ok((before - entries.len()) as u64)
    }
}
