//! In-process TTL cache tier for user contexts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::UserContext;

/// Entries tolerated before expired ones are swept out on insert.
const MAX_ENTRIES: usize = 4096;

/// Cache tier abstraction.
///
/// The cache is a derived replica of the persistent repository, never the
/// sole holder of state. The trait seam exists so the context store can be
/// exercised against failing tiers.
#[async_trait]
pub trait ContextCache: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserContext>, StoreError>;

    async fn set(
        &self,
        user_id: &str,
        context: &UserContext,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    context: UserContext,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.created_at.elapsed() < self.ttl
    }
}

/// TTL-based in-memory cache keyed by user id.
///
/// Expired entries are dropped lazily on read; inserts sweep them out once
/// the map grows past its capacity.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextCache for InMemoryCache {
    async fn get(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(user_id)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.context.clone()))
    }

    async fn set(
        &self,
        user_id: &str,
        context: &UserContext,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if entries.len() >= MAX_ENTRIES {
            entries.retain(|_, entry| entry.is_fresh());
        }

        entries.insert(
            user_id.to_string(),
            CacheEntry {
                context: context.clone(),
                created_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(user_id);
        Ok(())
    }
}
