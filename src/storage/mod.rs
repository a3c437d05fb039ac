//! Two-tier context storage.
//!
//! The persistent repository is the source of truth; the cache is a
//! TTL-bounded replica filled on read and refreshed after every durable
//! write. Nothing the cache holds is ever the only copy of a context.

pub mod cache;
pub mod repository;

pub use cache::{ContextCache, InMemoryCache};
pub use repository::{ContextRepository, RedbRepository};

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::UserContext;

/// Single access surface over the cache tier and the persistent repository.
pub struct ContextStore {
    cache: Arc<dyn ContextCache>,
    repository: Arc<dyn ContextRepository>,
    cache_ttl: Duration,
}

impl ContextStore {
    pub fn new(
        cache: Arc<dyn ContextCache>,
        repository: Arc<dyn ContextRepository>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            repository,
            cache_ttl,
        }
    }

    /// Cache-aside read.
    ///
    /// `Ok(None)` means the user has no record in either tier. A tier that
    /// cannot answer surfaces as `StoreError::Unavailable` instead, since
    /// treating it as a miss would let callers create a duplicate context.
    pub async fn get(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
        match self.cache.get(user_id).await? {
            Some(context) => {
                tracing::debug!(user_id, "cache hit");
                return Ok(Some(context));
            }
            None => tracing::debug!(user_id, "cache miss"),
        }

        let fetched = self.repository.fetch(user_id).await?;

        if let Some(context) = &fetched {
            // Fill-on-read; a failure here only costs the next read a trip
            // to the repository.
            if let Err(err) = self.cache.set(user_id, context, self.cache_ttl).await {
                tracing::warn!(user_id, error = %err, "cache fill after repository read failed");
            }
        }

        Ok(fetched)
    }

    /// Durable-first write.
    ///
    /// The repository write must succeed before the cache is touched; a
    /// failed durable write leaves the cache exactly as it was. A cache
    /// refresh failure after a durable write is absorbed; the next read
    /// fills the cache back from the repository.
    ///
    /// Concurrent turns for the same user race last-write-wins; there is no
    /// per-user mutual exclusion.
    pub async fn put(&self, user_id: &str, context: &UserContext) -> Result<(), StoreError> {
        self.repository.upsert(user_id, context).await?;
        tracing::debug!(user_id, history_len = context.chat_history.len(), "context persisted");

        if let Err(err) = self.cache.set(user_id, context, self.cache_ttl).await {
            tracing::warn!(user_id, error = %err, "cache refresh after durable write failed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    fn context_with(content: &str) -> UserContext {
        UserContext {
            chat_history: vec![Message::user(content)],
            ..UserContext::default()
        }
    }

    struct MemoryRepository {
        records: RwLock<HashMap<String, UserContext>>,
        fail_upserts: bool,
    }

    impl MemoryRepository {
        fn new() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
                fail_upserts: false,
            }
        }

        fn failing_upserts() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
                fail_upserts: true,
            }
        }

        async fn seed(&self, user_id: &str, context: UserContext) {
            self.records
                .write()
                .await
                .insert(user_id.to_string(), context);
        }
    }

    #[async_trait]
    impl ContextRepository for MemoryRepository {
        async fn fetch(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
            Ok(self.records.read().await.get(user_id).cloned())
        }

        async fn upsert(&self, user_id: &str, context: &UserContext) -> Result<(), StoreError> {
            if self.fail_upserts {
                return Err(StoreError::Unavailable("repository down".to_string()));
            }
            self.records
                .write()
                .await
                .insert(user_id.to_string(), context.clone());
            Ok(())
        }
    }

    struct UnavailableRepository;

    #[async_trait]
    impl ContextRepository for UnavailableRepository {
        async fn fetch(&self, _user_id: &str) -> Result<Option<UserContext>, StoreError> {
            Err(StoreError::Unavailable("repository down".to_string()))
        }

        async fn upsert(&self, _user_id: &str, _context: &UserContext) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("repository down".to_string()))
        }
    }

    /// Cache whose writes fail while reads keep working.
    struct WriteFailingCache {
        inner: InMemoryCache,
    }

    #[async_trait]
    impl ContextCache for WriteFailingCache {
        async fn get(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
            self.inner.get(user_id).await
        }

        async fn set(
            &self,
            _user_id: &str,
            _context: &UserContext,
            _ttl: Duration,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("cache down".to_string()))
        }

        async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
            self.inner.delete(user_id).await
        }
    }

    fn store_over(
        cache: Arc<dyn ContextCache>,
        repository: Arc<dyn ContextRepository>,
    ) -> ContextStore {
        ContextStore::new(cache, repository, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_cache_aside_fill_on_read() {
        let cache = Arc::new(InMemoryCache::new());
        let repository = Arc::new(MemoryRepository::new());
        repository.seed("user-1", context_with("hi")).await;

        let store = store_over(cache.clone(), repository);
        let fetched = store.get("user-1").await.unwrap();
        assert_eq!(fetched, Some(context_with("hi")));

        // The read must have left a cache entry behind.
        let cached = cache.get("user-1").await.unwrap();
        assert_eq!(cached, Some(context_with("hi")));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_repository() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set("user-1", &context_with("cached"), Duration::from_secs(60))
            .await
            .unwrap();

        // An unavailable repository proves the hit never reaches it.
        let store = store_over(cache, Arc::new(UnavailableRepository));
        let fetched = store.get("user-1").await.unwrap();
        assert_eq!(fetched, Some(context_with("cached")));
    }

    #[tokio::test]
    async fn test_miss_in_both_tiers_is_none() {
        let store = store_over(
            Arc::new(InMemoryCache::new()),
            Arc::new(MemoryRepository::new()),
        );
        assert_eq!(store.get("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_repository_failure_is_not_a_miss() {
        let store = store_over(
            Arc::new(InMemoryCache::new()),
            Arc::new(UnavailableRepository),
        );
        let result = store.get("user-1").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_failed_durable_write_leaves_cache_untouched() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set("user-1", &context_with("old"), Duration::from_secs(60))
            .await
            .unwrap();

        let store = store_over(cache.clone(), Arc::new(MemoryRepository::failing_upserts()));
        let result = store.put("user-1", &context_with("new")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        // Never serve state that is not durable.
        let cached = cache.get("user-1").await.unwrap();
        assert_eq!(cached, Some(context_with("old")));
    }

    #[tokio::test]
    async fn test_put_writes_both_tiers() {
        let cache = Arc::new(InMemoryCache::new());
        let repository = Arc::new(MemoryRepository::new());

        let store = store_over(cache.clone(), repository.clone());
        store.put("user-1", &context_with("hi")).await.unwrap();

        assert_eq!(
            repository.fetch("user-1").await.unwrap(),
            Some(context_with("hi"))
        );
        assert_eq!(cache.get("user-1").await.unwrap(), Some(context_with("hi")));
    }

    #[tokio::test]
    async fn test_cache_write_failure_after_durable_write_is_absorbed() {
        let cache = Arc::new(WriteFailingCache {
            inner: InMemoryCache::new(),
        });
        let repository = Arc::new(MemoryRepository::new());

        let store = store_over(cache, repository.clone());
        store.put("user-1", &context_with("hi")).await.unwrap();

        // Durability satisfied; the next get still serves the value via the
        // repository fallback.
        let fetched = store.get("user-1").await.unwrap();
        assert_eq!(fetched, Some(context_with("hi")));
    }
}
