//! Persistent user-context repository backed by redb.

use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::models::UserContext;

const USER_CONTEXT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("user_contexts");

/// Durable document store keyed by user id. This tier is the source of truth;
/// every cached value must be reconstructible from it.
#[async_trait]
pub trait ContextRepository: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Option<UserContext>, StoreError>;

    async fn upsert(&self, user_id: &str, context: &UserContext) -> Result<(), StoreError>;
}

pub struct RedbRepository {
    db: Arc<Database>,
}

impl RedbRepository {
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let db = Arc::new(Database::create(path)?);

        // Create table if not exists
        let write_txn = db.begin_write()?;
        write_txn.open_table(USER_CONTEXT_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }
}

#[async_trait]
impl ContextRepository for RedbRepository {
    async fn fetch(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let table = read_txn
            .open_table(USER_CONTEXT_TABLE)
            .map_err(unavailable)?;

        match table.get(user_id).map_err(unavailable)? {
            Some(value) => {
                let context: UserContext = serde_json::from_slice(value.value())?;
                Ok(Some(context))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, user_id: &str, context: &UserContext) -> Result<(), StoreError> {
        let document = serde_json::to_vec(context)?;

        let write_txn = self.db.begin_write().map_err(unavailable)?;
        {
            let mut table = write_txn
                .open_table(USER_CONTEXT_TABLE)
                .map_err(unavailable)?;
            table
                .insert(user_id, document.as_slice())
                .map_err(unavailable)?;
        }
        write_txn.commit().map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}
