//! Persistence abstraction for tasks.
//!
//! Both implementations honour the same contract so handlers and tests can
//! swap one for the other:
//!
//! - `create` fails with [`RepositoryError::Duplicate`] when the id is taken.
//! - `find_by_id` returns `Ok(None)` for a missing record; absence is not an error.
//! - `find_all` returns records in no particular order.
//! - `update` overwrites `title`, `description`, `completed` and `updated_at`
//!   only, and reports whether a record matched.
//! - `delete` reports whether a record was removed; a miss is still `Ok`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::context::Context;
use crate::model::TaskRecord;

mod memory;
mod redis_store;

pub use self::memory::InMemoryTaskRepository;
pub use self::redis_store::{RedisTaskRepository, DEFAULT_KEY_PREFIX, DEFAULT_STORE_TIMEOUT};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("task {0} already exists")]
    Duplicate(Uuid),

    #[error("store operation timed out")]
    Timeout,

    #[error("stored task {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, ctx: &Context, task: &TaskRecord) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        ctx: &Context,
        id: Uuid,
    ) -> Result<Option<TaskRecord>, RepositoryError>;

    async fn find_all(&self, ctx: &Context) -> Result<Vec<TaskRecord>, RepositoryError>;

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        task: &TaskRecord,
    ) -> Result<bool, RepositoryError>;

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<bool, RepositoryError>;

    /// Liveness check for the backing store.
    async fn ping(&self, _ctx: &Context) -> Result<(), RepositoryError> {
        Ok(())
    }
}
