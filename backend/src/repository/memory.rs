//! In-memory repository, used by tests and by `TASK_STORE=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RepositoryError, TaskRepository};
use crate::context::Context;
use crate::model::TaskRecord;

/// Tasks keyed by id behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<Uuid, TaskRecord>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

fn check(ctx: &Context) -> Result<(), RepositoryError> {
    if ctx.is_expired() {
        return Err(RepositoryError::Timeout);
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, ctx: &Context, task: &TaskRecord) -> Result<(), RepositoryError> {
        check(ctx)?;
        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(&task.id) {
            return Err(RepositoryError::Duplicate(task.id));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        ctx: &Context,
        id: Uuid,
    ) -> Result<Option<TaskRecord>, RepositoryError> {
        check(ctx)?;
        Ok(self.tasks.lock().await.get(&id).cloned())
    }

    async fn find_all(&self, ctx: &Context) -> Result<Vec<TaskRecord>, RepositoryError> {
        check(ctx)?;
        Ok(self.tasks.lock().await.values().cloned().collect())
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        task: &TaskRecord,
    ) -> Result<bool, RepositoryError> {
        check(ctx)?;
        let mut tasks = self.tasks.lock().await;
        let Some(stored) = tasks.get_mut(&id) else {
            return Ok(false);
        };
        stored.title.clone_from(&task.title);
        stored.description.clone_from(&task.description);
        stored.completed = task.completed;
        stored.updated_at = task.updated_at;
        Ok(true)
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<bool, RepositoryError> {
        check(ctx)?;
        Ok(self.tasks.lock().await.remove(&id).is_some())
    }
}
