//! Redis-backed repository. Each task is one hash at `<prefix><uuid>`.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, RedisResult, Script};
use tokio::time::Instant;
use uuid::Uuid;

use super::{RepositoryError, TaskRepository};
use crate::context::Context;
use crate::model::TaskRecord;

pub const DEFAULT_KEY_PREFIX: &str = "task:";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

// KEYS[1] = task key, ARGV = field/value pairs.
const INSERT_IF_ABSENT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
";

const UPDATE_IF_PRESENT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
";

const SCAN_BATCH: usize = 100;

const ID: &str = "id";
const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const COMPLETED: &str = "completed";
const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

pub struct RedisTaskRepository {
    conn: ConnectionManager,
    prefix: String,
    timeout: Duration,
    insert: Script,
    update: Script,
}

impl RedisTaskRepository {
    /// Connects and pings the server; fails if it is unreachable.
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        let repo = Self {
            conn,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            timeout: DEFAULT_STORE_TIMEOUT,
            insert: Script::new(INSERT_IF_ABSENT),
            update: Script::new(UPDATE_IF_PRESENT),
        };
        repo.ping(&Context::background()).await?;
        Ok(repo)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Per-call limit applied on top of any caller deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn key(&self, id: Uuid) -> String {
        format!("{}{}", self.prefix, id)
    }

    async fn bounded<T>(
        &self,
        ctx: &Context,
        op: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, RepositoryError> {
        bounded(ctx.deadline_within(self.timeout), op).await
    }
}

impl From<RedisError> for RepositoryError {
    fn from(err: RedisError) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}

async fn bounded<T>(
    deadline: Instant,
    op: impl Future<Output = RedisResult<T>>,
) -> Result<T, RepositoryError> {
    tokio::time::timeout_at(deadline, op)
        .await
        .map_err(|_| RepositoryError::Timeout)?
        .map_err(RepositoryError::from)
}

/// `MATCH` pattern for every key under `prefix`, with glob metacharacters
/// in the prefix taken literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl TaskRepository for RedisTaskRepository {
    async fn create(&self, ctx: &Context, task: &TaskRecord) -> Result<(), RepositoryError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.insert.key(self.key(task.id));
        for (field, value) in document(task) {
            invocation.arg(field).arg(value);
        }

        let inserted: i64 = self
            .bounded(ctx, invocation.invoke_async(&mut conn))
            .await?;
        if inserted == 0 {
            return Err(RepositoryError::Duplicate(task.id));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        ctx: &Context,
        id: Uuid,
    ) -> Result<Option<TaskRecord>, RepositoryError> {
        let mut conn = self.conn.clone();
        let key = self.key(id);
        let fields: HashMap<String, String> =
            self.bounded(ctx, conn.hgetall(&key)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode(&key, fields).map(Some)
    }

    async fn find_all(&self, ctx: &Context) -> Result<Vec<TaskRecord>, RepositoryError> {
        let mut conn = self.conn.clone();
        let pattern = scan_pattern(&self.prefix);

        let (keys, rows) = self
            .bounded(ctx, async {
                // only hashes; other key types under the prefix are not tasks
                let mut keys = Vec::new();
                let mut cursor: u64 = 0;
                loop {
                    let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .arg("TYPE")
                        .arg("hash")
                        .query_async(&mut conn)
                        .await?;
                    keys.extend(batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                // SCAN may return a key more than once
                keys.sort_unstable();
                keys.dedup();

                if keys.is_empty() {
                    return RedisResult::Ok((keys, Vec::new()));
                }
                let mut pipe = redis::pipe();
                for key in &keys {
                    pipe.hgetall(key);
                }
                let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;
                RedisResult::Ok((keys, rows))
            })
            .await?;

        keys.iter()
            .zip(rows)
            // deleted between KEYS and HGETALL
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(key, fields)| decode(key, fields))
            .collect()
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        task: &TaskRecord,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.update.key(self.key(id));
        for (field, value) in mutable_fields(task) {
            invocation.arg(field).arg(value);
        }

        let matched: i64 = self
            .bounded(ctx, invocation.invoke_async(&mut conn))
            .await?;
        Ok(matched == 1)
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self.bounded(ctx, conn.del(self.key(id))).await?;
        Ok(removed > 0)
    }

    async fn ping(&self, ctx: &Context) -> Result<(), RepositoryError> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded(ctx, redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}

fn document(task: &TaskRecord) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        (ID, task.id.to_string()),
        (CREATED_AT, task.created_at.to_string()),
    ];
    fields.extend(mutable_fields(task));
    fields
}

fn mutable_fields(task: &TaskRecord) -> Vec<(&'static str, String)> {
    vec![
        (TITLE, task.title.clone()),
        (DESCRIPTION, task.description.clone()),
        (COMPLETED, task.completed.to_string()),
        (UPDATED_AT, task.updated_at.to_string()),
    ]
}

fn decode(key: &str, mut fields: HashMap<String, String>) -> Result<TaskRecord, RepositoryError> {
    let corrupt = |reason: String| RepositoryError::Corrupt {
        id: key.to_string(),
        reason,
    };
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| corrupt(format!("missing field `{name}`")))
    };

    let id = take(ID)?;
    let title = take(TITLE)?;
    let description = take(DESCRIPTION)?;
    let completed = take(COMPLETED)?;
    let created_at = take(CREATED_AT)?;
    let updated_at = take(UPDATED_AT)?;

    Ok(TaskRecord {
        id: id
            .parse()
            .map_err(|e| corrupt(format!("bad `{ID}`: {e}")))?,
        title,
        description,
        completed: completed
            .parse()
            .map_err(|e| corrupt(format!("bad `{COMPLETED}`: {e}")))?,
        created_at: created_at
            .parse()
            .map_err(|e| corrupt(format!("bad `{CREATED_AT}`: {e}")))?,
        updated_at: updated_at
            .parse()
            .map_err(|e| corrupt(format!("bad `{UPDATED_AT}`: {e}")))?,
    })
}
