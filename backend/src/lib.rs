pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod model;
pub mod repository;
pub mod routes;

pub use context::Context;
pub use error::ApiError;
pub use model::TaskRecord;
pub use repository::{InMemoryTaskRepository, RedisTaskRepository, RepositoryError, TaskRepository};
pub use routes::{router, AppState};
