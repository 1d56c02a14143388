use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::Context;
use crate::error::ApiError;
use crate::handlers::{create_task, delete_task, get_task, health, list_tasks, update_task};
use crate::repository::TaskRepository;

/// Everything a handler needs. Cheap to clone; one instance per router.
#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn TaskRepository>,
    request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            repository,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn repository(&self) -> &dyn TaskRepository {
        self.repository.as_ref()
    }

    /// Fresh context for one request.
    pub fn context(&self) -> Context {
        Context::from_timeout(self.request_timeout)
    }
}

pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("GET", "/api/v1/tasks"),
    ("POST", "/api/v1/tasks"),
    ("GET", "/api/v1/tasks/{id}"),
    ("PUT", "/api/v1/tasks/{id}"),
    ("DELETE", "/api/v1/tasks/{id}"),
];

pub fn router(state: AppState) -> Router {
    let tasks = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", tasks)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    ApiError::internal("Internal server error", detail).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use shared::{ErrorKind, ErrorResponse};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn panicking_handler_becomes_internal_error() {
        async fn boom() -> &'static str {
            panic!("kaboom")
        }

        let app: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.kind, ErrorKind::InternalError);
        assert_eq!(body.message, "Internal server error");
    }
}
