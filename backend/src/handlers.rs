//! Request handlers: decode, validate, call the repository, encode.
//!
//! Each handler short-circuits to an [`ApiError`] at the first failing stage.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{CreateTaskRequest, TaskEnvelope, TaskListEnvelope, UpdateTaskRequest, Validate};
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::{now_seconds, TaskRecord};
use crate::routes::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.repository().ping(&state.context()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<TaskListEnvelope>, ApiError> {
    let records = state
        .repository()
        .find_all(&state.context())
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve tasks", e))?;

    Ok(Json(TaskListEnvelope {
        tasks: records.iter().map(TaskRecord::to_wire).collect(),
    }))
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<TaskEnvelope>), ApiError> {
    let req: CreateTaskRequest = decode(&read_body(body)?)?;
    req.validate()?;

    let record = TaskRecord::new(req.title, req.description, now_seconds());
    state
        .repository()
        .create(&state.context(), &record)
        .await
        .map_err(|e| ApiError::internal("Failed to create task", e))?;

    tracing::debug!(id = %record.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(TaskEnvelope {
            task: record.to_wire(),
        }),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskEnvelope>, ApiError> {
    let id = path_id(id)?;
    let record = find(&state, id).await?;
    Ok(Json(TaskEnvelope {
        task: record.to_wire(),
    }))
}

pub async fn update_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TaskEnvelope>, ApiError> {
    let id = path_id(id)?;
    let req: UpdateTaskRequest = decode(&read_body(body)?)?;
    req.validate()?;

    let mut record = find(&state, id).await?;
    record.apply_update(req.title, req.description, req.completed, now_seconds());

    let matched = state
        .repository()
        .update(&state.context(), id, &record)
        .await
        .map_err(|e| ApiError::internal("Failed to update task", e))?;
    if !matched {
        // removed between the read and the write
        return Err(ApiError::not_found("Task not found"));
    }

    Ok(Json(TaskEnvelope {
        task: record.to_wire(),
    }))
}

/// Always 204 once the id parses; deleting an unknown id is not an error.
pub async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    let removed = state
        .repository()
        .delete(&state.context(), id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete task", e))?;

    tracing::debug!(%id, removed, "task delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn find(state: &AppState, id: Uuid) -> Result<TaskRecord, ApiError> {
    state
        .repository()
        .find_by_id(&state.context(), id)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve task", e))?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

fn path_id(path: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
    match path {
        Ok(Path(raw)) => parse_id(&raw),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "path rejected");
            Err(ApiError::bad_request("Invalid task ID format"))
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid task ID format"))
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "body rejected");
        ApiError::bad_request("Failed to read request body")
    })
}

/// Bodies must be JSON objects; serde would otherwise accept the sequence form
/// of a struct.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let invalid = |note: String| ApiError::bad_request_with_note("Invalid JSON format", note);
    match serde_json::from_slice::<Value>(body).map_err(|e| invalid(e.to_string()))? {
        value @ Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
        }
        other => Err(invalid(format!("expected a JSON object, found {}", kind(&other)))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("550e8400-e29b-41d4-a716-446655440000")]
    #[case("550E8400-E29B-41D4-A716-446655440000")]
    fn parses_canonical_ids(#[case] raw: &str) {
        assert_eq!(
            parse_id(raw).unwrap().to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[case("550e8400-e29b-41d4-a716")]
    fn rejects_malformed_ids(#[case] raw: &str) {
        let err = parse_id(raw).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid task ID format");
    }

    #[rstest]
    #[case(b"{".as_slice())]
    #[case(b"[]".as_slice())]
    #[case(br#"["My Task","desc"]"#.as_slice())]
    #[case(b"null".as_slice())]
    #[case(br#"{"title": 5}"#.as_slice())]
    #[case(br#"{"title":"t","createdAt":"2020-01-01T00:00:00Z"}"#.as_slice())]
    fn rejects_undecodable_bodies(#[case] body: &[u8]) {
        let err = decode::<CreateTaskRequest>(body).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { note: Some(_), .. }));
        assert_eq!(err.to_string(), "Invalid JSON format");
    }

    #[test]
    fn array_update_body_is_rejected() {
        let err = decode::<UpdateTaskRequest>(br#"["t","d",true]"#).unwrap_err();
        assert!(
            matches!(err, ApiError::BadRequest { note: Some(ref note), .. } if note.contains("an array"))
        );
    }

    #[test]
    fn object_body_decodes() {
        let req: UpdateTaskRequest =
            decode(br#"{"title":"t","description":"d","completed":true}"#).unwrap();
        assert_eq!(req.completed, Some(true));
    }
}
