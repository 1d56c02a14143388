use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod error;
mod validation;

pub use error::{ErrorDetails, ErrorKind, ErrorResponse};
pub use validation::{
    FieldViolation, Validate, ValidationErrors, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};

/// Wire representation of a task, as returned by every task endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/tasks`. Server-owned fields are rejected as unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
}

/// Body of `PUT /api/v1/tasks/{id}`.
///
/// `title` and `description` always overwrite the stored values; `completed`
/// only does when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task: Task,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListEnvelope {
    pub tasks: Vec<Task>,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl UpdateTaskRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            completed: None,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_serializes_with_camel_case_and_rfc3339() {
        let created = DateTime::from_timestamp(1_234_567_890, 0).unwrap();
        let task = Task {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            title: "Test Task".into(),
            description: String::new(),
            completed: false,
            created_at: created,
            updated_at: created,
        };

        let value = serde_json::to_value(TaskEnvelope { task }).unwrap();
        assert_eq!(
            value,
            json!({
                "task": {
                    "id": "550e8400-e29b-41d4-a716-446655440000",
                    "title": "Test Task",
                    "description": "",
                    "completed": false,
                    "createdAt": "2009-02-13T23:31:30Z",
                    "updatedAt": "2009-02-13T23:31:30Z"
                }
            })
        );
    }

    #[test]
    fn empty_list_serializes_as_array() {
        let value = serde_json::to_value(TaskListEnvelope::default()).unwrap();
        assert_eq!(value, json!({ "tasks": [] }));
    }

    #[test]
    fn create_request_defaults_missing_fields() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"only"}"#).unwrap();
        assert_eq!(req.title, "only");
        assert_eq!(req.description, "");
    }

    #[test]
    fn create_request_rejects_server_owned_fields() {
        let err = serde_json::from_str::<CreateTaskRequest>(r#"{"title":"t","completed":true}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<CreateTaskRequest>(r#"{"title":"t","id":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn update_request_distinguishes_absent_completed() {
        let absent: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"t","description":"d"}"#).unwrap();
        assert_eq!(absent.completed, None);

        let present: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"t","description":"d","completed":false}"#).unwrap();
        assert_eq!(present.completed, Some(false));
    }
}
