use serde::{Deserialize, Serialize};

use crate::FieldViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    BadRequest,
    InternalError,
}

/// Extra context attached to an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// Per-field diagnostics; serialized as an array.
    Fields(Vec<FieldViolation>),
    /// Single free-text note; serialized as `{"note": "..."}`.
    Note { note: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_details_serialize_as_array() {
        let response = ErrorResponse {
            kind: ErrorKind::ValidationError,
            message: "Validation failed".into(),
            details: Some(ErrorDetails::Fields(vec![FieldViolation::new(
                "title",
                "must not be empty",
            )])),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "type": "VALIDATION_ERROR",
                "message": "Validation failed",
                "details": [{ "field": "title", "message": "must not be empty" }]
            })
        );
    }

    #[test]
    fn note_details_serialize_as_object_and_absent_details_are_omitted() {
        let with_note = ErrorResponse {
            kind: ErrorKind::BadRequest,
            message: "Invalid JSON format".into(),
            details: Some(ErrorDetails::Note {
                note: "EOF while parsing".into(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&with_note).unwrap()["details"],
            json!({ "note": "EOF while parsing" })
        );

        let bare = ErrorResponse {
            kind: ErrorKind::NotFound,
            message: "Task not found".into(),
            details: None,
        };
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({ "type": "NOT_FOUND", "message": "Task not found" })
        );
    }

    #[test]
    fn decodes_both_detail_shapes() {
        let parsed: ErrorResponse = serde_json::from_value(json!({
            "type": "VALIDATION_ERROR",
            "message": "m",
            "details": [{ "field": "description", "message": "too long" }]
        }))
        .unwrap();
        assert!(matches!(parsed.details, Some(ErrorDetails::Fields(ref v)) if v.len() == 1));
    }
}
