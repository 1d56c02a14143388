//! Field constraints for incoming task requests.
//!
//! Lengths are counted in Unicode scalar values, so a title of 100 emoji is
//! as valid as a title of 100 ASCII letters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CreateTaskRequest, UpdateTaskRequest};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-empty, ordered list of field violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed on {} field(s)", .0.len())]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.0
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Collector::default()
            .title(&self.title)
            .description(&self.description)
            .finish()
    }
}

impl Validate for UpdateTaskRequest {
    // `completed` has no constraint beyond being a boolean, which decoding already checks.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Collector::default()
            .title(&self.title)
            .description(&self.description)
            .finish()
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<FieldViolation>,
}

impl Collector {
    fn title(mut self, title: &str) -> Self {
        let len = title.chars().count();
        if len == 0 {
            self.violations
                .push(FieldViolation::new("title", "must not be empty"));
        } else if len > TITLE_MAX_CHARS {
            self.violations.push(FieldViolation::new(
                "title",
                format!("must be at most {TITLE_MAX_CHARS} characters (got {len})"),
            ));
        }
        self
    }

    fn description(mut self, description: &str) -> Self {
        let len = description.chars().count();
        if len > DESCRIPTION_MAX_CHARS {
            self.violations.push(FieldViolation::new(
                "description",
                format!("must be at most {DESCRIPTION_MAX_CHARS} characters (got {len})"),
            ));
        }
        self
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.violations))
        }
    }
}
