//! Storage-side task record and its projection onto the wire shape.

use chrono::{DateTime, Utc};
use shared::Task;
use uuid::Uuid;

/// A task as persisted. Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskRecord {
    /// Fresh record with a server-assigned id, `completed == false` and
    /// `created_at == updated_at == now`.
    pub fn new(title: String, description: String, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the mutable fields. `updated_at` never falls behind `created_at`.
    pub fn apply_update(
        &mut self,
        title: String,
        description: String,
        completed: Option<bool>,
        now: i64,
    ) {
        self.title = title;
        self.description = description;
        if let Some(completed) = completed {
            self.completed = completed;
        }
        self.updated_at = now.max(self.created_at);
    }

    pub fn to_wire(&self) -> Task {
        Task {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            created_at: to_datetime(self.created_at),
            updated_at: to_datetime(self.updated_at),
        }
    }
}

pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

fn to_datetime(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TaskRecord {
        TaskRecord {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            title: "Test Task".into(),
            description: "Test Description".into(),
            completed: false,
            created_at: 1_234_567_890,
            updated_at: 1_234_567_890,
        }
    }

    #[test]
    fn new_record_has_matching_timestamps() {
        let record = TaskRecord::new("a".into(), String::new(), 42);
        assert!(!record.completed);
        assert_eq!(record.created_at, 42);
        assert_eq!(record.updated_at, 42);
        assert_ne!(record.id, TaskRecord::new("a".into(), String::new(), 42).id);
    }

    #[test]
    fn update_preserves_completed_when_absent() {
        let mut record = sample();
        record.completed = true;
        record.apply_update("t".into(), "d".into(), None, 1_234_567_900);
        assert!(record.completed);
        assert_eq!(record.title, "t");
        assert_eq!(record.updated_at, 1_234_567_900);
    }

    #[test]
    fn update_never_moves_before_creation() {
        let mut record = sample();
        record.apply_update("t".into(), String::new(), Some(true), 0);
        assert!(record.completed);
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn projection_keeps_every_field() {
        let wire = sample().to_wire();
        assert_eq!(wire.id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(wire.title, "Test Task");
        assert_eq!(wire.description, "Test Description");
        assert_eq!(wire.created_at.timestamp(), 1_234_567_890);
        assert_eq!(wire.updated_at.to_rfc3339(), "2009-02-13T23:31:30+00:00");
    }
}
