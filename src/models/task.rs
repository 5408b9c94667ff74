//! Task model
//!
//! Tasks carry their own recurrence settings; the alarm that fires for a
//! task is owned by the reminder scheduler and only referenced here.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RecordId;
use super::{now_millis, Record};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

/// How often a recurring task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    Every,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Annual,
}

/// A to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: RecordId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub completed: bool,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub created_date: i64,

    #[serde(default)]
    pub updated_date: i64,

    /// Due time (epoch milliseconds), 0 when the task has no due date
    #[serde(default)]
    pub due_date: i64,

    #[serde(default)]
    pub recurring: bool,

    #[serde(default)]
    pub frequency: TaskFrequency,

    #[serde(default = "default_frequency_amount")]
    pub frequency_amount: u32,

    /// Reminder alarm attached to this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<i64>,
}

fn default_frequency_amount() -> u32 {
    1
}

impl Task {
    /// Create a new open task
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::generate(),
            title: title.into(),
            description: String::new(),
            completed: false,
            priority: Priority::default(),
            created_date: now,
            updated_date: now,
            due_date: 0,
            recurring: false,
            frequency: TaskFrequency::default(),
            frequency_amount: default_frequency_amount(),
            alarm_id: None,
        }
    }

    /// Whether a due date is set
    pub fn has_due_date(&self) -> bool {
        self.due_date != 0
    }
}

impl Record for Task {
    const KIND: &'static str = "Task";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{}] {}", mark, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_task() {
        let task = Task::new("Water plants");
        assert!(!task.completed);
        assert!(!task.has_due_date());
        assert_eq!(task.frequency_amount, 1);
        assert_eq!(task.to_string(), "[ ] Water plants");
    }

    #[test]
    fn test_optional_fields_default() {
        let task: Task =
            serde_json::from_value(json!({"id": "t1", "title": "Call mom", "completed": true}))
                .unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.frequency, TaskFrequency::Daily);
        assert_eq!(task.frequency_amount, 1);
        assert!(task.alarm_id.is_none());
    }

    #[test]
    fn test_completed_is_required() {
        let result = serde_json::from_value::<Task>(json!({"id": "t1", "title": "x"}));
        assert!(result.unwrap_err().to_string().contains("completed"));
    }
}
