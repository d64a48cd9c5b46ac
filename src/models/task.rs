use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 5;
pub const DEFAULT_PRIORITY: i64 = 3;

/// Represents the status of a task.
/// Stored as its snake_case name.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional free-text description.
    pub description: Option<String>,

    /// The current status of the task. Defaults to `todo`.
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority from 1 to 5 inclusive. Defaults to 3.
    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 5))]
    pub priority: i64,

    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,

    /// Optional assignee.
    pub assigned_to: Option<Uuid>,
}

/// Partial update of a task.
///
/// A field that is absent from the payload is left untouched. For the nullable columns the
/// outer `Option` records presence and the inner one the value, so an explicit `null` clears
/// the column while an absent key does not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    #[validate(range(min = 1, max = 5))]
    pub priority: Option<i64>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<Option<Uuid>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i64,
    pub due_date: Option<DateTime<Utc>>,
    /// Set once, server-side.
    pub created_at: DateTime<Utc>,
    /// Identifier of the user who created the task. Immutable.
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Filters applied when listing tasks. Present filters are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the creator's id, with a fresh UUID and
    /// the current time as `created_at`.
    pub fn new(input: TaskInput, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            created_at: Utc::now(),
            created_by,
            assigned_to: input.assigned_to,
        }
    }
}
