//! Task data model: backend-owned tasks, creation and update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// A task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::deserialize_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Payload for `POST /api/{user}/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
}

impl NewTask {
    /// Create a payload with an empty description and medium priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::Medium,
        }
    }

    /// Builder: set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial update for `PUT /api/{user}/tasks/{task}`. Absent fields are left
/// untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

/// Status filter accepted by `GET /api/{user}/tasks?status=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskStatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for TaskStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown status filter '{other}'")),
        }
    }
}

/// Envelope returned by `GET /api/{user}/tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub status_filter: Option<String>,
}

/// Dashboard counts over a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.is_completed()).count();
        let pending = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count();
        Self {
            total: tasks.len(),
            pending,
            completed,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_task(id: &str, title: &str, status: TaskStatus) -> Task {
    let now = Utc::now();
    Task {
        task_id: id.to_string(),
        title: title.to_string(),
        description: None,
        status,
        priority: TaskPriority::Medium,
        created_at: now,
        updated_at: now,
        completed_at: (status == TaskStatus::Completed).then_some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_decodes_backend_shape() {
        let json = serde_json::json!({
            "task_id": "5f1c",
            "title": "Buy milk",
            "description": null,
            "status": "pending",
            "priority": "high",
            "created_at": "2025-01-10T09:00:00Z",
            "updated_at": "2025-01-10T09:00:00Z",
            "completed_at": null
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::High);
        assert!(task.description.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn task_list_decodes_naive_backend_timestamps() {
        let json = serde_json::json!({
            "tasks": [{
                "task_id": "t1",
                "title": "Buy milk",
                "description": "",
                "status": "completed",
                "priority": "medium",
                "created_at": "2025-01-10T09:00:00.123456",
                "updated_at": "2025-01-10 09:30:00",
                "completed_at": "2025-01-10T09:30:00"
            }],
            "total": 1,
            "status_filter": "all"
        });
        let list: TaskList = serde_json::from_value(json).unwrap();
        let task = &list.tasks[0];
        assert_eq!(task.created_at.to_rfc3339(), "2025-01-10T09:00:00.123456+00:00");
        assert_eq!(task.updated_at, task.completed_at.unwrap());
    }

    #[test]
    fn unknown_status_does_not_fail_decode() {
        let parsed: TaskStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(parsed, TaskStatus::Unknown);
    }

    #[test]
    fn status_serde_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn new_task_defaults() {
        let task = NewTask::new("Write report");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, TaskPriority::Medium);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Write report", "description": "", "priority": "medium"})
        );
    }

    #[test]
    fn task_update_omits_absent_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"status": "completed"}));
        assert!(!update.is_empty());
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn status_filter_parse() {
        assert_eq!("".parse::<TaskStatusFilter>().unwrap(), TaskStatusFilter::All);
        assert_eq!(
            "Pending".parse::<TaskStatusFilter>().unwrap(),
            TaskStatusFilter::Pending
        );
        assert!("someday".parse::<TaskStatusFilter>().is_err());
    }

    #[test]
    fn summary_counts_two_pending_one_completed() {
        let tasks = vec![
            sample_task("1", "a", TaskStatus::Pending),
            sample_task("2", "b", TaskStatus::Pending),
            sample_task("3", "c", TaskStatus::Completed),
        ];
        let summary = TaskSummary::from_tasks(&tasks);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.completed, 1);
    }
}
