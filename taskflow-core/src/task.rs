//! Task model shared by the store, the view pipeline and the AI adapter.
//!
//! The JSON shape (field names included) is the on-disk format, so renames here
//! are breaking changes for existing task files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Backlog,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Backlog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Backlog => "backlog",
        }
    }

    /// Human label used by the CLI.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Backlog => "Backlog",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!("unknown status '{s}' (expected todo, in-progress, done or backlog)")
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,

    /// Required for new tasks; older task files may lack it.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Ids of prerequisite tasks. Dangling ids are allowed.
    #[serde(default)]
    pub dependencies: Vec<String>,

    pub status: TaskStatus,

    /// Lower is more urgent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(
        rename = "aiReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_reason: Option<String>,

    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            deadline: None,
            dependencies: Vec::new(),
            status: TaskStatus::Todo,
            priority: None,
            ai_reason: None,
            created_at: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Status transition. Any status may follow any other.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.deadline.is_some_and(|d| d < now)
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }
}

/// Fresh id in the `task-<unix-millis>-<suffix>` form.
///
/// The millis segment doubles as a creation-order hint for tasks that predate
/// `createdAt`.
pub fn generate_task_id(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect();
    format!("task-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_round_trips_through_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("In-Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("started".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn optional_fields_are_omitted_and_renamed() {
        let t = Task::new("task-1", "write docs")
            .with_deadline(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let v = serde_json::to_value(&t).unwrap();
        assert!(v.get("priority").is_none());
        assert!(v.get("aiReason").is_none());
        assert!(v.get("createdAt").is_none());
        assert_eq!(v["status"], "todo");

        let mut t = t.with_priority(2);
        t.ai_reason = Some("soon".to_string());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["priority"], 2);
        assert_eq!(v["aiReason"], "soon");
    }

    #[test]
    fn parses_browser_iso_strings_and_missing_dependencies() {
        let raw = r#"{"id":"task-9","description":"x","deadline":"2024-05-01T10:00:00.000Z","status":"backlog"}"#;
        let t: Task = serde_json::from_str(raw).unwrap();
        assert!(t.dependencies.is_empty());
        assert_eq!(t.deadline, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn overdue_only_when_past_and_not_done() {
        let now = Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap();
        let past = Task::new("a", "late").with_deadline(now - chrono::Duration::hours(1));
        assert!(past.is_overdue(now));
        assert!(!past.clone().with_status(TaskStatus::Done).is_overdue(now));
        assert!(!Task::new("b", "no deadline").is_overdue(now));
    }

    #[test]
    fn generated_ids_embed_creation_millis() {
        let now = Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap();
        let id = generate_task_id(now);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts[0], "task");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 5);
    }
}
