//! Shared types for the action engine and the todo engine.
//!
//! These types define stable contracts between the parser, the executors and
//! the persisted store. Their serialized forms are part of the on-disk format
//! under `.neuralcode/` and must stay backwards compatible.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed intent extracted from a model reply.
///
/// The parser only constructs actions whose required fields are non-empty.
/// Actions built by other means (e.g. deserialized) are re-validated by the
/// action executor before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    CreateFile {
        path: String,
        content: String,
    },
    EditFile {
        path: String,
        old_string: String,
        new_string: String,
    },
    RunCommand {
        command: String,
    },
    ReadFile {
        path: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateFile { .. } => ActionKind::CreateFile,
            Action::EditFile { .. } => ActionKind::EditFile,
            Action::RunCommand { .. } => ActionKind::RunCommand,
            Action::ReadFile { .. } => ActionKind::ReadFile,
        }
    }
}

/// Discriminant of [`Action`], used in result lines and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateFile,
    EditFile,
    RunCommand,
    ReadFile,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::CreateFile => "create_file",
            ActionKind::EditFile => "edit_file",
            ActionKind::RunCommand => "run_command",
            ActionKind::ReadFile => "read_file",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured outcome of a shell command.
///
/// Always fully populated: a command that exits non-zero still yields a
/// result with whatever output it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Lifecycle state of a todo item.
///
/// `pending -> in_progress -> completed`, with cancellation allowed from
/// either open state. `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    /// True for `pending` and `in_progress`.
    pub fn is_open(self) -> bool {
        matches!(self, TodoStatus::Pending | TodoStatus::InProgress)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
            TodoStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    /// Stamped once, on the first transition into `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<TodoItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_item_id: Option<String>,
}

/// Title and item lines recognized in a reply, before any list is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTodoList {
    pub title: String,
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_with_snake_case_tag_and_camel_case_fields() {
        let action = Action::EditFile {
            path: "src/lib.rs".to_string(),
            old_string: "a".to_string(),
            new_string: "b".to_string(),
        };
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json["type"], "edit_file");
        assert_eq!(json["oldString"], "a");
        assert_eq!(json["newString"], "b");
    }

    #[test]
    fn todo_status_uses_snake_case_on_disk() {
        let json = serde_json::to_string(&TodoStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        assert!(TodoStatus::Cancelled.is_terminal());
        assert!(TodoStatus::InProgress.is_open());
    }

    /// Lists written without optional fields load with defaults.
    #[test]
    fn todo_list_tolerates_missing_optional_fields() {
        let raw = r#"{
            "id": "l1",
            "title": "Ship it",
            "createdAt": "2025-01-01T00:00:00Z",
            "items": [
                {"id": "i1", "content": "write code", "status": "pending", "createdAt": "2025-01-01T00:00:00Z"}
            ]
        }"#;
        let list: TodoList = serde_json::from_str(raw).expect("parse");
        assert_eq!(list.description, None);
        assert_eq!(list.current_item_id, None);
        assert_eq!(list.items[0].priority, Priority::Medium);
        assert_eq!(list.items[0].completed_at, None);
    }
}
