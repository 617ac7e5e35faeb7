use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::enums::{MemberRole, Priority, TaskStatus, TaskType};

// ── Auth ──────────────────────────────────────────────────────────────

/// Identity of the signed-in user as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("(no email)")
    }
}

/// Auth-state-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
    TokenRefreshed(AuthUser),
}

// ── Profiles ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        display_name(self.full_name.as_deref(), &self.email)
    }
}

/// Profile columns embedded into task and comment rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub full_name: Option<String>,
    pub email: String,
}

impl ProfileSummary {
    pub fn display_name(&self) -> &str {
        display_name(self.full_name.as_deref(), &self.email)
    }
}

fn display_name<'a>(full_name: Option<&'a str>, email: &'a str) -> &'a str {
    match full_name {
        Some(name) if !name.is_empty() => name,
        _ => email,
    }
}

// ── Projects ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
}

// ── Tasks ─────────────────────────────────────────────────────────────

/// A task exactly as the `tasks` table returns it.
///
/// Enumerated columns stay as raw strings here; [`Task::try_from`] is the
/// single place where they are checked against the known tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Uuid,
    #[serde(default)]
    pub sprint_id: Option<Uuid>,
    #[serde(default)]
    pub estimate: Option<f64>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub task_type: TaskType,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Uuid,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub assignee: Option<ProfileSummary>,
}

/// A task row whose enumerated columns hold an unknown tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Task {task_id} has invalid {field} '{value}'")]
pub struct InvalidTaskRow {
    pub task_id: Uuid,
    pub field: &'static str,
    pub value: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = InvalidTaskRow;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let invalid = |field: &'static str, value: &str| InvalidTaskRow {
            task_id: row.id,
            field,
            value: value.to_string(),
        };
        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|_| invalid("status", &row.status))?;
        let priority = row
            .priority
            .parse::<Priority>()
            .map_err(|_| invalid("priority", &row.priority))?;
        let task_type = row
            .task_type
            .parse::<TaskType>()
            .map_err(|_| invalid("type", &row.task_type))?;

        Ok(Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status,
            priority,
            task_type,
            assignee_id: row.assignee_id,
            reporter_id: row.reporter_id,
            position: row.position,
            created_at: row.created_at,
            assignee: row.assignee,
        })
    }
}

/// Insert payload for the `tasks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Uuid,
    pub position: i32,
}

/// A task that has no identity yet. Only used to pre-fill a creation form.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub task_type: TaskType,
    pub assignee_id: Option<Uuid>,
}

impl TaskDraft {
    /// Empty draft for the "add task" button of one column.
    pub fn for_status(status: TaskStatus) -> Self {
        Self {
            title: String::new(),
            description: None,
            status,
            priority: Priority::default(),
            task_type: TaskType::default(),
            assignee_id: None,
        }
    }

    pub fn into_new_task(self, project_id: Uuid, reporter_id: Uuid) -> NewTask {
        NewTask {
            project_id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            task_type: self.task_type,
            assignee_id: self.assignee_id,
            reporter_id,
            position: 0,
        }
    }
}

/// Partial update for an existing task. `None` leaves a column untouched;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<Uuid>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.task_type.is_none()
            && self.assignee_id.is_none()
    }

    /// Apply this patch to a stored row.
    pub fn apply_to(&self, row: &mut TaskRow) {
        if let Some(title) = &self.title {
            row.title = title.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(status) = self.status {
            row.status = status.as_str().to_string();
        }
        if let Some(priority) = self.priority {
            row.priority = priority.as_str().to_string();
        }
        if let Some(task_type) = self.task_type {
            row.task_type = task_type.as_str().to_string();
        }
        if let Some(assignee_id) = self.assignee_id {
            row.assignee_id = assignee_id;
        }
    }
}

// ── Comments ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub author: Option<ProfileSummary>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.display_name())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Fix login".to_string(),
            description: None,
            status: status.to_string(),
            priority: "high".to_string(),
            task_type: "bug".to_string(),
            assignee_id: None,
            reporter_id: Uuid::new_v4(),
            sprint_id: None,
            estimate: None,
            position: 3,
            created_at: now,
            updated_at: now,
            assignee: None,
        }
    }

    #[test]
    fn test_task_row_converts_known_tags() {
        let task = Task::try_from(row("blocked")).unwrap();
        assert_eq!(task.status, TaskStatus::Blocked);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.task_type, TaskType::Bug);
        assert_eq!(task.position, 3);
    }

    #[test]
    fn test_task_row_rejects_unknown_status() {
        let bad = row("archived");
        let id = bad.id;
        let err = Task::try_from(bad).unwrap_err();
        assert_eq!(err.task_id, id);
        assert_eq!(err.field, "status");
        assert_eq!(err.value, "archived");
        assert!(err.to_string().contains("archived"));
    }

    #[test]
    fn test_task_row_deserializes_embedded_assignee() {
        let json = r#"{
            "id": "6a1f7a7e-9c55-4b65-8a4e-2f1f3f0c9a11",
            "project_id": "0b0c6a55-1f7d-4d3b-9f7a-7f8b1c2d3e4f",
            "title": "Write docs",
            "description": null,
            "status": "todo",
            "priority": "low",
            "type": "story",
            "assignee_id": "8d2c1e0f-3a4b-4c5d-8e6f-7a8b9c0d1e2f",
            "reporter_id": "8d2c1e0f-3a4b-4c5d-8e6f-7a8b9c0d1e2f",
            "sprint_id": null,
            "estimate": null,
            "position": 0,
            "created_at": "2025-01-02T03:04:05.123456+00:00",
            "updated_at": "2025-01-02T03:04:05.123456+00:00",
            "profiles": {"full_name": null, "email": "dev@example.com"}
        }"#;
        let row: TaskRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.task_type, "story");
        let assignee = row.assignee.as_ref().unwrap();
        assert_eq!(assignee.display_name(), "dev@example.com");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            assignee_id: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({"status": "done", "assignee_id": null}));
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_patch_apply_to_row() {
        let mut r = row("todo");
        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            status: Some(TaskStatus::InProgress),
            description: Some(Some("details".to_string())),
            ..Default::default()
        };
        patch.apply_to(&mut r);
        assert_eq!(r.title, "Renamed");
        assert_eq!(r.status, "in_progress");
        assert_eq!(r.description.as_deref(), Some("details"));
        assert_eq!(r.priority, "high");
    }

    #[test]
    fn test_draft_defaults() {
        let draft = TaskDraft::for_status(TaskStatus::Blocked);
        assert_eq!(draft.status, TaskStatus::Blocked);
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.task_type, TaskType::Task);
        let new_task = draft.into_new_task(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(new_task.position, 0);
        let value = serde_json::to_value(&new_task).unwrap();
        assert_eq!(value["type"], "task");
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let with_name = ProfileSummary {
            full_name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
        };
        let empty_name = ProfileSummary {
            full_name: Some(String::new()),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(with_name.display_name(), "Ada");
        assert_eq!(empty_name.display_name(), "ada@example.com");
    }
}
