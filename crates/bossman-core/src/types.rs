//! Task data model shared by the store and all three front-ends.

use serde::{Deserialize, Serialize};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

/// A tracked task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub description: String,
    pub context: String,
    /// 1 is highest, 5 is lowest
    pub priority: i64,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub updated_at: String,
}

/// Input for creating a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub description: String,
    pub parent_id: Option<String>,
    pub priority: Option<i64>,
    pub context: Option<String>,
}

/// Filters for listing tasks
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    pub status: Option<TaskStatus>,
    pub parent_id: Option<String>,
    /// No limit when zero or negative
    pub limit: i64,
}

/// Partial update for a task; only the provided fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateOpts {
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub status: Option<TaskStatus>,
    pub context: Option<String>,
    pub result: Option<String>,
}
