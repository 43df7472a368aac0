//! Task CRUD tools.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use bossman_core::{ListOpts, NewTask, TaskStatus, TaskStore, UpdateOpts};

use super::{check_cancelled, parse_args, result_json, Tool};
use crate::protocol::{ToolDefinition, ToolResult};

pub(super) fn tools(store: &Arc<TaskStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateTask {
            store: Arc::clone(store),
        }),
        Arc::new(ListTasks {
            store: Arc::clone(store),
        }),
        Arc::new(GetTask {
            store: Arc::clone(store),
        }),
        Arc::new(UpdateTask {
            store: Arc::clone(store),
        }),
        Arc::new(DeleteTask {
            store: Arc::clone(store),
        }),
    ]
}

struct CreateTask {
    store: Arc<TaskStore>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    description: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    context: Option<String>,
}

#[async_trait]
impl Tool for CreateTask {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_task".to_string(),
            description: "Create a new task".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "Task description"
                    },
                    "parent_id": {
                        "type": "string",
                        "description": "Parent task ID for subtasks"
                    },
                    "priority": {
                        "type": "integer",
                        "description": "Priority 1-5 (1 is highest)",
                        "minimum": 1,
                        "maximum": 5
                    },
                    "context": {
                        "type": "string",
                        "description": "Additional context or notes"
                    }
                },
                "required": ["description"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: CreateTaskParams = parse_args(arguments)?;
        let task = self
            .store
            .create_task(NewTask {
                description: params.description,
                parent_id: params.parent_id,
                priority: params.priority,
                context: params.context,
            })
            .context("insert task")?;
        result_json(&task)
    }
}

struct ListTasks {
    store: Arc<TaskStore>,
}

#[derive(Debug, Deserialize)]
struct ListTasksParams {
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

#[async_trait]
impl Tool for ListTasks {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_tasks".to_string(),
            description: "List tasks with optional filters".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "description": "Filter by status",
                        "enum": ["pending", "in_progress", "completed", "failed"]
                    },
                    "parent_id": {
                        "type": "string",
                        "description": "Filter by parent task ID"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of tasks to return"
                    }
                },
                "required": [],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: ListTasksParams = parse_args(arguments)?;
        let tasks = self
            .store
            .query_tasks(&ListOpts {
                status: params.status,
                parent_id: params.parent_id,
                limit: params.limit.unwrap_or(0),
            })
            .context("query tasks")?;
        result_json(&tasks)
    }
}

struct GetTask {
    store: Arc<TaskStore>,
}

#[derive(Debug, Deserialize)]
struct TaskIdParams {
    id: String,
}

#[async_trait]
impl Tool for GetTask {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_task".to_string(),
            description: "Get a task by ID".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Task ID"
                    }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: TaskIdParams = parse_args(arguments)?;
        let Some(task) = self.store.get_task(&params.id).context("get task")? else {
            bail!("task not found: {}", params.id);
        };
        result_json(&task)
    }
}

struct UpdateTask {
    store: Arc<TaskStore>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskParams {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

#[async_trait]
impl Tool for UpdateTask {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_task".to_string(),
            description: "Update fields on an existing task".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Task ID"
                    },
                    "description": {
                        "type": "string",
                        "description": "Updated task description"
                    },
                    "priority": {
                        "type": "integer",
                        "description": "Priority 1-5 (1 is highest)",
                        "minimum": 1,
                        "maximum": 5
                    },
                    "status": {
                        "type": "string",
                        "description": "Task status",
                        "enum": ["pending", "in_progress", "completed", "failed"]
                    },
                    "context": {
                        "type": "string",
                        "description": "Additional context or notes"
                    },
                    "result": {
                        "type": "string",
                        "description": "Task result or outcome"
                    }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: UpdateTaskParams = parse_args(arguments)?;

        let updated = self
            .store
            .update_task(
                &params.id,
                &UpdateOpts {
                    description: params.description,
                    priority: params.priority,
                    status: params.status,
                    context: params.context,
                    result: params.result,
                },
            )
            .context("update task")?;
        if !updated {
            bail!("task not found: {}", params.id);
        }

        // Return the updated task so the client sees the current state
        let Some(task) = self.store.get_task(&params.id).context("get updated task")? else {
            bail!("task not found: {}", params.id);
        };
        result_json(&task)
    }
}

struct DeleteTask {
    store: Arc<TaskStore>,
}

#[async_trait]
impl Tool for DeleteTask {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "delete_task".to_string(),
            description: "Delete a task by ID".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Task ID"
                    }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: TaskIdParams = parse_args(arguments)?;
        if !self.store.delete_task(&params.id).context("delete task")? {
            bail!("task not found: {}", params.id);
        }
        result_json(&json!({ "deleted": params.id }))
    }
}
