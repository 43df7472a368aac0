//! Dependency-edge tools.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use bossman_core::TaskStore;

use super::{check_cancelled, parse_args, result_json, Tool};
use crate::protocol::{ToolDefinition, ToolResult};

pub(super) fn tools(store: &Arc<TaskStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(AddBlocker {
            store: Arc::clone(store),
        }),
        Arc::new(RemoveBlocker {
            store: Arc::clone(store),
        }),
        Arc::new(GetBlockers {
            store: Arc::clone(store),
        }),
    ]
}

#[derive(Debug, Deserialize)]
struct EdgeParams {
    task_id: String,
    blocked_by_id: String,
}

struct AddBlocker {
    store: Arc<TaskStore>,
}

#[async_trait]
impl Tool for AddBlocker {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "add_blocker".to_string(),
            description: "Add a dependency between tasks".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "The task that is blocked"
                    },
                    "blocked_by_id": {
                        "type": "string",
                        "description": "The task that is blocking"
                    }
                },
                "required": ["task_id", "blocked_by_id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: EdgeParams = parse_args(arguments)?;
        self.store
            .add_blocker(&params.task_id, &params.blocked_by_id)
            .context("add blocker")?;
        result_json(&json!({
            "task_id": params.task_id,
            "blocked_by_id": params.blocked_by_id,
            "status": "added"
        }))
    }
}

struct RemoveBlocker {
    store: Arc<TaskStore>,
}

#[async_trait]
impl Tool for RemoveBlocker {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "remove_blocker".to_string(),
            description: "Remove a dependency between tasks".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "The task that is blocked"
                    },
                    "blocked_by_id": {
                        "type": "string",
                        "description": "The task that was blocking"
                    }
                },
                "required": ["task_id", "blocked_by_id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: EdgeParams = parse_args(arguments)?;
        let removed = self
            .store
            .remove_blocker(&params.task_id, &params.blocked_by_id)
            .context("remove blocker")?;
        if !removed {
            bail!(
                "blocker not found: {} -> {}",
                params.task_id,
                params.blocked_by_id
            );
        }
        result_json(&json!({
            "task_id": params.task_id,
            "blocked_by_id": params.blocked_by_id,
            "status": "removed"
        }))
    }
}

struct GetBlockers {
    store: Arc<TaskStore>,
}

#[derive(Debug, Deserialize)]
struct GetBlockersParams {
    task_id: String,
}

#[async_trait]
impl Tool for GetBlockers {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_blockers".to_string(),
            description: "List tasks blocking a given task".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "The task to get blockers for"
                    }
                },
                "required": ["task_id"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult> {
        check_cancelled(&scope)?;
        let params: GetBlockersParams = parse_args(arguments)?;
        let tasks = self
            .store
            .get_blockers(&params.task_id)
            .context("get blockers")?;
        result_json(&tasks)
    }
}
