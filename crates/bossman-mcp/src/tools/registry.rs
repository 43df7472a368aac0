//! Name-keyed tool registry; the reference [`ToolHandler`].

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use bossman_core::TaskStore;

use super::{blockers, tasks};
use crate::protocol::{ToolDefinition, ToolResult};
use crate::server::ToolHandler;

/// One registered tool: its wire descriptor plus the implementation
/// invoked on tools/call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, scope: CancellationToken, arguments: Value) -> Result<ToolResult>;
}

/// Registry of the task tools, built once at startup. Implements the
/// dispatcher's [`ToolHandler`] boundary.
pub struct Registry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Registry {
    pub fn new(store: Arc<TaskStore>) -> Self {
        let mut registry = Registry {
            tools: BTreeMap::new(),
        };
        for tool in tasks::tools(&store) {
            registry.register(tool);
        }
        for tool in blockers::tools(&store) {
            registry.register(tool);
        }
        registry
    }

    fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }
}

#[async_trait]
impl ToolHandler for Registry {
    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    async fn call_tool(
        &self,
        scope: CancellationToken,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult> {
        let Some(tool) = self.tools.get(name) else {
            bail!("unknown tool: {}", name);
        };
        tool.invoke(scope, arguments).await
    }
}
