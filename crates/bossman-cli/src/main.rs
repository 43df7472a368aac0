//! bossman - one-shot command-line interface to the task store.
//!
//! Every subcommand opens the store, runs a single operation, prints
//! the affected records as JSON, and exits.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use bossman_core::{config, ListOpts, NewTask, TaskStatus, TaskStore, UpdateOpts};

#[derive(Parser, Debug)]
#[command(name = "bossman")]
#[command(about = "Task tracking from the command line")]
#[command(version)]
struct Cli {
    /// Path to the task database (defaults to $BOSSMAN_DB, then ~/.bossman/bossman.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task
    Create {
        description: String,
        /// Parent task ID for subtasks
        #[arg(long)]
        parent_id: Option<String>,
        /// Priority 1-5 (1 is highest, default 3)
        #[arg(long)]
        priority: Option<i64>,
        /// Additional context or notes
        #[arg(long)]
        context: Option<String>,
    },
    /// List tasks, most urgent first
    List {
        /// Filter by status (pending, in_progress, completed, failed)
        #[arg(long)]
        status: Option<String>,
        /// Filter by parent task ID
        #[arg(long)]
        parent_id: Option<String>,
        /// Maximum number of tasks to return (0 = no limit)
        #[arg(long, default_value_t = 0)]
        limit: i64,
    },
    /// Show a single task
    Get { id: String },
    /// Update fields on a task
    Update {
        id: String,
        #[arg(long)]
        description: Option<String>,
        /// Priority 1-5 (1 is highest)
        #[arg(long)]
        priority: Option<i64>,
        /// New status (pending, in_progress, completed, failed)
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        context: Option<String>,
        /// Task result or outcome
        #[arg(long)]
        result: Option<String>,
    },
    /// Delete a task (dependency edges cascade)
    Delete { id: String },
    /// Mark a task as blocked by another
    Block {
        task_id: String,
        blocked_by_id: String,
    },
    /// Remove a dependency edge
    Unblock {
        task_id: String,
        blocked_by_id: String,
    },
    /// List the tasks blocking a task
    Blockers { task_id: String },
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    match TaskStatus::from_str(s) {
        Some(status) => Ok(status),
        None => bail!("invalid status: {}", s),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => config::prepare_db_path().context("prepare data directory")?,
    };
    let store = TaskStore::open(&db_path)
        .with_context(|| format!("open task store at {}", db_path.display()))?;

    match cli.command {
        Command::Create {
            description,
            parent_id,
            priority,
            context,
        } => {
            let task = store
                .create_task(NewTask {
                    description,
                    parent_id,
                    priority,
                    context,
                })
                .context("create task")?;
            print_json(&task)
        }
        Command::List {
            status,
            parent_id,
            limit,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let tasks = store
                .query_tasks(&ListOpts {
                    status,
                    parent_id,
                    limit,
                })
                .context("list tasks")?;
            print_json(&tasks)
        }
        Command::Get { id } => match store.get_task(&id).context("get task")? {
            Some(task) => print_json(&task),
            None => bail!("task not found: {}", id),
        },
        Command::Update {
            id,
            description,
            priority,
            status,
            context,
            result,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let updated = store
                .update_task(
                    &id,
                    &UpdateOpts {
                        description,
                        priority,
                        status,
                        context,
                        result,
                    },
                )
                .context("update task")?;
            if !updated {
                bail!("task not found: {}", id);
            }
            match store.get_task(&id).context("get updated task")? {
                Some(task) => print_json(&task),
                None => bail!("task not found: {}", id),
            }
        }
        Command::Delete { id } => {
            if !store.delete_task(&id).context("delete task")? {
                bail!("task not found: {}", id);
            }
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Block {
            task_id,
            blocked_by_id,
        } => {
            store
                .add_blocker(&task_id, &blocked_by_id)
                .context("add blocker")?;
            print_json(&serde_json::json!({
                "task_id": task_id,
                "blocked_by_id": blocked_by_id,
                "status": "added"
            }))
        }
        Command::Unblock {
            task_id,
            blocked_by_id,
        } => {
            if !store
                .remove_blocker(&task_id, &blocked_by_id)
                .context("remove blocker")?
            {
                bail!("blocker not found: {} -> {}", task_id, blocked_by_id);
            }
            print_json(&serde_json::json!({
                "task_id": task_id,
                "blocked_by_id": blocked_by_id,
                "status": "removed"
            }))
        }
        Command::Blockers { task_id } => {
            let tasks = store.get_blockers(&task_id).context("get blockers")?;
            print_json(&tasks)
        }
    }
}
