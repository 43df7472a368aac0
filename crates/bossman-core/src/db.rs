//! SQLite store for tasks and dependency edges.
//!
//! Single-connection store behind a mutex; every caller surface goes
//! through the same CRUD methods. Timestamps are ISO-8601 UTC strings
//! with millisecond precision.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, ToSql};
use uuid::Uuid;

use crate::types::{ListOpts, NewTask, Task, TaskStatus, UpdateOpts};

/// Error type surfaced by the store
pub type StoreError = rusqlite::Error;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY,
    parent_id   TEXT REFERENCES tasks(id),
    description TEXT NOT NULL,
    context     TEXT NOT NULL DEFAULT '',
    priority    INTEGER NOT NULL DEFAULT 3
        CHECK (priority BETWEEN 1 AND 5),
    status      TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'in_progress', 'completed', 'failed')),
    result      TEXT,
    created_at  TEXT NOT NULL,
    started_at  TEXT,
    completed_at TEXT,
    updated_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS task_blockers (
    task_id       TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    blocked_by_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, blocked_by_id),
    CHECK (task_id != blocked_by_id)
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
CREATE INDEX IF NOT EXISTS idx_task_blockers_task ON task_blockers(task_id);
CREATE INDEX IF NOT EXISTS idx_task_blockers_blocked_by ON task_blockers(blocked_by_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status_priority ON tasks(status, priority);
"#;

/// Generate a new task identifier
pub fn new_task_id() -> String {
    format!("task_{}", Uuid::new_v4().simple())
}

fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Task store over a single SQLite connection
pub struct TaskStore {
    conn: Mutex<Connection>,
}

impl TaskStore {
    /// Open (or create) the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> SqliteResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqliteResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ============ Tasks ============

    /// Persist a new task and return the stored record
    pub fn create_task(&self, input: NewTask) -> SqliteResult<Task> {
        let now = now_utc();
        let task = Task {
            id: new_task_id(),
            parent_id: input.parent_id,
            description: input.description,
            context: input.context.unwrap_or_default(),
            priority: input.priority.unwrap_or(3),
            status: TaskStatus::Pending,
            result: None,
            created_at: now.clone(),
            started_at: None,
            completed_at: None,
            updated_at: now,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tasks (id, parent_id, description, context, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id,
                task.parent_id,
                task.description,
                task.context,
                task.priority,
                task.status.as_str(),
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(task)
    }

    /// Get a task by ID
    pub fn get_task(&self, id: &str) -> SqliteResult<Option<Task>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM tasks WHERE id = ?", params![id], row_to_task)
            .optional()
    }

    /// List tasks, most urgent first, newest first within a priority
    pub fn query_tasks(&self, opts: &ListOpts) -> SqliteResult<Vec<Task>> {
        let mut sql = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = opts.status {
            sql.push_str(" AND status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(parent_id) = &opts.parent_id {
            sql.push_str(" AND parent_id = ?");
            values.push(Box::new(parent_id.clone()));
        }

        sql.push_str(" ORDER BY priority ASC, created_at DESC");

        if opts.limit > 0 {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(opts.limit));
        }

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let args: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(args.as_slice(), row_to_task)?;

        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    /// Apply the provided fields and bump updated_at.
    /// Returns false if no task with that ID exists.
    pub fn update_task(&self, id: &str, opts: &UpdateOpts) -> SqliteResult<bool> {
        let mut fields = vec!["updated_at = ?"];
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(now_utc())];

        if let Some(description) = &opts.description {
            fields.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(priority) = opts.priority {
            fields.push("priority = ?");
            values.push(Box::new(priority));
        }
        if let Some(status) = opts.status {
            fields.push("status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(context) = &opts.context {
            fields.push("context = ?");
            values.push(Box::new(context.clone()));
        }
        if let Some(result) = &opts.result {
            fields.push("result = ?");
            values.push(Box::new(result.clone()));
        }

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", fields.join(", "));
        values.push(Box::new(id.to_string()));

        let conn = self.conn.lock().unwrap();
        let args: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let changed = conn.execute(&sql, args.as_slice())?;
        Ok(changed > 0)
    }

    /// Delete a task. Dependency edges cascade.
    /// Returns false if no task with that ID exists.
    pub fn delete_task(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?", params![id])?;
        Ok(changed > 0)
    }

    pub fn task_exists(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?)",
            params![id],
            |row| row.get(0),
        )
    }

    // ============ Blockers ============

    /// Insert a dependency edge: task_id is blocked by blocked_by_id
    pub fn add_blocker(&self, task_id: &str, blocked_by_id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO task_blockers (task_id, blocked_by_id) VALUES (?1, ?2)",
            params![task_id, blocked_by_id],
        )?;
        Ok(())
    }

    /// Remove a dependency edge. Returns false if the edge did not exist.
    pub fn remove_blocker(&self, task_id: &str, blocked_by_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM task_blockers WHERE task_id = ? AND blocked_by_id = ?",
            params![task_id, blocked_by_id],
        )?;
        Ok(changed > 0)
    }

    /// Return the tasks blocking the given task
    pub fn get_blockers(&self, task_id: &str) -> SqliteResult<Vec<Task>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.* FROM tasks t
             INNER JOIN task_blockers tb ON t.id = tb.blocked_by_id
             WHERE tb.task_id = ?",
        )?;
        let rows = stmt.query_map(params![task_id], row_to_task)?;

        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }
}

fn row_to_task(row: &Row) -> SqliteResult<Task> {
    let status_str: String = row.get("status")?;
    let status = TaskStatus::from_str(&status_str).unwrap_or(TaskStatus::Pending);

    Ok(Task {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        description: row.get("description")?,
        context: row.get("context")?,
        priority: row.get("priority")?,
        status,
        result: row.get("result")?,
        created_at: row.get("created_at")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(store: &TaskStore, description: &str) -> Task {
        store
            .create_task(NewTask {
                description: description.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_create_and_get_task() {
        let store = TaskStore::in_memory().unwrap();
        let task = create(&store, "write the report");

        assert!(task.id.starts_with("task_"));
        assert_eq!(task.priority, 3);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.created_at.is_empty());

        let fetched = store.get_task(&task.id).unwrap().unwrap();
        assert_eq!(fetched.id, task.id);
        assert_eq!(fetched.description, "write the report");
        assert_eq!(fetched.created_at, task.created_at);
    }

    #[test]
    fn test_get_missing_task() {
        let store = TaskStore::in_memory().unwrap();
        assert!(store.get_task("task_nope").unwrap().is_none());
    }

    #[test]
    fn test_priority_range_enforced() {
        let store = TaskStore::in_memory().unwrap();
        let err = store.create_task(NewTask {
            description: "bad".to_string(),
            priority: Some(9),
            ..Default::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_update_task() {
        let store = TaskStore::in_memory().unwrap();
        let task = create(&store, "original");

        let changed = store
            .update_task(
                &task.id,
                &UpdateOpts {
                    description: Some("revised".to_string()),
                    status: Some(TaskStatus::InProgress),
                    priority: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);

        let fetched = store.get_task(&task.id).unwrap().unwrap();
        assert_eq!(fetched.description, "revised");
        assert_eq!(fetched.status, TaskStatus::InProgress);
        assert_eq!(fetched.priority, 1);
        // untouched fields survive
        assert_eq!(fetched.created_at, task.created_at);
        assert_eq!(fetched.context, "");
    }

    #[test]
    fn test_update_missing_task() {
        let store = TaskStore::in_memory().unwrap();
        let changed = store
            .update_task(
                "task_nope",
                &UpdateOpts {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_query_tasks_ordering_and_filters() {
        let store = TaskStore::in_memory().unwrap();

        let low = store
            .create_task(NewTask {
                description: "low".to_string(),
                priority: Some(5),
                ..Default::default()
            })
            .unwrap();
        let high = store
            .create_task(NewTask {
                description: "high".to_string(),
                priority: Some(1),
                ..Default::default()
            })
            .unwrap();
        let child = store
            .create_task(NewTask {
                description: "child".to_string(),
                parent_id: Some(high.id.clone()),
                ..Default::default()
            })
            .unwrap();

        let all = store.query_tasks(&ListOpts::default()).unwrap();
        assert_eq!(all.len(), 3);
        // priority ascending: high (1) first, low (5) last
        assert_eq!(all[0].id, high.id);
        assert_eq!(all[2].id, low.id);

        store
            .update_task(
                &child.id,
                &UpdateOpts {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        let completed = store
            .query_tasks(&ListOpts {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, child.id);

        let children = store
            .query_tasks(&ListOpts {
                parent_id: Some(high.id.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(children.len(), 1);

        let limited = store
            .query_tasks(&ListOpts {
                limit: 2,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_blockers() {
        let store = TaskStore::in_memory().unwrap();
        let a = create(&store, "blocked");
        let b = create(&store, "blocking");

        store.add_blocker(&a.id, &b.id).unwrap();

        let blockers = store.get_blockers(&a.id).unwrap();
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].id, b.id);

        // the reverse direction has no edge
        assert!(store.get_blockers(&b.id).unwrap().is_empty());

        assert!(store.remove_blocker(&a.id, &b.id).unwrap());
        assert!(!store.remove_blocker(&a.id, &b.id).unwrap());
    }

    #[test]
    fn test_self_blocker_rejected() {
        let store = TaskStore::in_memory().unwrap();
        let a = create(&store, "self");
        assert!(store.add_blocker(&a.id, &a.id).is_err());
    }

    #[test]
    fn test_blocker_requires_existing_tasks() {
        let store = TaskStore::in_memory().unwrap();
        let a = create(&store, "real");
        assert!(store.add_blocker(&a.id, "task_ghost").is_err());
    }

    #[test]
    fn test_delete_cascades_to_blockers() {
        let store = TaskStore::in_memory().unwrap();
        let a = create(&store, "blocked");
        let b = create(&store, "blocking");
        store.add_blocker(&a.id, &b.id).unwrap();

        assert!(store.delete_task(&b.id).unwrap());
        assert!(store.get_blockers(&a.id).unwrap().is_empty());
        assert!(!store.delete_task(&b.id).unwrap());
    }

    #[test]
    fn test_task_exists() {
        let store = TaskStore::in_memory().unwrap();
        let a = create(&store, "here");
        assert!(store.task_exists(&a.id).unwrap());
        assert!(!store.task_exists("task_ghost").unwrap());
    }
}
