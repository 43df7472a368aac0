//! Core library for bossman
//!
//! Owns the task data model and the SQLite store shared by every
//! surface (stdio MCP server, HTTP dashboard, CLI), plus the small
//! amount of process plumbing they have in common: data-directory
//! resolution and tracing setup.

pub mod config;
pub mod db;
pub mod types;

pub use db::TaskStore;
pub use types::{ListOpts, NewTask, Task, TaskStatus, UpdateOpts};
