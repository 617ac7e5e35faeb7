//! Shared domain types for TaskFlow.
//!
//! Rows mirror the hosted backend's tables (`profiles`, `projects`, `tasks`,
//! `comments`, `project_members`). Enumerated columns are Rust enums; task
//! rows keep their tags as strings until converted with `Task::try_from`.

pub mod enums;
pub mod models;

pub use enums::{MemberRole, Priority, TaskStatus, TaskType};
pub use models::*;
