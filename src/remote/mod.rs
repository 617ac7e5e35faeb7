//! The hosted backend as seen by the client core.
//!
//! `RemoteService` is the only seam between TaskFlow and the backend: tables,
//! auth, and auth-state notifications. `RestClient` talks to a Supabase-style
//! deployment over HTTP; `InMemoryRemote` keeps everything in process for tests
//! and local experiments.

pub mod admin;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use taskflow_common::{
    AuthEvent, AuthUser, Comment, NewComment, NewProject, NewProjectMember, NewTask, Profile,
    Project, TaskPatch, TaskRow,
};

use crate::errors::RemoteError;

pub use memory::InMemoryRemote;
pub use rest::RestClient;

/// Outcome of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is active and a session was issued.
    SignedIn(AuthUser),
    /// The account exists but must be confirmed by email before signing in.
    ConfirmationRequired,
}

/// Abstraction over the hosted backend for testability.
/// Real implementation: `RestClient`. Test double: `InMemoryRemote`.
#[async_trait]
pub trait RemoteService: Send + Sync {
    // ── Auth ──────────────────────────────────────────────────────────

    /// Look up an existing session, if any.
    async fn current_session(&self) -> Result<Option<AuthUser>, RemoteError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Subscribe to auth-state-change notifications.
    fn auth_events(&self) -> broadcast::Receiver<AuthEvent>;

    // ── Projects ──────────────────────────────────────────────────────

    /// Projects visible to the caller, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError>;

    async fn fetch_project(&self, id: Uuid) -> Result<Option<Project>, RemoteError>;

    async fn insert_project(&self, project: &NewProject) -> Result<Project, RemoteError>;

    async fn insert_member(&self, member: &NewProjectMember) -> Result<(), RemoteError>;

    /// Profiles of a project's members. Members without a visible profile are omitted.
    async fn list_member_profiles(&self, project_id: Uuid) -> Result<Vec<Profile>, RemoteError>;

    // ── Tasks ─────────────────────────────────────────────────────────

    /// Tasks of one project with assignee display info, ascending `position`.
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskRow>, RemoteError>;

    async fn insert_task(&self, task: &NewTask) -> Result<(), RemoteError>;

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<(), RemoteError>;

    async fn delete_task(&self, id: Uuid) -> Result<(), RemoteError>;

    // ── Comments ──────────────────────────────────────────────────────

    /// Comments of one task with author display info, ascending `created_at`.
    async fn list_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, RemoteError>;

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError>;
}
