//! In-process implementation of [`RemoteService`].
//!
//! Behaves like the hosted backend closely enough for the client core:
//! every table operation requires a signed-in user, ordering follows the
//! same columns the REST queries order by, and auth changes are broadcast.
//! Individual operations can be made to fail, and every call is counted, so
//! tests can assert both error paths and "no remote call was issued".

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use taskflow_common::{
    AuthEvent, AuthUser, Comment, NewComment, NewProject, NewProjectMember, NewTask, Profile,
    ProfileSummary, Project, ProjectMember, TaskPatch, TaskRow,
};

use super::{RemoteService, SignUpOutcome};
use crate::errors::RemoteError;

struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    session: Option<AuthUser>,
    profiles: HashMap<Uuid, Profile>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<TaskRow>,
    comments: Vec<Comment>,
    failing: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    clock: Option<DateTime<Utc>>,
}

impl Store {
    /// Strictly increasing timestamps so `created_at` ordering is deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let next = match self.clock {
            Some(prev) => prev + Duration::milliseconds(1),
            None => Utc::now(),
        };
        self.clock = Some(next);
        next
    }

    fn summary(&self, user_id: Option<Uuid>) -> Option<ProfileSummary> {
        let profile = self.profiles.get(&user_id?)?;
        Some(ProfileSummary {
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
        })
    }

    fn require_user(&self) -> Result<AuthUser, RemoteError> {
        self.session.clone().ok_or(RemoteError::Unauthenticated)
    }
}

pub struct InMemoryRemote {
    store: Mutex<Store>,
    auth_tx: broadcast::Sender<AuthEvent>,
    confirm_signups: bool,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        let (auth_tx, _) = broadcast::channel(64);
        Self {
            store: Mutex::new(Store::default()),
            auth_tx,
            confirm_signups: false,
        }
    }

    /// Require email confirmation on sign-up, like a production auth config.
    pub fn with_email_confirmation(mut self) -> Self {
        self.confirm_signups = true;
        self
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>, RemoteError> {
        self.store
            .lock()
            .map_err(|e| RemoteError::Unavailable(format!("store lock poisoned: {}", e)))
    }

    /// Count the call and fail it if `op` was marked failing.
    fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, Store>, RemoteError> {
        let mut store = self.store()?;
        *store.calls.entry(op).or_insert(0) += 1;
        if store.failing.contains(op) {
            return Err(RemoteError::Unavailable(format!("{} failed", op)));
        }
        Ok(store)
    }

    // ── Test controls ─────────────────────────────────────────────────

    /// Register an account and its profile row. Does not sign in.
    pub fn register(&self, email: &str, password: &str, full_name: Option<&str>) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        if let Ok(mut store) = self.store() {
            store.profiles.insert(
                user.id,
                Profile {
                    id: user.id,
                    email: email.to_string(),
                    full_name: full_name.map(str::to_string),
                    avatar_url: None,
                },
            );
            store.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                },
            );
        }
        user
    }

    /// Make every subsequent call to `op` fail until [`InMemoryRemote::recover`].
    pub fn fail(&self, op: &'static str) {
        if let Ok(mut store) = self.store() {
            store.failing.insert(op);
        }
    }

    pub fn recover(&self, op: &'static str) {
        if let Ok(mut store) = self.store() {
            store.failing.remove(op);
        }
    }

    /// Number of times `op` has been called (failed calls included).
    pub fn call_count(&self, op: &str) -> usize {
        self.store()
            .map(|s| s.calls.get(op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Insert a raw task row, bypassing payload typing. Lets tests plant
    /// rows carrying tags the client does not know.
    pub fn insert_raw_task(&self, row: TaskRow) {
        if let Ok(mut store) = self.store() {
            store.tasks.push(row);
        }
    }

    /// Revoke the current session server-side without notifying listeners.
    pub fn expire_session(&self) {
        if let Ok(mut store) = self.store() {
            store.session = None;
        }
    }

    pub fn members(&self, project_id: Uuid) -> Vec<ProjectMember> {
        self.store()
            .map(|s| {
                s.members
                    .iter()
                    .filter(|m| m.project_id == project_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteService for InMemoryRemote {
    async fn current_session(&self) -> Result<Option<AuthUser>, RemoteError> {
        let store = self.enter("current_session")?;
        Ok(store.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let user = {
            let mut store = self.enter("sign_in")?;
            let user = match store.accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => {
                    return Err(RemoteError::Status {
                        status: 400,
                        message: "Invalid login credentials".to_string(),
                    });
                }
            };
            store.session = Some(user.clone());
            user
        };
        let _ = self.auth_tx.send(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, RemoteError> {
        {
            let store = self.enter("sign_up")?;
            if store.accounts.contains_key(email) {
                return Err(RemoteError::Status {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
        }
        let user = self.register(email, password, full_name);
        if self.confirm_signups {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        self.store()?.session = Some(user.clone());
        let _ = self.auth_tx.send(AuthEvent::SignedIn(user.clone()));
        Ok(SignUpOutcome::SignedIn(user))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.enter("sign_out")?.session = None;
        let _ = self.auth_tx.send(AuthEvent::SignedOut);
        Ok(())
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        let store = self.enter("list_projects")?;
        store.require_user()?;
        let mut projects = store.projects.clone();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn fetch_project(&self, id: Uuid) -> Result<Option<Project>, RemoteError> {
        let store = self.enter("fetch_project")?;
        store.require_user()?;
        Ok(store.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, RemoteError> {
        let mut store = self.enter("insert_project")?;
        store.require_user()?;
        let now = store.tick();
        let row = Project {
            id: Uuid::new_v4(),
            name: project.name.clone(),
            key: project.key.clone(),
            description: project.description.clone(),
            icon: None,
            owner_id: project.owner_id,
            created_at: now,
            updated_at: now,
        };
        store.projects.push(row.clone());
        Ok(row)
    }

    async fn insert_member(&self, member: &NewProjectMember) -> Result<(), RemoteError> {
        let mut store = self.enter("insert_member")?;
        store.require_user()?;
        let now = store.tick();
        store.members.push(ProjectMember {
            id: Uuid::new_v4(),
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role,
            created_at: now,
        });
        Ok(())
    }

    async fn list_member_profiles(&self, project_id: Uuid) -> Result<Vec<Profile>, RemoteError> {
        let store = self.enter("list_member_profiles")?;
        store.require_user()?;
        Ok(store
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| store.profiles.get(&m.user_id).cloned())
            .collect())
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskRow>, RemoteError> {
        let store = self.enter("list_tasks")?;
        store.require_user()?;
        let mut rows: Vec<TaskRow> = store
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| {
                let mut row = t.clone();
                row.assignee = store.summary(t.assignee_id);
                row
            })
            .collect();
        // Same ordering as the REST query: position, then newest first.
        rows.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn insert_task(&self, task: &NewTask) -> Result<(), RemoteError> {
        let mut store = self.enter("insert_task")?;
        store.require_user()?;
        let now = store.tick();
        store.tasks.push(TaskRow {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            task_type: task.task_type.as_str().to_string(),
            assignee_id: task.assignee_id,
            reporter_id: task.reporter_id,
            sprint_id: None,
            estimate: None,
            position: task.position,
            created_at: now,
            updated_at: now,
            assignee: None,
        });
        Ok(())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<(), RemoteError> {
        let mut store = self.enter("update_task")?;
        store.require_user()?;
        let now = store.tick();
        if let Some(row) = store.tasks.iter_mut().find(|t| t.id == id) {
            patch.apply_to(row);
            row.updated_at = now;
        }
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), RemoteError> {
        let mut store = self.enter("delete_task")?;
        store.require_user()?;
        store.tasks.retain(|t| t.id != id);
        store.comments.retain(|c| c.task_id != id);
        Ok(())
    }

    async fn list_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, RemoteError> {
        let store = self.enter("list_comments")?;
        store.require_user()?;
        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .map(|c| {
                let mut comment = c.clone();
                comment.author = store.summary(Some(c.user_id));
                comment
            })
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError> {
        let mut store = self.enter("insert_comment")?;
        store.require_user()?;
        let now = store.tick();
        store.comments.push(Comment {
            id: Uuid::new_v4(),
            task_id: comment.task_id,
            user_id: comment.user_id,
            content: comment.content.clone(),
            created_at: now,
            author: None,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_common::{TaskDraft, TaskStatus};

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let remote = InMemoryRemote::new();
        remote.register("a@example.com", "secret", None);
        let err = remote.sign_in("a@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 400, .. }));
        assert!(remote.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_broadcasts_event() {
        let remote = InMemoryRemote::new();
        let user = remote.register("a@example.com", "secret", None);
        let mut events = remote.auth_events();
        remote.sign_in("a@example.com", "secret").await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn(user));
    }

    #[tokio::test]
    async fn test_table_access_requires_session() {
        let remote = InMemoryRemote::new();
        let err = remote.list_projects().await.unwrap_err();
        assert!(matches!(err, RemoteError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_tasks_ordered_by_position_with_assignee() {
        let remote = InMemoryRemote::new();
        let user = remote.register("a@example.com", "secret", Some("Ada"));
        remote.sign_in("a@example.com", "secret").await.unwrap();
        let project_id = Uuid::new_v4();

        let mut late = TaskDraft::for_status(TaskStatus::Todo);
        late.title = "second".into();
        late.assignee_id = Some(user.id);
        let mut late = late.into_new_task(project_id, user.id);
        late.position = 5;
        let mut early = TaskDraft::for_status(TaskStatus::Todo);
        early.title = "first".into();
        let early = early.into_new_task(project_id, user.id);

        remote.insert_task(&late).await.unwrap();
        remote.insert_task(&early).await.unwrap();

        let rows = remote.list_tasks(project_id).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(rows[1].assignee.as_ref().unwrap().display_name(), "Ada");
    }

    #[tokio::test]
    async fn test_equal_positions_list_newest_first() {
        let remote = InMemoryRemote::new();
        let user = remote.register("a@example.com", "secret", None);
        remote.sign_in("a@example.com", "secret").await.unwrap();
        let project_id = Uuid::new_v4();

        for title in ["older", "newer"] {
            let mut draft = TaskDraft::for_status(TaskStatus::Todo);
            draft.title = title.into();
            remote
                .insert_task(&draft.into_new_task(project_id, user.id))
                .await
                .unwrap();
        }

        let rows = remote.list_tasks(project_id).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_failure_injection_and_call_counts() {
        let remote = InMemoryRemote::new();
        remote.fail("current_session");
        assert!(remote.current_session().await.is_err());
        remote.recover("current_session");
        assert!(remote.current_session().await.is_ok());
        assert_eq!(remote.call_count("current_session"), 2);
        assert_eq!(remote.call_count("insert_comment"), 0);
    }
}
