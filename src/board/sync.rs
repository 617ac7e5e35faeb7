//! Keeps one project's board in step with the remote tables.
//!
//! The synchronizer never merges mutations locally: each create, update, or
//! delete is one remote call followed by a full reload. Mutation sequences are
//! serialized by `mutations`, and every reload is stamped with a generation so
//! a slow, earlier reload can never overwrite the result of a later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use taskflow_common::{AuthUser, InvalidTaskRow, Project, Task, TaskDraft, TaskPatch, TaskRow};

use super::partition::{BoardView, partition_by_status};
use crate::errors::{Result, TaskflowError};
use crate::remote::RemoteService;

#[derive(Debug, Default)]
struct BoardState {
    project: Option<Project>,
    tasks: Vec<Task>,
    rejected: Vec<InvalidTaskRow>,
    /// Generation of the reload that produced this state (0 = never loaded).
    generation: u64,
}

/// Convert fetched rows, setting aside (and logging) rows with unknown tags.
fn convert_rows(rows: Vec<TaskRow>) -> (Vec<Task>, Vec<InvalidTaskRow>) {
    let mut tasks = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        match Task::try_from(row) {
            Ok(task) => tasks.push(task),
            Err(invalid) => {
                warn!(
                    task_id = %invalid.task_id,
                    field = invalid.field,
                    value = %invalid.value,
                    "Rejected task row with unknown tag"
                );
                rejected.push(invalid);
            }
        }
    }
    (tasks, rejected)
}

fn normalize_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskflowError::Validation("task title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Empty descriptions are stored as null.
fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

/// Shortest id prefix accepted by [`BoardSynchronizer::find`].
pub const MIN_REFERENCE_LEN: usize = 4;

/// A loaded row: either a task placed in a column or one set aside because of
/// an unknown tag.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEntry {
    Task(Task),
    Rejected(InvalidTaskRow),
}

impl BoardEntry {
    pub fn id(&self) -> Uuid {
        match self {
            BoardEntry::Task(task) => task.id,
            BoardEntry::Rejected(invalid) => invalid.task_id,
        }
    }
}

pub struct BoardSynchronizer {
    remote: Arc<dyn RemoteService>,
    project_id: Uuid,
    state: Mutex<BoardState>,
    next_generation: AtomicU64,
    mutations: tokio::sync::Mutex<()>,
}

impl BoardSynchronizer {
    pub fn new(remote: Arc<dyn RemoteService>, project_id: Uuid) -> Self {
        Self {
            remote,
            project_id,
            state: Mutex::new(BoardState::default()),
            next_generation: AtomicU64::new(1),
            mutations: tokio::sync::Mutex::new(()),
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    fn state(&self) -> Result<MutexGuard<'_, BoardState>> {
        self.state
            .lock()
            .map_err(|e| TaskflowError::Other(anyhow::anyhow!("board state poisoned: {}", e)))
    }

    /// Fetch project metadata and tasks in parallel and install them.
    ///
    /// If either fetch fails the previous state is kept and the error returned.
    pub async fn load(&self) -> Result<()> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        debug!(project_id = %self.project_id, generation, "Loading board");

        let fetched = tokio::try_join!(
            self.remote.fetch_project(self.project_id),
            self.remote.list_tasks(self.project_id),
        );
        let (project, rows) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(project_id = %self.project_id, error = %e, "Failed to load board");
                return Err(e.into());
            }
        };
        let Some(project) = project else {
            error!(project_id = %self.project_id, "Project not found");
            return Err(TaskflowError::ProjectNotFound {
                id: self.project_id,
            });
        };

        let (tasks, rejected) = convert_rows(rows);
        let mut state = self.state()?;
        if generation < state.generation {
            debug!(
                generation,
                installed = state.generation,
                "Discarding stale board reload"
            );
            return Ok(());
        }
        state.project = Some(project);
        state.tasks = tasks;
        state.rejected = rejected;
        state.generation = generation;
        Ok(())
    }

    /// Current board, partitioned into columns.
    pub fn view(&self) -> Result<BoardView> {
        let state = self.state()?;
        Ok(BoardView {
            project: state.project.clone(),
            columns: partition_by_status(&state.tasks),
            rejected: state.rejected.clone(),
        })
    }

    pub fn project(&self) -> Option<Project> {
        self.state().ok().and_then(|s| s.project.clone())
    }

    /// Loaded tasks in ascending position order.
    pub fn tasks(&self) -> Vec<Task> {
        self.state().map(|s| s.tasks.clone()).unwrap_or_default()
    }

    pub fn rejected(&self) -> Vec<InvalidTaskRow> {
        self.state().map(|s| s.rejected.clone()).unwrap_or_default()
    }

    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.state()
            .ok()
            .and_then(|s| s.tasks.iter().find(|t| t.id == id).cloned())
    }

    /// Find a loaded row by full id or unique id prefix. Rejected rows match
    /// too, so they can be inspected, fixed, or removed.
    pub fn find(&self, reference: &str) -> Result<BoardEntry> {
        let reference = reference.trim();
        let needle = reference.to_lowercase().replace('-', "");
        if needle.len() < MIN_REFERENCE_LEN {
            return Err(TaskflowError::Validation(format!(
                "task reference '{}' is too short (use at least {} characters)",
                reference, MIN_REFERENCE_LEN
            )));
        }

        let state = self.state()?;
        let matches = |id: &Uuid| id.simple().to_string().starts_with(&needle);
        let mut found: Vec<BoardEntry> = state
            .tasks
            .iter()
            .filter(|t| matches(&t.id))
            .cloned()
            .map(BoardEntry::Task)
            .chain(
                state
                    .rejected
                    .iter()
                    .filter(|r| matches(&r.task_id))
                    .cloned()
                    .map(BoardEntry::Rejected),
            )
            .collect();

        match found.len() {
            0 => Err(TaskflowError::NoTaskMatch {
                reference: reference.to_string(),
            }),
            1 => Ok(found.remove(0)),
            n => Err(TaskflowError::Validation(format!(
                "'{}' matches {} tasks; use more characters",
                reference, n
            ))),
        }
    }

    /// Known ids include rejected rows, so they can still be fixed or removed.
    fn ensure_known(&self, id: Uuid) -> Result<()> {
        let state = self.state()?;
        let known = state.tasks.iter().any(|t| t.id == id)
            || state.rejected.iter().any(|r| r.task_id == id);
        if known {
            Ok(())
        } else {
            Err(TaskflowError::TaskNotFound { id })
        }
    }

    /// Insert a task at position 0 reported by `user`, then reload.
    pub async fn create_task(&self, user: &AuthUser, draft: TaskDraft) -> Result<()> {
        let draft = TaskDraft {
            title: normalize_title(&draft.title)?,
            description: normalize_description(draft.description),
            ..draft
        };
        let new_task = draft.into_new_task(self.project_id, user.id);

        let _sequence = self.mutations.lock().await;
        if let Err(e) = self.remote.insert_task(&new_task).await {
            error!(project_id = %self.project_id, error = %e, "Failed to create task");
            return Err(e.into());
        }
        info!(title = %new_task.title, status = %new_task.status, "Task created");
        self.load().await
    }

    pub async fn update_task(&self, id: Uuid, mut patch: TaskPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            patch.title = Some(normalize_title(title)?);
        }
        if let Some(description) = patch.description.take() {
            patch.description = Some(normalize_description(description));
        }
        if patch.is_empty() {
            return Err(TaskflowError::Validation("nothing to update".to_string()));
        }
        self.ensure_known(id)?;

        let _sequence = self.mutations.lock().await;
        if let Err(e) = self.remote.update_task(id, &patch).await {
            error!(task_id = %id, error = %e, "Failed to update task");
            return Err(e.into());
        }
        info!(task_id = %id, "Task updated");
        self.load().await
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        self.ensure_known(id)?;

        let _sequence = self.mutations.lock().await;
        if let Err(e) = self.remote.delete_task(id).await {
            error!(task_id = %id, error = %e, "Failed to delete task");
            return Err(e.into());
        }
        info!(task_id = %id, "Task deleted");
        self.load().await
    }
}
