//! Project listing and creation.
//!
//! Creating a project also adds the creator as its admin member.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use taskflow_common::{AuthUser, MemberRole, NewProject, NewProjectMember, Profile, Project};

use crate::errors::{Result, TaskflowError};
use crate::remote::RemoteService;

/// Longest accepted project key.
pub const MAX_KEY_LEN: usize = 10;

/// Fields collected by the "new project" form.
#[derive(Debug, Clone, Default)]
pub struct NewProjectInput {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
}

impl NewProjectInput {
    fn validate(self, owner_id: Uuid) -> Result<NewProject> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TaskflowError::Validation(
                "project name is required".to_string(),
            ));
        }
        let key = self.key.trim().to_uppercase();
        if key.is_empty() || key.chars().count() > MAX_KEY_LEN {
            return Err(TaskflowError::Validation(format!(
                "project key must be 1-{} characters, got '{}'",
                MAX_KEY_LEN, key
            )));
        }
        Ok(NewProject {
            name: name.to_string(),
            key,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            owner_id,
        })
    }
}

pub struct ProjectDirectory {
    remote: Arc<dyn RemoteService>,
}

impl ProjectDirectory {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }

    /// All projects the caller can see, newest first.
    pub async fn list(&self) -> Result<Vec<Project>> {
        self.remote.list_projects().await.map_err(|e| {
            error!(error = %e, "Failed to load projects");
            e.into()
        })
    }

    /// Create a project owned by `user` and add them as its admin.
    ///
    /// The membership insert is best-effort: the project exists either way.
    pub async fn create(&self, user: &AuthUser, input: NewProjectInput) -> Result<Project> {
        let new_project = input.validate(user.id)?;
        let project = self.remote.insert_project(&new_project).await.map_err(|e| {
            error!(key = %new_project.key, error = %e, "Failed to create project");
            TaskflowError::from(e)
        })?;
        info!(id = %project.id, key = %project.key, "Project created");

        let owner = NewProjectMember {
            project_id: project.id,
            user_id: user.id,
            role: MemberRole::Admin,
        };
        if let Err(e) = self.remote.insert_member(&owner).await {
            warn!(project_id = %project.id, error = %e, "Failed to add owner as project member");
        }
        Ok(project)
    }

    /// Profiles of a project's members, i.e. the possible assignees.
    pub async fn members(&self, project_id: Uuid) -> Result<Vec<Profile>> {
        self.remote
            .list_member_profiles(project_id)
            .await
            .map_err(|e| {
                error!(project_id = %project_id, error = %e, "Failed to load project members");
                e.into()
            })
    }

    /// Find a project by id or (case-insensitive) key.
    pub async fn resolve(&self, reference: &str) -> Result<Project> {
        let reference = reference.trim();
        if let Ok(id) = Uuid::parse_str(reference) {
            return self
                .remote
                .fetch_project(id)
                .await?
                .ok_or(TaskflowError::ProjectNotFound { id });
        }
        self.list()
            .await?
            .into_iter()
            .find(|p| p.key.eq_ignore_ascii_case(reference))
            .ok_or_else(|| {
                TaskflowError::Validation(format!("no project with key '{}'", reference))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryRemote;

    async fn signed_in() -> (Arc<InMemoryRemote>, AuthUser, ProjectDirectory) {
        let remote = Arc::new(InMemoryRemote::new());
        remote.register("owner@example.com", "pw", Some("Owner"));
        let user = remote.sign_in("owner@example.com", "pw").await.unwrap();
        let directory = ProjectDirectory::new(remote.clone());
        (remote, user, directory)
    }

    fn input(name: &str, key: &str) -> NewProjectInput {
        NewProjectInput {
            name: name.to_string(),
            key: key.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_uppercases_key_and_adds_admin_member() {
        let (remote, user, directory) = signed_in().await;
        let project = directory.create(&user, input("Web App", "web")).await.unwrap();

        assert_eq!(project.key, "WEB");
        assert_eq!(project.owner_id, user.id);
        let members = remote.members(project.id);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, user.id);
        assert_eq!(members[0].role, MemberRole::Admin);
    }

    #[tokio::test]
    async fn test_member_insert_failure_is_not_fatal() {
        let (remote, user, directory) = signed_in().await;
        remote.fail("insert_member");
        let project = directory.create(&user, input("Api", "API")).await.unwrap();
        assert!(remote.members(project.id).is_empty());
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_remote_call() {
        let (remote, user, directory) = signed_in().await;
        for bad in [input("  ", "OK"), input("Name", ""), input("Name", "ELEVENCHARS")] {
            let err = directory.create(&user, bad).await.unwrap_err();
            assert!(matches!(err, TaskflowError::Validation(_)));
        }
        assert_eq!(remote.call_count("insert_project"), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (_remote, user, directory) = signed_in().await;
        directory.create(&user, input("Old", "OLD")).await.unwrap();
        directory.create(&user, input("New", "NEW")).await.unwrap();
        let keys: Vec<_> = directory
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["NEW", "OLD"]);
    }

    #[tokio::test]
    async fn test_resolve_by_key_or_id() {
        let (_remote, user, directory) = signed_in().await;
        let project = directory.create(&user, input("Core", "CORE")).await.unwrap();

        assert_eq!(directory.resolve("core").await.unwrap().id, project.id);
        assert_eq!(
            directory.resolve(&project.id.to_string()).await.unwrap().key,
            "CORE"
        );
        assert!(directory.resolve("NOPE").await.is_err());
    }

    #[tokio::test]
    async fn test_members_lists_profiles() {
        let (_remote, user, directory) = signed_in().await;
        let project = directory.create(&user, input("Core", "CORE")).await.unwrap();
        let members = directory.members(project.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].display_name(), "Owner");
    }
}
