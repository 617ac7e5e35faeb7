//! Discussion thread attached to a single task.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use taskflow_common::{AuthUser, Comment, NewComment};

use crate::errors::{Result, TaskflowError};
use crate::remote::RemoteService;

/// The discussion attached to one task. Comments are append-only.
pub struct CommentThread {
    remote: Arc<dyn RemoteService>,
    task_id: Uuid,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(remote: Arc<dyn RemoteService>, task_id: Uuid) -> Self {
        Self {
            remote,
            task_id,
            comments: Vec::new(),
        }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Comments oldest first, as of the last successful load.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Reload the thread. On failure the previous comments are kept.
    pub async fn load(&mut self) -> Result<&[Comment]> {
        match self.remote.list_comments(self.task_id).await {
            Ok(comments) => {
                self.comments = comments;
                Ok(&self.comments)
            }
            Err(e) => {
                error!(task_id = %self.task_id, error = %e, "Failed to load comments");
                Err(e.into())
            }
        }
    }

    /// Post `content` as `user`, then reload. Blank content never reaches the remote.
    pub async fn add(&mut self, user: &AuthUser, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TaskflowError::Validation(
                "comment cannot be empty".to_string(),
            ));
        }

        let comment = NewComment {
            task_id: self.task_id,
            user_id: user.id,
            content: content.to_string(),
        };
        if let Err(e) = self.remote.insert_comment(&comment).await {
            error!(task_id = %self.task_id, error = %e, "Failed to add comment");
            return Err(e.into());
        }
        info!(task_id = %self.task_id, "Comment added");
        self.load().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryRemote;

    async fn signed_in() -> (Arc<InMemoryRemote>, AuthUser) {
        let remote = Arc::new(InMemoryRemote::new());
        remote.register("ada@example.com", "pw", Some("Ada Lovelace"));
        let user = remote.sign_in("ada@example.com", "pw").await.unwrap();
        (remote, user)
    }

    #[tokio::test]
    async fn test_whitespace_comment_rejected_without_remote_call() {
        let (remote, user) = signed_in().await;
        let mut thread = CommentThread::new(remote.clone(), Uuid::new_v4());

        for content in ["", "   ", "\n\t "] {
            let err = thread.add(&user, content).await.unwrap_err();
            assert!(matches!(err, TaskflowError::Validation(_)));
        }
        assert_eq!(remote.call_count("insert_comment"), 0);
        assert_eq!(remote.call_count("list_comments"), 0);
    }

    #[tokio::test]
    async fn test_add_trims_and_reloads_with_author() {
        let (remote, user) = signed_in().await;
        let mut thread = CommentThread::new(remote.clone(), Uuid::new_v4());

        thread.add(&user, "  first  ").await.unwrap();
        thread.add(&user, "second").await.unwrap();

        let contents: Vec<_> = thread.comments().iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(thread.comments()[0].author_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_comments() {
        let (remote, user) = signed_in().await;
        let mut thread = CommentThread::new(remote.clone(), Uuid::new_v4());
        thread.add(&user, "kept").await.unwrap();

        remote.fail("list_comments");
        assert!(thread.load().await.is_err());
        assert_eq!(thread.comments().len(), 1);
    }
}
