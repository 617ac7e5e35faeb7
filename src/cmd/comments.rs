//! Task discussion: `taskflow comments` and `taskflow comment`.

use anyhow::Result;

use taskflow::board::CommentThread;
use taskflow::ui::{self, render};

use super::{App, find_task};

pub async fn cmd_comments(app: &App, project: &str, task: &str) -> Result<()> {
    let (_user, board) = app.open_board(project).await?;
    let task = find_task(&board, task)?;

    let mut thread = CommentThread::new(app.remote.clone(), task.id);
    let comments = thread.load().await?;
    println!("{}", render::task_line(&task));
    print!("{}", render::comments(comments));
    Ok(())
}

pub async fn cmd_comment(app: &App, project: &str, task: &str, content: &str) -> Result<()> {
    let (user, board) = app.open_board(project).await?;
    let task = find_task(&board, task)?;

    let mut thread = CommentThread::new(app.remote.clone(), task.id);
    thread.add(&user, content).await?;
    ui::success(&format!(
        "Comment added ({} on this task)",
        thread.comments().len()
    ));
    Ok(())
}
