//! Task commands: `taskflow task create|show|update|delete`.

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use uuid::Uuid;

use taskflow::board::BoardEntry;
use taskflow::ui::{self, render};
use taskflow_common::{AuthUser, TaskDraft, TaskPatch};

use super::super::TaskCommands;
use super::App;

/// Resolve `--assignee` against the project's members: "me", an email, or an id.
async fn resolve_assignee(
    app: &App,
    project_id: Uuid,
    user: &AuthUser,
    reference: &str,
) -> Result<Uuid> {
    let reference = reference.trim();
    if reference.eq_ignore_ascii_case("me") {
        return Ok(user.id);
    }
    let members = app.projects().members(project_id).await?;
    members
        .iter()
        .find(|p| p.email.eq_ignore_ascii_case(reference) || p.id.to_string() == reference)
        .map(|p| p.id)
        .with_context(|| format!("'{}' is not a member of this project", reference))
}

pub async fn cmd_task(app: &App, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Create {
            project,
            title,
            description,
            status,
            priority,
            task_type,
            assignee,
        } => {
            let (user, board) = app.open_board(&project).await?;
            let assignee_id = match assignee {
                Some(reference) => {
                    Some(resolve_assignee(app, board.project_id(), &user, &reference).await?)
                }
                None => None,
            };
            let draft = TaskDraft {
                title,
                description,
                priority,
                task_type,
                assignee_id,
                ..TaskDraft::for_status(status)
            };
            board.create_task(&user, draft).await?;
            let view = board.view()?;
            ui::success(&format!(
                "Task added to {} ({} total)",
                status.label(),
                view.column(status).count()
            ));
        }
        TaskCommands::Show { project, task } => {
            let (_user, board) = app.open_board(&project).await?;
            match board.find(&task)? {
                BoardEntry::Task(task) => print!("{}", render::task_detail(&task)),
                BoardEntry::Rejected(invalid) => print!("{}", render::rejected_detail(&invalid)),
            }
        }
        TaskCommands::Update {
            project,
            task,
            title,
            description,
            clear_description,
            status,
            priority,
            task_type,
            assignee,
            unassign,
        } => {
            let (user, board) = app.open_board(&project).await?;
            let id = board.find(&task)?.id();

            let assignee_id = match (assignee, unassign) {
                (_, true) => Some(None),
                (Some(reference), false) => Some(Some(
                    resolve_assignee(app, board.project_id(), &user, &reference).await?,
                )),
                (None, false) => None,
            };
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            let patch = TaskPatch {
                title,
                description,
                status,
                priority,
                task_type,
                assignee_id,
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one field flag.");
            }

            board.update_task(id, patch).await?;
            match board.task(id) {
                Some(updated) => {
                    ui::success("Task updated");
                    print!("{}", render::task_detail(&updated));
                }
                None => ui::warning("Task updated but is no longer visible on this board"),
            }
        }
        TaskCommands::Delete {
            project,
            task,
            force,
        } => {
            let (_user, board) = app.open_board(&project).await?;
            let entry = board.find(&task)?;

            if !force {
                let name = match &entry {
                    BoardEntry::Task(task) => format!("\"{}\"", task.title),
                    BoardEntry::Rejected(invalid) => {
                        format!("task {}", render::short_id(&invalid.task_id))
                    }
                };
                let confirm = Confirm::new()
                    .with_prompt(format!("Delete {} and its comments?", name))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirm {
                    println!("Delete cancelled");
                    return Ok(());
                }
            }

            board.delete_task(entry.id()).await?;
            match entry {
                BoardEntry::Task(task) => {
                    let column = board.view()?.column(task.status).clone();
                    ui::success(&format!(
                        "Task deleted. {} now has {} task(s)",
                        column.label(),
                        column.count()
                    ));
                }
                BoardEntry::Rejected(_) => ui::success("Task deleted"),
            }
        }
    }
    Ok(())
}
