//! Project listing and creation: `taskflow projects` and `taskflow project`.

use anyhow::Result;

use taskflow::Route;
use taskflow::board::NewProjectInput;
use taskflow::ui::{self, render};

use super::super::ProjectCommands;
use super::App;

pub async fn cmd_projects(app: &App) -> Result<()> {
    app.require_user(Route::Projects).await?;
    let spinner = ui::spinner("Loading projects...");
    let projects = app.projects().list().await;
    spinner.finish_and_clear();
    print!("{}", render::projects(&projects?));
    Ok(())
}

pub async fn cmd_project(app: &App, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::Create {
            name,
            key,
            description,
        } => {
            let user = app.require_user(Route::Projects).await?;
            let project = app
                .projects()
                .create(
                    &user,
                    NewProjectInput {
                        name,
                        key,
                        description,
                    },
                )
                .await?;
            ui::success(&format!("Created project {} [{}]", project.name, project.key));
            println!("  {}", Route::ProjectBoard(project.id));
        }
        ProjectCommands::Members { project } => {
            let (_user, board) = app.open_board(&project).await?;
            let members = app.projects().members(board.project_id()).await?;
            if members.is_empty() {
                println!("No members");
            } else {
                print!("{}", render::members(&members));
            }
        }
    }
    Ok(())
}
