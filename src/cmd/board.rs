//! Board view: `taskflow board`.

use anyhow::{Context, Result};

use taskflow::ui::{self, render};

use super::App;

pub async fn cmd_board(app: &App, project: &str, json: bool) -> Result<()> {
    let (_user, board) = app.open_board(project).await?;
    let view = board.view()?;

    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize board")?;
        println!("{}", out);
        return Ok(());
    }

    print!("{}", render::board(&view));
    if !view.rejected.is_empty() {
        ui::warning(&format!(
            "{} task(s) could not be shown because of unknown values",
            view.rejected.len()
        ));
    }
    Ok(())
}
