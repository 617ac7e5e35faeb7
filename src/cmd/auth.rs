//! Sign-in, sign-up, and session commands: `taskflow login|signup|logout|whoami`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};

use taskflow::Route;
use taskflow::remote::SignUpOutcome;
use taskflow::ui::{self, icons, render};

use super::App;

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email"),
    }
}

pub async fn cmd_login(app: &App, email: Option<String>, password: Option<String>) -> Result<()> {
    app.require_signed_out(Route::SignIn).await?;

    let email = prompt_email(email)?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let spinner = ui::spinner("Signing in...");
    let result = app.session.sign_in(&email, &password).await;
    spinner.finish_and_clear();
    let user = result?;

    ui::success(&format!("Signed in as {}", user.display_name()));
    Ok(())
}

pub async fn cmd_signup(
    app: &App,
    email: Option<String>,
    full_name: Option<String>,
    password: Option<String>,
) -> Result<()> {
    app.require_signed_out(Route::SignUp).await?;

    let email = prompt_email(email)?;
    let full_name = match full_name {
        Some(name) => name,
        None => Input::new()
            .with_prompt("Full name")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read full name")?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .context("Failed to read password")?,
    };

    let spinner = ui::spinner("Creating account...");
    let result = app
        .session
        .sign_up(&email, &password, Some(full_name.as_str()))
        .await;
    spinner.finish_and_clear();

    match result? {
        SignUpOutcome::SignedIn(user) => {
            ui::success(&format!("Account created, signed in as {}", user.display_name()));
        }
        SignUpOutcome::ConfirmationRequired => {
            println!(
                "{}Account created. Check {} for a confirmation link, then run {}",
                icons::SPARKLE,
                style(&email).bold(),
                style("taskflow login").cyan()
            );
        }
    }
    Ok(())
}

pub async fn cmd_logout(app: &App) -> Result<()> {
    app.require_user(Route::Projects).await?;
    app.session.sign_out().await?;
    ui::success("Signed out");
    // The guard now sends protected routes back to sign-in.
    if app.require_user(Route::Projects).await.is_ok() {
        ui::warning("Session is still active");
    }
    Ok(())
}

pub async fn cmd_whoami(app: &App) -> Result<()> {
    let user = app.require_user(Route::Projects).await?;
    let name = user.display_name().to_string();
    println!(
        "{}{} {}",
        icons::USER,
        style(format!("[{}]", render::initials(&name))).cyan(),
        style(&name).bold()
    );
    println!("  id:    {}", user.id);
    println!(
        "  state: {}",
        style(app.config.state_dir.display()).dim()
    );
    Ok(())
}
