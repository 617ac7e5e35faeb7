//! Test-account provisioning: `taskflow seed-user`.

use anyhow::{Context, Result};
use console::style;

use taskflow::config::TaskflowConfig;
use taskflow::remote::admin::{AdminClient, SeedOutcome};
use taskflow::ui;

pub async fn cmd_seed_user(
    config: &TaskflowConfig,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<()> {
    let admin = AdminClient::new(
        config.base_url()?,
        config.service_role_key()?,
        config.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

    let spinner = ui::spinner("Creating test user...");
    let outcome = admin.seed_user(email, password, full_name).await;
    spinner.finish_and_clear();

    match outcome.context("Seed failed")? {
        SeedOutcome::Created(id) => {
            ui::success("Test user created");
            println!("  Email:    {}", style(email).bold());
            println!("  Password: {}", password);
            println!("  User ID:  {}", id);
        }
        SeedOutcome::AlreadyExists(id) => {
            println!("Test user already exists: {}", style(email).bold());
            println!("  User ID:  {}", id);
        }
    }
    Ok(())
}
