//! Configuration view and validation commands: `taskflow config`.

use anyhow::{Result, bail};

use taskflow::config::{TaskflowConfig, TaskflowToml};
use taskflow::ui;

use super::super::ConfigCommands;

/// Show a secret only as its length.
fn redact(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<set, {} chars>", v.len()),
        None => "<unset>".to_string(),
    }
}

pub fn cmd_config(config: &TaskflowConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("TaskFlow Configuration");
            println!("======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No taskflow.toml found at {}", config_path.display());
            }
            println!();
            println!("Effective values (with env/CLI overrides):");

            let remote = &config.toml.remote;
            println!("[remote]");
            println!(
                "  url = \"{}\"",
                remote.url.as_deref().unwrap_or("<unset>")
            );
            println!("  anon_key = {}", redact(remote.anon_key.as_deref()));
            println!(
                "  service_role_key = {}",
                redact(remote.service_role_key.as_deref())
            );
            println!("  request_timeout_secs = {}", remote.request_timeout_secs);
            println!();

            let log = &config.toml.log;
            println!("[log]");
            println!("  level = \"{}\"", log.level);
            println!("  json = {}", log.json);
            if let Some(dir) = config.log_dir() {
                println!("  directory = \"{}\"", dir.display());
            }
            println!();
            println!("Session file: {}", config.session_file().display());
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            let mut problems = warnings.len();
            for warning in &warnings {
                ui::warning(warning);
            }
            if let Err(e) = config.base_url() {
                ui::failure(&e.to_string());
                problems += 1;
            }
            if let Err(e) = config.anon_key() {
                ui::failure(&e.to_string());
                problems += 1;
            }
            if problems > 0 {
                bail!("Configuration has {} problem(s)", problems);
            }
            ui::success("Configuration is valid");
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                bail!(
                    "Config file already exists at {}",
                    config_path.display()
                );
            }
            std::fs::create_dir_all(&config.state_dir)?;
            TaskflowToml::default().save(&config_path)?;
            ui::success(&format!("Created {}", config_path.display()));
        }
    }

    Ok(())
}
