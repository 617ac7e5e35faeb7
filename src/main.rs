use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskflow_common::{Priority, TaskStatus, TaskType};

mod cmd;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(version, about = "Project and task tracking board")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding taskflow.toml and the saved session
    #[arg(long, global = true, env = "TASKFLOW_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
        /// Read from a prompt when omitted
        #[arg(long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List projects, newest first
    Projects,
    /// Create projects or inspect their members
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Show a project's board
    Board {
        /// Project key or id
        project: String,
        /// Print the board as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create, show, update, or delete tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show the comments on a task
    Comments {
        /// Project key or id
        project: String,
        /// Task id or short id
        task: String,
    },
    /// Add a comment to a task
    Comment {
        /// Project key or id
        project: String,
        /// Task id or short id
        task: String,
        content: String,
    },
    /// Create a confirmed user with a profile (requires the service-role key)
    SeedUser {
        #[arg(short, long)]
        email: String,
        #[arg(long, default_value = "password123")]
        password: String,
        #[arg(long, default_value = "Test User")]
        full_name: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ProjectCommands {
    /// Create a project; you become its admin
    Create {
        #[arg(short, long)]
        name: String,
        /// Short key, 1-10 characters (stored upper-case)
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List the members of a project
    Members {
        /// Project key or id
        project: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Create a task at the top of a column
    Create {
        /// Project key or id
        project: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, default_value = "todo")]
        status: TaskStatus,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        #[arg(long = "type", default_value = "task")]
        task_type: TaskType,
        /// Member email or id, or "me"
        #[arg(short, long)]
        assignee: Option<String>,
    },
    /// Show one task
    Show {
        project: String,
        task: String,
    },
    /// Change fields of a task
    Update {
        project: String,
        task: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        /// Member email or id, or "me"
        #[arg(short, long, conflicts_with = "unassign")]
        assignee: Option<String>,
        #[arg(long)]
        unassign: bool,
    },
    /// Delete a task and its comments
    Delete {
        project: String,
        task: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default taskflow.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = taskflow::config::TaskflowConfig::load(cli.state_dir.clone())?
        .with_verbose(cli.verbose);
    let _log_guard = taskflow::logging::init(&config)?;

    cmd::dispatch(&cli, config).await
}
