//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                              |
//! |-------------|-----------------------------------------------|
//! | `auth`      | `Login`, `Signup`, `Logout`, `Whoami`         |
//! | `projects`  | `Projects`, `Project`                         |
//! | `board`     | `Board`                                       |
//! | `tasks`     | `Task`                                        |
//! | `comments`  | `Comments`, `Comment`                         |
//! | `seed`      | `SeedUser`                                    |
//! | `config`    | `Config`                                      |
//!
//! Every screen-like command first resolves its [`Route`] through the route
//! guard; `seed-user` and `config` are maintenance commands outside the route
//! table.

pub mod auth;
pub mod board;
pub mod comments;
pub mod config;
pub mod projects;
pub mod seed;
pub mod tasks;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;
use uuid::Uuid;

use taskflow::board::{BoardEntry, BoardSynchronizer, ProjectDirectory};
use taskflow::config::TaskflowConfig;
use taskflow::remote::{RemoteService, RestClient};
use taskflow::ui;
use taskflow::{GuardedRoute, Navigation, Route, SessionStore};
use taskflow_common::{AuthUser, Task};

use super::{Cli, Commands};

pub async fn dispatch(cli: &Cli, config: TaskflowConfig) -> Result<()> {
    match &cli.command {
        Commands::Config { command } => config::cmd_config(&config, command.clone()),
        Commands::SeedUser {
            email,
            password,
            full_name,
        } => seed::cmd_seed_user(&config, email, password, full_name).await,
        command => {
            let app = App::connect(config).await?;
            let result = run_routed(&app, command).await;
            app.session.shutdown();
            result
        }
    }
}

async fn run_routed(app: &App, command: &Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            auth::cmd_login(app, email.clone(), password.clone()).await
        }
        Commands::Signup {
            email,
            full_name,
            password,
        } => auth::cmd_signup(app, email.clone(), full_name.clone(), password.clone()).await,
        Commands::Logout => auth::cmd_logout(app).await,
        Commands::Whoami => auth::cmd_whoami(app).await,
        Commands::Projects => projects::cmd_projects(app).await,
        Commands::Project { command } => projects::cmd_project(app, command.clone()).await,
        Commands::Board { project, json } => board::cmd_board(app, project, *json).await,
        Commands::Task { command } => tasks::cmd_task(app, command.clone()).await,
        Commands::Comments { project, task } => comments::cmd_comments(app, project, task).await,
        Commands::Comment {
            project,
            task,
            content,
        } => comments::cmd_comment(app, project, task, content).await,
        Commands::SeedUser { .. } | Commands::Config { .. } => {
            bail!("maintenance commands do not use a session")
        }
    }
}

/// A connected client: configuration, backend, and resolved session.
pub struct App {
    pub config: TaskflowConfig,
    pub remote: Arc<dyn RemoteService>,
    pub session: SessionStore,
}

impl App {
    pub async fn connect(config: TaskflowConfig) -> Result<Self> {
        for warning in config.validate() {
            ui::warning(&warning);
        }
        let client = RestClient::new(
            config.base_url()?,
            config.anon_key()?,
            config.request_timeout(),
        )
        .context("Failed to build HTTP client")?
        .with_session_file(config.session_file());
        let remote: Arc<dyn RemoteService> = Arc::new(client);

        let session = SessionStore::new(Arc::clone(&remote));
        let spinner = ui::spinner("Checking session...");
        session.initialize().await;
        spinner.finish_and_clear();

        Ok(Self {
            config,
            remote,
            session,
        })
    }

    /// Run the route guard for `route` and wait for a settled decision.
    async fn navigate(&self, route: &Route) -> Navigation {
        let mut guarded = GuardedRoute::new(route.clone(), self.session.subscribe());
        let navigation = guarded.settle().await;
        debug!(route = %route, ?navigation, "Route evaluated");
        navigation
    }

    /// Enter a protected route, returning the signed-in user.
    pub async fn require_user(&self, route: Route) -> Result<AuthUser> {
        match self.navigate(&route).await {
            Navigation::Render(rendered) if rendered == route => self
                .session
                .user()
                .context("Session changed while entering route"),
            Navigation::Render(Route::SignIn) => {
                bail!("Not signed in. Run `taskflow login` first.")
            }
            other => bail!("Cannot open {}: {:?}", route, other),
        }
    }

    /// Enter a public-only route (sign-in, sign-up).
    pub async fn require_signed_out(&self, route: Route) -> Result<()> {
        match self.navigate(&route).await {
            Navigation::Render(rendered) if rendered == route => Ok(()),
            Navigation::Render(Route::Projects) => {
                let who = self
                    .session
                    .user()
                    .map(|u| u.display_name().to_string())
                    .unwrap_or_default();
                bail!(
                    "Already signed in as {}. Run `taskflow logout` first.",
                    who
                )
            }
            other => bail!("Cannot open {}: {:?}", route, other),
        }
    }

    pub fn projects(&self) -> ProjectDirectory {
        ProjectDirectory::new(Arc::clone(&self.remote))
    }

    /// Enter the board route of `reference` (key or id) and load it.
    pub async fn open_board(&self, reference: &str) -> Result<(AuthUser, BoardSynchronizer)> {
        let project_id = match Uuid::parse_str(reference.trim()) {
            Ok(id) => id,
            Err(_) => {
                self.require_user(Route::Projects).await?;
                self.projects().resolve(reference).await?.id
            }
        };
        let user = self.require_user(Route::ProjectBoard(project_id)).await?;

        let board = BoardSynchronizer::new(Arc::clone(&self.remote), project_id);
        let spinner = ui::spinner("Loading board...");
        let loaded = board.load().await;
        spinner.finish_and_clear();
        loaded?;
        Ok((user, board))
    }
}

/// Find a placeable task by full id or unique id prefix. Rows with unknown
/// tags are reported with a hint instead.
pub fn find_task(board: &BoardSynchronizer, reference: &str) -> Result<Task> {
    match board.find(reference)? {
        BoardEntry::Task(task) => Ok(task),
        BoardEntry::Rejected(invalid) => bail!(
            "{}. Fix it with `taskflow task update` or remove it with `taskflow task delete`",
            invalid
        ),
    }
}
