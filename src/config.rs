//! Configuration for TaskFlow.
//!
//! Settings are read from `<state_dir>/taskflow.toml` and then overridden by
//! environment variables (a `.env` file in the working directory is loaded
//! first by the binary). The state directory defaults to `.taskflow` and can be
//! moved with `--state-dir` or `TASKFLOW_STATE_DIR`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [remote]
//! url = "https://abcd.supabase.co"
//! anon_key = "eyJhbGciOi..."
//! request_timeout_secs = 30
//!
//! [log]
//! level = "info"
//! json = false
//! directory = "~/.taskflow/logs"
//! ```
//!
//! Environment overrides: `SUPABASE_URL` (or `VITE_SUPABASE_URL`),
//! `SUPABASE_ANON_KEY` (or `VITE_SUPABASE_ANON_KEY`), `SUPABASE_SERVICE_ROLE_KEY`,
//! `TASKFLOW_REQUEST_TIMEOUT_SECS`.

use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "taskflow.toml";
pub const SESSION_FILE: &str = "session.json";
pub const DEFAULT_STATE_DIR: &str = ".taskflow";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    /// Project URL, e.g. `https://abcd.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Service-role key, only needed for `seed-user`
    #[serde(default)]
    pub service_role_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            service_role_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
    /// Also write a daily-rotated log file into this directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

/// Contents of `taskflow.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskflowToml {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub log: LogSection,
}

impl TaskflowToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskflow.toml")
    }

    /// Load `<state_dir>/taskflow.toml`, or defaults if it doesn't exist.
    pub fn load_or_default(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize taskflow.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        };

        if let Some(url) = first(&["SUPABASE_URL", "VITE_SUPABASE_URL"]) {
            self.remote.url = Some(url);
        }
        if let Some(key) = first(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]) {
            self.remote.anon_key = Some(key);
        }
        if let Some(key) = first(&["SUPABASE_SERVICE_ROLE_KEY"]) {
            self.remote.service_role_key = Some(key);
        }
        if let Some(secs) = first(&["TASKFLOW_REQUEST_TIMEOUT_SECS"])
            && let Ok(secs) = secs.trim().parse()
        {
            self.remote.request_timeout_secs = secs;
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(url) = &self.remote.url
            && let Err(e) = parse_base_url(url)
        {
            warnings.push(format!("Invalid remote url '{}': {}", url, e));
        }
        if self.remote.request_timeout_secs == 0 {
            warnings.push("request_timeout_secs is 0; requests will time out immediately".into());
        }
        if self.remote.service_role_key.is_some() && self.remote.anon_key.is_none() {
            warnings.push("service_role_key is set but anon_key is missing".into());
        }

        warnings
    }
}

/// Parse and normalize the project URL so relative endpoint joins work.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("not a URL: {}", raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("unsupported scheme '{}', expected http or https", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Resolved configuration: file, then environment, then CLI flags.
#[derive(Debug, Clone)]
pub struct TaskflowConfig {
    pub state_dir: PathBuf,
    pub toml: TaskflowToml,
    /// CLI override: debug-level logging
    pub verbose: bool,
}

impl TaskflowConfig {
    /// Load configuration from `state_dir`, applying process environment overrides.
    pub fn load(state_dir: Option<PathBuf>) -> Result<Self> {
        let state_dir = expand_home(&state_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)));
        let mut toml = TaskflowToml::load_or_default(&state_dir)?;
        toml.apply_env(|name| std::env::var(name).ok());
        Ok(Self {
            state_dir,
            toml,
            verbose: false,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE)
    }

    /// Where the signed-in session is persisted.
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.toml.log.directory.as_deref().map(expand_home)
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        let level = if self.verbose {
            "debug"
        } else {
            self.toml.log.level.as_str()
        };
        format!("taskflow={}", level)
    }

    pub fn base_url(&self) -> Result<Url> {
        let raw = self
            .toml
            .remote
            .url
            .as_deref()
            .context("Remote URL not configured (set SUPABASE_URL or [remote].url)")?;
        parse_base_url(raw)
    }

    pub fn anon_key(&self) -> Result<&str> {
        self.toml
            .remote
            .anon_key
            .as_deref()
            .context("Anon key not configured (set SUPABASE_ANON_KEY or [remote].anon_key)")
    }

    pub fn service_role_key(&self) -> Result<&str> {
        self.toml
            .remote
            .service_role_key
            .as_deref()
            .context("Service role key not configured (set SUPABASE_SERVICE_ROLE_KEY)")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.remote.request_timeout_secs)
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
