//! Tracing subscriber setup for the `taskflow` binary.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::TaskflowConfig;

const LOG_FILE_PREFIX: &str = "taskflow.log";

/// `--verbose` wins over `RUST_LOG`, which wins over the configured level.
fn filter_directive(config: &TaskflowConfig, rust_log: Option<String>) -> String {
    if config.verbose {
        return config.log_filter();
    }
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config.log_filter())
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. Keep the returned guard alive until exit so the file
/// writer flushes.
pub fn init(config: &TaskflowConfig) -> Result<Option<WorkerGuard>> {
    let directive = filter_directive(config, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let stderr_layer = if config.toml.log.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed()
    };

    let (file_layer, guard) = match config.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskflowToml;
    use std::path::PathBuf;

    fn config(verbose: bool) -> TaskflowConfig {
        TaskflowConfig {
            state_dir: PathBuf::from(".taskflow"),
            toml: TaskflowToml::default(),
            verbose,
        }
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(filter_directive(&config(false), None), "taskflow=info");
    }

    #[test]
    fn test_rust_log_overrides_config() {
        assert_eq!(
            filter_directive(&config(false), Some("taskflow=trace".into())),
            "taskflow=trace"
        );
        assert_eq!(
            filter_directive(&config(false), Some("  ".into())),
            "taskflow=info"
        );
    }

    #[test]
    fn test_verbose_overrides_rust_log() {
        assert_eq!(
            filter_directive(&config(true), Some("warn".into())),
            "taskflow=debug"
        );
    }

    #[test]
    fn test_directives_parse() {
        assert!(EnvFilter::try_new(filter_directive(&config(false), None)).is_ok());
    }
}
