//! CLI argument definitions for the timelog action runner.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Timelog action: offer, render and commit time log edits over a JSON-lines
/// event stream.
#[derive(Parser, Debug)]
#[command(name = "timelog-action", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the JSON record store.
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TIMELOG_ACTION_CONFIG env var > ~/.timelog-action/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TIMELOG_ACTION_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the record store path.
    ///
    /// Priority: --store flag > config file value, with `~` expanded.
    pub fn resolve_store_path(&self, config_store: &str) -> PathBuf {
        match self.store {
            Some(ref p) => p.clone(),
            None => expand_home(config_store),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"));
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        (Some(rest), None) => PathBuf::from(".").join(rest),
        (None, _) => PathBuf::from(path),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".timelog-action").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
