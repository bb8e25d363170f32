//! Configuration management for the installer.

use crate::cli::Cli;
use crate::pipeline::Options;
use std::env;
use std::path::{Path, PathBuf};

/// Installer configuration resolved from the environment and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server mission directory receiving the merged files
    pub mission_path: PathBuf,
    /// Repository data folder holding fragments and `custom/`
    pub data_dir: PathBuf,
    /// Archive previous content before overwriting
    pub backup: bool,
    /// Merge and report without writing anything
    pub dry_run: bool,
}

impl Config {
    /// Load configuration, letting CLI flags override the environment.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mission_path = cli
            .mission_path
            .clone()
            .or_else(|| env::var("MODMERGE_MISSION_PATH").ok())
            .map(|raw| clean_path(&raw))
            .ok_or(ConfigError::MissingMissionPath)?;

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| env::var("MODMERGE_DATA_DIR").ok())
            .map(|raw| clean_path(&raw))
            .ok_or(ConfigError::MissingDataDir)?;

        let backup = !cli.no_backup && env_flag("MODMERGE_BACKUP", true)?;
        let dry_run = cli.dry_run || env_flag("MODMERGE_DRY_RUN", false)?;

        Ok(Self {
            mission_path,
            data_dir,
            backup,
            dry_run,
        })
    }

    /// Check the hard preconditions: both directories must exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_dir("mission path", &self.mission_path)?;
        require_dir("data folder", &self.data_dir)
    }

    pub fn options(&self) -> Options {
        Options {
            backup: self.backup,
            dry_run: self.dry_run,
        }
    }
}

/// Trim whitespace and one pair of surrounding double quotes, as pasted
/// Windows paths often carry them.
fn clean_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

fn env_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn require_dir(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::NotADirectory {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("mission path is required (--mission-path or MODMERGE_MISSION_PATH)")]
    MissingMissionPath,

    #[error("data folder is required (--data-dir or MODMERGE_DATA_DIR)")]
    MissingDataDir,

    #[error("invalid {name} value '{value}', expected true or false")]
    InvalidFlag { name: &'static str, value: String },

    #[error("the {what} '{}' does not exist or is not a directory", .path.display())]
    NotADirectory { what: &'static str, path: PathBuf },
}
