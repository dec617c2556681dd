mod file_config;

pub use file_config::{ClassifierConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that take part in config resolution. Mirrors the subset of
/// the CLI that a TOML file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub classifier_enabled: bool,
    pub classifier_url: String,
    pub classifier_timeout_sec: u64,
}

/// Fully resolved configuration, built once at startup and passed into
/// components at construction. No ambient state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub enabled: bool,
    pub url: String,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and an optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified as an argument or in the config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("media"));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or(cli.logging_level);

        let classifier_file = file.classifier.unwrap_or_default();
        let classifier = ClassifierSettings {
            enabled: classifier_file.enabled.unwrap_or(cli.classifier_enabled),
            url: classifier_file
                .url
                .unwrap_or_else(|| cli.classifier_url.clone()),
            timeout_sec: classifier_file
                .timeout_sec
                .unwrap_or(cli.classifier_timeout_sec),
        };

        Ok(Self {
            db_dir,
            media_path,
            port,
            logging_level,
            classifier,
        })
    }

    pub fn library_db_path(&self) -> PathBuf {
        self.db_dir.join("library.db")
    }

    pub fn emotions_db_path(&self) -> PathBuf {
        self.db_dir.join("emotions.db")
    }

    pub fn users_db_path(&self) -> PathBuf {
        self.db_dir.join("users.db")
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
