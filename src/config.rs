use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::Credential;

/// Self-hosted file sharing and shared clipboard.
#[derive(Parser, Debug, Clone)]
#[command(name = "clipshare", version, about)]
pub struct Cli {
    /// Path to the JSON file holding `passwordHash`.
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// SQLite database holding clipboard entries.
    #[arg(long, default_value = "clipboard.db")]
    pub database: PathBuf,

    /// Directory uploaded files are stored in.
    #[arg(long, default_value = "uploads")]
    pub uploads: PathBuf,

    /// Directory with `index.html` and the `static/` assets.
    #[arg(long, default_value = "web")]
    pub web: PathBuf,

    /// Largest accepted upload request, in MiB.
    #[arg(long, default_value_t = 1024)]
    pub max_upload_mb: usize,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the `passwordHash` value for a password read from stdin.
    HashPassword,
}

impl Cli {
    /// `host:port`, resolved when the listener binds.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("passwordHash must be a hex-encoded SHA-256 digest")]
    PasswordHash,
}

/// Contents of `config.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretConfig {
    pub password_hash: String,
}

impl SecretConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn credential(&self) -> Result<Credential, ConfigError> {
        Credential::from_hash(&self.password_hash).ok_or(ConfigError::PasswordHash)
    }
}
