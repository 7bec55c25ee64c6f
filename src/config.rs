//! Startup configuration for markshelf.
//!
//! Options come from the command line or the environment and are flattened
//! into [`FlatConfig`], which converts into the nested [`Config`].

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::types::errors::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_DB_FILE: &str = "markshelf.db";
pub const DATA_DIR_ENV: &str = "MARKSHELF_DATA_DIR";

/// Personal bookmark manager served over HTTP.
#[derive(Parser, Debug)]
#[command(name = "markshelf", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server.
    Run(FlatConfig),
}

#[derive(clap::Args, Debug, Clone)]
pub struct FlatConfig {
    #[arg(long, env = "MARKSHELF_DB", help = "SQLite database file")]
    pub db: Option<PathBuf>,
    #[arg(long, env = "MARKSHELF_HOST", default_value = DEFAULT_HOST, help = "Address to listen on")]
    pub host: String,
    #[arg(long, env = "MARKSHELF_PORT", default_value_t = DEFAULT_PORT, help = "Port to listen on")]
    pub port: u16,
    #[arg(
        long,
        env = "MARKSHELF_REFRESH_TIMEOUT",
        default_value_t = 10,
        help = "Seconds to wait for a page when refreshing a title"
    )]
    pub refresh_timeout: u64,
    #[arg(
        long,
        env = "MARKSHELF_REFRESH_CONCURRENCY",
        default_value_t = 4,
        help = "Pages fetched at once when refreshing every bookmark"
    )]
    pub refresh_concurrency: usize,
    #[arg(
        long,
        env = "MARKSHELF_USER_AGENT",
        default_value = concat!("markshelf/", env!("CARGO_PKG_VERSION")),
        help = "User-Agent sent when fetching pages"
    )]
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbConfiguration,
    pub http: HttpConfiguration,
    pub refresh: RefreshConfiguration,
}

#[derive(Debug, Clone)]
pub struct DbConfiguration {
    pub path: PathBuf, // MARKSHELF_DB
}

#[derive(Debug, Clone)]
pub struct HttpConfiguration {
    pub host: String, // MARKSHELF_HOST
    pub port: u16,    // MARKSHELF_PORT
}

#[derive(Debug, Clone)]
pub struct RefreshConfiguration {
    pub timeout: Duration,
    pub concurrency: usize,
    pub user_agent: String,
}

impl From<FlatConfig> for Config {
    fn from(value: FlatConfig) -> Self {
        Config {
            db: DbConfiguration {
                path: value.db.unwrap_or_else(default_db_path),
            },
            http: HttpConfiguration {
                host: value.host,
                port: value.port,
            },
            refresh: RefreshConfiguration {
                timeout: Duration::from_secs(value.refresh_timeout),
                concurrency: value.refresh_concurrency,
                user_agent: value.user_agent,
            },
        }
    }
}

impl Config {
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        if self.refresh.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "refresh-concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.refresh.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "refresh-timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }
        self.socket_addr().map(|_| ())
    }

    /// The address the HTTP server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse::<SocketAddr>()
            .or_else(|_| format!("[{}]:{}", self.http.host, self.http.port).parse::<SocketAddr>())
            .map_err(|_| ConfigError::InvalidValue {
                key: "host",
                reason: format!("{} is not an IP address", self.http.host),
            })
    }
}

/// Returns the directory holding the database when none is configured.
///
/// `$MARKSHELF_DATA_DIR` if set, else the executable's directory, else the
/// working directory.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_db_path() -> PathBuf {
    data_dir().join(DEFAULT_DB_FILE)
}
