use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::{
    cli::{Cli, OutputFormat},
    errors::DbError,
    models::connections::{ConnectionConfig, SslMode},
};

pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub schema: String,
    pub format: OutputFormat,
}

/// Loads `.env` (or `--env-file`) into the process environment, then builds
/// the config from environment variables and CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, DbError> {
    load_env_file(cli.env_file.as_deref())?;
    AppConfig::from_lookup(|key| env::var(key).ok(), cli)
}

/// A missing `./.env` is fine; a missing explicit file is not.
pub fn load_env_file(path: Option<&Path>) -> Result<(), DbError> {
    match path {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| {
                DbError::Config(format!("cannot load env file {}: {}", path.display(), e))
            })?;
            debug!("loaded environment from {}", path.display());
        }
        None => {
            if let Ok(path) = dotenv::dotenv() {
                debug!("loaded environment from {}", path.display());
            }
        }
    }
    Ok(())
}

fn lookup_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup_var(lookup, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| DbError::Config(format!("invalid value for {}: {}", key, e)))
        })
        .transpose()
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F, cli: &Cli) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ConnectionConfig::default();

        let max_connections = parse_var::<u32, _>(&lookup, "DB_MAX_CONNECTIONS")?
            .unwrap_or(defaults.max_connections);
        if max_connections == 0 {
            return Err(DbError::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let port = parse_var::<u16, _>(&lookup, "DB_PORT")?;
        if port == Some(0) {
            return Err(DbError::Config("DB_PORT must be greater than 0".to_string()));
        }

        let connection = ConnectionConfig {
            database_url: lookup_var(&lookup, "DATABASE_URL"),
            host: lookup_var(&lookup, "DB_HOST"),
            port,
            user: lookup_var(&lookup, "DB_USER"),
            // Not trimmed: whitespace can be part of a password.
            password: lookup("DB_PASSWORD").filter(|p| !p.is_empty()),
            database: lookup_var(&lookup, "DB_NAME"),
            sslmode: parse_var::<SslMode, _>(&lookup, "DB_SSLMODE")?,
            max_connections,
            acquire_timeout: parse_var::<u64, _>(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            statement_timeout: parse_var::<u64, _>(&lookup, "DB_STATEMENT_TIMEOUT_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            connect_retries: parse_var::<u32, _>(&lookup, "DB_CONNECT_RETRIES")?
                .unwrap_or(defaults.connect_retries),
            retry_backoff: defaults.retry_backoff,
            application_name: defaults.application_name,
        };

        let schema = cli
            .schema
            .clone()
            .or_else(|| lookup_var(&lookup, "DB_SCHEMA"))
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        Ok(AppConfig {
            connection,
            schema,
            format: cli.format.unwrap_or_default(),
        })
    }
}
