use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::errors::DbError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_APPLICATION_NAME: &str = "dbstruct";

/// TLS negotiation mode, mirroring libpq's `sslmode` values.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "true" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(DbError::Config(format!("unknown sslmode `{}`", other))),
        }
    }
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Connection descriptor plus pool settings.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Full connection URL; discrete fields set explicitly take precedence.
    pub database_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub sslmode: Option<SslMode>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Server-side per-statement bound; `None` leaves the server default.
    pub statement_timeout: Option<Duration>,
    pub connect_retries: u32,
    pub retry_backoff: Duration,
    /// Reported to the server; sessions show up under it in `pg_stat_activity`.
    pub application_name: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            sslmode: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            statement_timeout: None,
            connect_retries: 0,
            retry_backoff: Duration::from_millis(500),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("sslmode", &self.sslmode)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .field("connect_retries", &self.connect_retries)
            .field("application_name", &self.application_name)
            .finish()
    }
}

impl ConnectionConfig {
    /// Builds driver options. Starts from `database_url` when present, then
    /// applies the discrete fields on top of it.
    pub fn connect_options(&self) -> Result<PgConnectOptions, DbError> {
        let mut options = match &self.database_url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| DbError::Config(format!("invalid DATABASE_URL: {}", e)))?,
            None => PgConnectOptions::new_without_pgpass()
                .host(DEFAULT_HOST)
                .port(DEFAULT_PORT)
                .username(DEFAULT_USER),
        };

        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = self.port {
            options = options.port(port);
        }
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        if let Some(sslmode) = self.sslmode {
            options = options.ssl_mode(sslmode.into());
        }

        // Everything this tool issues is a catalog SELECT.
        let mut session = vec![("default_transaction_read_only", "on".to_string())];
        if let Some(timeout) = self.statement_timeout {
            session.push(("statement_timeout", format!("{}ms", timeout.as_millis())));
        }

        Ok(options
            .application_name(&self.application_name)
            .options(session))
    }

    /// `host:port/database` for log lines.
    pub fn describe_target(&self) -> String {
        match self.connect_options() {
            Ok(options) => format!(
                "{}:{}/{}",
                options.get_host(),
                options.get_port(),
                options.get_database().unwrap_or(options.get_username())
            ),
            Err(_) => "<invalid target>".to_string(),
        }
    }
}
