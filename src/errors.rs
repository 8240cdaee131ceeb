use std::fmt;

use thiserror::Error;

/// Custom error type for schema report operations.
#[derive(Error, Debug)]
pub enum DbError {
    /// Unable to obtain a working connection (network, auth, TLS, pool timeout).
    #[error("Connection error: {0}")]
    Connection(String),
    /// A specific statement failed; carries the backend diagnostic.
    #[error("Query error: {0}")]
    Query(String),
    /// Malformed row data or a failure writing the report.
    #[error("Render error: {0}")]
    Render(String),
    /// Configuration error (e.g., invalid port or ssl mode).
    #[error("Configuration error: {0}")]
    Config(String),
    /// Failure raised while the reporter was running a given query.
    #[error("failed to {stage}{}: {source}", table_suffix(.table))]
    Report {
        stage: QueryStage,
        table: Option<String>,
        #[source]
        source: Box<DbError>,
    },
}

fn table_suffix(table: &Option<String>) -> String {
    match table {
        Some(table) => format!(" for table `{}`", table),
        None => String::new(),
    }
}

impl DbError {
    pub fn report(stage: QueryStage, table: Option<&str>, source: DbError) -> Self {
        DbError::Report {
            stage,
            table: table.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// The innermost error, with reporter context stripped.
    pub fn root(&self) -> &DbError {
        match self {
            DbError::Report { source, .. } => source.root(),
            other => other,
        }
    }
}

impl DbError {
    /// A statement that already held a connection failed. Anything the driver
    /// reports from here on, a dropped socket included, is a query failure.
    pub fn statement(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code) => DbError::Query(format!("{} (SQLSTATE {})", db_err.message(), code)),
                None => DbError::Query(db_err.message().to_string()),
            },
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(_) => DbError::statement(err),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DbError::Connection(err.to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Render(err.to_string())
    }
}

impl From<fmt::Error> for DbError {
    fn from(err: fmt::Error) -> Self {
        DbError::Render(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Render(err.to_string())
    }
}

/// The query the reporter was issuing when something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    ListTables,
    Columns,
    Indexes,
    ForeignKeys,
    Stats,
    Render,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let intent = match self {
            QueryStage::ListTables => "list tables",
            QueryStage::Columns => "fetch columns",
            QueryStage::Indexes => "fetch indexes",
            QueryStage::ForeignKeys => "fetch foreign keys",
            QueryStage::Stats => "fetch database statistics",
            QueryStage::Render => "render report",
        };
        f.write_str(intent)
    }
}
