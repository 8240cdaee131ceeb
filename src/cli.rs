use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print the structure of a PostgreSQL schema: tables, columns, indexes,
/// foreign keys and object counts.
///
/// Connection settings come from DATABASE_URL or DB_HOST, DB_PORT, DB_USER,
/// DB_PASSWORD, DB_NAME and DB_SSLMODE, read from the environment or a .env file.
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Schema to report on. Overrides DB_SCHEMA (default: public).
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Load environment variables from this file instead of ./.env.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
