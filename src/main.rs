use std::process::ExitCode;

use clap::Parser;
use dbstruct::cli::Cli;
use env_logger::Env;
use log::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter())).init();

    match dbstruct::run(&cli).await {
        Ok(summary) => {
            info!(
                "reported {} tables ({} with indexes, {} with foreign keys)",
                summary.tables, summary.with_indexes, summary.with_foreign_keys
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error analyzing the database: {}", e);
            debug!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
