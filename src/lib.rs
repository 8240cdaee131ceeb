use std::io::{self, Write};

use cli::{Cli, OutputFormat};
use config::resolve_config;
use db::{postgres::PostgresClient, DbClient};
use errors::DbError;
use log::info;
use render::{JsonRenderer, TextRenderer};
use report::{ReportSummary, SchemaReporter};

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod render;
pub mod report;

/// Runs one report for `schema` against an already connected client.
pub async fn generate_report<W: Write>(
    client: &(dyn DbClient + Send + Sync),
    schema: &str,
    format: OutputFormat,
    out: W,
) -> Result<ReportSummary, DbError> {
    let reporter = SchemaReporter::new(client, schema);
    match format {
        OutputFormat::Text => reporter.run(&mut TextRenderer::new(out, schema)).await,
        OutputFormat::Json => reporter.run(&mut JsonRenderer::new(out, schema)).await,
    }
}

/// Resolves configuration, connects, writes the report to stdout and
/// closes the pool whether or not the report succeeded.
pub async fn run(cli: &Cli) -> Result<ReportSummary, DbError> {
    let config = resolve_config(cli)?;
    info!(
        "analyzing schema `{}` on {}",
        config.schema,
        config.connection.describe_target()
    );

    let client = PostgresClient::connect(&config.connection).await?;
    let result = generate_report(&client, &config.schema, config.format, io::stdout()).await;
    client.shutdown().await;

    result
}
