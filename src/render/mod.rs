use crate::{
    errors::DbError,
    models::schema::{AggregateStats, TableReport},
};

pub mod json;
pub mod table;
pub mod text;

pub use json::JsonRenderer;
pub use table::TextTable;
pub use text::TextRenderer;

/// Receives report pieces in the order the reporter produces them.
pub trait ReportSink {
    fn table_list(&mut self, tables: &[String]) -> Result<(), DbError>;
    fn table_section(&mut self, section: &TableReport) -> Result<(), DbError>;
    fn stats(&mut self, stats: &AggregateStats) -> Result<(), DbError>;
    /// Called once after everything else succeeded.
    fn finish(&mut self) -> Result<(), DbError>;
}
