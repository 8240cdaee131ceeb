use std::io::Write;

use crate::{
    errors::DbError,
    models::schema::{AggregateStats, SchemaReport, TableReport},
};

use super::ReportSink;

/// Collects the whole report and writes it as one JSON document on `finish`.
pub struct JsonRenderer<W: Write> {
    out: W,
    report: SchemaReport,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W, schema: &str) -> Self {
        Self {
            out,
            report: SchemaReport {
                schema: schema.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonRenderer<W> {
    fn table_list(&mut self, tables: &[String]) -> Result<(), DbError> {
        self.report.tables = tables.to_vec();
        Ok(())
    }

    fn table_section(&mut self, section: &TableReport) -> Result<(), DbError> {
        self.report.sections.push(section.clone());
        Ok(())
    }

    fn stats(&mut self, stats: &AggregateStats) -> Result<(), DbError> {
        self.report.stats = Some(*stats);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DbError> {
        serde_json::to_writer_pretty(&mut self.out, &self.report)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
