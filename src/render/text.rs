use std::fmt::Write as _;
use std::io::Write;

use crate::{
    errors::DbError,
    models::schema::{AggregateStats, TableReport},
};

use super::{ReportSink, TextTable};

const SEPARATOR_WIDTH: usize = 80;

/// Human-readable console report.
pub struct TextRenderer<W: Write> {
    out: W,
    schema: String,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, schema: &str) -> Self {
        Self {
            out,
            schema: schema.to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) -> Result<(), DbError> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }
}

pub fn section_text(section: &TableReport) -> Result<String, DbError> {
    let mut buf = String::new();
    writeln!(
        buf,
        "TABLE STRUCTURE: {}",
        section.table_name.to_uppercase()
    )?;

    let mut columns = TextTable::new(["column_name", "data_type", "is_nullable", "column_default"]);
    for column in &section.columns {
        columns.push_row([
            column.name.as_str(),
            column.data_type.as_str(),
            if column.is_nullable { "YES" } else { "NO" },
            column.default.as_deref().unwrap_or("null"),
        ]);
    }
    writeln!(buf, "Columns:")?;
    columns.render(&mut buf)?;

    if !section.indexes.is_empty() {
        let mut indexes = TextTable::new(["indexname", "indexdef"]);
        for index in &section.indexes {
            indexes.push_row([index.name.as_str(), index.definition.as_str()]);
        }
        writeln!(buf, "\nIndexes:")?;
        indexes.render(&mut buf)?;
    }

    if !section.foreign_keys.is_empty() {
        let mut fks = TextTable::new([
            "constraint_name",
            "column_name",
            "foreign_table_name",
            "foreign_column_name",
        ]);
        for fk in &section.foreign_keys {
            fks.push_row([
                fk.constraint_name.as_str(),
                fk.column_name.as_str(),
                fk.foreign_table.as_str(),
                fk.foreign_column.as_str(),
            ]);
        }
        writeln!(buf, "\nForeign keys:")?;
        fks.render(&mut buf)?;
    }

    writeln!(buf, "\n{}\n", "=".repeat(SEPARATOR_WIDTH))?;
    Ok(buf)
}

impl<W: Write> ReportSink for TextRenderer<W> {
    fn table_list(&mut self, tables: &[String]) -> Result<(), DbError> {
        let mut buf = String::new();
        writeln!(
            buf,
            "Analyzing database structure (schema `{}`)...\n",
            self.schema
        )?;
        writeln!(buf, "TABLES IN THE DATABASE:")?;
        if tables.is_empty() {
            writeln!(buf, "(no tables)")?;
        }
        for table in tables {
            writeln!(buf, "- {}", table)?;
        }
        writeln!(buf)?;
        self.emit(&buf)
    }

    fn table_section(&mut self, section: &TableReport) -> Result<(), DbError> {
        let text = section_text(section)?;
        self.emit(&text)
    }

    fn stats(&mut self, stats: &AggregateStats) -> Result<(), DbError> {
        let mut table = TextTable::new(["total_tables", "total_views", "total_functions"]);
        table.push_row([
            stats.total_tables.to_string(),
            stats.total_views.to_string(),
            stats.total_routines.to_string(),
        ]);

        let mut buf = String::new();
        writeln!(buf, "DATABASE STATISTICS:")?;
        table.render(&mut buf)?;
        self.emit(&buf)
    }

    fn finish(&mut self) -> Result<(), DbError> {
        self.emit("\nAnalysis completed successfully!\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor};

    fn orders_section() -> TableReport {
        TableReport {
            table_name: "orders".to_string(),
            columns: vec![
                ColumnDescriptor {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    is_nullable: false,
                    default: Some("nextval('orders_id_seq'::regclass)".to_string()),
                },
                ColumnDescriptor {
                    name: "user_id".to_string(),
                    data_type: "integer".to_string(),
                    is_nullable: true,
                    default: None,
                },
            ],
            indexes: Vec::new(),
            foreign_keys: vec![ForeignKeyDescriptor {
                constraint_name: "orders_user_id_fkey".to_string(),
                column_name: "user_id".to_string(),
                foreign_table: "users".to_string(),
                foreign_column: "id".to_string(),
            }],
        }
    }

    #[test]
    fn test_section_omits_empty_index_block() {
        let text = section_text(&orders_section()).unwrap();

        assert!(text.starts_with("TABLE STRUCTURE: ORDERS\nColumns:\n"));
        assert!(!text.contains("Indexes:"));
        assert!(text.contains("Foreign keys:"));
        assert!(text.contains("│ orders_user_id_fkey │ user_id     │ users              │ id                  │"));
        assert!(text.trim_end().ends_with(&"=".repeat(SEPARATOR_WIDTH)));
    }

    #[test]
    fn test_section_renders_indexes_before_foreign_keys() {
        let mut section = orders_section();
        section.indexes.push(IndexDescriptor {
            name: "orders_pkey".to_string(),
            definition: "CREATE UNIQUE INDEX orders_pkey ON public.orders USING btree (id)"
                .to_string(),
        });

        let text = section_text(&section).unwrap();
        let columns_at = text.find("Columns:").unwrap();
        let indexes_at = text.find("Indexes:").unwrap();
        let fks_at = text.find("Foreign keys:").unwrap();
        assert!(columns_at < indexes_at && indexes_at < fks_at);
    }

    #[test]
    fn test_nullable_and_default_cells() {
        let text = section_text(&orders_section()).unwrap();

        assert!(text.contains("│ NO          │ nextval('orders_id_seq'::regclass) │"));
        assert!(text.contains("│ YES         │ null"));
    }

    #[test]
    fn test_full_report_for_empty_schema() {
        let mut renderer = TextRenderer::new(Vec::new(), "public");
        renderer.table_list(&[]).unwrap();
        renderer.stats(&AggregateStats::default()).unwrap();
        renderer.finish().unwrap();

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("TABLES IN THE DATABASE:\n(no tables)\n"));
        assert!(out.contains("DATABASE STATISTICS:"));
        assert!(out.contains("│ 0       │ 0            │ 0           │ 0               │"));
        assert!(out.ends_with("Analysis completed successfully!\n"));
    }
}
