use log::{debug, info};

use crate::{
    db::DbClient,
    errors::{DbError, QueryStage},
    models::schema::{
        self, AggregateStats, ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, Row,
        TableReport,
    },
    render::ReportSink,
};

pub mod queries;

/// Counts gathered while a report ran.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub tables: usize,
    pub with_indexes: usize,
    pub with_foreign_keys: usize,
    pub stats: AggregateStats,
}

/// Walks the catalog of one schema and feeds each result to a `ReportSink`.
///
/// Queries are issued strictly one after another and the first failure
/// stops the walk.
pub struct SchemaReporter<'a> {
    client: &'a (dyn DbClient + Send + Sync),
    schema: String,
}

impl<'a> SchemaReporter<'a> {
    pub fn new(client: &'a (dyn DbClient + Send + Sync), schema: &str) -> Self {
        Self {
            client,
            schema: schema.to_string(),
        }
    }

    pub async fn run(&self, sink: &mut dyn ReportSink) -> Result<ReportSummary, DbError> {
        let tables = self.list_tables().await?;
        info!("found {} tables in schema `{}`", tables.len(), self.schema);
        sink.table_list(&tables)
            .map_err(|e| DbError::report(QueryStage::Render, None, e))?;

        let mut summary = ReportSummary {
            tables: tables.len(),
            ..Default::default()
        };

        for table in &tables {
            let section = self.describe_table(table).await?;
            if !section.indexes.is_empty() {
                summary.with_indexes += 1;
            }
            if !section.foreign_keys.is_empty() {
                summary.with_foreign_keys += 1;
            }
            sink.table_section(&section)
                .map_err(|e| DbError::report(QueryStage::Render, Some(table.as_str()), e))?;
        }

        summary.stats = self.stats().await?;
        sink.stats(&summary.stats)
            .map_err(|e| DbError::report(QueryStage::Render, None, e))?;
        sink.finish()
            .map_err(|e| DbError::report(QueryStage::Render, None, e))?;

        Ok(summary)
    }

    /// Table names in alphabetical order.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let rows = self
            .client
            .query(queries::LIST_TABLES, &[self.schema.clone()])
            .await
            .map_err(|e| DbError::report(QueryStage::ListTables, None, e))?;

        rows.iter()
            .map(schema::table_name)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::report(QueryStage::ListTables, None, e))
    }

    pub async fn describe_table(&self, table: &str) -> Result<TableReport, DbError> {
        debug!("describing table `{}`", table);
        let columns = self.columns(table).await?;
        let indexes = self.indexes(table).await?;
        let foreign_keys = self.foreign_keys(table).await?;

        Ok(TableReport {
            table_name: table.to_string(),
            columns,
            indexes,
            foreign_keys,
        })
    }

    /// Columns in physical order.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError> {
        self.fetch(QueryStage::Columns, table, queries::COLUMNS).await
    }

    pub async fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, DbError> {
        self.fetch(QueryStage::Indexes, table, queries::INDEXES).await
    }

    /// Foreign keys of `table`, one entry per referencing column in
    /// constraint order.
    pub async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>, DbError> {
        self.fetch(QueryStage::ForeignKeys, table, queries::FOREIGN_KEYS)
            .await
    }

    pub async fn stats(&self) -> Result<AggregateStats, DbError> {
        let rows = self
            .client
            .query(queries::STATS, &[self.schema.clone()])
            .await
            .map_err(|e| DbError::report(QueryStage::Stats, None, e))?;

        let row = rows.first().ok_or_else(|| {
            DbError::report(
                QueryStage::Stats,
                None,
                DbError::Render("statistics query returned no rows".to_string()),
            )
        })?;

        AggregateStats::try_from(row).map_err(|e| DbError::report(QueryStage::Stats, None, e))
    }

    async fn fetch<T>(&self, stage: QueryStage, table: &str, sql: &str) -> Result<Vec<T>, DbError>
    where
        T: for<'r> TryFrom<&'r Row, Error = DbError>,
    {
        let params = [self.schema.clone(), table.to_string()];
        let rows = self
            .client
            .query(sql, &params)
            .await
            .map_err(|e| DbError::report(stage, Some(table), e))?;

        rows.iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::report(stage, Some(table), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PoolStats;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::{json, Value};

    mock! {
        pub Client {}

        #[async_trait]
        impl DbClient for Client {
            async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<Row>, DbError>;
            async fn shutdown(&self);
            fn pool_stats(&self) -> PoolStats;
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
    }

    impl ReportSink for RecordingSink {
        fn table_list(&mut self, tables: &[String]) -> Result<(), DbError> {
            self.events.push(format!("tables:{}", tables.join(",")));
            Ok(())
        }

        fn table_section(&mut self, section: &TableReport) -> Result<(), DbError> {
            self.events.push(format!(
                "section:{}:{}:{}:{}",
                section.table_name,
                section.columns.len(),
                section.indexes.len(),
                section.foreign_keys.len()
            ));
            Ok(())
        }

        fn stats(&mut self, stats: &AggregateStats) -> Result<(), DbError> {
            self.events.push(format!(
                "stats:{}:{}:{}",
                stats.total_tables, stats.total_views, stats.total_routines
            ));
            Ok(())
        }

        fn finish(&mut self) -> Result<(), DbError> {
            self.events.push("finish".to_string());
            Ok(())
        }
    }

    fn rows(value: Value) -> Vec<Row> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn expect_stats(mock: &mut MockClient, tables: i64) {
        mock.expect_query()
            .withf(|sql, _| sql == queries::STATS)
            .times(1)
            .returning(move |_, _| {
                Ok(rows(json!([{
                    "total_tables": tables,
                    "total_views": 0,
                    "total_functions": 0
                }])))
            });
    }

    #[tokio::test]
    async fn test_empty_schema_still_reports_stats() {
        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, params| sql == queries::LIST_TABLES && params.first().map(String::as_str) == Some("public"))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_query()
            .withf(|sql, _| sql == queries::COLUMNS)
            .never();
        expect_stats(&mut mock, 0);

        let reporter = SchemaReporter::new(&mock, "public");
        let mut sink = RecordingSink::default();
        let summary = reporter.run(&mut sink).await.unwrap();

        assert_eq!(summary.tables, 0);
        assert_eq!(sink.events, vec!["tables:", "stats:0:0:0", "finish"]);
    }

    #[tokio::test]
    async fn test_missing_indexes_and_foreign_keys_are_empty() {
        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, _| sql == queries::LIST_TABLES)
            .returning(|_, _| Ok(rows(json!([{ "table_name": "settings" }]))));
        mock.expect_query()
            .withf(|sql, params| sql == queries::COLUMNS && params.get(1).map(String::as_str) == Some("settings"))
            .returning(|_, _| {
                Ok(rows(json!([
                    { "column_name": "key", "data_type": "text", "is_nullable": "NO", "column_default": null },
                    { "column_name": "value", "data_type": "text", "is_nullable": "YES", "column_default": null }
                ])))
            });
        mock.expect_query()
            .withf(|sql, _| sql == queries::INDEXES)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_query()
            .withf(|sql, _| sql == queries::FOREIGN_KEYS)
            .returning(|_, _| Ok(Vec::new()));
        expect_stats(&mut mock, 1);

        let reporter = SchemaReporter::new(&mock, "public");
        let mut sink = RecordingSink::default();
        let summary = reporter.run(&mut sink).await.unwrap();

        assert_eq!(summary.with_indexes, 0);
        assert_eq!(summary.with_foreign_keys, 0);
        assert_eq!(
            sink.events,
            vec!["tables:settings", "section:settings:2:0:0", "stats:1:0:0", "finish"]
        );
    }

    #[tokio::test]
    async fn test_query_failure_aborts_remaining_tables() {
        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, _| sql == queries::LIST_TABLES)
            .returning(|_, _| {
                Ok(rows(json!([
                    { "table_name": "accounts" },
                    { "table_name": "payroll" },
                    { "table_name": "users" }
                ])))
            });
        mock.expect_query()
            .withf(|sql, params| sql == queries::COLUMNS && params.get(1).map(String::as_str) == Some("accounts"))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_query()
            .withf(|sql, params| sql != queries::COLUMNS && params.len() == 2 && params.get(1).map(String::as_str) == Some("accounts"))
            .times(2)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_query()
            .withf(|sql, params| sql == queries::COLUMNS && params.get(1).map(String::as_str) == Some("payroll"))
            .times(1)
            .returning(|_, _| {
                Err(DbError::Query(
                    "permission denied for table payroll (SQLSTATE 42501)".to_string(),
                ))
            });
        mock.expect_query()
            .withf(|_, params| params.len() == 2 && params.get(1).map(String::as_str) == Some("users"))
            .never();
        mock.expect_query()
            .withf(|sql, _| sql == queries::STATS)
            .never();

        let reporter = SchemaReporter::new(&mock, "public");
        let mut sink = RecordingSink::default();
        let err = reporter.run(&mut sink).await.unwrap_err();

        match &err {
            DbError::Report { stage, table, .. } => {
                assert_eq!(*stage, QueryStage::Columns);
                assert_eq!(table.as_deref(), Some("payroll"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("permission denied"));
        assert_eq!(
            sink.events,
            vec!["tables:accounts,payroll,users", "section:accounts:0:0:0"]
        );
    }

    #[tokio::test]
    async fn test_composite_foreign_key_keeps_column_pairs() {
        let fetched = rows(json!([
            {
                "constraint_name": "fk_shipment",
                "column_name": "warehouse_id",
                "foreign_table_name": "shipments",
                "foreign_column_name": "warehouse_id"
            },
            {
                "constraint_name": "fk_shipment",
                "column_name": "shipment_no",
                "foreign_table_name": "shipments",
                "foreign_column_name": "number"
            }
        ]));

        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, params| sql == queries::FOREIGN_KEYS && params.get(1).map(String::as_str) == Some("parcels"))
            .times(1)
            .returning(move |_, _| Ok(fetched.clone()));

        let reporter = SchemaReporter::new(&mock, "public");
        let fks = reporter.foreign_keys("parcels").await.unwrap();

        let pairs: Vec<(&str, &str)> = fks
            .iter()
            .map(|fk| (fk.column_name.as_str(), fk.foreign_column.as_str()))
            .collect();
        assert_eq!(pairs, vec![("warehouse_id", "warehouse_id"), ("shipment_no", "number")]);
    }

    #[tokio::test]
    async fn test_malformed_row_is_render_error_with_context() {
        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, _| sql == queries::INDEXES)
            .returning(|_, _| Ok(rows(json!([{ "indexname": "users_pkey" }]))));

        let reporter = SchemaReporter::new(&mock, "public");
        let err = reporter.indexes("users").await.unwrap_err();

        assert!(matches!(err.root(), DbError::Render(_)));
        assert!(err.to_string().starts_with("failed to fetch indexes for table `users`"));
    }

    #[tokio::test]
    async fn test_stats_without_rows_is_error() {
        let mut mock = MockClient::new();
        mock.expect_query()
            .withf(|sql, _| sql == queries::STATS)
            .returning(|_, _| Ok(Vec::new()));

        let reporter = SchemaReporter::new(&mock, "analytics");
        let err = reporter.stats().await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Report {
                stage: QueryStage::Stats,
                ..
            }
        ));
    }
}
