use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DbError;

/// One result row as handed back by a `DbClient`: column name to value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ForeignKeyDescriptor {
    pub constraint_name: String,
    pub column_name: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateStats {
    pub total_tables: i64,
    pub total_views: i64,
    pub total_routines: i64,
}

/// Everything rendered for a single table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

/// Whole-schema document, used by the JSON output.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SchemaReport {
    pub schema: String,
    pub tables: Vec<String>,
    pub sections: Vec<TableReport>,
    pub stats: Option<AggregateStats>,
}

fn required_str(row: &Row, field: &str) -> Result<String, DbError> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DbError::Render(format!(
            "field `{}` should be text, got {}",
            field, other
        ))),
        None => Err(DbError::Render(format!("row is missing field `{}`", field))),
    }
}

fn optional_str(row: &Row, field: &str) -> Result<Option<String>, DbError> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Ok(Some(other.to_string())),
    }
}

fn required_count(row: &Row, field: &str) -> Result<i64, DbError> {
    match row.get(field) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            DbError::Render(format!("field `{}` is not an integer count: {}", field, n))
        }),
        // Some drivers hand numerics back as text.
        Some(Value::String(s)) => s.parse().map_err(|_| {
            DbError::Render(format!("field `{}` is not an integer count: {}", field, s))
        }),
        Some(other) => Err(DbError::Render(format!(
            "field `{}` should be a count, got {}",
            field, other
        ))),
        None => Err(DbError::Render(format!("row is missing field `{}`", field))),
    }
}

/// Table name from a `SELECT table_name ...` row.
pub fn table_name(row: &Row) -> Result<String, DbError> {
    required_str(row, "table_name")
}

impl TryFrom<&Row> for ColumnDescriptor {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let is_nullable = match row.get("is_nullable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("YES"),
            Some(other) => {
                return Err(DbError::Render(format!(
                    "field `is_nullable` should be YES/NO, got {}",
                    other
                )))
            }
            None => return Err(DbError::Render("row is missing field `is_nullable`".into())),
        };

        Ok(ColumnDescriptor {
            name: required_str(row, "column_name")?,
            data_type: required_str(row, "data_type")?,
            is_nullable,
            default: optional_str(row, "column_default")?,
        })
    }
}

impl TryFrom<&Row> for IndexDescriptor {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(IndexDescriptor {
            name: required_str(row, "indexname")?,
            definition: required_str(row, "indexdef")?,
        })
    }
}

impl TryFrom<&Row> for ForeignKeyDescriptor {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(ForeignKeyDescriptor {
            constraint_name: required_str(row, "constraint_name")?,
            column_name: required_str(row, "column_name")?,
            foreign_table: required_str(row, "foreign_table_name")?,
            foreign_column: required_str(row, "foreign_column_name")?,
        })
    }
}

impl TryFrom<&Row> for AggregateStats {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(AggregateStats {
            total_tables: required_count(row, "total_tables")?,
            total_views: required_count(row, "total_views")?,
            total_routines: required_count(row, "total_functions")?,
        })
    }
}
