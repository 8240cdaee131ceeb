use async_trait::async_trait;
use log::{debug, info, trace, warn};
use serde_json::{Number, Value};
use sqlx::{
    pool::PoolConnection,
    postgres::{PgPoolOptions, PgRow},
    Column as _, PgPool, Postgres, Row as _, ValueRef as _,
};

use crate::{
    errors::DbError,
    models::{connections::ConnectionConfig, schema::Row},
};

use super::{DbClient, PoolStats};

pub struct PostgresClient {
    pub pool: PgPool,
}

impl PostgresClient {
    /// Opens the pool and establishes the first connection, retrying up to
    /// `connect_retries` extra times.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let options = config.connect_options()?;
        let target = config.describe_target();
        let mut attempt = 0;

        loop {
            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    info!("connected to {}", target);
                    return Ok(Self { pool });
                }
                Err(e) if attempt < config.connect_retries => {
                    attempt += 1;
                    let backoff = config.retry_backoff * attempt;
                    warn!(
                        "connection attempt {} to {} failed: {}; retrying in {:?}",
                        attempt, target, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(DbError::Connection(e.to_string())),
            }
        }
    }

    /// Checks one connection out of the pool, waiting up to the acquire timeout.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, DbError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    /// Hands a connection back to the pool.
    pub fn release(&self, conn: PoolConnection<Postgres>) {
        trace!("releasing connection");
        drop(conn);
    }
}

fn decode_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect()
}

fn decode_value(row: &PgRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    if let Ok(val) = row.try_get::<String, _>(index) {
        return Value::String(val);
    }
    if let Ok(val) = row.try_get::<i64, _>(index) {
        return Value::from(val);
    }
    if let Ok(val) = row.try_get::<i32, _>(index) {
        return Value::from(val);
    }
    if let Ok(val) = row.try_get::<i16, _>(index) {
        return Value::from(val);
    }
    if let Ok(val) = row.try_get::<bool, _>(index) {
        return Value::Bool(val);
    }
    if let Ok(val) = row.try_get::<f64, _>(index) {
        return Number::from_f64(val).map(Value::Number).unwrap_or(Value::Null);
    }

    Value::Null
}

#[async_trait]
impl DbClient for PostgresClient {
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<Row>, DbError> {
        let mut conn = self.acquire().await?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }
        let result = query.fetch_all(&mut *conn).await;
        // Back to the pool on both the success and the error path.
        self.release(conn);

        let rows = result.map_err(DbError::statement)?;
        debug!("query returned {} rows", rows.len());
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn shutdown(&self) {
        if !self.pool.is_closed() {
            info!("closing connection pool");
            self.pool.close().await;
        }
    }

    /// Read from the pool's counters. A dropped connection is handed back by
    /// a background task, so right after a query (or even after `shutdown`)
    /// these can still count it; ask the server when an exact answer matters.
    fn pool_stats(&self) -> PoolStats {
        let size = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        PoolStats {
            size,
            idle,
            active: size.saturating_sub(idle),
        }
    }
}
