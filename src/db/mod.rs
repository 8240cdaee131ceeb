use crate::{errors::DbError, models::schema::Row};
use async_trait::async_trait;

pub mod postgres;

/// Snapshot of pool occupancy as the client sees it. Released connections
/// are counted back in asynchronously, so the numbers can trail reality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Connections currently open.
    pub size: u32,
    /// Open connections sitting idle in the pool.
    pub idle: u32,
    /// Connections checked out and not yet released.
    pub active: u32,
}

/// Read-only access to the target database.
#[async_trait]
pub trait DbClient {
    /// Runs one statement with positional (`$1`, `$2`, ...) parameters and
    /// returns every row in server order.
    async fn query(&self, sql: &str, params: &[String]) -> Result<Vec<Row>, DbError>;
    /// Closes every connection. Calling it again is a no-op.
    async fn shutdown(&self);
    fn pool_stats(&self) -> PoolStats;
}
