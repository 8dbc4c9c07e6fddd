use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::mutex::WriteMutex;
use crate::pool::StoragePool;
use crate::results::QueryResult;
use crate::types::Params;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresPool;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqlitePool;

/// The one call every repository and report builder goes through.
///
/// Implemented by both engine pools and by [`StoragePool`], so query code can be written once
/// against `&dyn QueryExecutor` and pick its SQL fragments from [`QueryExecutor::dialect`].
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run one statement written with `$N` placeholders.
    async fn query(&self, sql: &str, params: Params) -> Result<QueryResult, StorageError>;

    /// Dialect the SQL fragments must be built for.
    fn dialect(&self) -> Dialect;

    /// Lock serializing multi-statement writes against this pool.
    fn write_lock(&self) -> &WriteMutex;
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl QueryExecutor for SqlitePool {
    async fn query(&self, sql: &str, params: Params) -> Result<QueryResult, StorageError> {
        SqlitePool::query(self, sql, params).await
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn write_lock(&self) -> &WriteMutex {
        SqlitePool::write_lock(self)
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl QueryExecutor for PostgresPool {
    async fn query(&self, sql: &str, params: Params) -> Result<QueryResult, StorageError> {
        PostgresPool::query(self, sql, params).await
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn write_lock(&self) -> &WriteMutex {
        PostgresPool::write_lock(self)
    }
}

#[async_trait]
impl QueryExecutor for StoragePool {
    async fn query(&self, sql: &str, params: Params) -> Result<QueryResult, StorageError> {
        StoragePool::query(self, sql, params).await
    }

    fn dialect(&self) -> Dialect {
        StoragePool::dialect(self)
    }

    fn write_lock(&self) -> &WriteMutex {
        StoragePool::write_lock(self)
    }
}
