use std::future::Future;

use tracing::info;

use crate::config::StorageConfig;
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::mutex::WriteMutex;
use crate::results::QueryResult;
use crate::types::Params;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresPool;
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteOptions, SqlitePool};

/// The pool chosen at startup. One per process.
#[derive(Debug)]
pub enum StoragePool {
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PostgresPool),
}

impl StoragePool {
    /// Build the pool for the configured dialect.
    ///
    /// # Errors
    /// Returns `StorageError::ConfigError` if the dialect's backend is not compiled in, the
    /// SQLite file is missing, or postgres settings are incomplete; otherwise the engine's error.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let dialect = config.dialect();
        info!(?dialect, "connecting storage");
        match dialect {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => {
                let opts = SqliteOptions::new(config.sqlite_path());
                let pool = tokio::task::spawn_blocking(move || SqlitePool::open(opts))
                    .await
                    .map_err(|e| {
                        StorageError::ExecutionError(format!("sqlite open join error: {e}"))
                    })??;
                Ok(StoragePool::Sqlite(pool))
            }
            #[cfg(feature = "postgres")]
            Dialect::Postgres => Ok(StoragePool::Postgres(PostgresPool::new(&config.postgres)?)),
            #[allow(unreachable_patterns)]
            other => Err(StorageError::ConfigError(format!(
                "{other:?} support is not compiled in"
            ))),
        }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            #[cfg(feature = "sqlite")]
            StoragePool::Sqlite(_) => Dialect::Sqlite,
            #[cfg(feature = "postgres")]
            StoragePool::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Run one statement written with `$N` placeholders on whichever engine is active.
    ///
    /// # Errors
    /// See [`SqlitePool::query`] and [`PostgresPool::query`].
    pub async fn query(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<QueryResult, StorageError> {
        match self {
            #[cfg(feature = "sqlite")]
            StoragePool::Sqlite(pool) => pool.query(sql, params).await,
            #[cfg(feature = "postgres")]
            StoragePool::Postgres(pool) => pool.query(sql, params).await,
        }
    }

    #[must_use]
    pub fn write_lock(&self) -> &WriteMutex {
        match self {
            #[cfg(feature = "sqlite")]
            StoragePool::Sqlite(pool) => pool.write_lock(),
            #[cfg(feature = "postgres")]
            StoragePool::Postgres(pool) => pool.write_lock(),
        }
    }

    pub async fn run_exclusive<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.write_lock().run_exclusive(task).await
    }

    /// # Errors
    /// Returns the SQLite engine's close error; closing postgres cannot fail.
    pub async fn close(self) -> Result<(), StorageError> {
        match self {
            #[cfg(feature = "sqlite")]
            StoragePool::Sqlite(pool) => pool.close().await,
            #[cfg(feature = "postgres")]
            StoragePool::Postgres(pool) => {
                pool.close().await;
                Ok(())
            }
        }
    }
}
