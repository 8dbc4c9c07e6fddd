use std::fmt;
use std::future::Future;

use deadpool_postgres::{Config as PgConfig, Object, Pool, Runtime};
use tokio::sync::Mutex;
use tokio_postgres::NoTls;
use tracing::{debug, info, warn};

use super::params::Params as PgParams;
use super::query::build_result_set_from_statement;
use crate::config::PostgresSettings;
use crate::error::StorageError;
use crate::mutex::WriteMutex;
use crate::results::QueryResult;
use crate::translation::{
    PlaceholderStyle, PreparedStatement, StatementKind, TransactionControl, prepare_statement,
};
use crate::types::Params;

/// Connection pool for the client-server engine.
///
/// Statements borrow any idle connection, except between an explicit `BEGIN` and the matching
/// `COMMIT`/`ROLLBACK`: that connection stays pinned so the whole transaction runs on one
/// session. Pair explicit transactions with [`PostgresPool::run_exclusive`] so other callers do
/// not slip statements into them.
pub struct PostgresPool {
    pool: Pool,
    pinned: Mutex<Option<Object>>,
    write_lock: WriteMutex,
}

impl PostgresPool {
    /// Build a pool from resolved settings. Connections are opened lazily.
    ///
    /// # Errors
    /// Returns `StorageError::ConfigError` if required settings are missing or
    /// `StorageError::ConnectionError` if pool creation fails.
    pub fn new(settings: &PostgresSettings) -> Result<Self, StorageError> {
        settings.validate()?;

        let mut cfg = PgConfig::new();
        cfg.url.clone_from(&settings.url);
        cfg.host.clone_from(&settings.host);
        cfg.port = settings.port;
        cfg.user.clone_from(&settings.user);
        cfg.password.clone_from(&settings.password);
        cfg.dbname.clone_from(&settings.dbname);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                StorageError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
            })?;

        info!(
            host = settings.host.as_deref().unwrap_or("<url>"),
            dbname = settings.dbname.as_deref().unwrap_or("<url>"),
            "postgres pool created"
        );
        Ok(Self::from_pool(pool))
    }

    /// Wrap an already-built deadpool pool.
    #[must_use]
    pub fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            pinned: Mutex::new(None),
            write_lock: WriteMutex::new(),
        }
    }

    /// Run one statement written with `$N` placeholders.
    ///
    /// # Errors
    /// Returns `StorageError::ParameterShape`/`ParameterCount` before any connection is taken,
    /// `StorageError::PoolErrorPostgres` if no connection is available, or the server's error.
    pub async fn query(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<QueryResult, StorageError> {
        let stmt = prepare_statement(sql, params.into(), PlaceholderStyle::Postgres)?;
        debug!(kind = ?stmt.kind, params = stmt.params.len(), "postgres statement");

        if let StatementKind::TransactionControl(control) = stmt.kind {
            return self.transaction_control(control, &stmt).await;
        }

        let pinned = self.pinned.lock().await;
        if let Some(client) = pinned.as_ref() {
            return execute_prepared(client, &stmt).await;
        }
        drop(pinned);

        let client = self.pool.get().await?;
        execute_prepared(&client, &stmt).await
    }

    async fn transaction_control(
        &self,
        control: TransactionControl,
        stmt: &PreparedStatement,
    ) -> Result<QueryResult, StorageError> {
        let mut pinned = self.pinned.lock().await;
        match control {
            TransactionControl::Begin => {
                if pinned.is_some() {
                    return Err(StorageError::ExecutionError(
                        "a transaction is already open on this pool".into(),
                    ));
                }
                let client = self.pool.get().await?;
                client.batch_execute(&stmt.sql).await?;
                *pinned = Some(client);
            }
            TransactionControl::Commit | TransactionControl::Rollback => match pinned.take() {
                Some(client) => client.batch_execute(&stmt.sql).await?,
                None => {
                    warn!(sql = %stmt.sql, "no open transaction");
                    let client = self.pool.get().await?;
                    client.batch_execute(&stmt.sql).await?;
                }
            },
        }
        Ok(QueryResult::default())
    }

    #[must_use]
    pub fn write_lock(&self) -> &WriteMutex {
        &self.write_lock
    }

    /// Shorthand for `self.write_lock().run_exclusive(task)`.
    pub async fn run_exclusive<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.write_lock.run_exclusive(task).await
    }

    /// Close the pool. A transaction still pinned is dropped with its connection, which rolls it
    /// back server-side.
    pub async fn close(self) {
        if self.pinned.lock().await.take().is_some() {
            warn!("closing postgres pool with an open transaction");
        }
        self.pool.close();
        info!("postgres pool closed");
    }
}

impl fmt::Debug for PostgresPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresPool")
            .field("status", &self.pool.status())
            .field("write_lock", &self.write_lock)
            .finish_non_exhaustive()
    }
}

async fn execute_prepared(
    client: &tokio_postgres::Client,
    stmt: &PreparedStatement,
) -> Result<QueryResult, StorageError> {
    if let StatementKind::TransactionControl(_) = stmt.kind {
        client.batch_execute(&stmt.sql).await?;
        return Ok(QueryResult::default());
    }

    let params = PgParams::convert(&stmt.params);
    // prepared first so the result carries column names even when no rows match
    let prepared = client.prepare(&stmt.sql).await?;
    match stmt.kind {
        StatementKind::TransactionControl(_) => Ok(QueryResult::default()),
        StatementKind::Query | StatementKind::MutatingReturning => {
            let rows = client.query(&prepared, params.as_refs()).await?;
            build_result_set_from_statement(&prepared, &rows)
        }
        StatementKind::Mutating => {
            let changed = client.execute(&prepared, params.as_refs()).await?;
            let changed = usize::try_from(changed).map_err(|e| {
                StorageError::ExecutionError(format!("affected row count out of range: {e}"))
            })?;
            Ok(QueryResult::affected(changed))
        }
    }
}
