use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::engine::{EngineOpener, SqliteEngine, rusqlite_opener};
use super::search_index;
use crate::error::StorageError;
use crate::mutex::WriteMutex;
use crate::results::QueryResult;
use crate::translation::{PlaceholderStyle, PreparedStatement, StatementKind, prepare_statement};
use crate::types::Params;

/// Applied to every handle right after it is opened.
pub const PRAGMAS: &[&str] = &["PRAGMA foreign_keys = ON;", "PRAGMA journal_mode = WAL;"];

type SharedEngine = Arc<Mutex<Box<dyn SqliteEngine>>>;

/// Options for opening a [`SqlitePool`].
#[derive(Clone)]
pub struct SqliteOptions {
    pub db_path: PathBuf,
    pub opener: Option<EngineOpener>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            opener: None,
        }
    }

    /// Use a custom engine constructor instead of `rusqlite`.
    #[must_use]
    pub fn with_engine(mut self, opener: EngineOpener) -> Self {
        self.opener = Some(opener);
        self
    }
}

impl fmt::Debug for SqliteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteOptions")
            .field("db_path", &self.db_path)
            .field("custom_engine", &self.opener.is_some())
            .finish()
    }
}

/// Owner of the single embedded-engine handle.
///
/// The handle is never lent out; every statement goes through [`SqlitePool::query`]. Each call
/// runs to completion on a blocking thread. Unrelated calls are not ordered against each other;
/// multi-statement writes take [`SqlitePool::write_lock`].
///
/// ```compile_fail
/// # async fn raw(pool: &finance_storage::sqlite::SqlitePool) {
/// // only the crate itself reaches the engine
/// let _ = pool.with_engine(|engine| engine.exec("DELETE FROM transactions")).await;
/// # }
/// ```
pub struct SqlitePool {
    path: PathBuf,
    engine: SharedEngine,
    write_lock: WriteMutex,
}

impl SqlitePool {
    /// Open the pool's handle, apply [`PRAGMAS`], and install the search-index triggers.
    ///
    /// # Errors
    /// Returns `StorageError::ConfigError` if the database file does not exist (it is never
    /// created here), or the engine's error if opening, a pragma, or trigger installation fails.
    pub fn open(opts: SqliteOptions) -> Result<Self, StorageError> {
        if !opts.db_path.is_file() {
            return Err(StorageError::ConfigError(format!(
                "SQLite database file not found at {}",
                opts.db_path.display()
            )));
        }

        let opener = opts.opener.unwrap_or_else(rusqlite_opener);
        let mut engine = opener(&opts.db_path)?;
        for pragma in PRAGMAS {
            engine.exec(pragma)?;
        }
        let indexed = search_index::install(engine.as_mut())?;

        info!(path = %opts.db_path.display(), search_index = indexed, "sqlite pool opened");
        Ok(Self {
            path: opts.db_path,
            engine: Arc::new(Mutex::new(engine)),
            write_lock: WriteMutex::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run one statement written with `$N` placeholders.
    ///
    /// # Errors
    /// Returns `StorageError::ParameterShape`/`ParameterCount` before touching the engine, or the
    /// engine's own error.
    pub async fn query(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<QueryResult, StorageError> {
        let stmt = prepare_statement(sql, params.into(), PlaceholderStyle::Sqlite)?;
        debug!(kind = ?stmt.kind, params = stmt.params.len(), "sqlite statement");
        run_blocking(Arc::clone(&self.engine), move |engine| {
            execute_prepared(engine, &stmt)
        })
        .await
    }

    /// Run a closure directly against the engine, outside statement translation.
    ///
    /// # Errors
    /// Propagates the closure's error.
    pub(crate) async fn with_engine<F, R>(&self, func: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut dyn SqliteEngine) -> Result<R, StorageError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.engine), func).await
    }

    /// Repopulate the full-text shadow index from the `transactions` table.
    ///
    /// # Errors
    /// Returns the engine's error.
    pub async fn rebuild_search_index(&self) -> Result<(), StorageError> {
        self.with_engine(search_index::rebuild).await
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

    /// Close the handle.
    ///
    /// # Errors
    /// Returns `StorageError::ConnectionError` if a statement is still running, or the engine's
    /// error from closing.
    pub async fn close(self) -> Result<(), StorageError> {
        let engine = Arc::try_unwrap(self.engine)
            .map_err(|_| {
                StorageError::ConnectionError("sqlite handle still has a running statement".into())
            })?
            .into_inner();
        tokio::task::spawn_blocking(move || engine.close())
            .await
            .map_err(|e| StorageError::ExecutionError(format!("sqlite close join error: {e}")))??;
        info!(path = %self.path.display(), "sqlite pool closed");
        Ok(())
    }
}

impl fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePool")
            .field("path", &self.path)
            .field("write_lock", &self.write_lock)
            .finish()
    }
}

/// Dispatch a prepared statement to the engine path its kind requires.
fn execute_prepared(
    engine: &mut dyn SqliteEngine,
    stmt: &PreparedStatement,
) -> Result<QueryResult, StorageError> {
    match stmt.kind {
        StatementKind::TransactionControl(_) => {
            engine.exec(&stmt.sql)?;
            Ok(QueryResult::default())
        }
        StatementKind::Query | StatementKind::MutatingReturning => {
            let mut result = engine.all(&stmt.sql, &stmt.params)?;
            result.row_count = result.rows.len();
            Ok(result)
        }
        StatementKind::Mutating => Ok(QueryResult::affected(
            engine.run(&stmt.sql, &stmt.params)?,
        )),
    }
}

async fn run_blocking<F, R>(engine: SharedEngine, func: F) -> Result<R, StorageError>
where
    F: FnOnce(&mut dyn SqliteEngine) -> Result<R, StorageError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = engine.blocking_lock();
        func(&mut **guard)
    })
    .await
    .map_err(|e| StorageError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
