use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OpenFlags, params_from_iter};

use super::params::Params;
use super::query::build_result_set;
use crate::error::StorageError;
use crate::results::QueryResult;
use crate::types::RowValues;

/// The three execution paths of an embedded-engine handle.
///
/// Calls are blocking. The pool owns exactly one engine and never runs two calls on it at once.
/// Parameters arrive already translated: `?N` placeholders, booleans as 0/1.
pub trait SqliteEngine: Send + 'static {
    /// Raw execute, no parameters, no result (pragmas, DDL batches, transaction control).
    ///
    /// # Errors
    /// Returns the engine's error unchanged.
    fn exec(&mut self, sql: &str) -> Result<(), StorageError>;

    /// Run a row-producing statement and fetch every row.
    ///
    /// # Errors
    /// Returns the engine's error unchanged.
    fn all(&mut self, sql: &str, params: &[RowValues]) -> Result<QueryResult, StorageError>;

    /// Run a statement and report the number of rows it changed.
    ///
    /// # Errors
    /// Returns the engine's error unchanged.
    fn run(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, StorageError>;

    /// Close the handle at shutdown.
    ///
    /// # Errors
    /// Returns the engine's error unchanged.
    fn close(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Constructor used by the pool to open its engine; swap it out to inject a fake in tests.
pub type EngineOpener =
    Arc<dyn Fn(&Path) -> Result<Box<dyn SqliteEngine>, StorageError> + Send + Sync>;

/// Default opener backed by [`RusqliteEngine`].
#[must_use]
pub fn rusqlite_opener() -> EngineOpener {
    Arc::new(|path: &Path| {
        let engine = RusqliteEngine::open(path)?;
        Ok(Box::new(engine) as Box<dyn SqliteEngine>)
    })
}

/// `rusqlite` connection opened read-write without the create flag.
pub struct RusqliteEngine {
    conn: Connection,
}

impl RusqliteEngine {
    /// Open an existing database file. Fails if the file does not exist.
    ///
    /// # Errors
    /// Returns `StorageError::SqliteError` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Ok(Self { conn })
    }
}

impl fmt::Debug for RusqliteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RusqliteEngine")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteEngine for RusqliteEngine {
    fn exec(&mut self, sql: &str) -> Result<(), StorageError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn all(&mut self, sql: &str, params: &[RowValues]) -> Result<QueryResult, StorageError> {
        let values = Params::convert(params).0;
        let mut stmt = self.conn.prepare_cached(sql)?;
        build_result_set(&mut stmt, &values)
    }

    fn run(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, StorageError> {
        let values = Params::convert(params).0;
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(values.iter()))?)
    }

    fn close(self: Box<Self>) -> Result<(), StorageError> {
        self.conn.close().map_err(|(_, err)| StorageError::SqliteError(err))
    }
}
