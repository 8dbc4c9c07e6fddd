//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to configure a pool and run statements.

pub use crate::config::{PostgresSettings, StorageConfig};
pub use crate::dialect::Dialect;
pub use crate::error::StorageError;
pub use crate::executor::QueryExecutor;
pub use crate::mutex::WriteMutex;
pub use crate::pool::StoragePool;
pub use crate::results::{QueryResult, Row};
pub use crate::translation::{PlaceholderStyle, translate_placeholders};
pub use crate::types::{Params, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresPool;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteEngine, SqliteOptions, SqlitePool};
