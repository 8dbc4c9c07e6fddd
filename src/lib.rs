//! Storage layer for a personal-finance service.
//!
//! Application code writes each statement once with PostgreSQL `$N` placeholders and runs it
//! through [`StoragePool::query`] (or any [`QueryExecutor`]). The pool translates placeholders
//! and booleans for SQLite, checks parameter shape and count before touching an engine, and
//! returns a uniform [`QueryResult`]. Date bucketing and other engine-specific fragments come
//! from [`Dialect`].
//!
//! ```rust,no_run
//! use finance_storage::prelude::*;
//!
//! # async fn run() -> Result<(), StorageError> {
//! let config = StorageConfig::from_env()?;
//! let pool = StoragePool::connect(&config).await?;
//! let month = pool.dialect().date_trunc("month", "t.date");
//! let sql = format!("SELECT {month} AS month, COUNT(*) AS n FROM transactions t WHERE t.vendor = $1 GROUP BY 1");
//! let result = pool.query(&sql, vec![RowValues::from("amex")]).await?;
//! println!("{}", serde_json::to_string(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod mutex;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{PostgresSettings, StorageConfig};
pub use dialect::Dialect;
pub use error::StorageError;
pub use executor::QueryExecutor;
pub use mutex::WriteMutex;
pub use pool::StoragePool;
pub use results::{QueryResult, Row};
pub use translation::{PlaceholderStyle, prepare_statement, translate_placeholders};
pub use types::{Params, RowValues};
