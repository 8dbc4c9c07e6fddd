use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] deadpool_postgres::PoolError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter shape error: {0}")]
    ParameterShape(String),

    #[error(
        "Parameter count error: too few parameter values (statement references ${highest}, \
         {supplied} supplied)"
    )]
    ParameterCount { highest: usize, supplied: usize },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl StorageError {
    /// True for failures raised before the statement reached an engine.
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            StorageError::ParameterShape(_) | StorageError::ParameterCount { .. }
        )
    }
}
