use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::StorageError;

/// SQLite file used when `SQLITE_DB_PATH` is not set. It must already exist.
pub const DEFAULT_SQLITE_PATH: &str = "finance.sqlite";

/// Connection settings for the client-server engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresSettings {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub dbname: Option<String>,
}

impl PostgresSettings {
    /// Whether any connection target is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.host.is_some()
    }

    /// # Errors
    /// Returns `StorageError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.url.is_some() {
            return Ok(());
        }
        for (name, value) in [
            ("host", &self.host),
            ("dbname", &self.dbname),
            ("user", &self.user),
        ] {
            if value.is_none() {
                return Err(StorageError::ConfigError(format!(
                    "postgres {name} is required when no connection url is set"
                )));
            }
        }
        Ok(())
    }
}

/// Process configuration for the storage layer, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit engine choice; `None` infers it from the postgres settings.
    pub use_sqlite: Option<bool>,
    pub sqlite_path: Option<PathBuf>,
    pub postgres: PostgresSettings,
}

impl StorageConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `StorageError::ConfigError` if a flag or port cannot be parsed.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Keys: `USE_SQLITE`, `SQLITE_DB_PATH`, `DATABASE_URL`, `PGHOST`, `PGPORT`, `PGUSER`,
    /// `PGPASSWORD`, `PGDATABASE`. Empty values count as unset.
    ///
    /// # Errors
    /// Returns `StorageError::ConfigError` if a flag or port cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let use_sqlite = get("USE_SQLITE")
            .map(|raw| parse_flag("USE_SQLITE", &raw))
            .transpose()?;
        let port = get("PGPORT")
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|e| {
                    StorageError::ConfigError(format!("PGPORT must be a port number: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            use_sqlite,
            sqlite_path: get("SQLITE_DB_PATH").map(PathBuf::from),
            postgres: PostgresSettings {
                url: get("DATABASE_URL"),
                host: get("PGHOST"),
                port,
                user: get("PGUSER"),
                password: get("PGPASSWORD"),
                dbname: get("PGDATABASE"),
            },
        })
    }

    /// Explicit flag first; otherwise postgres when a url or host is configured.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self.use_sqlite {
            Some(true) => Dialect::Sqlite,
            Some(false) => Dialect::Postgres,
            None if self.postgres.is_configured() => Dialect::Postgres,
            None => Dialect::Sqlite,
        }
    }

    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH))
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, StorageError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(StorageError::ConfigError(format!(
            "{key} must be a boolean flag, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<StorageConfig, StorageError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorageConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_to_sqlite() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.dialect(), Dialect::Sqlite);
        assert_eq!(cfg.sqlite_path(), PathBuf::from(DEFAULT_SQLITE_PATH));
    }

    #[test]
    fn infers_postgres_from_connection_settings() {
        let cfg = config(&[("PGHOST", "db"), ("PGPORT", "5433")]).unwrap();
        assert_eq!(cfg.dialect(), Dialect::Postgres);
        assert_eq!(cfg.postgres.port, Some(5433));

        let cfg = config(&[("DATABASE_URL", "postgres://u@h/db")]).unwrap();
        assert_eq!(cfg.dialect(), Dialect::Postgres);
    }

    #[test]
    fn explicit_flag_wins() {
        let cfg = config(&[("USE_SQLITE", "TRUE"), ("PGHOST", "db")]).unwrap();
        assert_eq!(cfg.dialect(), Dialect::Sqlite);
        let cfg = config(&[("USE_SQLITE", "0")]).unwrap();
        assert_eq!(cfg.dialect(), Dialect::Postgres);
        let cfg = config(&[("USE_SQLITE", "  ")]).unwrap();
        assert_eq!(cfg.use_sqlite, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("USE_SQLITE", "maybe")]),
            Err(StorageError::ConfigError(_))
        ));
        assert!(matches!(
            config(&[("PGPORT", "not-a-port")]),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[test]
    fn postgres_validation_names_missing_field() {
        let settings = PostgresSettings {
            host: Some("db".into()),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("dbname"));
        let settings = PostgresSettings {
            url: Some("postgres://u@h/db".into()),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }
}
