#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const TRANSACTIONS_DDL: &str = r"
CREATE TABLE transactions (
    identifier TEXT PRIMARY KEY,
    vendor TEXT NOT NULL,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    date TEXT NOT NULL,
    category_definition_id INTEGER,
    is_pikadon_related INTEGER
);
";

/// A database file inside a temporary directory; WAL side files are removed with the directory.
pub struct TempDb {
    dir: TempDir,
    path: PathBuf,
}

impl TempDb {
    /// Create an empty database file, optionally running `ddl` first.
    pub fn create(ddl: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("finance.sqlite");
        let conn = rusqlite::Connection::open(&path)?;
        // write the header so the file is a real database even without a schema
        conn.execute_batch("PRAGMA user_version = 1;")?;
        if let Some(ddl) = ddl {
            conn.execute_batch(ddl)?;
        }
        drop(conn);
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn missing_path(&self) -> PathBuf {
        self.dir.path().join("missing.sqlite")
    }
}
