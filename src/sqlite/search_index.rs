//! Full-text shadow index over the `transactions` table.
//!
//! The shadow table is a plain FTS5 table keyed by the primary table's rowid. Updates and
//! deletes remove the old index row and (for updates) insert a fresh one; the index is never
//! patched in place.
//!
//! A row removed by `REPLACE` conflict resolution fires no delete trigger (unless
//! `recursive_triggers` is on), so the insert and update triggers also drop index rows that
//! still carry the new row's `identifier` or rowid before indexing it.

use tracing::debug;

use super::engine::SqliteEngine;
use crate::error::StorageError;
use crate::types::RowValues;

pub const PRIMARY_TABLE: &str = "transactions";
pub const SHADOW_TABLE: &str = "transactions_fts";

pub const CREATE_SHADOW_TABLE: &str = "CREATE VIRTUAL TABLE IF NOT EXISTS transactions_fts \
     USING fts5(identifier UNINDEXED, vendor, name)";

pub const CREATE_TRIGGERS: &str = r"
CREATE TRIGGER IF NOT EXISTS transactions_fts_ai AFTER INSERT ON transactions BEGIN
    DELETE FROM transactions_fts WHERE rowid = new.rowid OR identifier = new.identifier;
    INSERT INTO transactions_fts(rowid, identifier, vendor, name)
    VALUES (new.rowid, new.identifier, new.vendor, new.name);
END;

CREATE TRIGGER IF NOT EXISTS transactions_fts_au AFTER UPDATE ON transactions BEGIN
    DELETE FROM transactions_fts WHERE rowid = old.rowid;
    DELETE FROM transactions_fts WHERE rowid = new.rowid OR identifier = new.identifier;
    INSERT INTO transactions_fts(rowid, identifier, vendor, name)
    VALUES (new.rowid, new.identifier, new.vendor, new.name);
END;

CREATE TRIGGER IF NOT EXISTS transactions_fts_ad AFTER DELETE ON transactions BEGIN
    DELETE FROM transactions_fts WHERE rowid = old.rowid;
END;
";

pub const REBUILD: &str = r"
DELETE FROM transactions_fts;
INSERT INTO transactions_fts(rowid, identifier, vendor, name)
SELECT rowid, identifier, vendor, name FROM transactions;
";

const TABLE_PROBE: &str = "SELECT name FROM sqlite_master WHERE name IN (?1, ?2)";

/// Which of the two tables already exist.
fn existing_tables(engine: &mut dyn SqliteEngine) -> Result<(bool, bool), StorageError> {
    let found = engine.all(
        TABLE_PROBE,
        &[
            RowValues::Text(PRIMARY_TABLE.into()),
            RowValues::Text(SHADOW_TABLE.into()),
        ],
    )?;
    let has = |table: &str| {
        found
            .rows
            .iter()
            .any(|row| row.get_by_index(0).and_then(RowValues::as_text) == Some(table))
    };
    Ok((has(PRIMARY_TABLE), has(SHADOW_TABLE)))
}

/// Create the shadow table and its triggers if missing.
///
/// Returns `false` without touching the schema when the primary table does not exist yet. A
/// freshly created shadow table is filled from the primary table.
///
/// # Errors
/// Returns the engine's error if any DDL fails.
pub fn install(engine: &mut dyn SqliteEngine) -> Result<bool, StorageError> {
    let (has_primary, has_shadow) = existing_tables(engine)?;
    if !has_primary {
        debug!("no {PRIMARY_TABLE} table yet; search index triggers not installed");
        return Ok(false);
    }
    engine.exec(CREATE_SHADOW_TABLE)?;
    engine.exec(CREATE_TRIGGERS)?;
    if !has_shadow {
        engine.exec(REBUILD)?;
        debug!("created {SHADOW_TABLE} and indexed existing rows");
    }
    Ok(true)
}

/// Repopulate the shadow table from scratch.
///
/// # Errors
/// Returns the engine's error if the rebuild fails.
pub fn rebuild(engine: &mut dyn SqliteEngine) -> Result<(), StorageError> {
    engine.exec(REBUILD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger_body(name: &str) -> &'static str {
        let start = CREATE_TRIGGERS.find(name).unwrap();
        let rest = &CREATE_TRIGGERS[start..];
        &rest[..rest.find("END;").unwrap()]
    }

    #[test]
    fn update_and_delete_triggers_delete_from_the_index() {
        for name in ["transactions_fts_au", "transactions_fts_ad"] {
            assert!(
                trigger_body(name).contains("DELETE FROM transactions_fts WHERE rowid = old.rowid"),
                "{name}"
            );
        }
        assert!(trigger_body("transactions_fts_au").contains("INSERT INTO transactions_fts"));
    }

    #[test]
    fn insert_and_update_drop_rows_replaced_by_conflict() {
        for name in ["transactions_fts_ai", "transactions_fts_au"] {
            assert!(
                trigger_body(name).contains(
                    "DELETE FROM transactions_fts \
                     WHERE rowid = new.rowid OR identifier = new.identifier"
                ),
                "{name}"
            );
        }
        assert!(!trigger_body("transactions_fts_ad").contains("new."));
    }

    #[test]
    fn no_incremental_fts_commands() {
        let compact: String = CREATE_TRIGGERS.split_whitespace().collect();
        assert!(!compact.contains("transactions_fts(transactions_fts"));
        assert!(!CREATE_TRIGGERS.contains("'delete'"));
    }

    #[test]
    fn every_statement_is_idempotent() {
        assert!(CREATE_SHADOW_TABLE.contains("IF NOT EXISTS"));
        assert_eq!(
            CREATE_TRIGGERS.matches("CREATE TRIGGER IF NOT EXISTS").count(),
            3
        );
    }
}
