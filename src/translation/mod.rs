use std::borrow::Cow;

mod classify;
mod scanner;

pub use classify::{StatementKind, TransactionControl, classify};

use crate::error::StorageError;
use crate::types::{Params, RowValues};

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`; SQL is forwarded unchanged.
    Postgres,
    /// SQLite-style numbered placeholders like `?1`.
    Sqlite,
}

/// A statement ready for an engine: native placeholders, normalized parameters, and the
/// execution path it must take.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
    pub kind: StatementKind,
}

/// Rewrite `$N` placeholders to `?N` for SQLite.
///
/// Placeholders inside quoted strings, comments, and dollar-quoted blocks are left alone. The
/// numbering is kept, so a repeated `$1` still binds the first value. Returns a borrowed `Cow`
/// when nothing changes.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    if target == PlaceholderStyle::Postgres {
        return Cow::Borrowed(sql);
    }
    let found = scanner::placeholders(sql);
    if found.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for placeholder in found {
        let (start, end) = placeholder.span;
        out.push_str(&sql[last..start]);
        out.push('?');
        out.push_str(&sql[start + 1..end]);
        last = end;
    }
    out.push_str(&sql[last..]);
    Cow::Owned(out)
}

/// Highest `$N` index referenced by executable text, if any.
#[must_use]
pub fn highest_placeholder(sql: &str) -> Option<usize> {
    scanner::placeholders(sql).iter().map(|p| p.index).max()
}

/// Classify, validate, and translate one statement.
///
/// Transaction control passes through untouched with no parameters. Otherwise, when the text
/// contains `$N` placeholders, `params` must be [`Params::Positional`] with at least as many
/// values as the highest index; shortfalls are never padded and surplus values are dropped.
/// Text without placeholders binds nothing.
///
/// # Errors
/// Returns `StorageError::ParameterShape` or `StorageError::ParameterCount` before any engine is
/// touched.
pub fn prepare_statement(
    sql: &str,
    params: Params,
    target: PlaceholderStyle,
) -> Result<PreparedStatement, StorageError> {
    let trimmed = sql.trim();
    let kind = classify(trimmed);

    if let StatementKind::TransactionControl(_) = kind {
        return Ok(PreparedStatement {
            sql: trimmed.to_owned(),
            params: Vec::new(),
            kind,
        });
    }

    let Some(highest) = highest_placeholder(trimmed) else {
        // nothing to bind; both engines reject surplus values
        return Ok(PreparedStatement {
            sql: trimmed.to_owned(),
            params: Vec::new(),
            kind,
        });
    };

    let mut values = match params {
        Params::Positional(values) => values,
        other => {
            return Err(StorageError::ParameterShape(format!(
                "positional parameters require an ordered list, got {}",
                other.shape()
            )));
        }
    };
    if values.len() < highest {
        return Err(StorageError::ParameterCount {
            highest,
            supplied: values.len(),
        });
    }
    // both engines bind exactly as many values as the highest index
    values.truncate(highest);

    Ok(PreparedStatement {
        sql: translate_placeholders(trimmed, target).into_owned(),
        params: normalize(values, target),
        kind,
    })
}

fn normalize(values: Vec<RowValues>, target: PlaceholderStyle) -> Vec<RowValues> {
    match target {
        PlaceholderStyle::Sqlite => values.into_iter().map(RowValues::normalize_bool).collect(),
        PlaceholderStyle::Postgres => values,
    }
}
