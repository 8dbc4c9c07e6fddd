use std::sync::Arc;

use serde::Serialize;

use super::row::Row;
use crate::types::RowValues;

/// Uniform result of a `query` call.
///
/// * reads and `RETURNING` mutations: `row_count == rows.len()`
/// * plain mutations: `rows` is empty, `row_count` is the engine's affected-row count
/// * transaction control: both empty
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    #[serde(skip)]
    column_names: Option<Arc<Vec<String>>>,
}

impl QueryResult {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            row_count: 0,
            column_names: None,
        }
    }

    /// Result of a statement that produces no rows.
    #[must_use]
    pub fn affected(row_count: usize) -> Self {
        Self {
            rows: Vec::new(),
            row_count,
            column_names: None,
        }
    }

    /// Build a row-producing result from column names and raw values.
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> Self {
        let mut result = Self::with_capacity(rows.len());
        result.set_column_names(Arc::new(column_names));
        for values in rows {
            result.add_row_values(values);
        }
        result
    }

    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row; `row_count` tracks the number of rows held.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        let names = self
            .column_names
            .get_or_insert_with(|| Arc::new(Vec::new()))
            .clone();
        self.rows.push(Row::new(names, values));
        self.row_count = self.rows.len();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.row_count == 0
    }
}
