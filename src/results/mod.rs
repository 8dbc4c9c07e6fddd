mod result_set;
mod row;

pub use result_set::QueryResult;
pub use row::Row;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;
    use serde_json::json;

    #[test]
    fn rows_resolve_columns_by_name() {
        let result = QueryResult::from_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![RowValues::Int(1), RowValues::Text("rent".into())],
                vec![RowValues::Int(2), RowValues::Null],
            ],
        );
        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[0].get("name"), Some(&RowValues::Text("rent".into())));
        assert_eq!(result.rows[1].get("id"), Some(&RowValues::Int(2)));
        assert_eq!(result.rows[1].get("missing"), None);
    }

    #[test]
    fn serializes_rows_and_count() {
        let result = QueryResult::from_rows(vec!["id".into()], vec![vec![RowValues::Int(1)]]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"rows": [{"id": 1}], "rowCount": 1})
        );
        assert_eq!(
            serde_json::to_value(QueryResult::affected(3)).unwrap(),
            json!({"rows": [], "rowCount": 3})
        );
    }
}
