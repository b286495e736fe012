//! Column classification.

use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Partitions table columns into numeric and non-numeric sets.
pub struct ColumnClassifier;

impl ColumnClassifier {
    /// Names of the columns whose runtime dtype is numeric (integer or
    /// float), in the table's original column order.
    ///
    /// Never fails; a table with no numeric columns yields an empty set,
    /// which downstream stages treat as a skip condition.
    pub fn classify(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_mixed_table() {
        let df = df![
            "name" => ["a", "b"],
            "age" => [30i64, 40],
            "score" => [1.5f64, 2.5],
            "active" => [true, false],
        ]
        .unwrap();

        let numeric = ColumnClassifier::classify(&df);
        assert_eq!(numeric, vec!["age".to_string(), "score".to_string()]);
    }

    #[test]
    fn test_classify_preserves_column_order() {
        let df = df![
            "z" => [1.0, 2.0],
            "label" => ["x", "y"],
            "a" => [3i64, 4],
        ]
        .unwrap();

        let numeric = ColumnClassifier::classify(&df);
        assert_eq!(numeric, vec!["z".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_classify_no_numeric_columns() {
        let df = df![
            "name" => ["a", "b"],
            "city" => ["x", "y"],
        ]
        .unwrap();

        assert!(ColumnClassifier::classify(&df).is_empty());
    }

    #[test]
    fn test_classify_includes_columns_with_missing_values() {
        let df = df![
            "v" => [Some(1.0), None],
        ]
        .unwrap();

        assert_eq!(ColumnClassifier::classify(&df), vec!["v".to_string()]);
    }
}
