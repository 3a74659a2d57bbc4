//! Tabular result sets.
//!
//! A [`Table`] is an ordered list of column names plus rows of JSON values.
//! Raw statement results come back as tables, and the final catalog is
//! rendered into one.

use serde::Serialize;
use serde_json::{Map, Value};

/// An ordered, uniformly-shaped result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with nulls, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Builder-style [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.push_row(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate rows as borrowed views with by-name lookup.
    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(move |values| RowRef {
            table: self,
            values,
        })
    }

    /// First row, if any.
    pub fn first(&self) -> Option<RowRef<'_>> {
        self.iter().next()
    }

    /// Rows as ordered JSON objects.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.iter().map(|row| row.to_record()).collect()
    }
}

/// A borrowed row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Value of a column, `None` if the table has no such column.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.column_index(column).map(|i| &self.values[i])
    }

    /// String value of a column. Null or missing yields `None`.
    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Integer value of a column, accepting integral floats and numeric strings.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float value of a column, accepting numeric strings.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value of a column, accepting Postgres text forms (`t`, `f`).
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        match self.get(column)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "t" | "true" | "TRUE" | "Y" | "y" => Some(true),
                "f" | "false" | "FALSE" | "N" | "n" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// This row as an ordered JSON object.
    pub fn to_record(&self) -> Map<String, Value> {
        self.table
            .columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::new(["name", "n", "flag"])
            .with_row(vec![json!("orders"), json!(3), json!("t")])
            .with_row(vec![json!("users")])
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1], vec![json!("users"), Value::Null, Value::Null]);
    }

    #[test]
    fn test_typed_getters() {
        let t = sample();
        let row = t.first().unwrap();
        assert_eq!(row.get_str("name"), Some("orders"));
        assert_eq!(row.get_i64("n"), Some(3));
        assert_eq!(row.get_f64("n"), Some(3.0));
        assert_eq!(row.get_bool("flag"), Some(true));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_records_keep_column_order() {
        let t = sample();
        let records = t.to_records();
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["name", "n", "flag"]);
    }
}
