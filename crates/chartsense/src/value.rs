// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Loosely typed cell values as handed over by file parsers.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One record of a dataset, keyed by column name in source order.
pub type Row = IndexMap<String, Value>;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Other(serde_json::Value),
}

/// Semantic bucket a single value falls into. Declaration order is the
/// tie-break order used when picking a column's primary type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    String,
    Date,
    Boolean,
    Object,
}

impl ValueKind {
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Date,
        ValueKind::Boolean,
        ValueKind::Object,
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hashable identity of a value, used for distinct counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    Null,
    Bool(bool),
    Number(u64),
    Text(&'a str),
    Date(NaiveDateTime),
    Other(String),
}

/// The one numeric coercion rule shared by classification and statistics.
///
/// | input                                   | result         |
/// |-----------------------------------------|----------------|
/// | `Number(n)`, `n` finite                 | `Some(n)`      |
/// | `Number(n)`, `n` NaN or infinite        | `None`         |
/// | `Text(s)`, `s.trim()` parses to finite  | `Some(parsed)` |
/// | `Text(s)` otherwise (incl. blank)       | `None`         |
/// | `Bool`, `Date`, `Null`, `Other`         | `None`         |
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        numeric_value(self)
    }
    /// Dates and booleans are checked before numeric coercion so a typed
    /// date never lands in the numeric bucket.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Date(_) => ValueKind::Date,
            Value::Bool(_) => ValueKind::Boolean,
            other if numeric_value(other).is_some() => ValueKind::Number,
            Value::Text(_) => ValueKind::String,
            _ => ValueKind::Object,
        }
    }
    pub fn unique_key(&self) -> ValueKey<'_> {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            // -0.0 and 0.0 are the same distinct value
            Value::Number(n) if *n == 0.0 => ValueKey::Number(0f64.to_bits()),
            Value::Number(n) => ValueKey::Number(n.to_bits()),
            Value::Text(s) => ValueKey::Text(s.as_str()),
            Value::Date(d) => ValueKey::Date(*d),
            Value::Other(v) => ValueKey::Other(v.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Reads a cell, treating a missing key as empty.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}

/// Builds a row from `(column, value)` pairs, keeping their order.
pub fn row_from<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl DatasetMeta {
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            filename: None,
            columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }
    /// Explicit column list when one was given, otherwise the first row's keys.
    pub fn resolve_columns(&self, rows: &[Row]) -> Vec<String> {
        match &self.columns {
            Some(cols) if !cols.is_empty() => cols.clone(),
            _ => rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn coercion_truth_table() {
        assert_eq!(numeric_value(&Value::Number(3.5)), Some(3.5));
        assert_eq!(numeric_value(&Value::Number(f64::NAN)), None);
        assert_eq!(numeric_value(&Value::Number(f64::INFINITY)), None);
        assert_eq!(numeric_value(&Value::from(" 42 ")), Some(42.0));
        assert_eq!(numeric_value(&Value::from("1e3")), Some(1000.0));
        assert_eq!(numeric_value(&Value::from("   ")), None);
        assert_eq!(numeric_value(&Value::from("abc")), None);
        assert_eq!(numeric_value(&Value::from("inf")), None);
        assert_eq!(numeric_value(&Value::Bool(true)), None);
        assert_eq!(numeric_value(&Value::Null), None);
    }

    #[test]
    fn kinds() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::from("12").kind(), ValueKind::Number);
        assert_eq!(Value::from("twelve").kind(), ValueKind::String);
        assert_eq!(Value::Date(date).kind(), ValueKind::Date);
        assert_eq!(Value::Bool(false).kind(), ValueKind::Boolean);
        assert_eq!(Value::Other(serde_json::json!({"a": 1})).kind(), ValueKind::Object);
        assert_eq!(Value::Number(f64::NAN).kind(), ValueKind::Object);
    }

    #[test]
    fn empty_values() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::from("  ").is_empty());
        assert!(!Value::from("0").is_empty());
        assert!(!Value::Number(0.0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn json_rows_deserialize_untagged() {
        let row: Row =
            serde_json::from_str(r#"{"a": 1, "b": "x", "c": null, "d": true, "e": [1]}"#).unwrap();
        assert_eq!(row["a"], Value::Number(1.0));
        assert_eq!(row["b"], Value::Text("x".into()));
        assert_eq!(row["c"], Value::Null);
        assert_eq!(row["d"], Value::Bool(true));
        assert!(matches!(row["e"], Value::Other(_)));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn missing_cells_read_as_null() {
        let row = row_from([("a", 1)]);
        assert_eq!(cell(&row, "b"), &Value::Null);
    }

    #[test]
    fn negative_zero_is_not_distinct() {
        assert_eq!(Value::Number(-0.0).unique_key(), Value::Number(0.0).unique_key());
        assert_ne!(Value::Number(1.0).unique_key(), Value::from("1").unique_key());
    }

    #[test]
    fn resolve_columns_prefers_explicit_list() {
        let rows = vec![row_from([("x", 1), ("y", 2)])];
        assert_eq!(DatasetMeta::default().resolve_columns(&rows), vec!["x", "y"]);
        assert_eq!(
            DatasetMeta::with_columns(["y"]).resolve_columns(&rows),
            vec!["y"]
        );
        assert_eq!(
            DatasetMeta::with_columns(Vec::<String>::new()).resolve_columns(&rows),
            vec!["x", "y"]
        );
    }
}
