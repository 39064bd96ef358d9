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

//! Reads CSV, JSON and Parquet files into rows for the engine.

use crate::error::{DataError, DataResult};
use crate::value::{DatasetMeta, Row, Value};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
    JsonLines,
    Parquet,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> DataResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            "jsonl" | "ndjson" => Ok(DataFormat::JsonLines),
            "parquet" | "pq" => Ok(DataFormat::Parquet),
            other => Err(DataError::UnsupportedFormat {
                format: if other.is_empty() {
                    "(no extension)".to_string()
                } else {
                    other.to_string()
                },
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub rows: Vec<Row>,
    pub meta: DatasetMeta,
}

pub struct DataLoader {
    try_parse_dates: bool,
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            try_parse_dates: true,
        }
    }
    /// Leave date-like CSV text as strings instead of typed dates.
    pub fn without_date_parsing() -> Self {
        Self {
            try_parse_dates: false,
        }
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> DataResult<LoadedDataset> {
        let path = path.as_ref();
        let format = DataFormat::from_path(path)?;
        let df = self.read_frame(path, format)?;
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let rows = dataframe_to_rows(&df)?;
        debug!(rows = rows.len(), columns = columns.len(), ?format, "loaded data file");
        Ok(LoadedDataset {
            rows,
            meta: DatasetMeta {
                filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                columns: Some(columns),
            },
        })
    }

    pub fn read_frame(&self, path: &Path, format: DataFormat) -> DataResult<DataFrame> {
        let display = path.display().to_string();
        let frame_error = |source: PolarsError| DataError::DataFileError {
            path: display.clone(),
            source,
        };
        let open = || {
            File::open(path).map_err(|source| DataError::FileOpenError {
                path: display.clone(),
                source,
            })
        };
        let frame = match format {
            DataFormat::Csv => {
                // surface a missing file as an open error, not a polars one
                open()?;
                let separator = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
                {
                    b'\t'
                } else {
                    b','
                };
                let try_parse_dates = self.try_parse_dates;
                CsvReadOptions::default()
                    .with_has_header(true)
                    .map_parse_options(|opts| {
                        opts.with_separator(separator)
                            .with_try_parse_dates(try_parse_dates)
                    })
                    .try_into_reader_with_file_path(Some(PathBuf::from(path)))
                    .and_then(|reader| reader.finish())
            }
            DataFormat::Json => JsonReader::new(open()?).finish(),
            DataFormat::JsonLines => JsonReader::new(open()?)
                .with_json_format(JsonFormat::JsonLines)
                .finish(),
            DataFormat::Parquet => ParquetReader::new(open()?).finish(),
        };
        match frame {
            // zero-byte input is an empty dataset, reported downstream as such
            Err(PolarsError::NoData(reason)) => {
                debug!(%reason, "data file is empty");
                Ok(DataFrame::empty())
            }
            other => other.map_err(frame_error),
        }
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a frame cell by cell, keeping column order within each row.
pub fn dataframe_to_rows(df: &DataFrame) -> DataResult<Vec<Row>> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|idx| {
            columns
                .iter()
                .map(|column| {
                    let any = column.get(idx).map_err(|source| DataError::CellError {
                        column: column.name().to_string(),
                        row: idx,
                        source,
                    })?;
                    Ok((column.name().to_string(), any_value_to_value(any)))
                })
                .collect::<DataResult<Row>>()
        })
        .collect()
}

pub fn any_value_to_value(any: AnyValue<'_>) -> Value {
    match any {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        AnyValue::Date(days) => date_from_days(days).map_or(Value::Null, Value::Date),
        AnyValue::Datetime(ts, unit, _) => {
            datetime_from(ts, unit).map_or(Value::Null, Value::Date)
        }
        AnyValue::DatetimeOwned(ts, unit, _) => {
            datetime_from(ts, unit).map_or(Value::Null, Value::Date)
        }
        nested @ (AnyValue::List(_)
        | AnyValue::Array(..)
        | AnyValue::Struct(..)
        | AnyValue::StructOwned(_)) => Value::Other(nested_to_json(nested)),
        other => match other.extract::<f64>() {
            Some(n) => Value::Number(n),
            None => Value::Text(other.to_string()),
        },
    }
}

/// JSON rendition of a cell, recursing into lists, arrays and structs.
fn nested_to_json(any: AnyValue<'_>) -> serde_json::Value {
    use serde_json::Value as Json;
    match any {
        AnyValue::Null => Json::Null,
        AnyValue::Boolean(b) => Json::Bool(b),
        AnyValue::String(s) => Json::String(s.to_string()),
        AnyValue::StringOwned(s) => Json::String(s.to_string()),
        AnyValue::List(series) | AnyValue::Array(series, _) => Json::Array(
            (0..series.len())
                .filter_map(|i| series.get(i).ok())
                .map(nested_to_json)
                .collect(),
        ),
        AnyValue::StructOwned(payload) => {
            let (values, fields) = *payload;
            Json::Object(
                fields
                    .iter()
                    .zip(values)
                    .map(|(field, value)| (field.name().to_string(), nested_to_json(value)))
                    .collect(),
            )
        }
        borrowed @ AnyValue::Struct(..) => nested_to_json(borrowed.into_static()),
        other => match other.extract::<f64>().and_then(serde_json::Number::from_f64) {
            Some(n) => Json::Number(n),
            None => Json::String(other.to_string()),
        },
    }
}

fn date_from_days(days: i32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|d| d.naive_utc())
}

fn datetime_from(ts: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ts)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ts)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(ts),
    };
    Some(dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn formats_by_extension() {
        let format = |name: &str| DataFormat::from_path(Path::new(name)).unwrap();
        assert_eq!(format("a.CSV"), DataFormat::Csv);
        assert_eq!(format("a.ndjson"), DataFormat::JsonLines);
        assert_eq!(format("a.parquet"), DataFormat::Parquet);
        assert!(matches!(
            DataFormat::from_path(Path::new("a.xlsx")),
            Err(DataError::UnsupportedFormat { format }) if format == "xlsx"
        ));
        assert!(DataFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn converts_any_values() {
        assert_eq!(any_value_to_value(AnyValue::Null), Value::Null);
        assert_eq!(any_value_to_value(AnyValue::Int64(7)), Value::Number(7.0));
        assert_eq!(any_value_to_value(AnyValue::Float32(1.5)), Value::Number(1.5));
        assert_eq!(any_value_to_value(AnyValue::Boolean(true)), Value::Bool(true));
        assert_eq!(any_value_to_value(AnyValue::String("x")), Value::from("x"));
        let day = NaiveDate::from_ymd_opt(1970, 1, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(any_value_to_value(AnyValue::Date(2)), Value::Date(day));
        let ms = 2 * 86_400_000;
        assert_eq!(
            any_value_to_value(AnyValue::Datetime(ms, TimeUnit::Milliseconds, None)),
            Value::Date(day)
        );
    }

    #[test]
    fn nested_cells_become_json() {
        let inner = Series::new("".into(), &[1i64, 2]);
        let cell = any_value_to_value(AnyValue::List(inner));
        assert_eq!(cell, Value::Other(serde_json::json!([1.0, 2.0])));
        assert_eq!(cell.kind(), crate::value::ValueKind::Object);

        let fields = vec![Field::new("k".into(), DataType::String)];
        let payload = Box::new((vec![AnyValue::StringOwned("v".into())], fields));
        assert_eq!(
            any_value_to_value(AnyValue::StructOwned(payload)),
            Value::Other(serde_json::json!({"k": "v"}))
        );
    }

    #[test]
    fn frame_rows_keep_column_order() {
        let df = df!(
            "b" => [Some(1i64), None],
            "a" => ["x", "y"],
        )
        .unwrap();
        let rows = dataframe_to_rows(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(rows[1]["b"], Value::Null);
        assert_eq!(rows[1]["a"], Value::from("y"));
    }
}
