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

//! Dataset-level gates deciding which chart families are worth scoring.

use crate::data_profiler::ColumnAnalysisMap;
use serde::{Deserialize, Serialize};

pub const MIN_LINE_ROWS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartCompatibility {
    pub row_count: usize,
    pub numeric_count: usize,
    pub categorical_count: usize,
    pub date_count: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub has_numeric_data: bool,
    pub has_categories: bool,
    pub has_dates: bool,
    pub is_bar_chart_candidate: bool,
    pub is_line_chart_candidate: bool,
    pub is_pie_chart_candidate: bool,
    pub is_time_series_candidate: bool,
}

/// Reduces per-column analyses to candidacy flags. The flags are necessary
/// conditions only; the suggestion rules apply the final checks.
pub fn assess_compatibility(analysis: &ColumnAnalysisMap, row_count: usize) -> ChartCompatibility {
    let mut numeric_columns = Vec::new();
    let mut categorical_columns = Vec::new();
    let mut date_columns = Vec::new();
    for (name, column) in analysis {
        if column.is_numeric() {
            numeric_columns.push(name.clone());
        }
        if column.is_categorical {
            categorical_columns.push(name.clone());
        }
        if column.is_date() {
            date_columns.push(name.clone());
        }
    }
    let has_numeric_data = !numeric_columns.is_empty();
    let has_categories = !categorical_columns.is_empty();
    let has_dates = !date_columns.is_empty();
    ChartCompatibility {
        row_count,
        numeric_count: numeric_columns.len(),
        categorical_count: categorical_columns.len(),
        date_count: date_columns.len(),
        has_numeric_data,
        has_categories,
        has_dates,
        is_bar_chart_candidate: (has_categories || has_dates) && has_numeric_data,
        is_line_chart_candidate: row_count >= MIN_LINE_ROWS && has_numeric_data,
        is_pie_chart_candidate: has_categories && has_numeric_data,
        is_time_series_candidate: has_dates && has_numeric_data,
        numeric_columns,
        categorical_columns,
        date_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_profiler::DataProfiler;
    use crate::value::{row_from, Row, Value};
    use chrono::NaiveDate;

    fn assess(rows: &[Row]) -> ChartCompatibility {
        let columns: Vec<String> = rows[0].keys().cloned().collect();
        let map = DataProfiler::new().profile_rows(rows, &columns).unwrap();
        assess_compatibility(&map, rows.len())
    }

    fn day(d: u32) -> Value {
        Value::Date(
            NaiveDate::from_ymd_opt(2024, 3, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn categories_and_numbers() {
        let rows = vec![
            row_from([("region", Value::from("north")), ("sales", Value::from(3))]),
            row_from([("region", Value::from("south")), ("sales", Value::from(5))]),
            row_from([("region", Value::from("east")), ("sales", Value::from(8))]),
        ];
        let c = assess(&rows);
        assert!(c.has_numeric_data);
        assert!(c.is_bar_chart_candidate);
        assert!(c.is_line_chart_candidate);
        assert!(c.is_pie_chart_candidate);
        assert!(!c.is_time_series_candidate);
        assert_eq!(c.numeric_columns, vec!["sales"]);
        assert_eq!(c.categorical_columns, vec!["region"]);
    }

    #[test]
    fn typed_dates_enable_time_series() {
        let rows = vec![
            row_from([("when", day(1)), ("v", Value::from(1))]),
            row_from([("when", day(2)), ("v", Value::from(2))]),
        ];
        let c = assess(&rows);
        assert!(c.has_dates);
        assert!(c.is_time_series_candidate);
        assert!(c.is_bar_chart_candidate);
        assert!(!c.is_line_chart_candidate, "two rows are too few for a line");
        assert!(!c.is_pie_chart_candidate);
    }

    #[test]
    fn no_numbers_gates_everything() {
        let rows = vec![
            row_from([("name", "John"), ("city", "NYC")]),
            row_from([("name", "Jane"), ("city", "LA")]),
        ];
        let c = assess(&rows);
        assert!(!c.has_numeric_data);
        assert!(!c.is_bar_chart_candidate);
        assert!(!c.is_line_chart_candidate);
        assert!(!c.is_pie_chart_candidate);
        assert_eq!(c.categorical_count, 2);
    }
}
