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

use crate::column_classifier::{
    classify_values, count_unique, detect_patterns, percentage, ColumnPatterns, TypeAnalysis,
};
use crate::column_stats::{calculate_numeric_stats, ColumnStats};
use crate::config::ProfilingConfig;
use crate::error::{DataError, DataResult};
use crate::value::{cell, Row, Value, ValueKind};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Column analyses keyed by column name, in column order.
pub type ColumnAnalysisMap = IndexMap<String, ColumnAnalysis>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAnalysis {
    pub name: String,
    pub total_values: usize,
    pub non_empty_values: usize,
    pub empty_count: usize,
    pub empty_percentage: f64,
    pub type_analysis: TypeAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ColumnStats>,
    pub patterns: ColumnPatterns,
    pub is_chartable: bool,
    pub is_categorical: bool,
    pub unique_values: usize,
    pub unique_percentage: f64,
}

impl ColumnAnalysis {
    pub fn primary_type(&self) -> Option<ValueKind> {
        self.type_analysis.primary_type
    }
    pub fn is_numeric(&self) -> bool {
        self.is_chartable && self.type_analysis.is_primary(ValueKind::Number)
    }
    pub fn is_date(&self) -> bool {
        self.is_chartable && self.type_analysis.is_primary(ValueKind::Date)
    }
    /// Mixed content with no dominant type, worth warning about.
    pub fn has_type_conflict(&self) -> bool {
        self.type_analysis.is_mixed && !self.type_analysis.is_homogeneous
    }
}

pub struct DataProfiler {
    config: ProfilingConfig,
}
impl DataProfiler {
    pub fn new() -> Self {
        Self {
            config: ProfilingConfig::default(),
        }
    }
    pub fn with_config(config: ProfilingConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ProfilingConfig {
        &self.config
    }
    /// Analyses every listed column over `rows`. Missing cells count as empty.
    pub fn profile_rows(&self, rows: &[Row], columns: &[String]) -> DataResult<ColumnAnalysisMap> {
        if columns.is_empty() {
            return Err(DataError::NoColumns);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(DataError::DuplicateColumn {
                column: dup.clone(),
            });
        }
        debug!(
            rows = rows.len(),
            columns = columns.len(),
            parallel = self.config.parallel_columns,
            "profiling dataset"
        );
        let analyses: Vec<ColumnAnalysis> = if self.config.parallel_columns {
            columns
                .par_iter()
                .map(|name| self.profile_column(rows, name))
                .collect()
        } else {
            columns
                .iter()
                .map(|name| self.profile_column(rows, name))
                .collect()
        };
        Ok(analyses
            .into_iter()
            .map(|analysis| (analysis.name.clone(), analysis))
            .collect())
    }
    pub fn profile_column(&self, rows: &[Row], name: &str) -> ColumnAnalysis {
        let non_empty: Vec<&Value> = rows
            .iter()
            .map(|row| cell(row, name))
            .filter(|v| !v.is_empty())
            .collect();
        self.analyse_values(name, rows.len(), &non_empty)
    }
    fn analyse_values(
        &self,
        name: &str,
        total_values: usize,
        non_empty: &[&Value],
    ) -> ColumnAnalysis {
        let non_empty_values = non_empty.len();
        let empty_count = total_values - non_empty_values;
        let type_analysis = classify_values(non_empty, &self.config);
        let stats = if type_analysis.is_primary(ValueKind::Number) {
            calculate_numeric_stats(non_empty)
        } else {
            None
        };
        let unique_values = count_unique(non_empty);
        let patterns = detect_patterns(name, non_empty_values, unique_values, &self.config);
        let is_chartable = matches!(
            type_analysis.primary_type,
            Some(ValueKind::Number | ValueKind::Date)
        );
        let is_categorical = matches!(
            type_analysis.primary_type,
            Some(ValueKind::String | ValueKind::Boolean)
        );
        ColumnAnalysis {
            name: name.to_string(),
            total_values,
            non_empty_values,
            empty_count,
            empty_percentage: percentage(empty_count, total_values),
            type_analysis,
            stats,
            patterns,
            is_chartable,
            is_categorical,
            unique_values,
            unique_percentage: percentage(unique_values, non_empty_values),
        }
    }
}
impl Default for DataProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Quick pre-check used before full validation: does the first row hold
/// any value that coerces to a number?
pub fn first_row_has_numeric(rows: &[Row]) -> bool {
    rows.first()
        .is_some_and(|row| row.values().any(|v| v.as_number().is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row_from;

    fn sales_rows() -> Vec<Row> {
        vec![
            row_from([("Month", Value::from("Jan")), ("Sales", Value::from(1200))]),
            row_from([("Month", Value::from("Feb")), ("Sales", Value::from("1500"))]),
            row_from([("Month", Value::from("Mar")), ("Sales", Value::Null)]),
            row_from([("Month", Value::from("Mar"))]),
        ]
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn profiles_every_column_in_order() {
        let map = DataProfiler::new()
            .profile_rows(&sales_rows(), &columns(&["Sales", "Month"]))
            .unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Sales", "Month"]);

        let sales = &map["Sales"];
        assert_eq!(sales.total_values, 4);
        assert_eq!(sales.non_empty_values, 2);
        assert_eq!(sales.empty_count, 2);
        assert_eq!(sales.empty_percentage, 50.0);
        assert!(sales.is_numeric());
        assert!(!sales.is_categorical);
        let stats = sales.stats.as_ref().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.sum, 2700.0);

        let month = &map["Month"];
        assert_eq!(month.primary_type(), Some(ValueKind::String));
        assert!(month.is_categorical);
        assert!(!month.is_chartable);
        assert!(month.stats.is_none());
        assert_eq!(month.unique_values, 3);
        assert_eq!(month.unique_percentage, 75.0);
        assert!(month.patterns.is_time_series);
    }

    #[test]
    fn all_empty_column_is_neither_chartable_nor_categorical() {
        let rows = vec![row_from([("x", Value::Null)]), row_from([("x", "")])];
        let map = DataProfiler::new().profile_rows(&rows, &columns(&["x"])).unwrap();
        let x = &map["x"];
        assert_eq!(x.primary_type(), None);
        assert!(!x.is_chartable);
        assert!(!x.is_categorical);
        assert_eq!(x.empty_percentage, 100.0);
        assert_eq!(x.unique_percentage, 0.0);
    }

    #[test]
    fn rejects_bad_column_lists() {
        let profiler = DataProfiler::new();
        assert!(matches!(
            profiler.profile_rows(&sales_rows(), &[]),
            Err(DataError::NoColumns)
        ));
        assert!(matches!(
            profiler.profile_rows(&sales_rows(), &columns(&["Sales", "Sales"])),
            Err(DataError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn parallel_profiling_matches_sequential() {
        let cols = columns(&["Month", "Sales"]);
        let sequential = DataProfiler::new().profile_rows(&sales_rows(), &cols).unwrap();
        let parallel = DataProfiler::with_config(ProfilingConfig {
            parallel_columns: true,
            ..Default::default()
        })
        .profile_rows(&sales_rows(), &cols)
        .unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(
            sequential.keys().collect::<Vec<_>>(),
            parallel.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn first_row_numeric_check() {
        assert!(first_row_has_numeric(&sales_rows()));
        assert!(!first_row_has_numeric(&[row_from([("a", "x")])]));
        assert!(!first_row_has_numeric(&[]));
    }
}
