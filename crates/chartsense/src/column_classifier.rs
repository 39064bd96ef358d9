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

use crate::config::ProfilingConfig;
use crate::value::{Value, ValueKind};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TIME_SERIES_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date|time|month|year|day").expect("static regex"));
static PERCENTAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)percent|%").expect("static regex"));
static IDENTIFIER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)id|key").expect("static regex"));

/// One slot per [`ValueKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindBreakdown<T> {
    pub number: T,
    pub string: T,
    pub date: T,
    pub boolean: T,
    pub object: T,
}

impl<T: Copy> KindBreakdown<T> {
    pub fn get(&self, kind: ValueKind) -> T {
        match kind {
            ValueKind::Number => self.number,
            ValueKind::String => self.string,
            ValueKind::Date => self.date,
            ValueKind::Boolean => self.boolean,
            ValueKind::Object => self.object,
        }
    }
    fn slot(&mut self, kind: ValueKind) -> &mut T {
        match kind {
            ValueKind::Number => &mut self.number,
            ValueKind::String => &mut self.string,
            ValueKind::Date => &mut self.date,
            ValueKind::Boolean => &mut self.boolean,
            ValueKind::Object => &mut self.object,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnalysis {
    pub type_counts: KindBreakdown<usize>,
    pub type_percentages: KindBreakdown<f64>,
    /// `None` when the column has no non-empty values.
    pub primary_type: Option<ValueKind>,
    pub is_homogeneous: bool,
    pub is_mixed: bool,
}

impl TypeAnalysis {
    pub fn is_primary(&self, kind: ValueKind) -> bool {
        self.primary_type == Some(kind)
    }
    pub fn kinds_present(&self) -> Vec<ValueKind> {
        ValueKind::ALL
            .into_iter()
            .filter(|k| self.type_counts.get(*k) > 0)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPatterns {
    pub is_time_series: bool,
    pub is_categorical: bool,
    pub is_percentage: bool,
    pub is_identifier: bool,
}

/// Classifies the non-empty values of one column. Empty values must be
/// filtered out by the caller.
pub fn classify_values(values: &[&Value], config: &ProfilingConfig) -> TypeAnalysis {
    let mut type_counts = KindBreakdown::<usize>::default();
    for value in values {
        *type_counts.slot(value.kind()) += 1;
    }
    let total = values.len();
    let mut type_percentages = KindBreakdown::<f64>::default();
    for kind in ValueKind::ALL {
        *type_percentages.slot(kind) = percentage(type_counts.get(kind), total);
    }
    // max_by_key keeps the last maximum, so walk the kinds in reverse to let
    // the earliest kind win ties.
    let primary_type = ValueKind::ALL
        .into_iter()
        .rev()
        .filter(|k| type_counts.get(*k) > 0)
        .max_by_key(|k| type_counts.get(*k));
    let is_homogeneous = primary_type
        .is_some_and(|k| type_counts.get(k) as f64 / total as f64 > config.homogeneity_threshold);
    let is_mixed = ValueKind::ALL
        .into_iter()
        .filter(|k| type_counts.get(*k) > 0)
        .count()
        > 1;
    TypeAnalysis {
        type_counts,
        type_percentages,
        primary_type,
        is_homogeneous,
        is_mixed,
    }
}

pub fn count_unique(values: &[&Value]) -> usize {
    values.iter().map(|v| v.unique_key()).unique().count()
}

/// Name- and distribution-based hints, independent of the type verdict.
pub fn detect_patterns(
    name: &str,
    non_empty_count: usize,
    unique_count: usize,
    config: &ProfilingConfig,
) -> ColumnPatterns {
    let categorical_ceiling = (config.max_categorical_unique as f64)
        .min(non_empty_count as f64 * config.categorical_unique_ratio);
    ColumnPatterns {
        is_time_series: TIME_SERIES_NAME.is_match(name),
        is_categorical: unique_count >= 2 && unique_count as f64 <= categorical_ceiling,
        is_percentage: PERCENTAGE_NAME.is_match(name),
        is_identifier: IDENTIFIER_NAME.is_match(name)
            || (non_empty_count > 0 && unique_count == non_empty_count),
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
