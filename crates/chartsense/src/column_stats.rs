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

use crate::value::{numeric_value, Value};
use serde::{Deserialize, Serialize};

pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    /// Upper-middle element for even counts, not the average of the two
    /// middle elements. Downstream consumers rely on this exact value.
    pub median: f64,
    pub range: f64,
    pub q25: f64,
    pub q75: f64,
    pub outlier_count: usize,
    pub has_negatives: bool,
    pub has_decimals: bool,
    pub is_all_positive: bool,
    pub is_all_integers: bool,
}

/// Statistics over the values that coerce to numbers. Returns `None` when
/// nothing coerces, never a zero-filled record.
pub fn calculate_numeric_stats(values: &[&Value]) -> Option<ColumnStats> {
    let numbers: Vec<f64> = values.iter().filter_map(|v| numeric_value(v)).collect();
    stats_for_numbers(&numbers)
}

pub fn stats_for_numbers(numbers: &[f64]) -> Option<ColumnStats> {
    if numbers.is_empty() {
        return None;
    }
    let sorted = sorted_copy(numbers);
    let count = sorted.len();
    let min = sorted[0];
    let max = sorted[count - 1];
    let sum: f64 = numbers.iter().sum();
    let q25 = quantile(&sorted, 0.25)?;
    let q75 = quantile(&sorted, 0.75)?;
    let (lower, upper) = iqr_fences(q25, q75);
    Some(ColumnStats {
        count,
        min,
        max,
        sum,
        mean: sum / count as f64,
        median: sorted[count / 2],
        range: max - min,
        q25,
        q75,
        outlier_count: numbers.iter().filter(|&&v| v < lower || v > upper).count(),
        has_negatives: numbers.iter().any(|&v| v < 0.0),
        has_decimals: numbers.iter().any(|&v| v.fract() != 0.0),
        is_all_positive: numbers.iter().all(|&v| v > 0.0),
        is_all_integers: numbers.iter().all(|&v| v.fract() == 0.0),
    })
}

pub fn sorted_copy(numbers: &[f64]) -> Vec<f64> {
    let mut sorted = numbers.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolated quantile of already sorted values, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        1 => Some(sorted[0]),
        _ => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (rank.ceil() as usize).min(n - 1);
            let frac = rank - lower as f64;
            Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
        }
    }
}

/// `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`
pub fn iqr_fences(q25: f64, q75: f64) -> (f64, f64) {
    let iqr = q75 - q25;
    (
        q25 - IQR_FENCE_MULTIPLIER * iqr,
        q75 + IQR_FENCE_MULTIPLIER * iqr,
    )
}
