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

//! Deterministic row reduction for rendering large datasets.

use crate::column_stats::{iqr_fences, quantile, sorted_copy};
use crate::config::SamplingConfig;
use crate::value::{cell, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingOptions {
    pub max_points: usize,
    pub preserve_pattern: bool,
    pub enable_sampling: bool,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::from_config(&SamplingConfig::default())
    }
}

impl SamplingOptions {
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self {
            max_points: config.default_max_points,
            preserve_pattern: true,
            enable_sampling: true,
        }
    }
    pub fn with_max_points(max_points: usize) -> Self {
        Self {
            max_points,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    None,
    Uniform,
    Intelligent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceHints {
    pub disable_animations: bool,
    pub use_downsampling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingResult {
    pub data: Vec<Row>,
    pub is_optimized: bool,
    pub original_size: usize,
    pub optimized_size: usize,
    pub sampling_method: SamplingMethod,
    pub performance: PerformanceHints,
    pub reduction_ratio: f64,
}

/// Row indices chosen by a sampling pass, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub method: SamplingMethod,
    pub indices: Vec<usize>,
}

pub struct DataSampler {
    config: SamplingConfig,
}

impl DataSampler {
    pub fn new() -> Self {
        Self {
            config: SamplingConfig::default(),
        }
    }
    pub fn with_config(config: SamplingConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn optimize(&self, rows: &[Row], options: &SamplingOptions) -> SamplingResult {
        let original_size = rows.len();
        let selection = self.select_indices(rows, options);
        let data: Vec<Row> = match selection.method {
            SamplingMethod::None => rows.to_vec(),
            _ => selection.indices.iter().map(|&i| rows[i].clone()).collect(),
        };
        let optimized_size = data.len();
        let reduction_ratio = if original_size == 0 {
            0.0
        } else {
            (original_size - optimized_size) as f64 / original_size as f64
        };
        SamplingResult {
            data,
            is_optimized: selection.method != SamplingMethod::None,
            original_size,
            optimized_size,
            sampling_method: selection.method,
            performance: self.performance_hints(original_size),
            reduction_ratio,
        }
    }

    pub fn performance_hints(&self, original_size: usize) -> PerformanceHints {
        PerformanceHints {
            disable_animations: original_size > self.config.animation_threshold,
            use_downsampling: original_size > self.config.large_dataset_threshold,
        }
    }

    /// Chooses which rows survive without cloning any of them.
    pub fn select_indices(&self, rows: &[Row], options: &SamplingOptions) -> Selection {
        let n = rows.len();
        let max_points = options.max_points.max(1);
        if !options.enable_sampling || n <= max_points {
            return Selection {
                method: SamplingMethod::None,
                indices: (0..n).collect(),
            };
        }
        let selection = if options.preserve_pattern && n > self.config.heavy_sampling_threshold {
            Selection {
                method: SamplingMethod::Intelligent,
                indices: self.intelligent_indices(rows, max_points),
            }
        } else {
            Selection {
                method: SamplingMethod::Uniform,
                indices: uniform_indices(n, max_points),
            }
        };
        debug!(
            original = n,
            kept = selection.indices.len(),
            method = ?selection.method,
            "sampled dataset"
        );
        selection
    }

    /// Endpoints, IQR outliers of the first numeric column, then uniform
    /// interior coverage. Requires `rows.len() > max_points`.
    fn intelligent_indices(&self, rows: &[Row], max_points: usize) -> Vec<usize> {
        let n = rows.len();
        let last = n - 1;
        if max_points == 1 {
            return vec![0];
        }
        let interior_slots = max_points - 2;
        let outlier_budget = ((interior_slots as f64 * self.config.outlier_share).floor() as usize)
            .min(interior_slots);
        let mut selected = BTreeSet::from([0, last]);
        let outliers = outlier_indices(rows, outlier_budget);
        selected.extend(outliers.iter().copied());

        let uniform_slots = interior_slots - outliers.len();
        let interior = last - 1;
        for j in 0..uniform_slots {
            selected.insert(1 + j * interior / uniform_slots);
        }
        // collisions with outliers leave gaps; fill from the front
        let mut next = 1;
        while selected.len() < max_points && next < last {
            selected.insert(next);
            next += 1;
        }
        selected.into_iter().collect()
    }
}

impl Default for DataSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// `floor(i * n / max_points)` for `i` in `0..max_points`; distinct when `n > max_points`.
pub fn uniform_indices(n: usize, max_points: usize) -> Vec<usize> {
    if max_points == 0 || n == 0 {
        return Vec::new();
    }
    if n <= max_points {
        return (0..n).collect();
    }
    (0..max_points).map(|i| i * n / max_points).collect()
}

/// First key of the first row whose value coerces to a number.
pub fn first_numeric_column(rows: &[Row]) -> Option<&str> {
    rows.first()?
        .iter()
        .find(|(_, v)| v.as_number().is_some())
        .map(|(k, _)| k.as_str())
}

/// Interior rows whose first-numeric-column value lies outside the IQR
/// fences, most extreme first, at most `budget` of them.
fn outlier_indices(rows: &[Row], budget: usize) -> Vec<usize> {
    if budget == 0 || rows.len() < 3 {
        return Vec::new();
    }
    let Some(column) = first_numeric_column(rows) else {
        return Vec::new();
    };
    let values: Vec<(usize, f64)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| cell(row, column).as_number().map(|v| (i, v)))
        .collect();
    let sorted = sorted_copy(&values.iter().map(|&(_, v)| v).collect::<Vec<_>>());
    let (Some(q25), Some(q75)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) else {
        return Vec::new();
    };
    let (lower, upper) = iqr_fences(q25, q75);
    let last = rows.len() - 1;
    let mut outliers: Vec<(usize, f64)> = values
        .into_iter()
        .filter(|&(i, v)| i != 0 && i != last && (v < lower || v > upper))
        .map(|(i, v)| (i, if v < lower { lower - v } else { v - upper }))
        .collect();
    outliers.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    outliers.truncate(budget);
    debug!(column, found = outliers.len(), budget, "kept outlier rows");
    outliers.into_iter().map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{row_from, Value};

    fn series(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| row_from([("i", Value::from(i as i64)), ("v", Value::from((i % 7) as i64))]))
            .collect()
    }

    #[test]
    fn small_or_disabled_is_untouched() {
        let sampler = DataSampler::new();
        let rows = series(10);
        let r = sampler.optimize(&rows, &SamplingOptions::with_max_points(10));
        assert_eq!(r.sampling_method, SamplingMethod::None);
        assert!(!r.is_optimized);
        assert_eq!(r.data, rows);
        assert_eq!(r.reduction_ratio, 0.0);

        let r = sampler.optimize(
            &series(2000),
            &SamplingOptions {
                max_points: 10,
                enable_sampling: false,
                ..Default::default()
            },
        );
        assert_eq!(r.optimized_size, 2000);
        assert!(r.performance.disable_animations);
        assert!(r.performance.use_downsampling);
    }

    #[test]
    fn uniform_uses_index_stride() {
        assert_eq!(uniform_indices(10, 4), vec![0, 2, 5, 7]);
        let r = DataSampler::new().optimize(&series(3000), &SamplingOptions::with_max_points(1000));
        assert_eq!(r.sampling_method, SamplingMethod::Uniform);
        assert_eq!(r.optimized_size, 1000);
        assert_eq!(r.data[1]["i"], Value::Number(3.0));
        assert!((r.reduction_ratio - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_pattern_means_uniform_even_when_heavy() {
        let options = SamplingOptions {
            max_points: 100,
            preserve_pattern: false,
            enable_sampling: true,
        };
        let s = DataSampler::new().select_indices(&series(6000), &options);
        assert_eq!(s.method, SamplingMethod::Uniform);
        assert_eq!(s.indices.len(), 100);
    }

    #[test]
    fn intelligent_keeps_endpoints_and_outliers() {
        let mut rows = series(6000);
        rows[1234].insert("i".into(), Value::from(1e9));
        let s = DataSampler::new().select_indices(&rows, &SamplingOptions::with_max_points(200));
        assert_eq!(s.method, SamplingMethod::Intelligent);
        assert_eq!(s.indices.len(), 200);
        assert_eq!(s.indices[0], 0);
        assert_eq!(*s.indices.last().unwrap(), 5999);
        assert!(s.indices.contains(&1234));
        assert!(s.indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn tiny_budgets() {
        let rows = series(6000);
        let sampler = DataSampler::new();
        let one = sampler.select_indices(&rows, &SamplingOptions::with_max_points(0));
        assert_eq!(one.indices, vec![0]);
        let two = sampler.select_indices(&rows, &SamplingOptions::with_max_points(2));
        assert_eq!(two.indices, vec![0, 5999]);
    }

    #[test]
    fn text_only_rows_still_fill_budget() {
        let rows: Vec<Row> = (0..5001).map(|i| row_from([("k", format!("r{i}"))])).collect();
        let s = DataSampler::new().select_indices(&rows, &SamplingOptions::with_max_points(50));
        assert_eq!(s.method, SamplingMethod::Intelligent);
        assert_eq!(s.indices.len(), 50);
        assert_eq!(first_numeric_column(&rows), None);
    }
}
