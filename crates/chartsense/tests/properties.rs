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

use chartsense::column_classifier::{classify_values, count_unique, detect_patterns};
use chartsense::{
    validate_data_for_charting, DataSampler, DatasetMeta, ProfilingConfig, Row, SamplingConfig,
    SamplingMethod, SamplingOptions, Value, ValueKind,
};
use proptest::prelude::*;

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6..1.0e6f64).prop_map(Value::Number),
        (-1000i32..1000).prop_map(|n| Value::Text(n.to_string())),
        "[a-z ]{0,6}".prop_map(Value::Text),
    ]
}

fn rows_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (value_strategy(), value_strategy(), value_strategy()).prop_map(|(a, b, c)| {
            [("alpha", a), ("beta", b), ("gamma", c)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Row>()
        }),
        0..max_rows,
    )
}

fn small_thresholds() -> SamplingConfig {
    SamplingConfig {
        large_dataset_threshold: 20,
        heavy_sampling_threshold: 40,
        animation_threshold: 10,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn validation_is_deterministic(rows in rows_strategy(40)) {
        let meta = DatasetMeta::default();
        let first = serde_json::to_string(&validate_data_for_charting(&rows, &meta)).unwrap();
        let second = serde_json::to_string(&validate_data_for_charting(&rows, &meta)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn sampling_is_deterministic(
        rows in rows_strategy(120),
        max_points in 0usize..60,
        pattern: bool,
    ) {
        let sampler = DataSampler::with_config(small_thresholds());
        let options = SamplingOptions {
            max_points,
            preserve_pattern: pattern,
            enable_sampling: true,
        };
        prop_assert_eq!(sampler.optimize(&rows, &options), sampler.optimize(&rows, &options));
    }

    #[test]
    fn sampling_respects_budget(
        rows in rows_strategy(120),
        max_points in 1usize..60,
        pattern: bool,
        enabled: bool,
    ) {
        let sampler = DataSampler::with_config(small_thresholds());
        let options = SamplingOptions {
            max_points,
            preserve_pattern: pattern,
            enable_sampling: enabled,
        };
        let result = sampler.optimize(&rows, &options);
        prop_assert!(result.optimized_size <= result.original_size);
        prop_assert!(result.optimized_size <= rows.len().max(max_points));
        if enabled && rows.len() > max_points {
            prop_assert_eq!(result.optimized_size, max_points);
        }
        let selection = sampler.select_indices(&rows, &options);
        prop_assert!(selection.indices.windows(2).all(|w| w[0] < w[1]));
        if selection.method == SamplingMethod::Intelligent && max_points >= 2 {
            prop_assert_eq!(selection.indices.first().copied(), Some(0));
            prop_assert_eq!(selection.indices.last().copied(), Some(rows.len() - 1));
        }
    }

    #[test]
    fn confidences_are_bounded_and_ranked(rows in rows_strategy(40)) {
        let result = validate_data_for_charting(&rows, &DatasetMeta::default());
        prop_assert!(result.suggestions.iter().all(|s| s.confidence <= 100));
        prop_assert!(result.suggestions.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn validity_tracks_numeric_columns(rows in rows_strategy(40)) {
        let result = validate_data_for_charting(&rows, &DatasetMeta::default());
        let any_numeric = result
            .column_analysis
            .values()
            .any(|c| c.primary_type() == Some(ValueKind::Number));
        prop_assert_eq!(result.is_valid, any_numeric);
        if !result.is_valid {
            prop_assert!(!result.errors.is_empty());
        }
    }

    #[test]
    fn classification_is_idempotent(values in prop::collection::vec(value_strategy(), 0..50)) {
        let config = ProfilingConfig::default();
        let non_empty: Vec<&Value> = values.iter().filter(|v| !v.is_empty()).collect();
        let first = classify_values(&non_empty, &config);
        let second = classify_values(&non_empty, &config);
        prop_assert_eq!(first.primary_type, second.primary_type);
        prop_assert_eq!(&first, &second);
        let unique = count_unique(&non_empty);
        prop_assert_eq!(
            detect_patterns("amount", non_empty.len(), unique, &config),
            detect_patterns("amount", non_empty.len(), count_unique(&non_empty), &config)
        );
    }
}
