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

pub mod chart_matcher;
pub mod column_classifier;
pub mod column_stats;
pub mod compatibility;
pub mod config;
pub mod data_profiler;
pub mod error;
pub mod loader;
pub mod sampler;
pub mod validation;
pub mod value;

pub use chart_matcher::{rules, suggest_charts, ChartSuggestion, ChartType, SuitableColumns};
pub use column_classifier::{ColumnPatterns, TypeAnalysis};
pub use column_stats::ColumnStats;
pub use compatibility::{assess_compatibility, ChartCompatibility};
pub use config::{EngineConfig, ProfilingConfig, SamplingConfig, ValidationConfig};
pub use data_profiler::{ColumnAnalysis, ColumnAnalysisMap, DataProfiler};
pub use error::{
    ChartSuggestionError, ConfigError, DataError, FailureKind, Result, ValidationFailure,
};
pub use loader::{DataFormat, DataLoader, LoadedDataset};
pub use sampler::{DataSampler, PerformanceHints, SamplingMethod, SamplingOptions, SamplingResult};
pub use validation::{
    has_numeric_data, optimize_data_for_charting, validate_data_for_charting, ChartValidator,
    Severity, ValidationResult, ValidationWarning, WarningKind,
};
pub use value::{DatasetMeta, Row, Value, ValueKind};

/// Loads a file and validates it in one call.
pub fn validate_file<P: AsRef<std::path::Path>>(
    path: P,
    config: EngineConfig,
) -> Result<ValidationResult> {
    let dataset = DataLoader::new().load(path)?;
    Ok(ChartValidator::with_config(config).validate(&dataset.rows, &dataset.meta))
}
