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

//! Single entry point tying profiling, compatibility, suggestions and
//! sampling together. Never returns `Err`: every outcome, including
//! internal failures, is packaged into a [`ValidationResult`].

use crate::chart_matcher::{suggest_charts, ChartSuggestion};
use crate::compatibility::{assess_compatibility, ChartCompatibility};
use crate::config::EngineConfig;
use crate::data_profiler::{first_row_has_numeric, ColumnAnalysisMap, DataProfiler};
use crate::error::{DataResult, FailureKind, ValidationFailure};
use crate::sampler::{DataSampler, SamplingMethod, SamplingOptions, SamplingResult};
use crate::value::{DatasetMeta, Row};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExampleTable {
    /// Small, obviously chartable table shown when no numbers were found.
    pub fn numeric_sample() -> Self {
        let strings = |cells: &[&str]| cells.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            headers: strings(&["Month", "Sales", "Expenses"]),
            rows: vec![
                strings(&["Jan", "1200", "800"]),
                strings(&["Feb", "1500", "900"]),
                strings(&["Mar", "1800", "950"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: FailureKind,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<ExampleTable>,
}

impl From<&ValidationFailure> for ValidationIssue {
    fn from(failure: &ValidationFailure) -> Self {
        let example = match failure {
            ValidationFailure::NoNumericData => Some(ExampleTable::numeric_sample()),
            _ => None,
        };
        Self {
            kind: failure.kind(),
            message: failure.to_string(),
            action: failure.action().to_string(),
            example,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    MissingData,
    MixedTypes,
    SmallDataset,
    LargeDataset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub original_row_count: usize,
    pub analyzed_row_count: usize,
    pub sampling_applied: bool,
    pub sampling_method: SamplingMethod,
}

impl PerformanceReport {
    fn unsampled(rows: usize) -> Self {
        Self {
            original_row_count: rows,
            analyzed_row_count: rows,
            sampling_applied: false,
            sampling_method: SamplingMethod::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
    pub suggestions: Vec<ChartSuggestion>,
    pub column_analysis: ColumnAnalysisMap,
    pub chart_compatibility: Option<ChartCompatibility>,
    pub performance: PerformanceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ValidationResult {
    /// Result for input rejected before any analysis ran.
    pub fn rejected(failure: &ValidationFailure, row_count: usize, meta: &DatasetMeta) -> Self {
        Self {
            is_valid: false,
            errors: vec![failure.into()],
            warnings: Vec::new(),
            suggestions: Vec::new(),
            column_analysis: ColumnAnalysisMap::new(),
            chart_compatibility: None,
            performance: PerformanceReport::unsampled(row_count),
            filename: meta.filename.clone(),
        }
    }
    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
    pub fn error_kinds(&self) -> Vec<FailureKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }
}

/// Rejects input the analysis cannot make sense of at all.
pub fn check_structure(rows: &[Row]) -> Result<(), ValidationFailure> {
    let Some(first) = rows.first() else {
        return Err(ValidationFailure::EmptyFile);
    };
    if first.is_empty() {
        return Err(ValidationFailure::parse("the first row has no columns"));
    }
    if rows.iter().all(|row| row.values().all(|v| v.is_empty())) {
        return Err(ValidationFailure::EmptyFile);
    }
    Ok(())
}

pub struct ChartValidator {
    config: EngineConfig,
}

impl ChartValidator {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip_all, fields(rows = rows.len(), filename = meta.filename.as_deref()))]
    pub fn validate(&self, rows: &[Row], meta: &DatasetMeta) -> ValidationResult {
        if let Err(failure) = check_structure(rows) {
            info!(kind = ?failure.kind(), "dataset rejected");
            return ValidationResult::rejected(&failure, rows.len(), meta);
        }
        match self.analyse(rows, meta) {
            Ok(result) => {
                info!(
                    valid = result.is_valid,
                    warnings = result.warnings.len(),
                    suggestions = result.suggestions.len(),
                    "validation finished"
                );
                result
            }
            Err(err) => {
                warn!(error = %err, "analysis failed, reporting as parse error");
                ValidationResult::rejected(&ValidationFailure::parse(err), rows.len(), meta)
            }
        }
    }

    /// Fast check on the first row only.
    pub fn has_numeric_data(&self, rows: &[Row]) -> bool {
        first_row_has_numeric(rows)
    }

    #[instrument(skip_all, fields(rows = rows.len(), max_points = options.max_points))]
    pub fn optimize(&self, rows: &[Row], options: &SamplingOptions) -> SamplingResult {
        DataSampler::with_config(self.config.sampling.clone()).optimize(rows, options)
    }

    fn analyse(&self, rows: &[Row], meta: &DatasetMeta) -> DataResult<ValidationResult> {
        let columns = meta.resolve_columns(rows);
        let (analysed, performance) = self.analysis_rows(rows);
        let profiler = DataProfiler::with_config(self.config.profiling.clone());
        let column_analysis = profiler.profile_rows(&analysed, &columns)?;
        let compatibility = assess_compatibility(&column_analysis, analysed.len());
        let suggestions = suggest_charts(&compatibility, &column_analysis);
        debug!(
            numeric = compatibility.numeric_count,
            categorical = compatibility.categorical_count,
            dates = compatibility.date_count,
            "assessed compatibility"
        );

        let mut warnings = Vec::new();
        if rows.len() > self.config.sampling.large_dataset_threshold {
            warnings.push(ValidationWarning {
                kind: WarningKind::LargeDataset,
                severity: Severity::Low,
                message: format!(
                    "Large dataset ({} rows); analysis used {} rows and charts may be downsampled",
                    rows.len(),
                    performance.analyzed_row_count
                ),
                column: None,
            });
        }
        warnings.extend(self.column_warnings(&column_analysis));
        if rows.len() < self.config.validation.min_rows {
            warnings.push(ValidationWarning {
                kind: WarningKind::SmallDataset,
                severity: Severity::Low,
                message: format!(
                    "Only {} row(s) of data; most charts need at least {}",
                    rows.len(),
                    self.config.validation.min_rows
                ),
                column: None,
            });
        }

        let is_valid = compatibility.has_numeric_data;
        let errors: Vec<ValidationIssue> = if is_valid {
            Vec::new()
        } else {
            vec![(&ValidationFailure::NoNumericData).into()]
        };
        Ok(ValidationResult {
            is_valid,
            errors,
            warnings,
            suggestions,
            column_analysis,
            chart_compatibility: Some(compatibility),
            performance,
            filename: meta.filename.clone(),
        })
    }

    fn analysis_rows<'a>(&self, rows: &'a [Row]) -> (Cow<'a, [Row]>, PerformanceReport) {
        if rows.len() <= self.config.sampling.large_dataset_threshold {
            return (Cow::Borrowed(rows), PerformanceReport::unsampled(rows.len()));
        }
        let options = SamplingOptions {
            max_points: self.config.validation.analysis_sample_size,
            preserve_pattern: true,
            enable_sampling: true,
        };
        let selection =
            DataSampler::with_config(self.config.sampling.clone()).select_indices(rows, &options);
        let report = PerformanceReport {
            original_row_count: rows.len(),
            analyzed_row_count: selection.indices.len(),
            sampling_applied: selection.method != SamplingMethod::None,
            sampling_method: selection.method,
        };
        if selection.method == SamplingMethod::None {
            return (Cow::Borrowed(rows), report);
        }
        let sampled = selection.indices.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
        (Cow::Owned(sampled), report)
    }

    fn column_warnings(&self, analysis: &ColumnAnalysisMap) -> Vec<ValidationWarning> {
        let limits = &self.config.validation;
        let mut warnings = Vec::new();
        for (name, column) in analysis {
            let missing = column.empty_percentage;
            let severity = if missing > limits.missing_high_percentage {
                Some(Severity::High)
            } else if missing > limits.missing_medium_percentage {
                Some(Severity::Medium)
            } else {
                None
            };
            if let Some(severity) = severity {
                warnings.push(ValidationWarning {
                    kind: WarningKind::MissingData,
                    severity,
                    message: format!("Column '{name}' is missing {missing:.1}% of its values"),
                    column: Some(name.clone()),
                });
            }
            if column.has_type_conflict() {
                let primary = column
                    .primary_type()
                    .map_or("unknown", |kind| kind.as_str());
                warnings.push(ValidationWarning {
                    kind: WarningKind::MixedTypes,
                    severity: Severity::Medium,
                    message: format!(
                        "Column '{name}' mixes value types; most values are {primary}"
                    ),
                    column: Some(name.clone()),
                });
            }
        }
        warnings
    }
}

impl Default for ChartValidator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_data_for_charting(rows: &[Row], meta: &DatasetMeta) -> ValidationResult {
    ChartValidator::new().validate(rows, meta)
}

pub fn has_numeric_data(rows: &[Row]) -> bool {
    ChartValidator::new().has_numeric_data(rows)
}

pub fn optimize_data_for_charting(rows: &[Row], options: &SamplingOptions) -> SamplingResult {
    ChartValidator::new().optimize(rows, options)
}
