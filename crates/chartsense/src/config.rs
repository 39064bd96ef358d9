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

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub profiling: ProfilingConfig,
    pub sampling: SamplingConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilingConfig {
    /// Share of values the primary type must exceed to call a column homogeneous.
    pub homogeneity_threshold: f64,
    pub max_categorical_unique: usize,
    pub categorical_unique_ratio: f64,
    /// Profile columns on the rayon pool instead of the calling thread.
    pub parallel_columns: bool,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            homogeneity_threshold: 0.9,
            max_categorical_unique: 20,
            categorical_unique_ratio: 0.5,
            parallel_columns: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingConfig {
    pub large_dataset_threshold: usize,
    pub heavy_sampling_threshold: usize,
    pub animation_threshold: usize,
    pub default_max_points: usize,
    /// Upper bound on the share of interior slots given to IQR outliers.
    pub outlier_share: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            large_dataset_threshold: 1000,
            heavy_sampling_threshold: 5000,
            animation_threshold: 500,
            default_max_points: 1000,
            outlier_share: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationConfig {
    pub analysis_sample_size: usize,
    pub missing_medium_percentage: f64,
    pub missing_high_percentage: f64,
    pub min_rows: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            analysis_sample_size: 1000,
            missing_medium_percentage: 25.0,
            missing_high_percentage: 50.0,
            min_rows: 3,
        }
    }
}

impl EngineConfig {
    /// Reads a YAML or JSON file, picked by extension (YAML when unknown).
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        Ok(config)
    }
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        let p = &self.profiling;
        if !(0.0..=1.0).contains(&p.homogeneity_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "profiling.homogeneityThreshold".to_string(),
                value: p.homogeneity_threshold.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&p.categorical_unique_ratio) {
            return Err(ConfigError::OutOfRange {
                field: "profiling.categoricalUniqueRatio".to_string(),
                value: p.categorical_unique_ratio.to_string(),
            });
        }
        let s = &self.sampling;
        if s.default_max_points == 0 {
            return Err(ConfigError::OutOfRange {
                field: "sampling.defaultMaxPoints".to_string(),
                value: "0".to_string(),
            });
        }
        if !(0.0..1.0).contains(&s.outlier_share) {
            return Err(ConfigError::OutOfRange {
                field: "sampling.outlierShare".to_string(),
                value: s.outlier_share.to_string(),
            });
        }
        if s.heavy_sampling_threshold < s.large_dataset_threshold {
            return Err(ConfigError::ConflictingOptions {
                details: format!(
                    "heavySamplingThreshold ({}) must not be below largeDatasetThreshold ({})",
                    s.heavy_sampling_threshold, s.large_dataset_threshold
                ),
            });
        }
        let v = &self.validation;
        if v.analysis_sample_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "validation.analysisSampleSize".to_string(),
                value: "0".to_string(),
            });
        }
        if v.missing_medium_percentage > v.missing_high_percentage {
            return Err(ConfigError::ConflictingOptions {
                details: format!(
                    "missingMediumPercentage ({}) exceeds missingHighPercentage ({})",
                    v.missing_medium_percentage, v.missing_high_percentage
                ),
            });
        }
        Ok(())
    }
    pub fn for_large_datasets() -> Self {
        Self {
            profiling: ProfilingConfig {
                parallel_columns: true,
                ..Default::default()
            },
            sampling: SamplingConfig {
                default_max_points: 2000,
                ..Default::default()
            },
            validation: ValidationConfig {
                analysis_sample_size: 2000,
                ..Default::default()
            },
        }
    }
    pub fn for_fast_profiling() -> Self {
        Self {
            sampling: SamplingConfig {
                large_dataset_threshold: 500,
                default_max_points: 500,
                ..Default::default()
            },
            validation: ValidationConfig {
                analysis_sample_size: 250,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
        EngineConfig::for_large_datasets().validate().unwrap();
        EngineConfig::for_fast_profiling().validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "sampling:\n  heavySamplingThreshold: 8000\n";
        let cfg = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.sampling.heavy_sampling_threshold, 8000);
        assert_eq!(cfg.sampling.large_dataset_threshold, 1000);
        assert_eq!(cfg.profiling, ProfilingConfig::default());
    }

    #[test]
    fn json_is_accepted() {
        let cfg = EngineConfig::from_json_str(r#"{"validation": {"minRows": 5}}"#).unwrap();
        assert_eq!(cfg.validation.min_rows, 5);
    }

    #[test]
    fn rejects_conflicting_thresholds() {
        let err = EngineConfig::from_yaml_str(
            "sampling:\n  largeDatasetThreshold: 9000\n  heavySamplingThreshold: 100\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingOptions { .. }));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let mut cfg = EngineConfig::default();
        cfg.profiling.homogeneity_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn loads_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"sampling": {{"animationThreshold": 42}}}}"#).unwrap();
        let cfg = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.sampling.animation_threshold, 42);

        let missing = EngineConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(missing, Err(ConfigError::ConfigFileError { .. })));
    }
}
