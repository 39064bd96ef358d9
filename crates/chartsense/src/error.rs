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

use serde::{Deserialize, Serialize};
use thiserror::Error;
#[derive(Error, Debug)]
pub enum ChartSuggestionError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Failed to open data file '{path}': {source}")]
    FileOpenError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported data format: {format}")]
    UnsupportedFormat { format: String },
    #[error("Failed to read cell {row} of column '{column}': {source}")]
    CellError {
        column: String,
        row: usize,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Dataset has no columns to analyse")]
    NoColumns,
    #[error("Column '{column}' is listed more than once")]
    DuplicateColumn { column: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to parse JSON configuration: {source}")]
    JsonParseError {
        #[from]
        source: serde_json::Error,
    },
    #[error("Invalid configuration: {field} = {value} is out of range")]
    OutOfRange { field: String, value: String },
    #[error("Conflicting configuration options: {details}")]
    ConflictingOptions { details: String },
}
pub type Result<T> = std::result::Result<T, ChartSuggestionError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl ChartSuggestionError {
    pub fn category(&self) -> &'static str {
        match self {
            ChartSuggestionError::Data(_) => "Data",
            ChartSuggestionError::Config(_) => "Configuration",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ChartSuggestionError::Data(DataError::UnsupportedFormat { .. }) => vec![
                "Save the file as CSV, JSON or Parquet".to_string(),
                "Check the file extension matches its content".to_string(),
            ],
            ChartSuggestionError::Data(DataError::DataFileError { .. }) => vec![
                "Check the file is not truncated or corrupted".to_string(),
                "Make sure the first line holds the column names".to_string(),
            ],
            ChartSuggestionError::Config(_) => vec![
                "Compare the configuration against the defaults".to_string(),
                "Remove unknown or out-of-range keys".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            ChartSuggestionError::Data(DataError::UnsupportedFormat { format }) => {
                format!(
                    "Files of type '{format}' cannot be charted. Please use CSV, JSON or Parquet."
                )
            }
            ChartSuggestionError::Data(DataError::FileOpenError { path, .. }) => {
                format!("Unable to open '{path}'. Please check the path and permissions.")
            }
            _ => self.to_string(),
        }
    }
}

/// Terminal validation outcomes reported to the user. These never escape as
/// `Err`; the validation facade packages them into its result envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("The file contains no data. Please upload a file with at least one row of values.")]
    EmptyFile,
    #[error("The data could not be read: {reason}")]
    ParseError { reason: String },
    #[error("No numeric data found. Charts need at least one column of numbers to plot.")]
    NoNumericData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    EmptyFile,
    ParseError,
    NoNumericData,
}

impl ValidationFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationFailure::EmptyFile => FailureKind::EmptyFile,
            ValidationFailure::ParseError { .. } => FailureKind::ParseError,
            ValidationFailure::NoNumericData => FailureKind::NoNumericData,
        }
    }
    pub fn action(&self) -> &'static str {
        match self {
            ValidationFailure::EmptyFile => "check-file-content",
            ValidationFailure::ParseError { .. } => "check-file-format",
            ValidationFailure::NoNumericData => "add-numeric-column",
        }
    }
    pub fn parse(reason: impl std::fmt::Display) -> Self {
        ValidationFailure::ParseError {
            reason: reason.to_string(),
        }
    }
}
