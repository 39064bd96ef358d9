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

mod args;

use anyhow::{Context, Result};
use args::{Args, Command};
use chartsense::{
    ChartValidator, DataLoader, DataProfiler, EngineConfig, LoadedDataset, SamplingOptions,
};
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match &args.command {
        Command::Validate { file } => {
            let dataset = load(file)?;
            let result = ChartValidator::with_config(config).validate(&dataset.rows, &dataset.meta);
            info!(
                valid = result.is_valid,
                suggestions = result.suggestions.len(),
                "validated {}",
                file.display()
            );
            emit(&result, args.compact)
        }
        Command::Sample {
            file,
            max_points,
            no_pattern,
            no_sampling,
            include_rows,
        } => {
            let dataset = load(file)?;
            let options = SamplingOptions {
                max_points: max_points.unwrap_or(config.sampling.default_max_points),
                preserve_pattern: !no_pattern,
                enable_sampling: !no_sampling,
            };
            let result = ChartValidator::with_config(config).optimize(&dataset.rows, &options);
            info!(
                original = result.original_size,
                optimized = result.optimized_size,
                method = ?result.sampling_method,
                "sampled {}",
                file.display()
            );
            let mut json = serde_json::to_value(&result).context("serialising sampling result")?;
            if !include_rows {
                if let Some(obj) = json.as_object_mut() {
                    obj.remove("data");
                }
            }
            emit(&json, args.compact)
        }
        Command::Profile { file } => {
            let dataset = load(file)?;
            let columns = dataset.meta.resolve_columns(&dataset.rows);
            let analysis = DataProfiler::with_config(config.profiling)
                .profile_rows(&dataset.rows, &columns)
                .with_context(|| format!("profiling {}", file.display()))?;
            emit(&analysis, args.compact)
        }
    }
}

fn load(path: &Path) -> Result<LoadedDataset> {
    DataLoader::new()
        .load(path)
        .with_context(|| format!("reading {}", path.display()))
}

fn emit<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").context("writing output")?;
    Ok(())
}
