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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chartsense",
    version,
    about = "Profile tabular data, recommend chart types and downsample for rendering"
)]
pub struct Args {
    #[arg(
        long = "config",
        global = true,
        help = "Engine configuration file (YAML, or JSON by .json extension)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "compact",
        global = true,
        default_value_t = false,
        help = "Print single-line JSON"
    )]
    pub compact: bool,
    #[arg(short = 'v', long = "verbose", global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a data file and print chart suggestions
    Validate { file: PathBuf },
    /// Downsample a data file for rendering
    Sample {
        file: PathBuf,
        #[arg(long = "max-points", help = "Row budget (defaults to the configured value)")]
        max_points: Option<usize>,
        #[arg(long = "no-pattern", help = "Use uniform sampling only")]
        no_pattern: bool,
        #[arg(long = "no-sampling", help = "Pass rows through unchanged")]
        no_sampling: bool,
        #[arg(long = "include-rows", help = "Include the sampled rows in the output")]
        include_rows: bool,
    },
    /// Print the per-column analysis
    Profile { file: PathBuf },
}
