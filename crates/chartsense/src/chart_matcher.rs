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

use crate::compatibility::ChartCompatibility;
use crate::data_profiler::ColumnAnalysisMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub mod scoring {
    pub const BAR_WITH_CATEGORIES: u8 = 90;
    pub const BAR_WITHOUT_CATEGORIES: u8 = 70;
    pub const LINE_TIME_SERIES: u8 = 95;
    pub const LINE_SEQUENTIAL: u8 = 75;
    pub const PIE: u8 = 85;
    pub const AREA: u8 = 80;
    pub const PIE_CHART_MIN_CATEGORIES: usize = 2;
    pub const PIE_CHART_MAX_CATEGORIES: usize = 8;
    pub const AREA_MIN_ROWS: usize = 5;
}

pub const NO_NUMERIC_DATA_REASON: &str = "No numeric data found for charting";

/// Declaration order doubles as the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column roles for a suggested chart. Axis charts use x/y; pie uses
/// categories/values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuitableColumns {
    #[serde(rename_all = "camelCase")]
    Axes { x_axis: Vec<String>, y_axis: Vec<String> },
    Proportions {
        categories: Vec<String>,
        values: Vec<String>,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSuggestion {
    pub chart_type: Option<ChartType>,
    pub confidence: u8,
    pub reason: String,
    pub suitable_columns: SuitableColumns,
}

impl ChartSuggestion {
    pub fn no_numeric_data() -> Self {
        Self {
            chart_type: None,
            confidence: 0,
            reason: NO_NUMERIC_DATA_REASON.to_string(),
            suitable_columns: SuitableColumns::None,
        }
    }
}

/// Everything a rule may look at.
pub struct MatchContext<'a> {
    pub compatibility: &'a ChartCompatibility,
    pub analysis: &'a ColumnAnalysisMap,
    /// Categorical columns with a pie-friendly number of distinct values.
    pub good_categories: Vec<String>,
}

impl<'a> MatchContext<'a> {
    pub fn new(compatibility: &'a ChartCompatibility, analysis: &'a ColumnAnalysisMap) -> Self {
        let good_categories = compatibility
            .categorical_columns
            .iter()
            .filter(|name| {
                analysis.get(name.as_str()).is_some_and(|c| {
                    (scoring::PIE_CHART_MIN_CATEGORIES..=scoring::PIE_CHART_MAX_CATEGORIES)
                        .contains(&c.unique_values)
                })
            })
            .cloned()
            .collect();
        Self {
            compatibility,
            analysis,
            good_categories,
        }
    }
    fn category_and_date_columns(&self) -> Vec<String> {
        let c = self.compatibility;
        c.categorical_columns
            .iter()
            .chain(c.date_columns.iter())
            .cloned()
            .collect()
    }
}

/// One row of the suggestion table: a gate, a fixed confidence, a reason and
/// a column-role mapper. Rules are evaluated in table order.
pub struct SuggestionRule {
    pub chart_type: ChartType,
    pub applies: fn(&MatchContext<'_>) -> bool,
    pub confidence: fn(&MatchContext<'_>) -> u8,
    pub reason: fn(&MatchContext<'_>) -> &'static str,
    pub columns: fn(&MatchContext<'_>) -> SuitableColumns,
}

impl SuggestionRule {
    pub fn evaluate(&self, ctx: &MatchContext<'_>) -> Option<ChartSuggestion> {
        if !(self.applies)(ctx) {
            return None;
        }
        Some(ChartSuggestion {
            chart_type: Some(self.chart_type),
            confidence: (self.confidence)(ctx).min(100),
            reason: (self.reason)(ctx).to_string(),
            suitable_columns: (self.columns)(ctx),
        })
    }
}

static RULES: [SuggestionRule; 4] = [
    SuggestionRule {
        chart_type: ChartType::Bar,
        applies: |ctx| ctx.compatibility.is_bar_chart_candidate,
        confidence: |ctx| {
            if ctx.compatibility.has_categories {
                scoring::BAR_WITH_CATEGORIES
            } else {
                scoring::BAR_WITHOUT_CATEGORIES
            }
        },
        reason: |ctx| {
            if ctx.compatibility.has_categories {
                "Bar charts compare numeric values across categories"
            } else {
                "Bar charts can compare numeric values across dates"
            }
        },
        columns: |ctx| SuitableColumns::Axes {
            x_axis: ctx.category_and_date_columns(),
            y_axis: ctx.compatibility.numeric_columns.clone(),
        },
    },
    SuggestionRule {
        chart_type: ChartType::Line,
        applies: |ctx| ctx.compatibility.is_line_chart_candidate,
        confidence: |ctx| {
            if ctx.compatibility.is_time_series_candidate {
                scoring::LINE_TIME_SERIES
            } else {
                scoring::LINE_SEQUENTIAL
            }
        },
        reason: |ctx| {
            if ctx.compatibility.is_time_series_candidate {
                "Line charts show how values change over time"
            } else {
                "Line charts show trends across sequential rows"
            }
        },
        columns: |ctx| {
            let c = ctx.compatibility;
            let x_axis = if c.has_dates {
                c.date_columns.clone()
            } else {
                c.categorical_columns.clone()
            };
            SuitableColumns::Axes {
                x_axis,
                y_axis: c.numeric_columns.clone(),
            }
        },
    },
    SuggestionRule {
        chart_type: ChartType::Pie,
        applies: |ctx| ctx.compatibility.is_pie_chart_candidate && !ctx.good_categories.is_empty(),
        confidence: |_| scoring::PIE,
        reason: |_| "Pie charts show the share of each category when there are only a few",
        columns: |ctx| SuitableColumns::Proportions {
            categories: ctx.good_categories.clone(),
            values: ctx.compatibility.numeric_columns.clone(),
        },
    },
    SuggestionRule {
        chart_type: ChartType::Area,
        applies: |ctx| {
            ctx.compatibility.is_time_series_candidate
                && ctx.compatibility.row_count >= scoring::AREA_MIN_ROWS
        },
        confidence: |_| scoring::AREA,
        reason: |_| "Area charts emphasise the magnitude of change over time",
        columns: |ctx| SuitableColumns::Axes {
            x_axis: ctx.compatibility.date_columns.clone(),
            y_axis: ctx.compatibility.numeric_columns.clone(),
        },
    },
];

pub fn rules() -> &'static [SuggestionRule] {
    &RULES
}

/// Ranked suggestions, highest confidence first. Equal confidences keep
/// rule order because the sort is stable.
pub fn suggest_charts(
    compatibility: &ChartCompatibility,
    analysis: &ColumnAnalysisMap,
) -> Vec<ChartSuggestion> {
    if !compatibility.has_numeric_data {
        return vec![ChartSuggestion::no_numeric_data()];
    }
    let ctx = MatchContext::new(compatibility, analysis);
    let mut suggestions: Vec<ChartSuggestion> =
        rules().iter().filter_map(|rule| rule.evaluate(&ctx)).collect();
    suggestions.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    debug!(
        count = suggestions.len(),
        top = ?suggestions.first().and_then(|s| s.chart_type),
        "ranked chart suggestions"
    );
    suggestions
}
