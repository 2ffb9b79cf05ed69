//! Which chart types a dataset can feed.
//!
//! A static rule table keyed on feature level and column names/types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::FeatureLevel;
use crate::schema::{ColumnType, ColumnTypes};

/// Population-level job feature columns. One must be present.
pub const JOB_FEATURES: [&str; 3] = [
    "ActiveJobs",
    "TopJobCompletionDestinations",
    "TopJobSwitchDestinations",
];

/// Per-job subfeatures. Every one must appear in some column name.
pub const JOBS_ATTEMPTED_SUBFEATURES: [&str; 6] = [
    "JobsAttempted-num-starts",
    "JobsAttempted-num-completes",
    "JobsAttempted-percent-complete",
    "JobsAttempted-avg-time-per-attempt",
    "JobsAttempted-std-dev-per-attempt",
    "JobsAttempted-job-name",
];

// Declaration order is the output order of `supported_chart_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    DescriptiveStatistics,
    BarChart,
    Histogram,
    ScatterPlot,
    BoxPlot,
    DatasetComparison,
    ForceGraph,
    JobGraph,
    JobSankey,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::DescriptiveStatistics => "descriptive_statistics",
            ChartType::BarChart => "bar_chart",
            ChartType::Histogram => "histogram",
            ChartType::ScatterPlot => "scatter_plot",
            ChartType::BoxPlot => "box_plot",
            ChartType::DatasetComparison => "dataset_comparison",
            ChartType::ForceGraph => "force_graph",
            ChartType::JobGraph => "job_graph",
            ChartType::JobSankey => "job_sankey",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_job_features(column_types: &ColumnTypes) -> bool {
    let names: Vec<&str> = column_types.keys().map(String::as_str).collect();
    let any_job = names
        .iter()
        .any(|n| JOB_FEATURES.iter().any(|f| n.contains(f)));
    any_job
        && JOBS_ATTEMPTED_SUBFEATURES
            .iter()
            .all(|sub| names.iter().any(|n| n.contains(sub)))
}

pub fn supported_chart_types(level: FeatureLevel, column_types: &ColumnTypes) -> Vec<ChartType> {
    let mut out = vec![ChartType::DescriptiveStatistics];
    match level {
        FeatureLevel::Population => {
            if column_types.values().any(|t| *t == ColumnType::Graph) {
                out.push(ChartType::ForceGraph);
            }
            if has_job_features(column_types) {
                out.push(ChartType::JobGraph);
                out.push(ChartType::JobSankey);
            }
        }
        FeatureLevel::Player | FeatureLevel::Session => {
            out.extend([
                ChartType::BarChart,
                ChartType::Histogram,
                ChartType::ScatterPlot,
                ChartType::BoxPlot,
                ChartType::DatasetComparison,
            ]);
        }
    }
    out.sort();
    out
}
