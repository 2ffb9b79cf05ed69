//! Open Game Data explorer CLI
//!
//! Command-line front end over the dataset, ingest and graph crates:
//! - `inspect`: schema, chart types and export metadata of a TSV export
//! - `filter` / `split`: write filtered or partitioned rows back out as TSV
//! - `describe`: descriptive statistics, histograms, box plots, counts
//! - `graph`: progression graphs and Sankey layouts from population rows

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ogd_dataset::stats::{self, ColumnStats};
use ogd_dataset::{
    split_dataset, ChartType, Dataset, FeatureLevel, Sampling, SplitCriterion, SplitSide,
};
use ogd_graph::{
    derive_progression_graph, DerivationOptions, EdgeMode, GraphDocument, ProgressionGraph,
    SankeyLayout,
};
use ogd_ingest::{load_dataset, write_tsv, ExportFileName, LoadOptions};

mod config;
mod filters;
mod render;

use config::ExplorerConfig;

#[derive(Parser)]
#[command(name = "ogd")]
#[command(author, version, about = "Explore Open Game Data feature exports")]
struct Cli {
    /// JSON config file (falls back to `OGD_CONFIG`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter, e.g. `info` or `ogd_graph=debug` (falls back to `OGD_LOG`, then `warn`).
    #[arg(long, global = true)]
    log: Option<String>,
    /// Column-type inference: first_row|all_rows.
    #[arg(long, global = true)]
    inference: Option<Sampling>,
    /// Read at most this many rows.
    #[arg(long, global = true)]
    max_rows: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// TSV export.
    input: PathBuf,
    /// Feature level: population|player|session (default: from the file name).
    #[arg(long)]
    level: Option<FeatureLevel>,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Numeric filter `column=min:max[,min:max]` (repeatable).
    #[arg(long = "range")]
    ranges: Vec<String>,
    /// Categorical filter `column=a,b` (repeatable).
    #[arg(long = "allow")]
    allows: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show row count, column types, supported charts and export metadata.
    Inspect {
        #[command(flatten)]
        input: InputArgs,
        /// Output format: text|json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Apply filters and write the surviving rows as TSV.
    Filter {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output TSV (default: stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Partition the filtered rows by one feature into two TSV files.
    Split {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Feature to split on.
        #[arg(long)]
        feature: String,
        /// Numeric split: `< value` versus `>= value`.
        #[arg(long, conflicts_with = "categories")]
        threshold: Option<f64>,
        /// Categorical split: comma-separated values versus the rest.
        #[arg(long)]
        categories: Option<String>,
        /// Directory for the two child files.
        #[arg(long)]
        out_dir: PathBuf,
        /// Also print a side-by-side summary of this column.
        #[arg(long)]
        compare: Option<String>,
    },

    /// Descriptive statistics over the filtered rows.
    Describe {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Single column, with histogram/box plot or category counts.
        #[arg(long)]
        column: Option<String>,
        /// Histogram bins (default: config `histogram_bins`).
        #[arg(long)]
        bins: Option<usize>,
        /// Output format: text|json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Derive a progression graph from one row.
    Graph {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Edge mode: active-jobs|top-job-completion-destinations|top-job-switch-destinations
        #[arg(long, required_unless_present = "document")]
        mode: Option<EdgeMode>,
        /// Read a pre-built graph document from this column instead.
        #[arg(long, conflicts_with = "mode")]
        document: Option<String>,
        /// Row index among the filtered rows.
        #[arg(long, default_value_t = 0)]
        row: usize,
        /// Check for cycles and emit a Sankey layout.
        #[arg(long)]
        sankey: bool,
        /// Metric used as the node display id.
        #[arg(long)]
        display_metric: Option<String>,
        /// Output format: json|dot
        #[arg(long, default_value = "json")]
        format: String,
        /// Output file (default: stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ExplorerConfig::load(cli.config.as_deref())?;
    if let Some(sampling) = cli.inference {
        config.inference = sampling;
    }
    if cli.max_rows.is_some() {
        config.max_rows = cli.max_rows;
    }
    init_tracing(cli.log.as_deref().or(config.log.as_deref()));

    match cli.command {
        Commands::Inspect { input, format } => cmd_inspect(&config, &input, &format),
        Commands::Filter {
            input,
            filters,
            out,
        } => cmd_filter(&config, &input, &filters, out.as_deref()),
        Commands::Split {
            input,
            filters,
            feature,
            threshold,
            categories,
            out_dir,
            compare,
        } => {
            let criterion = match (threshold, categories) {
                (Some(value), None) => SplitCriterion::threshold(feature, value),
                (None, Some(list)) => SplitCriterion::categories(
                    feature,
                    list.split(',').map(str::trim).filter(|s| !s.is_empty()),
                ),
                _ => return Err(anyhow!("split needs exactly one of --threshold or --categories")),
            };
            cmd_split(
                &config,
                &input,
                &filters,
                &criterion,
                &out_dir,
                compare.as_deref(),
            )
        }
        Commands::Describe {
            input,
            filters,
            column,
            bins,
            format,
        } => cmd_describe(
            &config,
            &input,
            &filters,
            column.as_deref(),
            bins.unwrap_or(config.histogram_bins),
            &format,
        ),
        Commands::Graph {
            input,
            filters,
            mode,
            document,
            row,
            sankey,
            display_metric,
            format,
            out,
        } => {
            let source = match (mode, document) {
                (_, Some(column)) => GraphSource::Document(column),
                (Some(mode), None) => GraphSource::Derived(mode),
                (None, None) => return Err(anyhow!("graph needs --mode or --document")),
            };
            let options = DerivationOptions { display_metric };
            cmd_graph(
                &config,
                &input,
                &filters,
                &source,
                &options,
                row,
                sankey,
                &format,
                out.as_deref(),
            )
        }
    }
}

fn init_tracing(directive: Option<&str>) {
    let filter = directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load(config: &ExplorerConfig, input: &InputArgs, filters: &FilterArgs) -> Result<Dataset> {
    let options = LoadOptions {
        level: input.level,
        sampling: config.inference,
        max_rows: config.max_rows,
    };
    let mut dataset = load_dataset(&input.input, &options)?;
    filters::apply_filter_args(&mut dataset, &filters.ranges, &filters.allows)?;
    Ok(dataset)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            io::stdout().write_all(text.as_bytes())?;
            Ok(())
        }
    }
}

fn cmd_inspect(config: &ExplorerConfig, input: &InputArgs, format: &str) -> Result<()> {
    let dataset = load(config, input, &FilterArgs::default())?;
    let meta = input.input.to_str().and_then(ExportFileName::parse);
    match format {
        "text" => render::print_inspect(&dataset, meta.as_ref()),
        "json" => {
            let report = serde_json::json!({
                "id": dataset.id(),
                "source": dataset.source(),
                "level": dataset.level(),
                "rows": dataset.rows().len(),
                "columns": dataset.columns(),
                "column_types": dataset.column_types(),
                "chart_types": dataset.chart_types(),
                "export": meta,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => return Err(anyhow!("unknown format `{other}` (expected text|json)")),
    }
    Ok(())
}

fn tsv_string(dataset: &Dataset) -> Result<String> {
    let mut buf = Vec::new();
    write_tsv(&mut buf, dataset.columns(), &dataset.filtered_rows())?;
    Ok(String::from_utf8(buf)?)
}

fn cmd_filter(
    config: &ExplorerConfig,
    input: &InputArgs,
    filters: &FilterArgs,
    out: Option<&Path>,
) -> Result<()> {
    let dataset = load(config, input, filters)?;
    write_output(out, &tsv_string(&dataset)?)?;
    if let Some(path) = out {
        eprintln!(
            "{} {} of {} rows → {}",
            "Filtered".green().bold(),
            dataset.filtered_row_count(),
            dataset.rows().len(),
            path.display()
        );
    }
    Ok(())
}

fn side_name(side: SplitSide) -> &'static str {
    match side {
        SplitSide::Accepted => "accepted",
        SplitSide::Rejected => "rejected",
    }
}

fn cmd_split(
    config: &ExplorerConfig,
    input: &InputArgs,
    filters: &FilterArgs,
    criterion: &SplitCriterion,
    out_dir: &Path,
    compare: Option<&str>,
) -> Result<()> {
    let dataset = load(config, input, filters)?;
    let (first, second) = split_dataset(&dataset, criterion)?;
    fs::create_dir_all(out_dir)?;

    println!(
        "{} {} on {}",
        "Split".green().bold(),
        dataset.id(),
        criterion.feature().cyan()
    );
    for (child, side) in [(&first, SplitSide::Accepted), (&second, SplitSide::Rejected)] {
        let path = out_dir.join(format!("{}.{}.tsv", dataset.id(), side_name(side)));
        write_output(Some(&path), &tsv_string(child)?)?;
        println!(
            "  {} {} ({} rows) → {}",
            "→".cyan(),
            child.id(),
            child.rows().len(),
            path.display()
        );
    }

    if let Some(column) = compare {
        let comparison = stats::compare(&first, &second, column)?;
        println!("{} {}", "Compare".green().bold(), column.cyan());
        for summary in [&comparison.left, &comparison.right] {
            render::print_column(summary, None, None, None);
        }
    }
    Ok(())
}

fn cmd_describe(
    config: &ExplorerConfig,
    input: &InputArgs,
    filters: &FilterArgs,
    column: Option<&str>,
    bins: usize,
    format: &str,
) -> Result<()> {
    if !matches!(format, "text" | "json") {
        return Err(anyhow!("unknown format `{format}` (expected text|json)"));
    }
    let dataset = load(config, input, filters)?;
    if !dataset.supports(ChartType::DescriptiveStatistics) {
        return Err(anyhow!("{} does not support statistics", dataset.id()));
    }

    let Some(column) = column else {
        let summary = stats::describe(&dataset);
        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            render::print_summary(&summary);
        }
        return Ok(());
    };

    let summary = stats::describe_column(&dataset, column)?;
    let rows = dataset.filtered_rows();
    let (histogram, box_plot, categories) = match summary.stats {
        ColumnStats::Numeric { .. } => {
            let (values, _) = stats::numeric_values(&rows, column);
            (
                Some(stats::histogram(&values, bins)?),
                stats::box_plot(&values),
                None,
            )
        }
        ColumnStats::Categorical { .. } => {
            (None, None, Some(stats::category_counts(&rows, column)))
        }
        ColumnStats::Graph { .. } => (None, None, None),
    };

    if format == "json" {
        let report = serde_json::json!({
            "summary": summary,
            "histogram": histogram,
            "box_plot": box_plot,
            "categories": categories,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_column(
            &summary,
            histogram.as_deref(),
            box_plot.as_ref(),
            categories.as_deref(),
        );
    }
    Ok(())
}

enum GraphSource {
    Derived(EdgeMode),
    Document(String),
}

#[allow(clippy::too_many_arguments)]
fn cmd_graph(
    config: &ExplorerConfig,
    input: &InputArgs,
    filters: &FilterArgs,
    source: &GraphSource,
    options: &DerivationOptions,
    row: usize,
    sankey: bool,
    format: &str,
    out: Option<&Path>,
) -> Result<()> {
    let dataset = load(config, input, filters)?;
    let rows = dataset.filtered_rows();
    let selected = rows.get(row).ok_or_else(|| {
        anyhow!(
            "row {row} out of range ({} rows after filters)",
            rows.len()
        )
    })?;

    let graph: ProgressionGraph = match source {
        GraphSource::Derived(mode) => {
            if !dataset.supports(ChartType::JobGraph) {
                tracing::warn!(
                    dataset = dataset.id(),
                    "dataset lacks the job feature columns; graph may be empty"
                );
            }
            derive_progression_graph(selected, *mode, options)?
        }
        GraphSource::Document(column) => {
            let cell = selected
                .get(column)
                .ok_or_else(|| anyhow!("unknown column `{column}`"))?;
            GraphDocument::from_cell(cell)?.into_graph()
        }
    };

    let text = if sankey {
        let layout = SankeyLayout::build(&graph)?;
        match format {
            "json" => serde_json::to_string_pretty(&layout)? + "\n",
            "dot" => render::render_sankey_dot(&layout),
            other => return Err(anyhow!("unknown format `{other}` (expected json|dot)")),
        }
    } else {
        match format {
            "json" => serde_json::to_string_pretty(&graph)? + "\n",
            "dot" => render::render_dot(&graph),
            other => return Err(anyhow!("unknown format `{other}` (expected json|dot)")),
        }
    };
    write_output(out, &text)
}
