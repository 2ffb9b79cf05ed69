//! Human-readable and DOT renderings.

use colored::Colorize;
use ogd_dataset::stats::{
    BoxPlot, CategoryCount, ColumnStats, ColumnSummary, DatasetSummary, HistogramBin,
};
use ogd_dataset::value::format_number;
use ogd_dataset::Dataset;
use ogd_graph::{ProgressionGraph, SankeyLayout};
use ogd_ingest::ExportFileName;

fn num(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format_number(x)
    } else {
        format!("{x:.3}")
    }
}

pub fn print_inspect(dataset: &Dataset, meta: Option<&ExportFileName>) {
    println!("{} {}", "Dataset".green().bold(), dataset.id());
    println!("  Level: {}", dataset.level().to_string().cyan());
    if let Some(meta) = meta {
        println!(
            "  Export: {} {} → {}",
            meta.game.cyan(),
            meta.start,
            meta.end
        );
    }
    println!("  Rows: {}", dataset.rows().len());
    println!("  Columns: {}", dataset.columns().len());
    for column in dataset.columns() {
        let ty = dataset
            .column_type(column)
            .map(|t| t.to_string())
            .unwrap_or_default();
        println!("    {} {}", column.yellow(), ty.dimmed());
    }
    let charts: Vec<&str> = dataset.chart_types().iter().map(|c| c.as_str()).collect();
    println!("  Charts: {}", charts.join(", ").cyan());
}

fn print_stats(summary: &ColumnSummary) {
    let header = format!("{} ({})", summary.column, summary.column_type);
    match &summary.stats {
        ColumnStats::Numeric { missing, summary: Some(s) } => {
            println!("  {}", header.yellow());
            println!(
                "    n={} missing={} mean={} sd={}",
                s.count,
                missing,
                num(s.mean),
                num(s.std_dev)
            );
            println!(
                "    min={} q1={} median={} q3={} max={}",
                num(s.min),
                num(s.q1),
                num(s.median),
                num(s.q3),
                num(s.max)
            );
        }
        ColumnStats::Numeric { missing, summary: None } => {
            println!("  {}", header.yellow());
            println!("    no numeric values (missing={missing})");
        }
        ColumnStats::Categorical { missing, summary: s } => {
            println!("  {}", header.yellow());
            println!(
                "    n={} missing={} distinct={}",
                s.count, missing, s.distinct
            );
            for c in &s.top {
                println!("    {} {}", c.value.cyan(), c.count);
            }
        }
        ColumnStats::Graph { count } => {
            println!("  {}", header.yellow());
            println!("    {count} graph documents");
        }
    }
}

pub fn print_summary(summary: &DatasetSummary) {
    println!(
        "{} {} ({} rows after filters)",
        "Statistics".green().bold(),
        summary.dataset_id,
        summary.row_count
    );
    for column in &summary.columns {
        print_stats(column);
    }
}

pub fn print_column(
    summary: &ColumnSummary,
    histogram: Option<&[HistogramBin]>,
    box_plot: Option<&BoxPlot>,
    categories: Option<&[CategoryCount]>,
) {
    print_stats(summary);
    if let Some(bins) = histogram {
        let peak = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        println!("  {}", "Histogram".green());
        for b in bins {
            let bar = "█".repeat(b.count * 40 / peak);
            println!("    [{:>10}, {:>10}] {:>6} {}", num(b.lower), num(b.upper), b.count, bar);
        }
    }
    if let Some(bp) = box_plot {
        println!("  {}", "Box plot".green());
        println!(
            "    whiskers {} .. {}  box {} | {} | {}",
            num(bp.lower_whisker),
            num(bp.upper_whisker),
            num(bp.q1),
            num(bp.median),
            num(bp.q3)
        );
        if !bp.outliers.is_empty() {
            let outliers: Vec<String> = bp.outliers.iter().map(|x| num(*x)).collect();
            println!("    outliers: {}", outliers.join(", "));
        }
    }
    if let Some(counts) = categories {
        println!("  {}", "Counts".green());
        for c in counts {
            println!("    {} {}", c.value.cyan(), c.count);
        }
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn render_dot(graph: &ProgressionGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph progression {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n\n");
    for n in &graph.nodes {
        match n.group {
            Some(group) => out.push_str(&format!(
                "  \"{}\" [group=\"{}\"];\n",
                dot_escape(&n.id),
                group
            )),
            None => out.push_str(&format!("  \"{}\";\n", dot_escape(&n.id))),
        }
    }
    out.push('\n');
    for l in &graph.links {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\", penwidth={}];\n",
            dot_escape(&l.source),
            dot_escape(&l.target),
            format_number(l.value),
            1.0 + l.value.max(0.0).ln_1p()
        ));
    }
    out.push_str("}\n");
    out
}

/// Same as [`render_dot`] but pins each node to its Sankey column.
pub fn render_sankey_dot(layout: &SankeyLayout) -> String {
    let mut out = String::new();
    out.push_str("digraph sankey {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n\n");
    for column in layout.column_ids() {
        let ids: Vec<String> = column
            .iter()
            .map(|id| format!("\"{}\"", dot_escape(id)))
            .collect();
        out.push_str(&format!("  {{ rank=same; {}; }}\n", ids.join("; ")));
    }
    out.push('\n');
    for l in &layout.links {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            dot_escape(&l.source),
            dot_escape(&l.target),
            format_number(l.value)
        ));
    }
    out.push_str("}\n");
    out
}
