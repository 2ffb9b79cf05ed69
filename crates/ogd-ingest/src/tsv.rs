//! Tab-separated exports.
//!
//! Behavior:
//! - the first line is the header,
//! - rows with too few fields are padded, rows with too many are truncated,
//! - quotes are literal, so every line is a record; read errors fail the load,
//! - written fields may not contain tabs or line breaks.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use ogd_dataset::{Row, Value};

#[derive(Debug, Clone, Default)]
pub struct TsvOptions {
    /// Keep at most this many rows; `total_rows` still counts all of them.
    pub max_rows: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub total_rows: usize,
}

impl TsvTable {
    pub fn truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }
}

fn normalize_record(record: &csv::StringRecord, columns: &[String]) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = record.get(i).map(Value::parse_field).unwrap_or(Value::Null);
            (column.clone(), value)
        })
        .collect()
}

pub fn parse_tsv(content: &str, options: &TsvOptions) -> Result<TsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        // Exports embed JSON with quotes in unquoted fields.
        .quoting(false)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .context("failed to read TSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(anyhow!("TSV has no header"));
    }

    let limit = options.max_rows.unwrap_or(usize::MAX);
    let mut table = TsvTable {
        columns,
        ..TsvTable::default()
    };
    for (index, record) in reader.records().enumerate() {
        // +2: one-based lines plus the header.
        let record = record.with_context(|| format!("failed to read TSV line {}", index + 2))?;
        table.total_rows += 1;
        if table.rows.len() < limit {
            table.rows.push(normalize_record(&record, &table.columns));
        }
    }

    if table.truncated() {
        tracing::info!(
            kept = table.rows.len(),
            total = table.total_rows,
            "TSV truncated to row limit"
        );
    }
    Ok(table)
}

fn check_field(field: &str, column: &str, line: usize) -> Result<()> {
    if field.contains(['\t', '\n', '\r']) {
        return Err(anyhow!(
            "cannot write TSV line {line}: column `{column}` contains a tab or line break"
        ));
    }
    Ok(())
}

/// Write `rows` as TSV with `columns` as the header.
///
/// Fields are never quoted, so a tab or line break in a header or cell is an
/// error rather than a corrupted row.
pub fn write_tsv<W: Write>(writer: W, columns: &[String], rows: &[Row]) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);
    for column in columns {
        check_field(column, column, 1)?;
    }
    out.write_record(columns)?;
    for (index, row) in rows.iter().enumerate() {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(Value::to_key).unwrap_or_default())
            .collect();
        for (column, field) in columns.iter().zip(&fields) {
            check_field(field, column, index + 2)?;
        }
        out.write_record(&fields)?;
    }
    out.flush()?;
    Ok(())
}
