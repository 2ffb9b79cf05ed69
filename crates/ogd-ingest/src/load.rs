//! File → `Dataset`.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ogd_dataset::{DataSource, Dataset, FeatureLevel, Sampling};

use crate::filename::ExportFileName;
use crate::tsv::{parse_tsv, TsvOptions};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Overrides the level parsed from the file name.
    pub level: Option<FeatureLevel>,
    pub sampling: Sampling,
    pub max_rows: Option<usize>,
}

fn resolve_level(path: &Path, options: &LoadOptions) -> Result<FeatureLevel> {
    if let Some(level) = options.level {
        return Ok(level);
    }
    path.to_str()
        .and_then(ExportFileName::parse)
        .map(|meta| meta.level)
        .ok_or_else(|| {
            anyhow!(
                "cannot tell the feature level of {}; pass one explicitly",
                path.display()
            )
        })
}

/// Build a dataset from already-read TSV text.
pub fn dataset_from_tsv(
    id: &str,
    source: DataSource,
    content: &str,
    level: FeatureLevel,
    options: &LoadOptions,
) -> Result<Dataset> {
    let table = parse_tsv(
        content,
        &TsvOptions {
            max_rows: options.max_rows,
        },
    )?;
    Ok(Dataset::new(
        id,
        source,
        level,
        table.columns,
        table.rows,
        options.sampling,
    ))
}

pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let level = resolve_level(path, options)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(id)
        .to_string();

    let dataset = dataset_from_tsv(id, DataSource::File { name }, &content, level, options)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!(
        id = dataset.id(),
        level = %dataset.level(),
        rows = dataset.rows().len(),
        columns = dataset.columns().len(),
        "loaded dataset"
    );
    Ok(dataset)
}
