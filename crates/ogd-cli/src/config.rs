//! Explorer configuration: JSON file, then `OGD_*` environment overrides.
//! Command-line flags are applied on top by the caller.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ogd_dataset::Sampling;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "OGD_CONFIG";
pub const LOG_ENV: &str = "OGD_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub inference: Sampling,
    pub histogram_bins: usize,
    pub max_rows: Option<usize>,
    pub log: Option<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            inference: Sampling::FirstRow,
            histogram_bins: 10,
            max_rows: None,
            log: None,
        }
    }
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// File from `--config`, else `OGD_CONFIG`, else defaults; then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = env::var(CONFIG_ENV).ok().filter(|s| !s.trim().is_empty());
        let mut config = match (path, from_env) {
            (Some(p), _) => Self::from_file(p)?,
            (None, Some(p)) => Self::from_file(Path::new(&p))?,
            (None, None) => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OGD_INFERENCE") {
            self.inference = v.parse().map_err(|e: String| anyhow!("OGD_INFERENCE: {e}"))?;
            tracing::debug!(inference = ?self.inference, "env override");
        }
        if let Some(v) = get("OGD_HISTOGRAM_BINS") {
            self.histogram_bins = v
                .trim()
                .parse()
                .with_context(|| format!("OGD_HISTOGRAM_BINS: `{v}` is not a count"))?;
        }
        if let Some(v) = get("OGD_MAX_ROWS") {
            self.max_rows = Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("OGD_MAX_ROWS: `{v}` is not a count"))?,
            );
        }
        if let Some(v) = get(LOG_ENV) {
            self.log = Some(v);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            return Err(anyhow!("histogram_bins must be at least 1"));
        }
        Ok(())
    }
}
