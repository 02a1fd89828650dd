//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rageval_core::ColumnNames;

/// Top-level rageval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagevalConfig {
    /// Measures to compute when `--measures` is not given.
    #[serde(default = "default_measures")]
    pub measures: Vec<String>,
    /// Output format when `--format` is not given.
    #[serde(default = "default_format")]
    pub format: String,
    /// Column names for tabular qrels and runs.
    #[serde(default)]
    pub columns: ColumnNames,
}

fn default_measures() -> Vec<String> {
    vec!["EM".to_string(), "F1".to_string()]
}
fn default_format() -> String {
    "text".to_string()
}

impl Default for RagevalConfig {
    fn default() -> Self {
        Self {
            measures: default_measures(),
            format: default_format(),
            columns: ColumnNames::default(),
        }
    }
}

/// Split a comma-separated measure list, dropping empty items.
pub fn parse_measure_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `rageval.toml` in the current directory
/// 2. `~/.config/rageval/config.toml`
///
/// `RAGEVAL_MEASURES` (comma-separated) overrides the configured measures.
pub fn load_config_from(path: Option<&Path>) -> Result<RagevalConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("rageval.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RagevalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RagevalConfig::default(),
    };

    if let Ok(measures) = std::env::var("RAGEVAL_MEASURES") {
        let measures = parse_measure_list(&measures);
        if !measures.is_empty() {
            config.measures = measures;
        }
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("rageval"))
}
