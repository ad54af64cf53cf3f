// Configuration file for the rsp CLI
//
// Every field is optional in the file; command-line flags override it.

use crate::html_output::ChartSize;
use crate::stats::TimeUnit;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_bind() -> String {
    "localhost:8080".to_string()
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    600
}

/// Chart dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl ChartConfig {
    pub fn size(&self) -> ChartSize {
        ChartSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Settings loaded from `--config <FILE>`
///
/// ```toml
/// bind = "0.0.0.0:9000"
/// unit = "ns"
///
/// [chart]
/// width = 900
/// height = 450
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RspConfig {
    /// Address for `timings` when no `--bind` is given
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Unit for `percentiles` and `timings` when no `--unit` is given
    #[serde(default)]
    pub unit: TimeUnit,

    #[serde(default)]
    pub chart: ChartConfig,
}

impl Default for RspConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            unit: TimeUnit::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl RspConfig {
    /// Load and validate a TOML config file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: RspConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Defaults when `path` is `None`, otherwise the parsed file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.trim().is_empty() {
            return Err("bind must not be empty".to_string());
        }

        if self.chart.width < 100 || self.chart.height < 100 {
            return Err(format!(
                "chart must be at least 100x100, got {}x{}",
                self.chart.width, self.chart.height
            ));
        }

        Ok(())
    }
}
