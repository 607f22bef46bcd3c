use crate::error::Result;
use crate::types::PivotScope;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ROLLUP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rollup.json";

/// Runtime settings for the console front-end. Every field is optional in
/// the file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Flat records; `.csv` selects the CSV loader, anything else is JSON.
    pub records_path: PathBuf,
    /// One `<zone>.json` detail payload per zone.
    pub detail_dir: PathBuf,
    pub kpi_path: PathBuf,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
    pub decimals: usize,
    pub scope: PivotScope,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            records_path: PathBuf::from("records.json"),
            detail_dir: PathBuf::from("detail"),
            kpi_path: PathBuf::from("kpi.json"),
            output_dir: PathBuf::from("."),
            preview_rows: 10,
            decimals: 2,
            scope: PivotScope::default(),
        }
    }
}

impl AppConfig {
    /// Read the file named by `ROLLUP_CONFIG`, or `rollup.json`.
    pub fn load() -> Result<AppConfig> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// A missing file means defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
