use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::loader::{LoaderOptions, DEFAULT_DATE_COLUMNS};
use crate::data::pipeline::DEFAULT_PREVIEW_ROWS;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "PLAN_VIEWER_CONFIG";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Settings read from JSON; every key is optional.
///
/// ```json
/// { "csv_delimiter": ",", "preview_rows": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub csv_delimiter: char,
    pub date_columns: Vec<String>,
    pub domain_column: String,
    pub budget_line_column: String,
    pub date_range_column: String,
    pub preview_rows: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            csv_delimiter: ';',
            date_columns: DEFAULT_DATE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            domain_column: "Domaines de dépense".to_string(),
            budget_line_column: "Ligne budgétaire".to_string(),
            date_range_column: "Date de début".to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(text).context("parsing config JSON")?;
        if !config.csv_delimiter.is_ascii() {
            bail!(
                "csv_delimiter must be a single ASCII character, got {:?}",
                config.csv_delimiter
            );
        }
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Config from the file named by `PLAN_VIEWER_CONFIG`, defaults when unset.
    /// A broken file is logged and the defaults are used.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_path(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            // from_json only accepts ASCII delimiters
            delimiter: self.csv_delimiter as u8,
            date_columns: self.date_columns.clone(),
        }
    }
}
