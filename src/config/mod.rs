#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::domain::ports::{ConfigProvider, ReportMode, SalesColumns};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CHART_DIR: &str = "charts";
pub const DEFAULT_OUTPUT_PATH: &str = "report.pdf";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Resolved settings for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub input_path: PathBuf,
    pub chart_dir: PathBuf,
    pub output_path: PathBuf,
    pub mode: ReportMode,
    pub title: Option<String>,
    pub preview_rows: usize,
    pub sales: SalesColumns,
}

impl ReportConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            mode: ReportMode::Data,
            title: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            sales: SalesColumns::default(),
        }
    }
}

impl ConfigProvider for ReportConfig {
    fn input_path(&self) -> &Path {
        &self.input_path
    }

    fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn mode(&self) -> ReportMode {
        self.mode
    }

    fn report_title(&self) -> String {
        match (&self.title, self.mode) {
            (Some(title), _) => title.clone(),
            (None, ReportMode::Data) => "Data Report".to_string(),
            (None, ReportMode::Sales) => "Sales Report".to_string(),
        }
    }

    fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    fn sales_columns(&self) -> &SalesColumns {
        &self.sales
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input_path", &self.input_path.to_string_lossy())?;
        validate_path("chart_dir", &self.chart_dir.to_string_lossy())?;
        validate_path("output_path", &self.output_path.to_string_lossy())?;
        validate_range("preview_rows", self.preview_rows, 1, 100)?;

        if self.mode == ReportMode::Sales {
            validate_non_empty_string("sales.units_column", &self.sales.units_column)?;
            validate_non_empty_string("sales.price_column", &self.sales.price_column)?;
            validate_non_empty_string("sales.total_column", &self.sales.total_column)?;
            validate_non_empty_string("sales.group_column", &self.sales.group_column)?;
        }
        Ok(())
    }
}
