use crate::domain::summary::Aggregation;
use crate::domain::model::{ChartArtifact, Table};
use crate::utils::error::Result;
use std::path::Path;

/// Which report variant a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Statistics table plus one chart per column.
    #[default]
    Data,
    /// Derived sales total, totals summary and a per-group chart.
    Sales,
}

/// Column names used by the sales variant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SalesColumns {
    pub units_column: String,
    pub price_column: String,
    pub total_column: String,
    pub group_column: String,
    pub currency: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            units_column: "Units Sold".to_string(),
            price_column: "Unit Price".to_string(),
            total_column: "Total Sales".to_string(),
            group_column: "Product".to_string(),
            currency: "INR".to_string(),
        }
    }
}

pub trait Storage {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &Path;
    fn chart_dir(&self) -> &Path;
    fn output_path(&self) -> &Path;
    fn mode(&self) -> ReportMode;
    fn report_title(&self) -> String;
    fn preview_rows(&self) -> usize;
    fn sales_columns(&self) -> &SalesColumns;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Table>;
    fn transform(&self, table: Table) -> Result<Aggregation>;
    fn render(&self, aggregation: &Aggregation) -> Result<Vec<ChartArtifact>>;
    fn load(&self, aggregation: &Aggregation, charts: &[ChartArtifact]) -> Result<String>;

    /// Rows of the extracted table echoed back to the caller.
    fn preview_rows(&self) -> usize {
        5
    }
}
