use crate::config::{ReportConfig, TomlConfig};
use crate::domain::ports::ReportMode;
use crate::utils::error::{ReportError, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "data-report")]
#[command(about = "Turn a csv/xlsx/json/txt table into a PDF report with statistics and charts")]
pub struct CliConfig {
    /// Input file (.csv, .xlsx, .json or .txt)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Optional TOML configuration; command line flags override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that receives the chart images
    #[arg(long)]
    pub chart_dir: Option<PathBuf>,

    /// Path of the generated PDF
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub mode: Option<ReportMode>,

    /// Report title (defaults to "Data Report" or "Sales Report")
    #[arg(long)]
    pub title: Option<String>,

    /// Number of rows printed in the console preview
    #[arg(long)]
    pub preview_rows: Option<usize>,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Builds the run configuration: TOML file first, then command line overrides.
    pub fn resolve(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut toml = TomlConfig::from_file(path)?;
                if toml.input.path.is_none() {
                    toml.input.path = self.input.clone();
                }
                toml.into_report_config()?
            }
            None => {
                let input = self.input.clone().ok_or_else(|| ReportError::MissingConfigError {
                    field: "input".to_string(),
                })?;
                ReportConfig::new(input)
            }
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(chart_dir) = &self.chart_dir {
            config.chart_dir = chart_dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(title) = &self.title {
            config.title = Some(title.clone());
        }
        if let Some(rows) = self.preview_rows {
            config.preview_rows = rows;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_input_only() {
        let cli = CliConfig::parse_from(["data-report", "--input", "sales_data.csv"]);
        let config = cli.resolve().unwrap();

        assert_eq!(config, ReportConfig::new("sales_data.csv"));
    }

    #[test]
    fn test_missing_input() {
        let cli = CliConfig::parse_from(["data-report"]);
        assert!(matches!(
            cli.resolve(),
            Err(ReportError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_flags_override_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                b"[input]\npath = \"from_toml.csv\"\n\n[output]\nreport_path = \"toml.pdf\"\n\n[report]\nmode = \"sales\"\n",
            )
            .unwrap();
        let config_path = temp_file.path().to_string_lossy().to_string();

        let cli = CliConfig::parse_from([
            "data-report",
            "--config",
            config_path.as_str(),
            "--output",
            "cli.pdf",
            "--preview-rows",
            "3",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.input_path, PathBuf::from("from_toml.csv"));
        assert_eq!(config.output_path, PathBuf::from("cli.pdf"));
        assert_eq!(config.mode, ReportMode::Sales);
        assert_eq!(config.preview_rows, 3);
    }

    #[test]
    fn test_mode_flag() {
        let cli = CliConfig::parse_from(["data-report", "-i", "data.xlsx", "--mode", "sales"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.mode, ReportMode::Sales);
    }
}
