use crate::config::{ReportConfig, DEFAULT_CHART_DIR, DEFAULT_OUTPUT_PATH, DEFAULT_PREVIEW_ROWS};
use crate::domain::ports::{ReportMode, SalesColumns};
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub report: ReportSection,
    pub sales: SalesColumns,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub chart_dir: PathBuf,
    pub report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            report_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub mode: ReportMode,
    pub title: Option<String>,
    pub preview_rows: usize,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            mode: ReportMode::Data,
            title: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl TomlConfig {
    /// Reads and parses a TOML file, substituting `${VAR}` references first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Requires `[input] path`; everything else falls back to defaults.
    pub fn into_report_config(self) -> Result<ReportConfig> {
        let input_path = validate_required_field("input.path", &self.input.path)?.clone();
        Ok(ReportConfig {
            input_path,
            chart_dir: self.output.chart_dir,
            output_path: self.output.report_path,
            mode: self.report.mode,
            title: self.report.title,
            preview_rows: self.report.preview_rows,
            sales: self.sales,
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.clone().into_report_config()?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[input]
path = "sales_data.xlsx"

[output]
chart_dir = "out/charts"
report_path = "out/sales.pdf"

[report]
mode = "sales"
title = "Monthly Sales"
preview_rows = 10

[sales]
units_column = "Qty"
currency = "USD"
"#;

        let config = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_report_config()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("sales_data.xlsx"));
        assert_eq!(config.chart_dir, PathBuf::from("out/charts"));
        assert_eq!(config.output_path, PathBuf::from("out/sales.pdf"));
        assert_eq!(config.mode, ReportMode::Sales);
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.sales.units_column, "Qty");
        assert_eq!(config.sales.price_column, "Unit Price");
        assert_eq!(config.sales.currency, "USD");
    }

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config = TomlConfig::from_toml_str("[input]\npath = \"data.csv\"\n")
            .unwrap()
            .into_report_config()
            .unwrap();

        assert_eq!(config, ReportConfig::new("data.csv"));
    }

    #[test]
    fn test_missing_input_path() {
        let config = TomlConfig::from_toml_str("[report]\nmode = \"data\"\n").unwrap();
        assert!(matches!(
            config.into_report_config(),
            Err(ReportError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DATA_REPORT_TEST_INPUT", "from_env.json");

        let config = TomlConfig::from_toml_str(
            "[input]\npath = \"${DATA_REPORT_TEST_INPUT}\"\n",
        )
        .unwrap();
        assert_eq!(config.input.path, Some(PathBuf::from("from_env.json")));

        std::env::remove_var("DATA_REPORT_TEST_INPUT");
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let result = TomlConfig::from_toml_str("[report]\nmode = \"weekly\"\n");
        assert!(matches!(result, Err(ReportError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[input]\npath = \"data.txt\"\n\n[report]\npreview_rows = 0\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input.path, Some(PathBuf::from("data.txt")));
        assert!(config.validate().is_err());
    }
}
