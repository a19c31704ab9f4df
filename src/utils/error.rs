use thiserror::Error;

/// Why a parser rejected an input file.
#[derive(Error, Debug)]
pub enum LoadFailure {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Malformed table: {message}")]
    Malformed { message: String },
}

impl LoadFailure {
    pub fn malformed(message: impl Into<String>) -> Self {
        LoadFailure::Malformed {
            message: message.into(),
        }
    }

    /// Parse failures may be retried with another delimiter; I/O failures may not.
    pub fn is_parse_failure(&self) -> bool {
        !matches!(self, LoadFailure::Io(_))
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Error loading file {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: LoadFailure,
    },

    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    #[error("Chart rendering error: {message}")]
    ChartError { message: String },

    #[error("PDF error: {message}")]
    PdfError { message: String },

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Output,
    Configuration,
}

impl ReportError {
    pub fn load(path: impl Into<String>, source: impl Into<LoadFailure>) -> Self {
        ReportError::LoadError {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn chart(err: impl std::fmt::Display) -> Self {
        ReportError::ChartError {
            message: err.to_string(),
        }
    }

    pub fn pdf(err: impl std::fmt::Debug) -> Self {
        ReportError::PdfError {
            message: format!("{:?}", err),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::UnsupportedFormat { .. } | ReportError::LoadError { .. } => {
                ErrorCategory::Input
            }
            ReportError::MissingColumn { .. } | ReportError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            ReportError::ChartError { .. }
            | ReportError::PdfError { .. }
            | ReportError::ImageError(_)
            | ReportError::IoError(_) => ErrorCategory::Output,
            ReportError::ConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::UnsupportedFormat { extension } => format!(
                "Files with extension '{}' are not supported (use .csv, .xlsx, .json or .txt)",
                extension
            ),
            ReportError::LoadError { path, source } => {
                format!("Could not read '{}': {}", path, source)
            }
            ReportError::MissingColumn { column } => {
                format!("The input has no column named '{}'", column)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
