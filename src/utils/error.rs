use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Directory source '{origin}' unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    #[error("Failed to parse '{file}': {reason}")]
    FileParseError { file: String, reason: String },

    #[error("Row {line} of '{file}' has {width} columns, at least {required} required")]
    SchemaAccessError {
        file: String,
        line: usize,
        width: usize,
        required: usize,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Directory,
    Input,
    Output,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RouterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RouterError::SourceUnavailable { .. } | RouterError::HttpError(_) => {
                ErrorCategory::Directory
            }
            RouterError::CsvError(_)
            | RouterError::SpreadsheetError(_)
            | RouterError::FileParseError { .. }
            | RouterError::SchemaAccessError { .. } => ErrorCategory::Input,
            RouterError::ZipError(_) | RouterError::XlsxError(_) | RouterError::IoError(_) => {
                ErrorCategory::Output
            }
            RouterError::ConfigError { .. }
            | RouterError::MissingConfigError { .. }
            | RouterError::InvalidConfigValueError { .. }
            | RouterError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            RouterError::SerializationError(_)
            | RouterError::ProcessingError { .. }
            | RouterError::ValidationError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單列或單檔錯誤只影響部分資料
            RouterError::SchemaAccessError { .. } => ErrorSeverity::Low,
            RouterError::FileParseError { .. }
            | RouterError::CsvError(_)
            | RouterError::SpreadsheetError(_) => ErrorSeverity::Medium,
            RouterError::SourceUnavailable { .. } | RouterError::HttpError(_) => {
                ErrorSeverity::Medium
            }
            RouterError::IoError(_) | RouterError::ZipError(_) | RouterError::XlsxError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Directory => {
                "Check the directory sheet URL (Publish to web > CSV) or the local directory file, then re-run"
            }
            ErrorCategory::Input => {
                "Check that the master files are CSV or Excel and keep the expected column layout"
            }
            ErrorCategory::Output => "Check free disk space and write permissions for the output path",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags and retry",
            ErrorCategory::Processing => "Re-run with --verbose and inspect the logged rows",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RouterError::SourceUnavailable { origin, .. } => {
                format!("Could not load the BDE directory from {}", origin)
            }
            RouterError::FileParseError { file, .. } => format!("Could not read file {}", file),
            RouterError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            RouterError::MissingConfigError { field } => format!("Missing setting {}", field),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
