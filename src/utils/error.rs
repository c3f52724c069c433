use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Json => write!(f, "JSON"),
            FileFormat::Csv => write!(f, "CSV"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("Unsupported file format: {filename} (expected .json or .csv)")]
    UnsupportedFormat { filename: String },

    #[error("Failed to parse {format} file: {message}")]
    ParseError { format: FileFormat, message: String },

    #[error("Generation failed: {message}")]
    GenerationError { message: String },

    #[error("Temperature {value} is outside the range [0.0, 1.0]")]
    InvalidTemperature { value: f32 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

// 與模型連線的錯誤都算生成失敗
impl From<reqwest::Error> for DescribeError {
    fn from(err: reqwest::Error) -> Self {
        DescribeError::GenerationError {
            message: err.to_string(),
        }
    }
}

impl DescribeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DescribeError::UnsupportedFormat { .. }
            | DescribeError::ParseError { .. }
            | DescribeError::InvalidTemperature { .. }
            | DescribeError::ConfigError { .. }
            | DescribeError::InvalidConfigValueError { .. }
            | DescribeError::MissingConfigError { .. } => ErrorSeverity::High,
            DescribeError::GenerationError { .. } => ErrorSeverity::Medium,
            DescribeError::SerializationError(_) | DescribeError::IoError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DescribeError::UnsupportedFormat { .. } => {
                "Please upload a JSON or CSV file.".to_string()
            }
            DescribeError::ParseError { format, .. } => {
                format!("The product data file could not be read as {}.", format)
            }
            DescribeError::GenerationError { message } => {
                format!("The model could not generate descriptions: {}", message)
            }
            DescribeError::InvalidTemperature { .. } => {
                "Temperature must be between 0.0 and 1.0.".to_string()
            }
            DescribeError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DescribeError::UnsupportedFormat { .. } => {
                "Rename or export the product data as .json or .csv"
            }
            DescribeError::ParseError { format: FileFormat::Json, .. } => {
                "Check that the file holds a JSON array of objects"
            }
            DescribeError::ParseError { format: FileFormat::Csv, .. } => {
                "Check that the first row is a header and every row has at most as many columns"
            }
            DescribeError::GenerationError { .. } => {
                "Check the API key, model name and network, then run the generation again"
            }
            DescribeError::InvalidTemperature { .. } => "Pass a --temperature between 0.0 and 1.0",
            DescribeError::ConfigError { .. }
            | DescribeError::InvalidConfigValueError { .. } => "Fix the configuration file or flags",
            DescribeError::MissingConfigError { .. } => {
                "Set GEMINI_API_KEY or add api_key to the [model] section of the config file"
            }
            DescribeError::SerializationError(_) | DescribeError::IoError(_) => {
                "Check the file paths and permissions"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DescribeError>;
