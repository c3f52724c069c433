pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::fmt;
use toml_config::ModelSection;

#[cfg(feature = "cli")]
use crate::core::engine::DescribeJob;
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// 連線模型服務所需的最終設定
#[derive(Clone)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_seconds: Option<u64>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ModelConfig {
    /// 優先順序：命令列參數 > 配置檔 > 預設值
    /// API key 找不到時改讀 `GEMINI_API_KEY`
    pub fn resolve(
        section: Option<&ModelSection>,
        name_override: Option<&str>,
        endpoint_override: Option<&str>,
    ) -> Result<Self> {
        let section = section.cloned().unwrap_or_default();

        let name = name_override
            .map(str::to_string)
            .or(section.name)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = endpoint_override
            .map(str::to_string)
            .or(section.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        // 未被替換的 `${VAR}` 視為未設定
        let api_key = section
            .api_key
            .filter(|key| !key.starts_with("${"))
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());
        let api_key = validation::validate_required_field("model.api_key", &api_key)?.clone();

        let config = Self {
            name,
            endpoint,
            api_key,
            timeout_seconds: section.timeout_seconds,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ModelConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("model.name", &self.name)?;
        validation::validate_url("model.endpoint", &self.endpoint)?;
        validation::validate_non_empty_string("model.api_key", &self.api_key)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("model.timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "product-describer")]
#[command(about = "Generate product descriptions from a JSON or CSV data file")]
pub struct CliConfig {
    /// Product data file (.json or .csv)
    #[arg(short, long)]
    pub file: String,

    /// Prompt sent to the model after the product data
    #[arg(short, long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read the prompt from a text file
    #[arg(long)]
    pub prompt_file: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short, long, default_value_t = 0.4, allow_negative_numbers = true)]
    pub temperature: f32,

    /// Optional product image URL (accepted, not yet sent to the model)
    #[arg(long)]
    pub image_url: Option<String>,

    /// TOML file with a [model] section
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Model name, overrides the config file")]
    pub model: Option<String>,

    #[arg(long, help = "Model API base URL, overrides the config file")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Print each segment as soon as it arrives")]
    pub stream: bool,

    #[arg(long, conflicts_with = "stream", help = "Print the full result as JSON")]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn prompt_text(&self) -> Result<String> {
        match (&self.prompt, &self.prompt_file) {
            (Some(prompt), _) => Ok(prompt.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
            (None, None) => Ok(String::new()),
        }
    }

    pub fn image_url(&self) -> Option<String> {
        self.image_url.clone().filter(|url| !url.trim().is_empty())
    }

    pub fn to_job(&self) -> Result<DescribeJob> {
        Ok(DescribeJob {
            data_file: self.file.clone(),
            prompt: self.prompt_text()?,
            temperature: self.temperature,
            image_url: self.image_url(),
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("file", &self.file)?;
        validation::validate_temperature(self.temperature)?;
        if let Some(url) = self.image_url() {
            validation::validate_url("image_url", &url)?;
        }
        if let Some(path) = &self.prompt_file {
            validation::validate_non_empty_string("prompt_file", path)?;
        }
        Ok(())
    }
}
