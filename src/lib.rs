pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{gemini::GeminiClient, storage::LocalStorage};
pub use config::{toml_config::TomlConfig, ModelConfig};
pub use crate::core::{
    engine::{DescribeJob, DescriptionEngine},
    generator::DescriptionGenerator,
    normalizer::normalize,
    prompt::compose_prompt,
};
pub use domain::model::{
    GenerationParams, GenerationRequest, GenerationResult, Record, RecordSet, UploadedFile,
};
pub use domain::ports::{ChunkStream, ModelClient, Storage};
pub use utils::error::{DescribeError, Result};
