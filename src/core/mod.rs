pub mod engine;
pub mod generator;
pub mod normalizer;
pub mod prompt;

pub use crate::domain::model::{
    GenerationParams, GenerationRequest, GenerationResult, Record, RecordSet, UploadedFile,
};
pub use crate::domain::ports::{ChunkStream, ModelClient, Storage};
pub use crate::utils::error::Result;
