use crate::core::generator::DescriptionGenerator;
use crate::core::normalizer::normalize;
use crate::core::{GenerationRequest, GenerationResult, ModelClient, Storage, UploadedFile};
use crate::utils::error::Result;
use std::path::Path;

/// 一次生成所需、由前端收集的輸入
#[derive(Debug, Clone)]
pub struct DescribeJob {
    pub data_file: String,
    pub prompt: String,
    pub temperature: f32,
    pub image_url: Option<String>,
}

pub struct DescriptionEngine<S: Storage, M: ModelClient> {
    storage: S,
    generator: DescriptionGenerator<M>,
}

impl<S: Storage, M: ModelClient> DescriptionEngine<S, M> {
    pub fn new(storage: S, client: M) -> Self {
        Self {
            storage,
            generator: DescriptionGenerator::new(client),
        }
    }

    pub fn run<F>(&self, job: DescribeJob, on_segment: F) -> Result<GenerationResult>
    where
        F: FnMut(&str),
    {
        tracing::info!("Reading product data from {}", job.data_file);
        let content = self.storage.read_file(&job.data_file)?;

        let name = Path::new(&job.data_file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&job.data_file)
            .to_string();
        let upload = UploadedFile::new(name, content);

        let records = normalize(&upload)?;
        tracing::info!("Loaded {} product records", records.len());

        let request = GenerationRequest {
            records,
            prompt: job.prompt,
            temperature: job.temperature,
            image_url: job.image_url,
        };

        tracing::info!("Generating descriptions (temperature {})", request.temperature);
        let result = self.generator.generate_streaming(request, on_segment)?;
        tracing::info!("Received {} segments", result.segments.len());

        Ok(result)
    }
}
