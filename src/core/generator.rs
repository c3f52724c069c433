use crate::core::prompt::compose_prompt;
use crate::core::{GenerationParams, GenerationRequest, GenerationResult, ModelClient};
use crate::utils::error::Result;

pub struct DescriptionGenerator<M: ModelClient> {
    client: M,
}

impl<M: ModelClient> DescriptionGenerator<M> {
    pub fn new(client: M) -> Self {
        Self { client }
    }

    /// 執行一次生成，串流結束後回傳完整結果
    pub fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        self.generate_streaming(request, |_| {})
    }

    /// Same as [`generate`](Self::generate), calling `on_segment` for each
    /// chunk as it arrives. On error no result is returned, whatever was
    /// already passed to `on_segment`.
    pub fn generate_streaming<F>(
        &self,
        request: GenerationRequest,
        mut on_segment: F,
    ) -> Result<GenerationResult>
    where
        F: FnMut(&str),
    {
        let params = GenerationParams::with_temperature(request.temperature)?;

        if let Some(image_url) = request.image_url.as_deref().filter(|u| !u.is_empty()) {
            tracing::warn!("Image URL {} is not attached to the model request", image_url);
        }

        let prompt = compose_prompt(&request.records, &request.prompt)?;
        tracing::debug!(
            "Composed prompt: {} records, {} bytes",
            request.records.len(),
            prompt.len()
        );

        let mut segments = Vec::new();
        for chunk in self.client.stream_generate(&prompt, &params)? {
            let text = chunk?;
            tracing::trace!("Received segment of {} bytes", text.len());
            on_segment(&text);
            segments.push(text);
        }

        tracing::debug!("Stream finished after {} segments", segments.len());

        Ok(GenerationResult {
            records: request.records,
            prompt,
            segments,
        })
    }
}
