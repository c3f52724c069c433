use crate::domain::model::GenerationParams;
use crate::utils::error::Result;

/// 依序產生文字片段的串流，有限且只能走一次
pub type ChunkStream<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// 以名稱指定、以串流回傳文字的生成模型
pub trait ModelClient {
    fn stream_generate(&self, prompt: &str, params: &GenerationParams) -> Result<ChunkStream<'_>>;
}

impl<M: ModelClient + ?Sized> ModelClient for &M {
    fn stream_generate(&self, prompt: &str, params: &GenerationParams) -> Result<ChunkStream<'_>> {
        (**self).stream_generate(prompt, params)
    }
}
