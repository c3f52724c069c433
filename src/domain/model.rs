use serde::{Deserialize, Serialize};

/// 單一商品的屬性，欄位順序與來源檔案相同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub type RecordSet = Vec<Record>;

/// 前端交來的資料檔
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub records: RecordSet,
    pub prompt: String,
    pub temperature: f32,
    /// 接受但不會送給模型
    pub image_url: Option<String>,
}

/// 固定的解碼參數，只有 temperature 由呼叫端決定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GenerationParams {
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;
    pub const TOP_P: f32 = 1.0;
    pub const TOP_K: u32 = 32;

    pub fn with_temperature(temperature: f32) -> crate::utils::error::Result<Self> {
        crate::utils::validation::validate_temperature(temperature)?;
        Ok(Self {
            max_output_tokens: Self::MAX_OUTPUT_TOKENS,
            temperature,
            top_p: Self::TOP_P,
            top_k: Self::TOP_K,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    #[serde(rename = "product_data")]
    pub records: RecordSet,
    /// 實際送給模型的完整提示
    pub prompt: String,
    #[serde(rename = "description")]
    pub segments: Vec<String>,
}

impl GenerationResult {
    pub fn text(&self) -> String {
        self.segments.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_params_fixed_values() {
        let params = GenerationParams::with_temperature(0.4).unwrap();
        assert_eq!(params.max_output_tokens, 2048);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.top_k, 32);
        assert_eq!(params.temperature, 0.4);
    }

    #[test]
    fn test_generation_params_reject_out_of_range_temperature() {
        assert!(GenerationParams::with_temperature(1.01).is_err());
        assert!(GenerationParams::with_temperature(-1.0).is_err());
    }

    #[test]
    fn test_generation_result_serializes_with_output_keys() {
        let record: Record = serde_json::from_value(json!({"id": 1})).unwrap();
        let result = GenerationResult {
            records: vec![record],
            prompt: "[{\"id\": 1}]Go".to_string(),
            segments: vec!["A".to_string(), "B".to_string()],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["product_data"], json!([{"id": 1}]));
        assert_eq!(value["prompt"], json!("[{\"id\": 1}]Go"));
        assert_eq!(value["description"], json!(["A", "B"]));
        assert_eq!(result.text(), "AB");
    }
}
