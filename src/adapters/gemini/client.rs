use super::dto::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::config::ModelConfig;
use crate::core::{ChunkStream, GenerationParams, ModelClient};
use crate::utils::error::{DescribeError, Result};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Gemini 串流端點的客戶端。自帶單執行緒 runtime，
/// 把事件串流包成同步的 iterator
pub struct GeminiClient {
    runtime: Runtime,
    client: Client,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DescribeError::ConfigError {
                message: format!("failed to start HTTP runtime: {}", e),
            })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = {
            let _guard = runtime.enter();
            builder.build().map_err(|e| DescribeError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?
        };

        Ok(Self {
            runtime,
            client,
            config,
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.name
        )
    }
}

impl ModelClient for GeminiClient {
    fn stream_generate(&self, prompt: &str, params: &GenerationParams) -> Result<ChunkStream<'_>> {
        let url = self.stream_url();
        tracing::debug!("Making streaming request to: {}", url);

        let body = GenerateContentRequest::new(prompt, params);
        let request = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);

        // 建立請求 future 時會設定 timeout，必須在 runtime 內
        let source = {
            let _guard = self.runtime.enter();
            EventSource::new(request).map_err(|e| DescribeError::GenerationError {
                message: format!("failed to open model stream: {}", e),
            })?
        };

        let mut chunks = ChunkEvents {
            runtime: &self.runtime,
            source,
            pending: None,
            done: false,
        };
        chunks.open()?;
        Ok(Box::new(chunks))
    }
}

/// Text chunks pulled one event at a time from an [`EventSource`].
/// The source is closed on the first error so it never reconnects.
struct ChunkEvents<'a> {
    runtime: &'a Runtime,
    source: EventSource,
    pending: Option<String>,
    done: bool,
}

impl ChunkEvents<'_> {
    fn poll_event(&mut self) -> Option<std::result::Result<Event, EventSourceError>> {
        self.runtime.block_on(self.source.next())
    }

    /// 先等回應標頭，HTTP 錯誤會在第一個片段之前回報
    fn open(&mut self) -> Result<()> {
        match self.poll_event() {
            Some(Ok(Event::Open)) => {
                tracing::debug!("Model stream opened");
                Ok(())
            }
            Some(Ok(Event::Message(message))) => {
                self.pending = Some(message.data);
                Ok(())
            }
            Some(Err(EventSourceError::StreamEnded)) | None => {
                self.finish();
                Ok(())
            }
            Some(Err(e)) => {
                self.finish();
                Err(self.stream_error(e))
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.source.close();
    }

    fn stream_error(&self, error: EventSourceError) -> DescribeError {
        match error {
            EventSourceError::InvalidStatusCode(status, response) => {
                tracing::debug!("Model response status: {}", status);
                let body = self.runtime.block_on(response.text()).unwrap_or_default();
                DescribeError::GenerationError {
                    message: upstream_error_message(status, &body),
                }
            }
            EventSourceError::InvalidContentType(content_type, _) => {
                let content_type = content_type.to_str().unwrap_or_default();
                DescribeError::GenerationError {
                    message: if content_type.is_empty() {
                        "model service did not answer with an event stream".to_string()
                    } else {
                        format!("model service answered with {} instead of an event stream", content_type)
                    },
                }
            }
            EventSourceError::Transport(e) => e.into(),
            other => DescribeError::GenerationError {
                message: format!("stream interrupted: {}", other),
            },
        }
    }
}

impl Iterator for ChunkEvents<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let data = match self.pending.take() {
                Some(data) => data,
                None if self.done => return None,
                None => match self.poll_event() {
                    Some(Ok(Event::Open)) => continue,
                    Some(Ok(Event::Message(message))) => message.data,
                    Some(Err(EventSourceError::StreamEnded)) | None => {
                        tracing::debug!("Model stream ended");
                        self.finish();
                        return None;
                    }
                    Some(Err(e)) => {
                        self.finish();
                        return Some(Err(self.stream_error(e)));
                    }
                },
            };

            match decode_chunk(&data) {
                Ok(Some(text)) => return Some(Ok(text)),
                Ok(None) => continue,
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }
    }
}

fn upstream_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("{} ({})", envelope.error.message, status)
        }
        _ if body.trim().is_empty() => format!("model service returned {}", status),
        _ => format!("model service returned {}: {}", status, body.trim()),
    }
}

/// 解析單一事件的文字，沒有文字的事件回傳 `None`
fn decode_chunk(data: &str) -> Result<Option<String>> {
    let chunk: GenerateContentResponse =
        serde_json::from_str(data).map_err(|e| DescribeError::GenerationError {
            message: format!("invalid stream chunk: {}", e),
        })?;

    if let Some(error) = &chunk.error {
        return Err(DescribeError::GenerationError {
            message: error.message.clone(),
        });
    }

    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(DescribeError::GenerationError {
            message: format!("prompt blocked: {}", reason),
        });
    }

    let text = chunk.text();
    if text.is_none() {
        // SAFETY、RECITATION 等原因會在沒有文字時中止回答
        if let Some(reason) = chunk.stop_reason() {
            return Err(DescribeError::GenerationError {
                message: format!("generation stopped: {}", reason),
            });
        }
    }

    Ok(text)
}
