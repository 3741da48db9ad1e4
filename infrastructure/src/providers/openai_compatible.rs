//! OpenAI-compatible HTTP provider adapter
//!
//! Implements both the generation and the embedding gateway against a
//! `/chat/completions` + `/embeddings` style API. The adapter makes a
//! single attempt per call (degradation policy belongs to the caller)
//! and enforces the configured bounded wait at the HTTP client level.

use async_trait::async_trait;
use council_application::ports::embedding_gateway::{EmbeddingError, EmbeddingGateway};
use council_application::ports::generation_gateway::{
    GenerationGateway, GenerationOptions, ProviderError, StreamHandle,
};
use council_domain::{Message, Model, StreamEvent};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
}

impl OpenAiCompatibleGateway {
    /// Create a new gateway against `base_url` (no trailing slash needed).
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        embedding_model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            embedding_model: embedding_model.into(),
        })
    }

    fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn embeddings_endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn post(&self, endpoint: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(endpoint);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }
        builder
    }

    fn chat_request<'a>(
        model: &'a Model,
        messages: &'a [Message],
        options: GenerationOptions,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: model.as_str(),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stream,
        }
    }
}

#[async_trait]
impl GenerationGateway for OpenAiCompatibleGateway {
    async fn generate(
        &self,
        model: &Model,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = Self::chat_request(model, messages, options, false);
        debug!(model = %model, messages = messages.len(), "Generation request");

        let response = self
            .post(self.chat_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(map_generation_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        match completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
        {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(ProviderError::EmptyResponse),
        }
    }

    async fn generate_streaming(
        &self,
        model: &Model,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<StreamHandle, ProviderError> {
        let request = Self::chat_request(model, messages, options, true);
        debug!(model = %model, "Streaming generation request");

        let response = self
            .post(self.chat_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(map_generation_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut accumulated = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=pos);

                    match parse_sse_line(&line) {
                        Some(SseFrame::Done) => {
                            let _ = tx
                                .send(StreamEvent::Completed(std::mem::take(&mut accumulated)))
                                .await;
                            return;
                        }
                        Some(SseFrame::Delta(delta)) => {
                            accumulated.push_str(&delta);
                            let _ = tx.send(StreamEvent::Delta(delta)).await;
                        }
                        // Malformed partial frames are skipped silently
                        None => trace!(%line, "Skipping non-delta SSE line"),
                    }
                }
            }

            // Stream ended without a [DONE] marker
            let _ = tx.send(StreamEvent::Completed(accumulated)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[async_trait]
impl EmbeddingGateway for OpenAiCompatibleGateway {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self
            .post(self.embeddings_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        match parsed.data.into_iter().next() {
            Some(data) if !data.embedding.is_empty() => Ok(data.embedding),
            _ => Err(EmbeddingError::EmptyResponse),
        }
    }
}

fn map_generation_transport(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(e.to_string())
    }
}

/// One decoded SSE frame of a streaming chat completion.
#[derive(Debug, PartialEq)]
enum SseFrame {
    /// A text fragment
    Delta(String),
    /// The `[DONE]` terminator
    Done,
}

/// Decode one SSE line. Returns `None` for anything that is not a usable
/// data frame (comments, empty keep-alives, malformed JSON) so the
/// stream reader can keep going.
fn parse_sse_line(line: &str) -> Option<SseFrame> {
    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(SseFrame::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    let content = chunk.choices.into_iter().next()?.delta.content?;
    if content.is_empty() {
        return None;
    }
    Some(SseFrame::Delta(content))
}

// ==================== Wire types ====================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
