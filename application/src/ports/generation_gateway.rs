//! Generation gateway port
//!
//! Defines the interface for invoking an external text-generation
//! provider. The contract is deliberately single-attempt: a failed call
//! surfaces as [`ProviderError`] and the caller decides degradation
//! policy. Retries, if wanted, belong in a wrapper.

use async_trait::async_trait;
use council_domain::{Message, Model, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the generation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The upstream call returned a non-success status
    #[error("Provider returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call succeeded but carried no usable text content
    #[error("Provider returned no usable content")]
    EmptyResponse,

    /// The bounded wait elapsed before the provider answered
    #[error("Request timed out")]
    Timeout,
}

/// Sampling options for a generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

/// Gateway for generation calls
///
/// This port defines how the application layer invokes generation
/// providers. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Run one generation call and return the full response text.
    async fn generate(
        &self,
        model: &Model,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Run one generation call, delivering text fragments as they arrive.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event, so non-streaming adapters work unchanged.
    async fn generate_streaming(
        &self,
        model: &Model,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<StreamHandle, ProviderError> {
        let result = self.generate(model, messages, options).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is dropped, that's fine
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Handle for receiving streaming events from a generation call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, ProviderError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(ProviderError::Transport(e));
                }
            }
        }
        // Channel closed without Completed — return what we have
        Ok(full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collect_text_accumulates_deltas() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("hel".to_string())).await.unwrap();
        tx.send(StreamEvent::Delta("lo".to_string())).await.unwrap();
        tx.send(StreamEvent::Completed("hello".to_string()))
            .await
            .unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn collect_text_surfaces_stream_error() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Error("connection reset".to_string()))
            .await
            .unwrap();
        drop(tx);

        let result = StreamHandle::new(rx).collect_text().await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }

    #[tokio::test]
    async fn collect_text_handles_closed_channel() {
        let (tx, rx) = mpsc::channel::<StreamEvent>(1);
        drop(tx);
        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "");
    }
}
