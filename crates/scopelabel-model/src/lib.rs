//! Chat model contract: tokenizer-aware encode/decode plus a synchronous-feeling
//! chat call, with an OpenAI-compatible HTTP implementation.

mod error;
mod openai;

pub use error::ModelError;
pub use openai::{ModelConfig, OpenAiChat};

use async_trait::async_trait;
use scopelabel_core::ChatMessage;

/// Contract the labeling engine consumes.
///
/// `encode`/`decode` expose the model's tokenizer for prompt budgeting;
/// `max_tokens` is the model's context capacity; `chat` submits an ordered
/// message sequence and returns the raw text reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    fn max_tokens(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vec<u32>, ModelError>;

    fn decode(&self, tokens: &[u32]) -> Result<String, ModelError>;

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
