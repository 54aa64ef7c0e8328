//! OpenAI-compatible chat client with a local `tokenizers` encoder.
//!
//! The encoder comes from a `tokenizer.json` next to the model (the same
//! layout sentence-transformers exports), so token budgeting works offline
//! and against self-hosted OpenAI-compatible servers.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;
use tracing::info;

use scopelabel_core::ChatMessage;

use crate::{ChatModel, ModelError};

/// Connection and capacity settings for [`OpenAiChat::load`].
pub struct ModelConfig {
    pub model_id: String,
    /// Like `https://api.openai.com/v1` (no trailing slash required).
    pub base_url: String,
    /// Bearer token; `None` for unauthenticated local servers.
    pub api_key: Option<String>,
    /// Model context capacity in tokens.
    pub max_tokens: usize,
    /// Path to the model's `tokenizer.json`.
    pub tokenizer_path: PathBuf,
}

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model_id: String,
    max_tokens: usize,
    tokenizer: Tokenizer,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiChat {
    /// Prepare the model for use: load the tokenizer and build the HTTP client.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let tokenizer = Tokenizer::from_file(&config.tokenizer_path).map_err(|e| {
            ModelError::Tokenizer(format!(
                "load {}: {e}",
                config.tokenizer_path.display()
            ))
        })?;
        info!(
            model = %config.model_id,
            max_tokens = config.max_tokens,
            "loaded chat model tokenizer"
        );

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_id: config.model_id.clone(),
            max_tokens: config.max_tokens,
            tokenizer,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, ModelError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, ModelError> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model_id,
            messages,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse)?;
        if reply.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopelabel_core::Role;

    #[test]
    fn request_wire_format() {
        let messages = [
            ChatMessage::system("label lists"),
            ChatMessage::user("1. a\n2. b"),
        ];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "1. a\n2. b");
    }

    #[test]
    fn response_parse_extracts_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Sports cars"}}
            ],
            "usage": {"total_tokens": 42}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Sports cars");
    }

    #[test]
    fn messages_keep_order() {
        let messages = [ChatMessage::system("s"), ChatMessage::user("u")];
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }
}
