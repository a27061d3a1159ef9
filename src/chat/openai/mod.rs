
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChatService;
use crate::config::OpenAiConfig;
use crate::http::{HttpClient, ServiceError};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_ASSISTANT_PERSONA: &str = "You are a helpful assistant.";

/// Client for the OpenAI `/v1/chat/completions` endpoint (non-streaming)
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    endpoint: String,
    model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    #[inline]
    pub fn new(config: &OpenAiConfig, http: HttpClient) -> Self {
        Self {
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.chat_model.clone(),
            http,
        }
    }
}

impl ChatService for OpenAiChat {
    fn complete(&self, system: &str, user: &str, api_key: &str) -> Result<String, ServiceError> {
        debug!(
            "Requesting chat completion from {} (prompt length: {})",
            self.model,
            user.len()
        );

        let bearer = format!("Bearer {}", api_key);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response: ChatResponse =
            self.http
                .post_json(&self.endpoint, &[("Authorization", bearer.as_str())], &request)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ServiceError::MissingField("choices[0].message.content"))
    }
}
