pub mod openai;

use crate::http::ServiceError;

pub use openai::OpenAiChat;

/// A chat-completion backend: one system message, one user message, one reply
pub trait ChatService: Send + Sync {
    fn complete(&self, system: &str, user: &str, api_key: &str) -> Result<String, ServiceError>;
}
