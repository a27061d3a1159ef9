// Embeddings module
// Turns catalog descriptions and user queries into vectors

pub mod openai;

use crate::http::ServiceError;

pub use openai::OpenAiEmbedder;

pub type Embedding = Vec<f32>;

/// A text-embedding backend. The API key travels with every call.
pub trait EmbeddingService: Send + Sync {
    /// Model used when the caller does not name one
    fn default_model(&self) -> &str;

    fn embed_with_model(
        &self,
        text: &str,
        model: &str,
        api_key: &str,
    ) -> Result<Embedding, ServiceError>;

    #[inline]
    fn embed(&self, text: &str, api_key: &str) -> Result<Embedding, ServiceError> {
        self.embed_with_model(text, self.default_model(), api_key)
    }
}
