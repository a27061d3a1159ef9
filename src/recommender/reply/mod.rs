
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, warn};

use super::{FailureKind, Recommendation, Recommender, run_blocking};
use crate::config::Credentials;
use crate::http::ServiceError;

pub const REPLY_FALLBACK: &str = "Failed to generate contextual message.";

/// The user-role message sent to the chat model
#[inline]
pub fn build_reply_prompt(
    query: &str,
    recommendations: &[Recommendation],
    system_prompt: &str,
) -> String {
    format!(
        "User query: {}\nRecommended products: {}\n{}",
        query,
        recommendations.iter().map(|r| r.label.as_str()).join(", "),
        system_prompt
    )
}

impl Recommender {
    /// Ask the chat model to describe `recommendations` in light of `query`
    #[inline]
    pub async fn try_generate_reply(
        &self,
        query: &str,
        recommendations: &[Recommendation],
        credentials: &Credentials,
    ) -> Result<String, ServiceError> {
        let prompt = build_reply_prompt(query, recommendations, credentials.system_prompt());
        debug!("Reply prompt covers {} products", recommendations.len());

        let chat = Arc::clone(&self.services.chat);
        let persona = self.persona.clone();
        let api_key = credentials.openai_api_key().to_string();
        run_blocking(move || chat.complete(&persona, &prompt, &api_key)).await
    }

    /// Like [`Self::try_generate_reply`], falling back to a fixed message on failure
    #[inline]
    pub async fn generate_contextual_message(
        &self,
        query: &str,
        recommendations: &[Recommendation],
        credentials: &Credentials,
    ) -> String {
        self.try_generate_reply(query, recommendations, credentials)
            .await
            .unwrap_or_else(|e| {
                warn!("{} failed: {}", FailureKind::ChatCompletion, e);
                REPLY_FALLBACK.to_string()
            })
    }
}
