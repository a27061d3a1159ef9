
use std::sync::Arc;

use tracing::{debug, warn};

use super::{RecommendError, Recommender, run_blocking};
use crate::config::Credentials;
use crate::index::MatchResult;

/// One gallery entry: an image and its caption
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub product_id: String,
    pub product_name: String,
    pub image_url: String,
    pub score: f32,
    pub label: String,
}

impl Recommendation {
    /// `None` when the match carries no product metadata
    #[inline]
    pub fn from_match(result: MatchResult) -> Option<Self> {
        let metadata = result.metadata?;
        Some(Self {
            label: format!("{} (Score: {})", metadata.product_name, result.score),
            product_id: result.id,
            product_name: metadata.product_name,
            image_url: metadata.image_url,
            score: result.score,
        })
    }
}

impl Recommender {
    /// Embed `query` and return up to `top_k` products, best first
    #[inline]
    pub async fn try_recommend(
        &self,
        query: &str,
        credentials: &Credentials,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let embedder = Arc::clone(&self.services.embedder);
        let text = query.to_string();
        let api_key = credentials.openai_api_key().to_string();
        let vector = run_blocking(move || embedder.embed(&text, &api_key))
            .await
            .map_err(RecommendError::Embedding)?;

        let index = Arc::clone(&self.services.index);
        let api_key = credentials.pinecone_api_key().to_string();
        let index_name = self.pinecone.index_name.clone();
        let matches = run_blocking(move || index.query(&api_key, &index_name, &vector, top_k))
            .await
            .map_err(RecommendError::Query)?;

        debug!("Index returned {} matches for query", matches.len());

        Ok(matches
            .into_iter()
            .filter_map(|result| {
                let id = result.id.clone();
                let recommendation = Recommendation::from_match(result);
                if recommendation.is_none() {
                    warn!("Dropping match {} without product metadata", id);
                }
                recommendation
            })
            .collect())
    }

    /// Like [`Self::try_recommend`], but any failure yields an empty list
    #[inline]
    pub async fn recommend_products(
        &self,
        query: &str,
        credentials: &Credentials,
        top_k: usize,
    ) -> Vec<Recommendation> {
        self.try_recommend(query, credentials, top_k)
            .await
            .unwrap_or_else(|e| {
                warn!("Recommendation failed ({}): {}", e.kind(), e);
                Vec::new()
            })
    }
}
