// Vector index module
// Contract for the nearest-neighbour store plus the Pinecone and in-memory backends

pub mod memory;
pub mod pinecone;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::embeddings::Embedding;
use crate::http::ServiceError;

pub use memory::InMemoryIndex;
pub use pinecone::PineconeClient;

pub const DEFAULT_INDEX_NAME: &str = "product-recommendations";

/// Distance metric an index ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Dotproduct,
    Euclidean,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cosine, Metric::Dotproduct, Metric::Euclidean];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dotproduct => "dotproduct",
            Self::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for Metric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to create an index on first use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: u32,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
}

/// Product metadata stored next to each vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub product_name: String,
    pub image_url: String,
}

/// One vector keyed by product id. Writing the same id again replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub values: Embedding,
    pub metadata: RecordMetadata,
}

/// A nearest-neighbour hit. Metadata is `None` when the stored record lacks it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub id: String,
    pub score: f32,
    pub metadata: Option<RecordMetadata>,
}

/// Remote (or local) vector store. Credentials are passed on every call.
pub trait VectorIndex: Send + Sync {
    fn list_indexes(&self, api_key: &str) -> Result<Vec<String>, ServiceError>;

    fn create_index(&self, api_key: &str, spec: &IndexSpec) -> Result<(), ServiceError>;

    /// Insert or overwrite records by id, returning how many were written
    fn upsert(
        &self,
        api_key: &str,
        index_name: &str,
        records: &[IndexRecord],
    ) -> Result<usize, ServiceError>;

    /// Up to `top_k` matches with metadata, best first
    fn query(
        &self,
        api_key: &str,
        index_name: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, ServiceError>;
}
