// Recommender module
// Orchestrates catalog ingestion, recommendation queries and contextual replies

pub mod ingest;
pub mod query;
pub mod reply;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::chat::{ChatService, OpenAiChat};
use crate::config::{Config, PineconeConfig, RecommendConfig};
use crate::embeddings::{EmbeddingService, OpenAiEmbedder};
use crate::http::{HttpClient, ServiceError};
use crate::index::{InMemoryIndex, PineconeClient, VectorIndex};

pub use ingest::{IngestReport, SkippedRow};
pub use query::Recommendation;
pub use reply::{REPLY_FALLBACK, build_reply_prompt};

pub const INGEST_SUCCESS_STATUS: &str =
    "Product catalog processed and embeddings stored in Pinecone.";
pub const INDEX_FAILURE_STATUS: &str = "Failed to create Pinecone index.";
pub const UPSERT_FAILURE_STATUS: &str = "Failed to upsert embeddings.";
pub const CATALOG_FAILURE_STATUS: &str = "Failed to process CSV file.";
pub const NO_EMBEDDINGS_STATUS: &str =
    "No embeddings could be generated from the catalog; nothing was stored in Pinecone.";

/// Which collaborator call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Embedding,
    IndexCreation,
    Upsert,
    IndexQuery,
    ChatCompletion,
    FileParse,
}

impl fmt::Display for FailureKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embedding => "embedding",
            Self::IndexCreation => "index creation",
            Self::Upsert => "upsert",
            Self::IndexQuery => "index query",
            Self::ChatCompletion => "chat completion",
            Self::FileParse => "file parse",
        })
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to list indexes: {0}")]
    ListIndexes(#[source] ServiceError),
    #[error("failed to create index '{index}': {source}")]
    CreateIndex {
        index: String,
        #[source]
        source: ServiceError,
    },
    #[error("failed to upsert {count} records: {source}")]
    Upsert {
        count: usize,
        #[source]
        source: ServiceError,
    },
    #[error("no embeddings were generated for {rows} catalog rows")]
    NoEmbeddings { rows: usize },
}

impl IngestError {
    #[inline]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Catalog(_) | Self::ListIndexes(_) => FailureKind::FileParse,
            Self::CreateIndex { .. } => FailureKind::IndexCreation,
            Self::Upsert { .. } => FailureKind::Upsert,
            Self::NoEmbeddings { .. } => FailureKind::Embedding,
        }
    }

    /// The user-facing status line for this failure.
    ///
    /// Only a failed create reports the index status. A failed listing falls
    /// under the generic upload failure.
    #[inline]
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Catalog(_) | Self::ListIndexes(_) => CATALOG_FAILURE_STATUS,
            Self::CreateIndex { .. } => INDEX_FAILURE_STATUS,
            Self::Upsert { .. } => UPSERT_FAILURE_STATUS,
            Self::NoEmbeddings { .. } => NO_EMBEDDINGS_STATUS,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("failed to embed query: {0}")]
    Embedding(#[source] ServiceError),
    #[error("failed to query index: {0}")]
    Query(#[source] ServiceError),
}

impl RecommendError {
    #[inline]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Embedding(_) => FailureKind::Embedding,
            Self::Query(_) => FailureKind::IndexQuery,
        }
    }
}

/// The three external collaborators, shared across sessions
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn EmbeddingService>,
    pub index: Arc<dyn VectorIndex>,
    pub chat: Arc<dyn ChatService>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("embedding_model", &self.embedder.default_model())
            .finish_non_exhaustive()
    }
}

impl Services {
    /// OpenAI for embeddings and chat, Pinecone for the index
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        let http = HttpClient::new(config.timeout());
        Self {
            embedder: Arc::new(OpenAiEmbedder::new(&config.openai, http.clone())),
            index: Arc::new(PineconeClient::new(&config.pinecone, http.clone())),
            chat: Arc::new(OpenAiChat::new(&config.openai, http)),
        }
    }

    /// OpenAI for embeddings and chat, with vectors kept in this process
    #[inline]
    pub fn with_local_index(config: &Config, index: Arc<InMemoryIndex>) -> Self {
        let http = HttpClient::new(config.timeout());
        Self {
            embedder: Arc::new(OpenAiEmbedder::new(&config.openai, http.clone())),
            index,
            chat: Arc::new(OpenAiChat::new(&config.openai, http)),
        }
    }
}

/// Stateless pipeline over [`Services`]. Credentials are passed per call.
#[derive(Debug, Clone)]
pub struct Recommender {
    services: Services,
    pinecone: PineconeConfig,
    recommend: RecommendConfig,
    persona: String,
}

impl Recommender {
    #[inline]
    pub fn new(services: Services, config: &Config) -> Self {
        Self {
            services,
            pinecone: config.pinecone.clone(),
            recommend: config.recommend.clone(),
            persona: config.openai.assistant_persona.clone(),
        }
    }

    #[inline]
    pub fn index_name(&self) -> &str {
        &self.pinecone.index_name
    }

    /// Result count used when the caller does not pick one
    #[inline]
    pub fn default_top_k(&self) -> usize {
        self.recommend.top_k
    }
}

/// Run a blocking collaborator call off the async executor
async fn run_blocking<T, F>(call: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))?
}
