// Stub collaborators for exercising the pipelines without a network

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Recommender, Services};
use crate::catalog::CatalogRow;
use crate::chat::ChatService;
use crate::config::{Config, Credentials};
use crate::embeddings::{Embedding, EmbeddingService};
use crate::http::ServiceError;
use crate::index::{InMemoryIndex, IndexRecord, IndexSpec, MatchResult, VectorIndex};

pub(crate) const KEYWORDS: [&str; 6] = ["shoe", "hat", "red", "blue", "warm", "wool"];

/// Embeds text as keyword presence plus a constant bias component
#[derive(Debug, Default)]
pub(crate) struct KeywordEmbedder {
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: texts.iter().map(|t| (*t).to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

pub(crate) fn keyword_vector(text: &str) -> Embedding {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
        .chain(std::iter::once(0.1))
        .collect()
}

impl EmbeddingService for KeywordEmbedder {
    fn default_model(&self) -> &str {
        "keyword-stub"
    }

    fn embed_with_model(
        &self,
        text: &str,
        _model: &str,
        _api_key: &str,
    ) -> Result<Embedding, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }
        if self.failing.contains(text) {
            return Err(ServiceError::Status {
                status: 500,
                body: "embedding backend unavailable".to_string(),
            });
        }
        Ok(keyword_vector(text))
    }
}

/// Records every prompt and answers with a canned reply or failure
#[derive(Debug)]
pub(crate) struct ScriptedChat {
    reply: Result<String, ServiceError>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(error: ServiceError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ChatService for ScriptedChat {
    fn complete(&self, system: &str, user: &str, _api_key: &str) -> Result<String, ServiceError> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push((system.to_string(), user.to_string()));
        self.reply.clone()
    }
}

/// Which index operations should fail
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct IndexFaults {
    pub list: bool,
    pub create: bool,
    pub upsert: bool,
    pub query: bool,
}

/// In-memory index with switchable failures and call counters
#[derive(Debug, Default)]
pub(crate) struct FaultyIndex {
    pub inner: InMemoryIndex,
    pub faults: IndexFaults,
    pub creates: AtomicUsize,
    pub upserts: AtomicUsize,
}

impl FaultyIndex {
    pub(crate) fn with_faults(faults: IndexFaults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }
}

fn injected(operation: &str) -> ServiceError {
    ServiceError::Status {
        status: 503,
        body: format!("{operation} unavailable"),
    }
}

impl VectorIndex for FaultyIndex {
    fn list_indexes(&self, api_key: &str) -> Result<Vec<String>, ServiceError> {
        if self.faults.list {
            return Err(injected("list"));
        }
        self.inner.list_indexes(api_key)
    }

    fn create_index(&self, api_key: &str, spec: &IndexSpec) -> Result<(), ServiceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.faults.create {
            return Err(injected("create"));
        }
        self.inner.create_index(api_key, spec)
    }

    fn upsert(
        &self,
        api_key: &str,
        index_name: &str,
        records: &[IndexRecord],
    ) -> Result<usize, ServiceError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.faults.upsert {
            return Err(injected("upsert"));
        }
        self.inner.upsert(api_key, index_name, records)
    }

    fn query(
        &self,
        api_key: &str,
        index_name: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, ServiceError> {
        if self.faults.query {
            return Err(injected("query"));
        }
        self.inner.query(api_key, index_name, vector, top_k)
    }
}

pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.pinecone.dimension = (KEYWORDS.len() + 1) as u32;
    config
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("sk-test", "pc-test", "us-east-1")
}

pub(crate) fn recommender(
    embedder: Arc<KeywordEmbedder>,
    index: Arc<FaultyIndex>,
    chat: Arc<ScriptedChat>,
) -> Recommender {
    let services = Services {
        embedder,
        index,
        chat,
    };
    Recommender::new(services, &test_config())
}

pub(crate) fn row(id: &str, name: &str, description: &str) -> CatalogRow {
    CatalogRow {
        product_id: id.to_string(),
        product_name: name.to_string(),
        description: description.to_string(),
        image_url: format!("https://img.example.com/{id}.jpg"),
    }
}

pub(crate) fn shoe_and_hat() -> Vec<CatalogRow> {
    vec![
        row("p1", "Red Shoe", "A red running shoe"),
        row("p2", "Blue Hat", "A warm blue wool hat"),
    ]
}
