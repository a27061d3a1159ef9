
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{IndexRecord, IndexSpec, MatchResult, Metric, RecordMetadata, VectorIndex};
use crate::config::PineconeConfig;
use crate::http::{HttpClient, ServiceError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Pinecone REST client covering the control plane (index management) and
/// the per-index data plane (upsert and query).
#[derive(Debug, Clone)]
pub struct PineconeClient {
    control_url: String,
    api_version: String,
    upsert_batch_size: usize,
    ready_timeout: Duration,
    poll_interval: Duration,
    /// Data-plane URL per index name, resolved on first use
    hosts: Arc<Mutex<HashMap<String, String>>>,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct ListIndexesResponse {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
pub struct IndexModel {
    pub name: String,
    #[serde(default)]
    pub dimension: Option<u32>,
    #[serde(default)]
    pub metric: Option<Metric>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
pub struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: Metric,
    spec: DeploymentSpec<'a>,
}

#[derive(Debug, Serialize)]
struct DeploymentSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Debug, Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeClient {
    #[inline]
    pub fn new(config: &PineconeConfig, http: HttpClient) -> Self {
        Self {
            control_url: config.control_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            upsert_batch_size: config.upsert_batch_size.max(1),
            ready_timeout: Duration::from_secs(config.ready_timeout_seconds),
            poll_interval: DEFAULT_POLL_INTERVAL,
            hosts: Arc::default(),
            http,
        }
    }

    #[inline]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[inline]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Fetch the description of a single index, including its data-plane host
    #[inline]
    pub fn describe_index(&self, api_key: &str, name: &str) -> Result<IndexModel, ServiceError> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        self.http
            .get_json(&url, &self.headers(api_key))
            .map_err(|e| {
                if e.is_not_found() {
                    ServiceError::NotFound(format!("index '{}'", name))
                } else {
                    e
                }
            })
    }

    /// Poll the index description until it reports ready or the timeout elapses
    #[inline]
    pub fn wait_until_ready(&self, api_key: &str, name: &str) -> Result<(), ServiceError> {
        let started = Instant::now();

        loop {
            let model = self.describe_index(api_key, name)?;
            let ready = model.status.as_ref().is_some_and(|s| s.ready);
            if ready {
                debug!("Index {} is ready", name);
                return Ok(());
            }

            if started.elapsed() >= self.ready_timeout {
                let state = model
                    .status
                    .and_then(|s| s.state)
                    .unwrap_or_else(|| "unknown".to_string());
                warn!("Index {} still not ready (state: {})", name, state);
                return Err(ServiceError::Timeout(format!(
                    "index '{}' not ready after {:?} (state: {})",
                    name, self.ready_timeout, state
                )));
            }

            std::thread::sleep(self.poll_interval);
        }
    }

    fn data_plane_url(&self, api_key: &str, index_name: &str) -> Result<String, ServiceError> {
        if let Some(url) = self.cached_hosts()?.get(index_name) {
            return Ok(url.clone());
        }

        let host = self
            .describe_index(api_key, index_name)?
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or(ServiceError::MissingField("index host"))?;
        let url = normalize_host(&host);
        debug!("Resolved data plane for {}: {}", index_name, url);

        self.cached_hosts()?
            .insert(index_name.to_string(), url.clone());
        Ok(url)
    }

    /// Drop a resolved host after the data plane reports the index gone
    fn forget_host_on_not_found(&self, index_name: &str, error: &ServiceError) {
        if error.is_not_found() {
            if let Ok(mut hosts) = self.hosts.lock() {
                hosts.remove(index_name);
            }
        }
    }

    fn cached_hosts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ServiceError> {
        self.hosts
            .lock()
            .map_err(|e| ServiceError::Task(format!("host cache poisoned: {}", e)))
    }

    fn headers<'a>(&'a self, api_key: &'a str) -> [(&'a str, &'a str); 2] {
        [
            ("Api-Key", api_key),
            ("X-Pinecone-API-Version", self.api_version.as_str()),
        ]
    }
}

impl VectorIndex for PineconeClient {
    fn list_indexes(&self, api_key: &str) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/indexes", self.control_url);
        let response: ListIndexesResponse = self.http.get_json(&url, &self.headers(api_key))?;

        let names: Vec<String> = response.indexes.into_iter().map(|i| i.name).collect();
        debug!("Pinecone project has {} indexes", names.len());
        Ok(names)
    }

    fn create_index(&self, api_key: &str, spec: &IndexSpec) -> Result<(), ServiceError> {
        let url = format!("{}/indexes", self.control_url);
        let request = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: DeploymentSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        info!(
            "Creating Pinecone index {} ({} dims, {}, {}/{})",
            spec.name, spec.dimension, spec.metric, spec.cloud, spec.region
        );

        match self
            .http
            .post_json::<_, Value>(&url, &self.headers(api_key), &request)
        {
            Ok(_) => {}
            // Someone else created it between our list and create calls
            Err(ServiceError::Status { status: 409, .. }) => {
                warn!("Index {} already exists, waiting for it instead", spec.name);
            }
            Err(e) => return Err(e),
        }

        self.wait_until_ready(api_key, &spec.name)
    }

    fn upsert(
        &self,
        api_key: &str,
        index_name: &str,
        records: &[IndexRecord],
    ) -> Result<usize, ServiceError> {
        if records.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/vectors/upsert", self.data_plane_url(api_key, index_name)?);
        let mut written = 0;

        for batch in records.chunks(self.upsert_batch_size) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|r| UpsertVector {
                        id: &r.id,
                        values: &r.values,
                        metadata: &r.metadata,
                    })
                    .collect(),
            };

            let response: UpsertResponse = self
                .http
                .post_json(&url, &self.headers(api_key), &request)
                .inspect_err(|e| self.forget_host_on_not_found(index_name, e))?;
            written += response.upserted_count.unwrap_or(batch.len());
            debug!("Upserted {}/{} vectors", written, records.len());
        }

        Ok(written)
    }

    fn query(
        &self,
        api_key: &str,
        index_name: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, ServiceError> {
        let url = format!("{}/query", self.data_plane_url(api_key, index_name)?);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self
            .http
            .post_json(&url, &self.headers(api_key), &request)
            .inspect_err(|e| self.forget_host_on_not_found(index_name, e))?;
        debug!("Pinecone returned {} matches", response.matches.len());

        Ok(response
            .matches
            .into_iter()
            .map(|m| MatchResult {
                metadata: m.metadata.as_ref().and_then(metadata_from_map),
                id: m.id,
                score: m.score,
            })
            .collect())
    }
}

fn metadata_from_map(map: &Map<String, Value>) -> Option<RecordMetadata> {
    Some(RecordMetadata {
        product_name: map.get("product_name")?.as_str()?.to_string(),
        image_url: map.get("image_url")?.as_str()?.to_string(),
    })
}

/// Data-plane hosts come back without a scheme; default them to https
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
