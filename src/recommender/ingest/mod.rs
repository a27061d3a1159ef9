
use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{debug, info, warn};

use super::{INGEST_SUCCESS_STATUS, IngestError, Recommender, run_blocking};
use crate::catalog::{CatalogRow, read_catalog};
use crate::config::Credentials;
use crate::embeddings::EmbeddingService;
use crate::http::ServiceError;
use crate::index::{IndexRecord, IndexSpec, RecordMetadata};

/// A catalog row left out of the index because its description could not be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub product_id: String,
    pub error: ServiceError,
}

/// Outcome of a successful ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub index_name: String,
    pub rows: usize,
    pub written: usize,
    pub skipped: Vec<SkippedRow>,
    pub created_index: bool,
}

impl IngestReport {
    #[inline]
    pub fn status_message(&self) -> &'static str {
        INGEST_SUCCESS_STATUS
    }
}

impl Recommender {
    /// Parse a catalog file, embed every description and store the vectors
    #[inline]
    pub async fn ingest_catalog<P: AsRef<Path>>(
        &self,
        path: P,
        credentials: &Credentials,
    ) -> Result<IngestReport, IngestError> {
        let rows = read_catalog(path)?;
        self.ingest_rows(rows, credentials).await
    }

    /// Embed and store already-parsed catalog rows
    #[inline]
    pub async fn ingest_rows(
        &self,
        rows: Vec<CatalogRow>,
        credentials: &Credentials,
    ) -> Result<IngestReport, IngestError> {
        let total = rows.len();
        if total == 0 {
            warn!("Catalog has no rows, nothing to embed");
            return Err(IngestError::NoEmbeddings { rows: 0 });
        }

        info!("Ingesting {} catalog rows into {}", total, self.index_name());

        let created_index = self.ensure_index(credentials).await?;

        let (records, skipped): (Vec<IndexRecord>, Vec<SkippedRow>) = self
            .embed_rows(rows, credentials)
            .await
            .into_iter()
            .partition_result();

        for row in &skipped {
            warn!("Skipping product {}: {}", row.product_id, row.error);
        }

        if records.is_empty() {
            return Err(IngestError::NoEmbeddings { rows: total });
        }

        let count = records.len();
        let index = Arc::clone(&self.services.index);
        let api_key = credentials.pinecone_api_key().to_string();
        let index_name = self.pinecone.index_name.clone();
        let written = run_blocking(move || index.upsert(&api_key, &index_name, &records))
            .await
            .map_err(|source| IngestError::Upsert { count, source })?;

        info!(
            "Stored {} of {} products in {} ({} skipped)",
            written,
            total,
            self.index_name(),
            skipped.len()
        );

        Ok(IngestReport {
            index_name: self.pinecone.index_name.clone(),
            rows: total,
            written,
            skipped,
            created_index,
        })
    }

    /// Create the configured index unless it already exists. Returns whether it was created.
    async fn ensure_index(&self, credentials: &Credentials) -> Result<bool, IngestError> {
        let index = Arc::clone(&self.services.index);
        let api_key = credentials.pinecone_api_key().to_string();
        let names = run_blocking(move || index.list_indexes(&api_key))
            .await
            .map_err(IngestError::ListIndexes)?;

        if names.iter().any(|name| *name == self.pinecone.index_name) {
            debug!("Index {} already exists", self.pinecone.index_name);
            return Ok(false);
        }

        let spec = IndexSpec {
            name: self.pinecone.index_name.clone(),
            dimension: self.pinecone.dimension,
            metric: self.pinecone.metric,
            cloud: self.pinecone.cloud.clone(),
            region: credentials.pinecone_region().to_string(),
        };
        debug!("Index {} not found, creating it", spec.name);

        let index = Arc::clone(&self.services.index);
        let api_key = credentials.pinecone_api_key().to_string();
        run_blocking(move || index.create_index(&api_key, &spec))
            .await
            .map_err(|source| IngestError::CreateIndex {
                index: self.pinecone.index_name.clone(),
                source,
            })?;

        Ok(true)
    }

    /// Embed every row with bounded concurrency, keeping catalog order
    async fn embed_rows(
        &self,
        rows: Vec<CatalogRow>,
        credentials: &Credentials,
    ) -> Vec<Result<IndexRecord, SkippedRow>> {
        let bar = progress_bar(rows.len());
        let concurrency = self.recommend.ingest_concurrency.max(1);

        let outcomes: Vec<_> = stream::iter(rows)
            .map(|row| {
                let embedder = Arc::clone(&self.services.embedder);
                let api_key = credentials.openai_api_key().to_string();
                let bar = bar.clone();
                async move {
                    let product_id = row.product_id.clone();
                    let outcome = tokio::task::spawn_blocking(move || {
                        embed_row(embedder.as_ref(), row, &api_key)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(SkippedRow {
                            product_id,
                            error: ServiceError::Task(e.to_string()),
                        })
                    });
                    bar.inc(1);
                    outcome
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        bar.finish_and_clear();
        outcomes
    }
}

fn embed_row(
    embedder: &dyn EmbeddingService,
    row: CatalogRow,
    api_key: &str,
) -> Result<IndexRecord, SkippedRow> {
    match embedder.embed(&row.description, api_key) {
        Ok(values) => Ok(IndexRecord {
            id: row.product_id,
            values,
            metadata: RecordMetadata {
                product_name: row.product_name,
                image_url: row.image_url,
            },
        }),
        Err(error) => Err(SkippedRow {
            product_id: row.product_id,
            error,
        }),
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if console::user_attended_stderr() {
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding catalog {wide_bar}")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    }
}
