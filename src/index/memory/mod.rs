
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{IndexRecord, IndexSpec, MatchResult, Metric, RecordMetadata, VectorIndex};
use crate::http::ServiceError;

#[derive(Debug)]
struct StoredIndex {
    dimension: usize,
    metric: Metric,
    records: BTreeMap<String, (Vec<f32>, RecordMetadata)>,
}

/// Process-local vector index with upsert-by-id semantics.
///
/// Used for offline runs and tests; scores follow the index metric with
/// higher always meaning more similar.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    indexes: Mutex<HashMap<String, StoredIndex>>,
}

impl InMemoryIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held by `index_name`, if it exists
    #[inline]
    pub fn record_count(&self, index_name: &str) -> Option<usize> {
        self.lock()
            .ok()?
            .get(index_name)
            .map(|index| index.records.len())
    }

    /// Stored record for `id`, if any
    #[inline]
    pub fn get(&self, index_name: &str, id: &str) -> Option<IndexRecord> {
        let guard = self.lock().ok()?;
        let (values, metadata) = guard.get(index_name)?.records.get(id)?;
        Some(IndexRecord {
            id: id.to_string(),
            values: values.clone(),
            metadata: metadata.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, StoredIndex>>, ServiceError> {
        self.indexes
            .lock()
            .map_err(|_| ServiceError::Task("in-memory index lock poisoned".to_string()))
    }
}

impl VectorIndex for InMemoryIndex {
    fn list_indexes(&self, _api_key: &str) -> Result<Vec<String>, ServiceError> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_index(&self, _api_key: &str, spec: &IndexSpec) -> Result<(), ServiceError> {
        let mut indexes = self.lock()?;
        if indexes.contains_key(&spec.name) {
            return Err(ServiceError::Rejected(format!(
                "index '{}' already exists",
                spec.name
            )));
        }

        debug!(
            "Creating in-memory index {} ({} dims, {})",
            spec.name, spec.dimension, spec.metric
        );
        indexes.insert(
            spec.name.clone(),
            StoredIndex {
                dimension: spec.dimension as usize,
                metric: spec.metric,
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn upsert(
        &self,
        _api_key: &str,
        index_name: &str,
        records: &[IndexRecord],
    ) -> Result<usize, ServiceError> {
        let mut indexes = self.lock()?;
        let index = indexes
            .get_mut(index_name)
            .ok_or_else(|| ServiceError::NotFound(format!("index '{}'", index_name)))?;

        // Validate the whole batch before touching anything
        if let Some(bad) = records.iter().find(|r| r.values.len() != index.dimension) {
            return Err(ServiceError::Rejected(format!(
                "vector for '{}' has dimension {}, index expects {}",
                bad.id,
                bad.values.len(),
                index.dimension
            )));
        }

        for record in records {
            index.records.insert(
                record.id.clone(),
                (record.values.clone(), record.metadata.clone()),
            );
        }

        Ok(records.len())
    }

    fn query(
        &self,
        _api_key: &str,
        index_name: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, ServiceError> {
        let indexes = self.lock()?;
        let index = indexes
            .get(index_name)
            .ok_or_else(|| ServiceError::NotFound(format!("index '{}'", index_name)))?;

        if vector.len() != index.dimension {
            return Err(ServiceError::Rejected(format!(
                "query vector has dimension {}, index expects {}",
                vector.len(),
                index.dimension
            )));
        }

        let mut matches: Vec<MatchResult> = index
            .records
            .iter()
            .map(|(id, (values, metadata))| MatchResult {
                id: id.clone(),
                score: similarity(index.metric, vector, values),
                metadata: Some(metadata.clone()),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// Similarity where larger is closer, whatever the metric
pub(crate) fn similarity(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Dotproduct => dot(a, b),
        Metric::Cosine => {
            let norms = dot(a, a).sqrt() * dot(b, b).sqrt();
            if norms == 0.0 { 0.0 } else { dot(a, b) / norms }
        }
        Metric::Euclidean => {
            let distance = a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt();
            1.0 / (1.0 + distance)
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
