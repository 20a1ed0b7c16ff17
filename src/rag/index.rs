// Persistent vector index with cosine similarity search

use crate::types::{AppError, AppResult, Chunk, RetrievalResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub page: usize,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// Append-only during build, read-only afterwards. Search takes `&self`, so
/// concurrent queries share the index without locking.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    embedding_model: String,
}

impl VectorIndex {
    /// Builds a fresh index from embedded chunks, assigning each entry a
    /// unique id. All vectors must share one dimension.
    pub fn build(items: Vec<(Chunk, Vec<f32>)>, embedding_model: &str) -> AppResult<Self> {
        let Some(dimension) = items.first().map(|(_, v)| v.len()) else {
            return Err(AppError::IndexBuild("no entries to index".to_string()));
        };

        let mut entries = Vec::with_capacity(items.len());
        for (chunk, vector) in items {
            if vector.len() != dimension {
                return Err(AppError::IndexBuild(format!(
                    "mixed vector dimensions: expected {dimension}, got {}",
                    vector.len()
                )));
            }
            entries.push(IndexEntry {
                id: uuid::Uuid::new_v4().to_string(),
                vector,
                text: chunk.text,
                page: chunk.source_page,
            });
        }

        Ok(Self {
            entries,
            dimension,
            embedding_model: embedding_model.to_string(),
        })
    }

    /// Writes the index atomically: a temp file in the same directory is
    /// renamed over the target, so a failed save leaves any previous index
    /// untouched.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let persisted = PersistedIndex {
            version: INDEX_FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            entries: self.entries.clone(),
        };
        let data = serde_json::to_vec(&persisted)
            .map_err(|e| AppError::IndexBuild(format!("serialization failed: {e}")))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data)
            .map_err(|e| AppError::IndexBuild(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| AppError::IndexBuild(format!("rename {}: {e}", path.display())))?;

        info!(entries = self.entries.len(), path = %path.display(), "Index persisted");
        Ok(())
    }

    /// Loads a previously saved index. Absent or corrupt files both surface
    /// as `IndexNotFound` so callers report "not ready" instead of crashing.
    pub fn open(path: &Path) -> AppResult<Self> {
        let data = std::fs::read(path)
            .map_err(|e| AppError::IndexNotFound(format!("{}: {e}", path.display())))?;
        let persisted: PersistedIndex = serde_json::from_slice(&data)
            .map_err(|e| AppError::IndexNotFound(format!("{} is corrupt: {e}", path.display())))?;

        debug!(
            entries = persisted.entries.len(),
            model = %persisted.embedding_model,
            "Opened index"
        );
        Ok(Self {
            entries: persisted.entries,
            dimension: persisted.dimension,
            embedding_model: persisted.embedding_model,
        })
    }

    /// Returns up to k entries ordered by descending cosine similarity. Ties
    /// keep insertion order (the sort is stable). An index smaller than k
    /// returns everything.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<RetrievalResult> {
        let k = k.max(1);

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| RetrievalResult {
                chunk_text: entry.text.clone(),
                page: entry.page,
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
