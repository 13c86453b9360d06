//! In-Memory Document Store Adapter
//!
//! Brute-force cosine similarity over vectors held in memory behind a
//! `tokio::sync::RwLock`: searches share the read lock, appends take the
//! write lock. Optionally mirrors its contents to a JSON snapshot file so
//! learned knowledge survives restarts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::domain::foundation::ChunkId;
use crate::domain::knowledge::{DocumentChunk, RetrievedChunk};
use crate::ports::{DocumentStore, EmbeddedChunk, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    chunk: DocumentChunk,
    vector: Vec<f32>,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<StoredEntry>,
    ids: HashSet<ChunkId>,
    dimension: Option<usize>,
}

impl StoreState {
    fn from_entries(entries: Vec<StoredEntry>) -> Self {
        let ids = entries.iter().map(|e| e.chunk.id.clone()).collect();
        let dimension = entries.first().map(|e| e.vector.len());
        Self {
            entries,
            ids,
            dimension,
        }
    }
}

/// In-memory vector index with optional JSON persistence.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
    snapshot_path: Option<PathBuf>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create an empty, purely in-memory store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a snapshot file, loading it if present.
    ///
    /// # Errors
    ///
    /// - `Io` if the file exists but cannot be read
    /// - `Serialization` if the file is not a valid snapshot
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let state = if fs::try_exists(&path).await.unwrap_or(false) {
            let json = fs::read_to_string(&path)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let entries: Vec<StoredEntry> =
                serde_json::from_str(&json).map_err(|e| StoreError::Serialization(e.to_string()))?;
            tracing::info!(path = %path.display(), chunks = entries.len(), "Loaded document store snapshot");
            StoreState::from_entries(entries)
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            snapshot_path: Some(path),
        })
    }

    async fn write_snapshot(&self, path: &Path, entries: &[StoredEntry]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let json =
            serde_json::to_string(entries).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

/// Cosine similarity; zero vectors score 0.
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add(&self, chunks: Vec<EmbeddedChunk>) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;

        // The whole batch must agree with the store's dimension before anything is kept.
        let expected = state
            .dimension
            .or_else(|| chunks.first().map(|c| c.vector.len()));
        if let Some(expected) = expected {
            if let Some(bad) = chunks.iter().find(|c| c.vector.len() != expected) {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }

        let previous_len = state.entries.len();
        let previous_dimension = state.dimension;
        for EmbeddedChunk { chunk, vector } in chunks {
            if !state.ids.insert(chunk.id.clone()) {
                tracing::debug!(chunk_id = %chunk.id, "Skipping duplicate chunk");
                continue;
            }
            state.dimension.get_or_insert(vector.len());
            state.entries.push(StoredEntry { chunk, vector });
        }
        let added = state.entries.len() - previous_len;

        if added > 0 {
            if let Some(path) = &self.snapshot_path {
                if let Err(e) = self.write_snapshot(path, &state.entries).await {
                    let rolled_back: Vec<StoredEntry> = state.entries.drain(previous_len..).collect();
                    for entry in &rolled_back {
                        state.ids.remove(&entry.chunk.id);
                    }
                    state.dimension = previous_dimension;
                    tracing::error!(error = %e, chunks = added, "Snapshot write failed, batch discarded");
                    return Err(e);
                }
            }
        }
        Ok(added)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, StoreError> {
        let state = self.state.read().await;
        if k == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = state.dimension {
            if query.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = state
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine(query, &e.vector)))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let entry = &state.entries[i];
                RetrievedChunk {
                    text: entry.chunk.text.clone(),
                    source: entry.chunk.source.clone(),
                    score,
                }
            })
            .collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.entries.len())
    }
}
