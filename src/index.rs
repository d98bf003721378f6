//! In-memory vector index over embedded chunks.
//!
//! The index is built once per document-set change and never mutated
//! afterwards; callers replace the whole index (behind an `Arc` swap in
//! [`crate::session::Session`]) instead of updating entries. One user's
//! uploads are small enough that a full rebuild is cheap and avoids
//! index-consistency bugs.
//!
//! Search is brute-force cosine similarity over all entries, sorted
//! descending and truncated to `k`.

use std::sync::Arc;

use anyhow::Result;

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::models::Chunk;

/// One retained chunk and its embedding vector.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// Immutable similarity index over a document set's chunks.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    /// Embed `chunks` in batches and build the index.
    ///
    /// Building from zero chunks succeeds and produces an index whose
    /// searches always return empty, without calling the embedding
    /// capability.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                anyhow::bail!(
                    "Embedding backend returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                );
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                entries.push(IndexEntry {
                    vector,
                    chunk: chunk.clone(),
                });
            }
        }

        Ok(Self { entries, embedder })
    }

    /// Return up to `k` chunks ranked by descending similarity to `query`.
    ///
    /// Returns fewer than `k` exactly when fewer chunks exist. An empty
    /// index returns empty without embedding the query.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vecs = self.embedder.embed(&[query.to_string()]).await?;
        let query_vec = query_vecs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response for query"))?;

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query_vec, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, e)| e.chunk.clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
