use serde::{Deserialize, Serialize};

/// One unstructured context chunk with its precomputed embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct DocChunk {
    pub id: String,
    pub content: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

/// A chunk ranked against a query; produced fresh per retrieval call and
/// never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub content: String,
    pub source: String,
    pub score: f32,
}

/// In-memory chunk corpus, read-only after seeding.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    chunks: Vec<DocChunk>,
}

impl ChunkStore {
    pub fn new(chunks: Vec<DocChunk>) -> Self {
        Self { chunks }
    }

    pub fn all(&self) -> &[DocChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
