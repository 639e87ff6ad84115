//! Embedding-based retrieval for Capstan.
//!
//! Two halves: [`embedding`] turns text into fixed-length vectors (external
//! provider with a deterministic local fallback, so embedding never fails),
//! and [`scorer`] ranks a candidate corpus against a query by cosine
//! similarity. Candidate sets in scope are hundreds of chunks, so each call
//! recomputes the query embedding and scans the corpus; there is no cache.

pub mod embedding;
pub mod scorer;

pub use embedding::{
    Embedder, EmbeddingError, EmbeddingProvider, HashingEmbeddings, OpenAiEmbeddings,
    DEFAULT_DIMENSION,
};
pub use scorer::{
    clamp_top_k, context_block, cosine_similarity, RetrievalScorer, MAX_TOP_K, MIN_TOP_K,
};
