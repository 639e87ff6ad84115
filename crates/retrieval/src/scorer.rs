//! Cosine-similarity ranking of context chunks against a query.

use capstan_core::domain::{DocChunk, ScoredChunk};

use crate::embedding::Embedder;

pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

/// Clamp a caller-supplied `k` to the supported window.
pub fn clamp_top_k(k: usize) -> usize {
    k.clamp(MIN_TOP_K, MAX_TOP_K)
}

/// Cosine similarity between two vectors.
///
/// Vectors may differ in length: only the shared prefix contributes (the
/// shorter vector is conceptually zero-padded). The denominator floors at 1
/// so an all-zero vector scores 0 instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let shared = a.len().min(b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for index in 0..shared {
        let x = a[index];
        let y = b[index];
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    dot / denominator
}

/// Stateless retrieval scorer: embeds the query per call and ranks the
/// candidates' precomputed embeddings. No cache, no cross-call state.
#[derive(Clone)]
pub struct RetrievalScorer {
    embedder: Embedder,
}

impl RetrievalScorer {
    pub fn new(embedder: Embedder) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The top `k` candidates by cosine similarity, sorted non-increasing,
    /// ties broken by candidate insertion order. `k` is clamped to
    /// `[MIN_TOP_K, MAX_TOP_K]`; at most `min(k, candidates.len())` items
    /// are returned.
    pub async fn retrieve(
        &self,
        query: &str,
        candidates: &[DocChunk],
        k: usize,
    ) -> Vec<ScoredChunk> {
        let query_vector = self.embedder.embed(query).await;
        let k = clamp_top_k(k);

        let mut scored: Vec<ScoredChunk> = candidates
            .iter()
            .map(|chunk| ScoredChunk {
                id: chunk.id.clone(),
                content: chunk.content.clone(),
                source: chunk.source.clone(),
                score: cosine_similarity(&query_vector, &chunk.embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(k);
        scored
    }
}

/// The "- (score) content" context block handed to a language model.
pub fn context_block(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .map(|chunk| format!("- ({:.3}) {}", chunk.score, chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use capstan_core::domain::DocChunk;

    use super::{clamp_top_k, context_block, cosine_similarity, RetrievalScorer};
    use crate::embedding::{Embedder, HashingEmbeddings};

    fn chunk(id: &str, content: &str, embedding: Vec<f32>) -> DocChunk {
        DocChunk {
            id: id.to_owned(),
            content: content.to_owned(),
            source: format!("docs/{id}.md"),
            embedding,
        }
    }

    #[test]
    fn cosine_of_a_vector_with_itself_is_one() {
        let v = HashingEmbeddings::new(128).embed_text("return policy");
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_handles_unequal_lengths_over_the_shared_prefix() {
        let a = [1.0, 0.0, 3.0];
        let b = [1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_of_zero_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    }

    #[test]
    fn top_k_is_clamped_to_the_window() {
        assert_eq!(clamp_top_k(0), 1);
        assert_eq!(clamp_top_k(3), 3);
        assert_eq!(clamp_top_k(50), 10);
    }

    #[tokio::test]
    async fn identical_content_ranks_first_with_score_near_one() {
        let hashing = HashingEmbeddings::new(128);
        let candidates = vec![
            chunk("a", "office chair assembly", hashing.embed_text("office chair assembly")),
            chunk("b", "return policy", hashing.embed_text("return policy")),
        ];
        let scorer = RetrievalScorer::new(Embedder::hashing(128));

        let results = scorer.retrieve("return policy", &candidates, 2).await;
        assert_eq!(results[0].id, "b");
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn results_are_sorted_non_increasing_and_bounded() {
        let hashing = HashingEmbeddings::new(64);
        let candidates: Vec<_> = (0..5)
            .map(|index| {
                let content = format!("chunk number {index}");
                let embedding = hashing.embed_text(&content);
                chunk(&format!("c{index}"), &content, embedding)
            })
            .collect();
        let scorer = RetrievalScorer::new(Embedder::hashing(64));

        let results = scorer.retrieve("chunk number 3", &candidates, 50).await;
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }

        let bounded = scorer.retrieve("chunk number 3", &candidates, 2).await;
        assert_eq!(bounded.len(), 2);
    }

    #[tokio::test]
    async fn ties_keep_candidate_insertion_order() {
        let shared = vec![1.0, 0.0];
        let candidates = vec![
            chunk("first", "alpha", shared.clone()),
            chunk("second", "beta", shared.clone()),
        ];
        let scorer = RetrievalScorer::new(Embedder::hashing(2));

        let results = scorer.retrieve("anything", &candidates, 2).await;
        assert_eq!(results[0].id, "first");
        assert_eq!(results[1].id, "second");
    }

    #[test]
    fn context_block_formats_scores_to_three_decimals() {
        let results = vec![capstan_core::domain::ScoredChunk {
            id: "a".to_owned(),
            content: "Returns accepted within 30 days.".to_owned(),
            source: "docs/a.md".to_owned(),
            score: 0.87654,
        }];
        assert_eq!(context_block(&results), "- (0.877) Returns accepted within 30 days.");
    }
}
