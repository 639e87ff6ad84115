//! Context retrieval tool (basic RAG).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use capstan_core::capability::CapabilityHandler;
use capstan_core::contracts::{RagQueryInput, RagQueryOutput};
use capstan_core::domain::ChunkStore;
use capstan_retrieval::{clamp_top_k, context_block, RetrievalScorer};

pub struct RagQueryHandler {
    chunks: ChunkStore,
    scorer: RetrievalScorer,
}

impl RagQueryHandler {
    pub fn new(chunks: ChunkStore, scorer: RetrievalScorer) -> Self {
        Self { chunks, scorer }
    }
}

#[async_trait]
impl CapabilityHandler for RagQueryHandler {
    async fn execute(&self, input: Value) -> Result<Value> {
        let input: RagQueryInput = serde_json::from_value(input)?;
        let results = self.scorer.retrieve(&input.query, self.chunks.all(), input.top_k).await;
        let output = RagQueryOutput {
            context: context_block(&results),
            top_k: clamp_top_k(input.top_k),
            query: input.query,
            results,
        };
        Ok(serde_json::to_value(output)?)
    }
}
