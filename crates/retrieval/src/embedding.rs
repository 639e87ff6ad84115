//! Text embedding: an external provider behind a trait, plus a
//! deterministic local fallback so embedding never fails.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Dimension of the fallback vectors.
pub const DEFAULT_DIMENSION: usize = 256;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("embedding provider error ({status}): {body}")]
    Provider { status: u16, body: String },
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("embedding api key is not a valid header value")]
    InvalidApiKey,
}

/// An external service that turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: &SecretString, model: impl Into<String>) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| EmbeddingError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client, model: model.into() })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest { model: self.model.clone(), input: text.to_owned() };
        let response = self.client.post(OPENAI_EMBEDDINGS_URL).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider { status: status.as_u16(), body });
        }

        let response: EmbeddingResponse = response.json().await?;
        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("no embedding data in response".to_owned())
            })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Deterministic character-hashing embedding.
///
/// Each character folds `((codepoint % 31) + 1) / 31` into the slot
/// `(codepoint + position) % dimension`; the vector is then L2-normalized
/// with a norm floor of 1, so the all-zero vector (empty text) stays zero
/// instead of dividing by zero. Identical text always embeds identically.
#[derive(Clone, Debug)]
pub struct HashingEmbeddings {
    dimension: usize,
}

impl HashingEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for (position, ch) in text.chars().enumerate() {
            let code = ch as u32;
            let index = (code as usize + position) % self.dimension;
            vector[index] += ((code % 31) + 1) as f32 / 31.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for value in &mut vector {
            *value /= norm;
        }
        vector
    }
}

impl Default for HashingEmbeddings {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }
}

/// Infallible embedding facade: delegates to the configured provider and
/// falls back to the deterministic scheme when the provider is absent or
/// fails.
#[derive(Clone)]
pub struct Embedder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    fallback: HashingEmbeddings,
}

impl Embedder {
    /// Fallback-only embedder.
    pub fn hashing(dimension: usize) -> Self {
        Self { provider: None, fallback: HashingEmbeddings::new(dimension) }
    }

    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>, fallback_dimension: usize) -> Self {
        Self { provider: Some(provider), fallback: HashingEmbeddings::new(fallback_dimension) }
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(provider) = &self.provider {
            match provider.embed(text).await {
                Ok(vector) => return vector,
                Err(error) => {
                    warn!(error = %error, "embedding provider failed, using deterministic fallback");
                }
            }
        }
        self.fallback.embed_text(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{Embedder, EmbeddingError, EmbeddingProvider, HashingEmbeddings};

    struct BrokenProvider;

    #[async_trait]
    impl EmbeddingProvider for BrokenProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::InvalidResponse("no embedding data in response".to_owned()))
        }
    }

    #[test]
    fn identical_text_embeds_identically() {
        let hashing = HashingEmbeddings::new(256);
        assert_eq!(hashing.embed_text("return policy"), hashing.embed_text("return policy"));
        assert_ne!(hashing.embed_text("return policy"), hashing.embed_text("warranty"));
    }

    #[test]
    fn vectors_are_unit_length_or_zero() {
        let hashing = HashingEmbeddings::new(64);

        let vector = hashing.embed_text("laptop battery life");
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);

        let empty = hashing.embed_text("");
        assert!(empty.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dimension_is_at_least_one() {
        assert_eq!(HashingEmbeddings::new(0).dimension(), 1);
        assert_eq!(HashingEmbeddings::new(0).embed_text("x").len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_deterministically() {
        let embedder = Embedder::with_provider(Arc::new(BrokenProvider), 128);
        let fallback = HashingEmbeddings::new(128);

        let vector = embedder.embed("return policy").await;
        assert_eq!(vector, fallback.embed_text("return policy"));
    }

    #[tokio::test]
    async fn absent_provider_uses_the_fallback() {
        let embedder = Embedder::hashing(32);
        let vector = embedder.embed("warranty").await;
        assert_eq!(vector.len(), 32);
    }
}
