//! Embedding providers for semantic similarity search
//!
//! Providers are blocking network I/O (or local computation) behind one
//! async trait. A [`ProviderChain`] tries providers strictly in priority
//! order with a per-call timeout, so one hanging provider can never stall
//! a retrieval beyond its bounded budget. When every provider fails, the
//! caller degrades to lexical-only search.

pub mod hashing;
pub mod remote;

pub use hashing::HashingProvider;
pub use remote::RemoteProvider;

use crate::error::{AnamnesisError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Embedding provider trait defining required operations
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimensionality
    fn dimensions(&self) -> usize;

    /// Provider name, for logging
    fn name(&self) -> &str;
}

/// Calculate cosine similarity between two vectors
///
/// Degenerates to 0.0 when either vector has zero norm or the lengths
/// differ, rather than erroring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Priority-ordered fallback chain over embedding providers
///
/// Each provider call runs under its own timeout; the chain moves to the
/// next provider on any failure. Total latency is bounded by
/// `providers.len() * per_call_timeout`.
pub struct ProviderChain {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
    per_call_timeout: Duration,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>, per_call_timeout: Duration) -> Self {
        Self {
            providers,
            per_call_timeout,
        }
    }

    /// Chain with a single provider and a default 10s per-call timeout
    pub fn single(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(vec![provider], Duration::from_secs(10))
    }
}

#[async_trait]
impl EmbeddingProvider for ProviderChain {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        for provider in &self.providers {
            match tokio::time::timeout(self.per_call_timeout, provider.embed(text)).await {
                Ok(Ok(embedding)) => {
                    debug!("Embedding from provider '{}'", provider.name());
                    return Ok(embedding);
                }
                Ok(Err(e)) => {
                    warn!("Provider '{}' failed: {}", provider.name(), e);
                }
                Err(_) => {
                    warn!(
                        "Provider '{}' timed out after {:?}",
                        provider.name(),
                        self.per_call_timeout
                    );
                }
            }
        }

        Err(AnamnesisError::Embedding(
            "no embedding provider available".to_string(),
        ))
    }

    fn dimensions(&self) -> usize {
        self.providers
            .first()
            .map(|p| p.dimensions())
            .unwrap_or(0)
    }

    fn name(&self) -> &str {
        "provider-chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_unit_vectors() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec1, &vec2) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec3 = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&vec1, &vec3).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = vec![0.3, -0.2, 0.9, 0.1];
        let b = vec![0.5, 0.5, -0.1, 0.7];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_zero_norm() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
    }

    #[test]
    fn test_cosine_different_lengths() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AnamnesisError::Network("unreachable".to_string()))
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_provider() {
        let chain = ProviderChain::new(
            vec![
                Arc::new(FailingProvider),
                Arc::new(HashingProvider::default()),
            ],
            Duration::from_millis(200),
        );

        let embedding = chain.embed("login handler").await.unwrap();
        assert_eq!(embedding.len(), hashing::HASH_EMBEDDING_DIM);
    }

    #[test]
    fn test_chain_reports_unavailable_when_all_fail() {
        let chain = ProviderChain::new(vec![Arc::new(FailingProvider)], Duration::from_millis(200));

        let result = tokio_test::block_on(chain.embed("login handler"));
        assert!(matches!(result, Err(AnamnesisError::Embedding(_))));
    }
}
