//! Deterministic local embedding provider
//!
//! Hashing-based embeddings (character n-grams plus word-level hashing,
//! normalized to unit length). Not a neural model, but fully deterministic
//! and dependency-free, which makes it the terminal fallback of a provider
//! chain: similar texts still land closer together than unrelated ones,
//! and the semantic side of hybrid search keeps functioning offline.

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Embedding dimension for the hashing provider
pub const HASH_EMBEDDING_DIM: usize = 384;

/// Deterministic hashing embedding provider
#[derive(Debug, Default, Clone)]
pub struct HashingProvider;

impl HashingProvider {
    /// Compute the hashing embedding for a text
    pub fn embedding(text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; HASH_EMBEDDING_DIM];

        let text_lower = text.to_lowercase();
        let chars: Vec<char> = text_lower.chars().collect();

        // Character n-grams capture morphology and identifiers
        for window_size in 2..=4 {
            for window in chars.windows(window_size) {
                let mut hasher = DefaultHasher::new();
                window.iter().collect::<String>().hash(&mut hasher);
                let hash = hasher.finish();

                let dim = (hash as usize) % HASH_EMBEDDING_DIM;
                embedding[dim] += 1.0;
            }
        }

        // Words weighted more than character n-grams
        for word in text_lower.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();

            let dim = (hash as usize) % HASH_EMBEDDING_DIM;
            embedding[dim] += 2.0;
        }

        // Normalize to unit length
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::embedding(text))
    }

    fn dimensions(&self) -> usize {
        HASH_EMBEDDING_DIM
    }

    fn name(&self) -> &str {
        "hashing-fallback"
    }
}
