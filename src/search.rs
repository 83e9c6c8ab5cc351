//! Hybrid lexical/semantic search over stored reviews
//!
//! Fuses two independently computed rankings: the store's full-text
//! relevance ranking (mapped to a score in (0, 1] by `1/(1+rank)`) and a
//! cosine-similarity ranking over stored embeddings. The blend is
//! `alpha * lexical + (1 - alpha) * semantic`; a side missing for an item
//! contributes 0. With no reachable embedding provider the search still
//! functions lexically-only.

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::{AnamnesisError, Result};
use crate::storage::ReviewStore;
use crate::types::RetrievedItem;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-candidate score components gathered before fusion
#[derive(Debug, Default)]
struct CandidateScores {
    lexical: f32,
    semantic: f32,
    project: String,
    snippet: String,
}

/// Hybrid search over a review store
pub struct HybridSearch {
    store: Arc<dyn ReviewStore>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    min_similarity: f32,
}

impl HybridSearch {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        min_similarity: f32,
    ) -> Self {
        Self {
            store,
            provider,
            min_similarity,
        }
    }

    /// Run a hybrid search, returning the fused top `limit` candidates
    ///
    /// Ties on the fused score are broken by ascending id so the ordering
    /// is stable and deterministic.
    pub async fn search(
        &self,
        query: &str,
        alpha: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedItem>> {
        if query.trim().is_empty() {
            return Err(AnamnesisError::InvalidInput(
                "search query cannot be empty".to_string(),
            ));
        }

        let alpha = alpha.clamp(0.0, 1.0);
        let mut candidates: HashMap<String, CandidateScores> = HashMap::new();

        // Lexical side, delegated to the store's full-text index
        let hits = self.store.text_search(query, limit).await?;
        debug!("Lexical search found {} hits", hits.len());
        for hit in hits {
            let entry = candidates.entry(hit.id).or_default();
            entry.lexical = 1.0 / (1.0 + hit.rank as f32);
            entry.project = hit.project;
            entry.snippet = hit.snippet;
        }

        // Semantic side; absent provider or a failed embedding leaves this
        // side empty and the search degrades to lexical-only
        if let Some(provider) = &self.provider {
            match provider.embed(query).await {
                Ok(query_embedding) => {
                    self.collect_semantic(&query_embedding, None, &mut candidates)
                        .await?;
                }
                Err(e) => {
                    warn!("Query embedding unavailable, lexical-only search: {}", e);
                }
            }
        }

        Ok(Self::rank(candidates, alpha, limit))
    }

    /// Find reviews similar to a stored item, using that item's own
    /// embedding as the query vector and excluding the item itself.
    pub async fn find_similar(&self, item_id: &str, limit: usize) -> Result<Vec<RetrievedItem>> {
        let embedding = match self.store.get_embedding(item_id).await? {
            Some(embedding) => embedding,
            None => {
                debug!("Review {} has no embedding, nothing similar", item_id);
                return Ok(Vec::new());
            }
        };

        let mut candidates: HashMap<String, CandidateScores> = HashMap::new();
        self.collect_semantic(&embedding, Some(item_id), &mut candidates)
            .await?;

        // Pure semantic ranking: alpha 0 weights only the similarity side
        Ok(Self::rank(candidates, 0.0, limit))
    }

    /// Score every embedded review against a query vector, dropping items
    /// below the similarity floor.
    async fn collect_semantic(
        &self,
        query_embedding: &[f32],
        exclude_id: Option<&str>,
        candidates: &mut HashMap<String, CandidateScores>,
    ) -> Result<()> {
        let embedded = self.store.list_embedded().await?;
        debug!("Scoring {} embedded reviews", embedded.len());

        for review in embedded {
            if exclude_id == Some(review.id.as_str()) {
                continue;
            }

            let similarity = cosine_similarity(query_embedding, &review.embedding);
            if similarity < self.min_similarity {
                continue;
            }

            let entry = candidates.entry(review.id).or_default();
            entry.semantic = similarity;
            if entry.project.is_empty() {
                entry.project = review.project;
            }
            // Candidates reached only through similarity have no FTS
            // snippet; show the start of the result text instead
            if entry.snippet.is_empty() {
                entry.snippet = review.preview;
            }
        }

        Ok(())
    }

    /// Fuse, sort and truncate a candidate map
    fn rank(
        candidates: HashMap<String, CandidateScores>,
        alpha: f32,
        limit: usize,
    ) -> Vec<RetrievedItem> {
        let mut items: Vec<RetrievedItem> = candidates
            .into_iter()
            .map(|(id, scores)| RetrievedItem {
                score: alpha * scores.lexical + (1.0 - alpha) * scores.semantic,
                id,
                project: scores.project,
                snippet: scores.snippet,
            })
            .collect();

        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        items.truncate(limit);
        items
    }
}
