//! Top-level facade over the intelligence subsystems
//!
//! `Intelligence` wires the store, the optional embedding provider, and a
//! config value into one handle exposing the operations callers use:
//! concept extraction, hybrid search, prompt augmentation, associative
//! learning, decay maintenance, and prediction.

use crate::concepts;
use crate::config::IntelligenceConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{AnamnesisError, Result};
use crate::hebbian::AssociativeMemory;
use crate::rag::RetrievalPipeline;
use crate::search::HybridSearch;
use crate::spread::ActivationSpreader;
use crate::storage::ReviewStore;
use crate::types::{ConceptId, PredictionOutcome, RetrievedItem};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Entry point for the review-intelligence layer
pub struct Intelligence {
    config: IntelligenceConfig,
    search: HybridSearch,
    pipeline: RetrievalPipeline,
    memory: AssociativeMemory,
    spreader: ActivationSpreader,
}

impl Intelligence {
    /// Build the facade from a store, an optional embedding provider, and
    /// configuration. Without a provider, search degrades to lexical-only
    /// and augmentation still works.
    pub fn new(
        store: Arc<dyn ReviewStore>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        config: IntelligenceConfig,
    ) -> Self {
        info!(
            "Intelligence layer initialized (semantic search {})",
            if provider.is_some() { "enabled" } else { "disabled" }
        );

        let search = HybridSearch::new(store.clone(), provider.clone(), config.min_similarity);
        let pipeline = RetrievalPipeline::new(
            store.clone(),
            HybridSearch::new(store.clone(), provider, config.min_similarity),
            config.clone(),
        );
        let memory = AssociativeMemory::new(store.clone(), config.clone());
        let spreader = ActivationSpreader::new(store, config.clone());

        Self {
            config,
            search,
            pipeline,
            memory,
            spreader,
        }
    }

    /// Extract typed concept labels from raw text
    pub fn extract_concepts(&self, text: &str) -> BTreeSet<ConceptId> {
        concepts::extract_concepts(text)
    }

    /// Hybrid lexical/semantic search over stored reviews
    pub async fn hybrid_search(
        &self,
        query: &str,
        alpha: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedItem>> {
        self.search.search(query, alpha, limit).await
    }

    /// Reviews most similar to a stored review, by embedding alone
    pub async fn find_similar(&self, review_id: &str, limit: usize) -> Result<Vec<RetrievedItem>> {
        self.search.find_similar(review_id, limit).await
    }

    /// Augment a review prompt with relevant past-review context. Always
    /// returns a usable prompt; on any internal failure the original is
    /// returned unchanged.
    pub async fn augment_prompt(
        &self,
        prompt: &str,
        files: &[String],
        commit_message: &str,
        diff: &str,
    ) -> String {
        self.pipeline
            .augment_prompt(prompt, files, commit_message, diff)
            .await
    }

    /// Record a co-occurrence event, strengthening every concept pair
    pub async fn learn_from_event(
        &self,
        concepts: &BTreeSet<ConceptId>,
        context: &str,
    ) -> Result<usize> {
        self.memory.learn_from_event(concepts, context).await
    }

    /// Apply time decay across all associations and prune the weakest
    pub async fn decay(&self, days: f32) -> Result<usize> {
        self.memory.decay(days).await
    }

    /// Predict related concepts for a piece of text by extracting its
    /// concepts and spreading activation from them
    pub async fn predict(&self, text: &str) -> Result<PredictionOutcome> {
        if text.trim().is_empty() {
            return Err(AnamnesisError::InvalidInput(
                "prediction text must not be empty".to_string(),
            ));
        }

        let seeds = concepts::extract_concepts(text);
        self.spreader.spread(&seeds).await
    }

    pub fn config(&self) -> &IntelligenceConfig {
        &self.config
    }
}
