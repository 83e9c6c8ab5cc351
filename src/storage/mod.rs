//! Storage layer for the Anamnesis intelligence layer
//!
//! Provides the store abstraction the retrieval and learning subsystems
//! are written against, plus the libsql backend implementing it.

pub mod libsql;

use crate::error::Result;
use crate::types::{Association, Concept, ConceptId, ReviewRecord, ReviewStatus, TextHit};
use async_trait::async_trait;

/// A review row carrying an embedding, as returned by
/// [`ReviewStore::list_embedded`]
#[derive(Debug, Clone)]
pub struct EmbeddedReview {
    pub id: String,
    pub status: ReviewStatus,
    pub project: String,

    /// Short prefix of the review's result text, for display when a
    /// candidate is reached through similarity alone
    pub preview: String,

    pub embedding: Vec<f32>,
}

/// Store trait defining all operations consumed by the intelligence layer
///
/// Association mutation goes through [`strengthen_association`], an atomic
/// insert-or-adjust, so concurrent learning events racing on the same pair
/// cannot lose updates. Decay and pruning likewise commit per-row
/// atomically; readers may observe pre- or post-decay weights but never a
/// torn value.
///
/// [`strengthen_association`]: ReviewStore::strengthen_association
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a review record (replaces an existing row with the same id)
    async fn store_review(&self, review: &ReviewRecord) -> Result<()>;

    /// Fetch a review by id
    async fn get_review(&self, id: &str) -> Result<ReviewRecord>;

    /// Total number of stored reviews
    async fn count_reviews(&self) -> Result<usize>;

    /// Full-text search over review text, best match first
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<TextHit>>;

    /// Embedding vector for a review, if one was stored
    async fn get_embedding(&self, id: &str) -> Result<Option<Vec<f32>>>;

    /// All reviews carrying a non-null embedding
    async fn list_embedded(&self) -> Result<Vec<EmbeddedReview>>;

    /// Create a concept or bump its frequency and last-seen timestamp
    async fn upsert_concept(&self, id: &ConceptId) -> Result<()>;

    /// Fetch a concept's bookkeeping row
    async fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>>;

    /// Atomically create (at `0.5 + delta`) or strengthen (by `delta`) the
    /// association between two concepts, clamped to 1.0, bumping its
    /// co-occurrence counter. The pair is canonicalized before storage.
    /// Returns the new weight.
    async fn strengthen_association(
        &self,
        a: &ConceptId,
        b: &ConceptId,
        context: &str,
        delta: f32,
    ) -> Result<f32>;

    /// Fetch an association row, canonicalizing the pair first
    async fn get_association(
        &self,
        a: &ConceptId,
        b: &ConceptId,
        context: &str,
    ) -> Result<Option<Association>>;

    /// Every concept touching `concept`, with edge weight, strongest first
    async fn list_neighbors(&self, concept: &ConceptId) -> Result<Vec<(ConceptId, f32)>>;

    /// Total number of association rows
    async fn count_associations(&self) -> Result<usize>;

    /// Multiply every association weight by `factor`
    async fn decay_all(&self, factor: f32) -> Result<()>;

    /// Delete associations with weight below `threshold`; returns the
    /// number of rows removed
    async fn delete_below(&self, threshold: f32) -> Result<usize>;
}
