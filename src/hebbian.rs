//! Hebbian associative memory over concept pairs
//!
//! Learns weighted, symmetric associations between concepts that co-occur
//! in the same event (typically one review). Weights live in [0, 1],
//! start at 0.5 on first co-occurrence, strengthen by
//! `learning_rate * activation_a * activation_b` per event, decay
//! multiplicatively over time, and are pruned once they fall below a
//! threshold.

use crate::config::IntelligenceConfig;
use crate::error::{AnamnesisError, Result};
use crate::storage::ReviewStore;
use crate::types::ConceptId;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Activation assigned to directly observed concepts
const DIRECT_OBSERVATION_ACTIVATION: f32 = 1.0;

/// Store-backed Hebbian associative memory
pub struct AssociativeMemory {
    store: Arc<dyn ReviewStore>,
    config: IntelligenceConfig,
}

impl AssociativeMemory {
    pub fn new(store: Arc<dyn ReviewStore>, config: IntelligenceConfig) -> Self {
        Self { store, config }
    }

    /// Learn from one co-occurrence event
    ///
    /// Every unordered pair in the set is strengthened by
    /// `learning_rate * 1.0 * 1.0` (direct observations carry activation
    /// 1.0); each concept's frequency and last-seen are refreshed. Cost is
    /// O(n²) in the set size, which extraction keeps bounded. Returns the
    /// number of pairs updated. An empty set is a no-op, not an error.
    pub async fn learn_from_event(
        &self,
        concepts: &BTreeSet<ConceptId>,
        context: &str,
    ) -> Result<usize> {
        if context.trim().is_empty() {
            return Err(AnamnesisError::InvalidInput(
                "association context cannot be empty".to_string(),
            ));
        }

        if concepts.len() < 2 {
            debug!("Learning event with {} concept(s), no pairs", concepts.len());
            for concept in concepts {
                self.store.upsert_concept(concept).await?;
            }
            return Ok(0);
        }

        for concept in concepts {
            self.store.upsert_concept(concept).await?;
        }

        let delta = self.config.learning_rate
            * DIRECT_OBSERVATION_ACTIVATION
            * DIRECT_OBSERVATION_ACTIVATION;

        let list: Vec<&ConceptId> = concepts.iter().collect();
        let mut pairs = 0;
        for i in 0..list.len() {
            for j in (i + 1)..list.len() {
                self.store
                    .strengthen_association(list[i], list[j], context, delta)
                    .await?;
                pairs += 1;
            }
        }

        debug!(
            "Learned {} pairs from {} concepts (context '{}')",
            pairs,
            concepts.len(),
            context
        );
        Ok(pairs)
    }

    /// Apply time decay to every association, then prune weak rows
    ///
    /// Multiplies all weights by `decay_rate ^ days` and deletes rows that
    /// fall below the prune threshold. The factor is flat: there is no
    /// per-row elapsed-time bookkeeping, so callers own the elapsed-day
    /// accounting and must not invoke this twice for the same interval.
    /// Returns the number of pruned associations.
    pub async fn decay(&self, days: f32) -> Result<usize> {
        if days <= 0.0 {
            return Ok(0);
        }

        let factor = self.config.decay_rate.powf(days);
        self.store.decay_all(factor).await?;
        let pruned = self.store.delete_below(self.config.prune_threshold).await?;

        info!(
            "Decay over {} day(s): factor {:.4}, {} pruned",
            days, factor, pruned
        );
        Ok(pruned)
    }

    /// Neighbors of a concept, strongest association first
    pub async fn neighbors(
        &self,
        concept: &ConceptId,
        limit: Option<usize>,
    ) -> Result<Vec<(ConceptId, f32)>> {
        let mut neighbors = self.store.list_neighbors(concept).await?;
        if let Some(limit) = limit {
            neighbors.truncate(limit);
        }
        Ok(neighbors)
    }
}
