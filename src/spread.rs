//! Activation spreading over the association graph
//!
//! Seeds start at activation 1.0. Each round, every activated concept
//! pushes `activation * edge_weight * spread_decay` into its neighbors'
//! accumulators; contributions from multiple sources sum within a round,
//! and a concept always retains its prior activation. After a fixed
//! number of rounds the touched concepts are sorted once by accumulated
//! activation. Scores are relative strengths, never renormalized.

use crate::config::IntelligenceConfig;
use crate::error::Result;
use crate::storage::ReviewStore;
use crate::types::{ConceptId, Prediction, PredictionOutcome};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Maximum predictions returned after the final sort
pub const MAX_PREDICTIONS: usize = 10;

/// Associations needed before predictions are meaningful
const MIN_GRAPH_SIZE: usize = 3;

/// Spreads activation from seed concepts across learned associations
pub struct ActivationSpreader {
    store: Arc<dyn ReviewStore>,
    config: IntelligenceConfig,
}

impl ActivationSpreader {
    pub fn new(store: Arc<dyn ReviewStore>, config: IntelligenceConfig) -> Self {
        Self { store, config }
    }

    /// Spread activation from `seeds` and rank the touched concepts
    ///
    /// An empty seed set, or a graph with fewer than three associations,
    /// yields [`PredictionOutcome::InsufficientMemory`] rather than a
    /// partial result.
    pub async fn spread(&self, seeds: &BTreeSet<ConceptId>) -> Result<PredictionOutcome> {
        if seeds.is_empty() {
            debug!("No seed concepts, insufficient memory");
            return Ok(PredictionOutcome::InsufficientMemory);
        }

        let graph_size = self.store.count_associations().await?;
        if graph_size < MIN_GRAPH_SIZE {
            debug!(
                "Graph has {} association(s), below the {} needed",
                graph_size, MIN_GRAPH_SIZE
            );
            return Ok(PredictionOutcome::InsufficientMemory);
        }

        let mut activation: HashMap<ConceptId, f32> =
            seeds.iter().map(|seed| (seed.clone(), 1.0)).collect();
        let mut neighbor_cache: HashMap<ConceptId, Vec<(ConceptId, f32)>> = HashMap::new();

        for round in 0..self.config.spread_iterations {
            // Contributions are computed against a snapshot and applied
            // after the round, so a round never feeds on its own output.
            let snapshot: Vec<(ConceptId, f32)> = activation
                .iter()
                .map(|(concept, value)| (concept.clone(), *value))
                .collect();
            let mut round_contributions: HashMap<ConceptId, f32> = HashMap::new();

            for (concept, value) in &snapshot {
                if !neighbor_cache.contains_key(concept) {
                    let neighbors = self.store.list_neighbors(concept).await?;
                    neighbor_cache.insert(concept.clone(), neighbors);
                }

                for (neighbor, weight) in &neighbor_cache[concept] {
                    let contribution = value * weight * self.config.spread_decay;
                    *round_contributions.entry(neighbor.clone()).or_insert(0.0) += contribution;
                }
            }

            for (concept, contribution) in round_contributions {
                *activation.entry(concept).or_insert(0.0) += contribution;
            }

            debug!(
                "Spread round {}: {} concepts activated",
                round + 1,
                activation.len()
            );
        }

        let mut predictions: Vec<Prediction> = activation
            .into_iter()
            .filter(|(concept, _)| !seeds.contains(concept))
            .map(|(concept, activation)| Prediction {
                concept,
                activation,
            })
            .collect();

        predictions.sort_by(|a, b| {
            b.activation
                .partial_cmp(&a.activation)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.concept.cmp(&b.concept))
        });
        predictions.truncate(MAX_PREDICTIONS);

        Ok(PredictionOutcome::Predictions { predictions })
    }
}
