//! Configuration for the Anamnesis intelligence layer
//!
//! A single immutable [`IntelligenceConfig`] value is passed into each
//! component at construction; there is no process-wide mutable state.
//! Every field has a default, so `IntelligenceConfig::default()` is a
//! fully working configuration. Values can also be loaded from a TOML
//! file with an `ANAMNESIS_*` environment-variable overlay.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Tunables for retrieval, learning and prediction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntelligenceConfig {
    /// Lexical/semantic blend for hybrid search; 1.0 is pure lexical,
    /// 0.0 is pure semantic.
    pub alpha: f32,

    /// Maximum number of historical reviews injected as context.
    pub context_limit: usize,

    /// Floor below which candidates are dropped, both on the semantic
    /// side of hybrid search and after recency boosting.
    pub min_similarity: f32,

    /// Token budget for the assembled historical-context block.
    pub max_tokens: usize,

    /// Multiplicative bonus applied to items newer than `recency_days`.
    pub recency_boost: f32,

    /// Recency window in days; older items receive no boost.
    pub recency_days: f32,

    /// Hebbian learning rate (weight delta per unit co-activation).
    pub learning_rate: f32,

    /// Per-day multiplicative decay factor for association weights.
    pub decay_rate: f32,

    /// Associations whose weight falls below this are deleted on decay.
    pub prune_threshold: f32,

    /// Number of activation-spreading rounds.
    pub spread_iterations: usize,

    /// Attenuation applied to each hop of spread activation.
    pub spread_decay: f32,

    /// Master switch for prompt augmentation; disabled means
    /// `augment_prompt` is a documented no-op.
    pub augmentation_enabled: bool,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            context_limit: 5,
            min_similarity: 0.3,
            max_tokens: 2000,
            recency_boost: 0.1,
            recency_days: 30.0,
            learning_rate: 0.1,
            decay_rate: 0.99,
            prune_threshold: 0.1,
            spread_iterations: 3,
            spread_decay: 0.5,
            augmentation_enabled: true,
        }
    }
}

impl IntelligenceConfig {
    /// Load configuration from a TOML file, with `ANAMNESIS_*` environment
    /// variables taking precedence over file values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ANAMNESIS"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration from environment variables only, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("ANAMNESIS"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
