//! # Anamnesis
//!
//! The intelligence layer of an AI-assisted code-review tool. Anamnesis
//! remembers past reviews and uses them three ways:
//!
//! - **Hybrid search** ([`search`]) fuses full-text relevance with
//!   embedding cosine similarity under a configurable blend, degrading
//!   gracefully to lexical-only when no embedding provider is available.
//! - **Prompt augmentation** ([`rag`]) retrieves recency-boosted similar
//!   reviews and appends a token-budgeted history section to a review
//!   prompt, without ever failing the caller.
//! - **Associative memory** ([`hebbian`], [`spread`]) learns weighted
//!   links between co-occurring concepts and predicts related concepts by
//!   spreading activation over the learned graph.
//!
//! Concepts are extracted deterministically ([`concepts`]) from diffs,
//! file lists and review text. Everything persists through the
//! [`storage::ReviewStore`] trait; [`storage::libsql::LibsqlStore`] is the
//! bundled libsql/FTS5 backend.
//!
//! ## Quick start
//!
//! ```no_run
//! use anamnesis::config::IntelligenceConfig;
//! use anamnesis::intelligence::Intelligence;
//! use anamnesis::storage::libsql::{ConnectionMode, LibsqlStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> anamnesis::error::Result<()> {
//! let store = Arc::new(LibsqlStore::new(ConnectionMode::InMemory).await?);
//! let intel = Intelligence::new(store, None, IntelligenceConfig::default());
//!
//! let hits = intel.hybrid_search("authentication issues", 0.5, 5).await?;
//! # Ok(())
//! # }
//! ```

pub mod concepts;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod hebbian;
pub mod intelligence;
pub mod rag;
pub mod search;
pub mod spread;
pub mod storage;
pub mod types;

pub use config::IntelligenceConfig;
pub use error::{AnamnesisError, Result};
pub use intelligence::Intelligence;
pub use types::{
    Concept, ConceptId, ConceptType, Prediction, PredictionOutcome, ReviewRecord, ReviewStatus,
    RetrievedItem,
};
