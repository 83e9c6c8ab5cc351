//! Retrieval-augmented prompt construction
//!
//! The pipeline turns a change description (files, commit message, diff)
//! into a search query, retrieves similar past reviews with a recency
//! boost, assembles them into a token-budgeted history section, and
//! appends that section to the caller's prompt. Augmentation is strictly
//! additive: any failure along the way logs and returns the prompt
//! unchanged, never an error.

use crate::concepts::category_labels;
use crate::config::IntelligenceConfig;
use crate::error::{AnamnesisError, Result};
use crate::search::HybridSearch;
use crate::storage::ReviewStore;
use crate::types::{ReviewRecord, RetrievedItem};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Candidates fetched per requested context slot, so recency boosting
/// can promote items that raw relevance alone would have cut
const OVER_FETCH_FACTOR: usize = 3;

/// Reviews required before history is worth injecting
const MIN_HISTORY: usize = 3;

/// Character cap applied to each review's result text
const RESULT_CHAR_CAP: usize = 500;

/// Fixed per-entry token overhead for headers and framing
const ENTRY_TOKEN_OVERHEAD: usize = 20;

/// Retrieves and formats past-review context for prompt augmentation
pub struct RetrievalPipeline {
    store: Arc<dyn ReviewStore>,
    search: HybridSearch,
    config: IntelligenceConfig,
}

impl RetrievalPipeline {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        search: HybridSearch,
        config: IntelligenceConfig,
    ) -> Self {
        Self {
            store,
            search,
            config,
        }
    }

    /// Append a history section to `prompt` when memory has something
    /// useful, otherwise return the prompt unchanged. The original prompt
    /// is always a prefix of the returned string.
    pub async fn augment_prompt(
        &self,
        prompt: &str,
        files: &[String],
        commit_message: &str,
        diff: &str,
    ) -> String {
        if !self.config.augmentation_enabled {
            return prompt.to_string();
        }

        match self.try_augment(prompt, files, commit_message, diff).await {
            Ok(augmented) => augmented,
            Err(e) => {
                warn!("Prompt augmentation failed, using original prompt: {}", e);
                prompt.to_string()
            }
        }
    }

    async fn try_augment(
        &self,
        prompt: &str,
        files: &[String],
        commit_message: &str,
        diff: &str,
    ) -> Result<String> {
        let stored = self.store.count_reviews().await?;
        if stored < MIN_HISTORY {
            debug!("Only {} review(s) stored, skipping augmentation", stored);
            return Ok(prompt.to_string());
        }

        let query = build_query(files, commit_message, diff);
        if query.is_empty() {
            debug!("Nothing recognizable in the change, skipping augmentation");
            return Ok(prompt.to_string());
        }

        let context = self.retrieve_context(&query).await?;
        if context.is_empty() {
            debug!("No past reviews cleared the similarity floor");
            return Ok(prompt.to_string());
        }

        let section = assemble_context(&context, self.config.max_tokens);
        if section.is_empty() {
            return Ok(prompt.to_string());
        }

        Ok(format!(
            "{}\n\n## Relevant past reviews\n\n{}\n\
             Consider whether issues found in these past reviews apply to the current change.",
            prompt, section
        ))
    }

    /// Retrieve the most relevant past reviews for `query`, recency-boosted
    /// and capped at the configured context limit
    pub async fn retrieve_context(&self, query: &str) -> Result<Vec<(RetrievedItem, ReviewRecord)>> {
        let candidates = self
            .search
            .search(
                query,
                self.config.alpha,
                self.config.context_limit * OVER_FETCH_FACTOR,
            )
            .await?;

        let now = Utc::now();
        let mut boosted: Vec<(RetrievedItem, ReviewRecord)> = Vec::new();
        for mut item in candidates {
            let record = match self.store.get_review(&item.id).await {
                Ok(record) => record,
                Err(AnamnesisError::ReviewNotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            let age_days = (now - record.created_at).num_seconds() as f32 / 86_400.0;
            item.score *= recency_multiplier(
                age_days,
                self.config.recency_boost,
                self.config.recency_days,
            );

            // Boosting can promote items, never rescue ones below the floor
            if item.score >= self.config.min_similarity {
                boosted.push((item, record));
            }
        }

        boosted.sort_by(|(a, _), (b, _)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        boosted.truncate(self.config.context_limit);

        Ok(boosted)
    }
}

/// Build the retrieval query for a change: file basenames, detected
/// category labels from the diff, and the commit message
pub fn build_query(files: &[String], commit_message: &str, diff: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for file in files {
        let basename = file.rsplit(['/', '\\']).next().unwrap_or(file);
        if !basename.is_empty() {
            parts.push(basename.to_string());
        }
    }

    for label in category_labels(diff) {
        parts.push(label.to_string());
    }

    let commit = commit_message.trim();
    if !commit.is_empty() {
        parts.push(commit.to_string());
    }

    parts.join(" ")
}

/// Multiplier applied to a relevance score based on review age. Linear
/// falloff from `1 + boost` at age zero to 1.0 at the window edge; older
/// reviews are left untouched.
fn recency_multiplier(age_days: f32, boost: f32, window_days: f32) -> f32 {
    if age_days < 0.0 || age_days >= window_days || window_days <= 0.0 {
        return 1.0;
    }
    1.0 + boost * (1.0 - age_days / window_days)
}

/// Render retrieved reviews into a history section, stopping at the first
/// entry that would exceed the token budget
fn assemble_context(context: &[(RetrievedItem, ReviewRecord)], max_tokens: usize) -> String {
    let mut section = String::new();
    let mut used_tokens = 0;

    for (item, record) in context {
        let entry = render_entry(item, record);
        let entry_tokens = estimate_tokens(&entry);
        if used_tokens + entry_tokens > max_tokens {
            debug!(
                "Token budget reached ({} used of {}), dropping remaining entries",
                used_tokens, max_tokens
            );
            break;
        }
        used_tokens += entry_tokens;
        section.push_str(&entry);
    }

    section
}

fn render_entry(item: &RetrievedItem, record: &ReviewRecord) -> String {
    let mut result = record.result.trim().to_string();
    if result.chars().count() > RESULT_CHAR_CAP {
        result = result.chars().take(RESULT_CHAR_CAP).collect();
        result.push('…');
    }

    format!(
        "### {} ({}, relevance {:.2})\nFiles: {}\n{}\n\n",
        record.project,
        record.status,
        item.score,
        record.files.join(", "),
        result
    )
}

/// Rough token count: four characters per token plus fixed framing overhead
fn estimate_tokens(entry: &str) -> usize {
    entry.chars().count() / 4 + ENTRY_TOKEN_OVERHEAD
}
