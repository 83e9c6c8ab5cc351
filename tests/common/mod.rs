//! Common test utilities and fixtures

#![allow(dead_code)]

use anamnesis::embeddings::hashing::HashingProvider;
use anamnesis::embeddings::EmbeddingProvider;
use anamnesis::storage::libsql::{ConnectionMode, LibsqlStore};
use anamnesis::types::{ReviewRecord, ReviewStatus};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber honoring RUST_LOG, once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Create an in-memory libsql store. The store holds one connection for
/// its whole lifetime, so :memory: databases stay coherent here.
pub async fn create_test_store() -> Arc<LibsqlStore> {
    init_tracing();
    Arc::new(
        LibsqlStore::new(ConnectionMode::InMemory)
            .await
            .expect("Failed to create test store"),
    )
}

/// Deterministic local embedding provider, so semantic scores are stable
/// across runs without any network dependency.
pub fn test_provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingProvider)
}

/// Build a review record with deterministic id and searchable content
pub fn sample_review(
    id: &str,
    project: &str,
    status: ReviewStatus,
    files: &[&str],
    result: &str,
) -> ReviewRecord {
    let mut record = ReviewRecord::new(project, status);
    record.id = id.to_string();
    record.files = files.iter().map(|f| f.to_string()).collect();
    record.result = result.to_string();
    record
}

/// Same as [`sample_review`] but aged by `days_old` days
pub fn aged_review(
    id: &str,
    project: &str,
    status: ReviewStatus,
    files: &[&str],
    result: &str,
    days_old: i64,
) -> ReviewRecord {
    let mut record = sample_review(id, project, status, files, result);
    record.created_at = Utc::now() - Duration::days(days_old);
    record
}

/// Attach a deterministic embedding computed from the record's own text
pub fn with_embedding(mut record: ReviewRecord) -> ReviewRecord {
    record.embedding = Some(HashingProvider::embedding(&record.searchable_text()));
    record
}
