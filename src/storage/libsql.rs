//! LibSQL store backend
//!
//! Persistent storage using libSQL with FTS5 for lexical search over
//! review text, JSON-encoded embedding vectors, and SQL-side atomic
//! upserts for association learning.

use crate::error::{AnamnesisError, Result};
use crate::storage::{EmbeddedReview, ReviewStore};
use crate::types::{
    canonical_pair, Association, Concept, ConceptId, ConceptType, ReviewRecord, ReviewStatus,
    TextHit,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use tracing::{debug, info, warn};

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// LibSQL store backend
///
/// Holds a single connection for the lifetime of the store; with
/// `:memory:` databases each new connection would see its own isolated
/// database, so schema and data must live on one connection.
pub struct LibsqlStore {
    _db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Open (and initialize if needed) a store
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        let db = match &mode {
            ConnectionMode::Local(path) => Builder::new_local(path).build().await?,
            ConnectionMode::InMemory => Builder::new_local(":memory:").build().await?,
        };

        let conn = db.connect()?;
        let store = Self { _db: db, conn };
        store.init_schema().await?;

        info!("LibSQL store opened ({:?})", mode);
        Ok(store)
    }

    /// Create all tables idempotently
    async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                project TEXT NOT NULL,
                status TEXT NOT NULL,
                files TEXT NOT NULL,
                diff TEXT NOT NULL,
                result TEXT NOT NULL,
                embedding TEXT
            )
            "#,
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS reviews_fts USING fts5(
                id UNINDEXED, files, diff, result
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS concepts (
                id TEXT PRIMARY KEY,
                concept_type TEXT NOT NULL,
                frequency INTEGER NOT NULL DEFAULT 1,
                last_seen TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS associations (
                concept_a TEXT NOT NULL,
                concept_b TEXT NOT NULL,
                context TEXT NOT NULL,
                weight REAL NOT NULL,
                cooccurrence INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (concept_a, concept_b, context)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_associations_a ON associations(concept_a)",
            "CREATE INDEX IF NOT EXISTS idx_associations_b ON associations(concept_b)",
        ];

        for sql in statements {
            self.conn.execute(sql, ()).await?;
        }

        debug!("Schema initialized");
        Ok(())
    }

    /// Escape a term for FTS5 MATCH syntax
    ///
    /// FTS5 treats certain characters and bare uppercase keywords as
    /// operators: `-` is MINUS, `:` is a column filter, `*`/`^` affect
    /// matching, parentheses group, and NOT/AND/OR are boolean operators.
    /// To treat these literally the term is wrapped in double quotes,
    /// with internal quotes doubled.
    fn escape_fts5_term(term: &str) -> String {
        let needs_escaping = term.contains('-')
            || term.contains('(')
            || term.contains(')')
            || term.contains('"')
            || term.contains('.')
            || term.contains('/')
            || term.contains(':')
            || term.contains('*')
            || term.contains('^')
            || term == "NOT"
            || term == "AND"
            || term == "OR";

        if needs_escaping {
            let escaped = term.replace('"', "\"\"");
            format!("\"{}\"", escaped)
        } else {
            term.to_string()
        }
    }

    /// Convert a multi-word query to OR logic for FTS5: results matching
    /// ANY of the terms are relevant, ranked by bm25.
    fn build_fts5_query(query: &str) -> String {
        query
            .split_whitespace()
            .map(Self::escape_fts5_term)
            .collect::<Vec<String>>()
            .join(" OR ")
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AnamnesisError::Database(format!("invalid timestamp '{}': {}", raw, e)))
    }

    fn row_to_review(row: &libsql::Row) -> Result<ReviewRecord> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(1)?;
        let project: String = row.get(2)?;
        let status: String = row.get(3)?;
        let files: String = row.get(4)?;
        let diff: String = row.get(5)?;
        let result: String = row.get(6)?;
        let embedding: Option<String> = row.get(7)?;

        Ok(ReviewRecord {
            id,
            created_at: Self::parse_timestamp(&created_at)?,
            project,
            status: ReviewStatus::from_str_lossy(&status),
            files: serde_json::from_str(&files)?,
            diff,
            result,
            embedding: embedding.map(|raw| serde_json::from_str(&raw)).transpose()?,
        })
    }
}

#[async_trait]
impl ReviewStore for LibsqlStore {
    async fn store_review(&self, review: &ReviewRecord) -> Result<()> {
        debug!("Storing review {} ({})", review.id, review.project);

        let files = serde_json::to_string(&review.files)?;
        let embedding = review
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // Row and FTS index must move together; a failure between the
        // statements would leave the index out of step with the row.
        let tx = self.conn.transaction().await?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO reviews
                (id, created_at, project, status, files, diff, result, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                review.id.clone(),
                review.created_at.to_rfc3339(),
                review.project.clone(),
                review.status.as_str(),
                files,
                review.diff.clone(),
                review.result.clone(),
                embedding,
            ],
        )
        .await?;

        tx.execute(
            "DELETE FROM reviews_fts WHERE id = ?",
            params![review.id.clone()],
        )
        .await?;
        tx.execute(
            "INSERT INTO reviews_fts (id, files, diff, result) VALUES (?, ?, ?, ?)",
            params![
                review.id.clone(),
                review.files.join(" "),
                review.diff.clone(),
                review.result.clone(),
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_review(&self, id: &str) -> Result<ReviewRecord> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, created_at, project, status, files, diff, result, embedding
                 FROM reviews WHERE id = ?",
                params![id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_review(&row),
            None => Err(AnamnesisError::ReviewNotFound(id.to_string())),
        }
    }

    async fn count_reviews(&self) -> Result<usize> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM reviews", ()).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| AnamnesisError::Database("COUNT returned no row".to_string()))?;
        let count: i64 = row.get(0)?;
        Ok(count as usize)
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<TextHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let fts_query = Self::build_fts5_query(query);
        debug!("Text search: {} (limit {})", fts_query, limit);

        let mut rows = self
            .conn
            .query(
                r#"
                SELECT f.id, r.status, r.project,
                       snippet(reviews_fts, -1, '', '', '…', 12)
                FROM reviews_fts f
                JOIN reviews r ON r.id = f.id
                WHERE reviews_fts MATCH ?
                ORDER BY rank
                LIMIT ?
                "#,
                params![fts_query, limit as i64],
            )
            .await?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let status: String = row.get(1)?;
            let project: String = row.get(2)?;
            let snippet: String = row.get(3)?;

            hits.push(TextHit {
                id,
                status: ReviewStatus::from_str_lossy(&status),
                project,
                rank: hits.len(),
                snippet,
            });
        }

        debug!("Text search returned {} hits", hits.len());
        Ok(hits)
    }

    async fn get_embedding(&self, id: &str) -> Result<Option<Vec<f32>>> {
        let mut rows = self
            .conn
            .query("SELECT embedding FROM reviews WHERE id = ?", params![id])
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw: Option<String> = row.get(0)?;
                Ok(raw.map(|r| serde_json::from_str(&r)).transpose()?)
            }
            None => Err(AnamnesisError::ReviewNotFound(id.to_string())),
        }
    }

    async fn list_embedded(&self) -> Result<Vec<EmbeddedReview>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, status, project, substr(result, 1, 120), embedding
                 FROM reviews WHERE embedding IS NOT NULL",
                (),
            )
            .await?;

        let mut reviews = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let status: String = row.get(1)?;
            let project: String = row.get(2)?;
            let preview: String = row.get(3)?;
            let raw: String = row.get(4)?;

            let embedding: Vec<f32> = match serde_json::from_str(&raw) {
                Ok(vector) => vector,
                Err(e) => {
                    warn!("Skipping review {} with malformed embedding: {}", id, e);
                    continue;
                }
            };

            reviews.push(EmbeddedReview {
                id,
                status: ReviewStatus::from_str_lossy(&status),
                project,
                preview,
                embedding,
            });
        }

        Ok(reviews)
    }

    async fn upsert_concept(&self, id: &ConceptId) -> Result<()> {
        let concept_type = id
            .concept_type()
            .unwrap_or(ConceptType::Keyword)
            .prefix()
            .to_string();

        self.conn
            .execute(
                r#"
                INSERT INTO concepts (id, concept_type, frequency, last_seen)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(id) DO UPDATE SET
                    frequency = frequency + 1,
                    last_seen = excluded.last_seen
                "#,
                params![id.as_str(), concept_type, Utc::now().to_rfc3339()],
            )
            .await?;

        Ok(())
    }

    async fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, concept_type, frequency, last_seen FROM concepts WHERE id = ?",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw_id: String = row.get(0)?;
                let concept_type: String = row.get(1)?;
                let frequency: i64 = row.get(2)?;
                let last_seen: String = row.get(3)?;

                Ok(Some(Concept {
                    id: ConceptId::from_raw(raw_id),
                    concept_type: ConceptType::from_prefix(&concept_type)
                        .unwrap_or(ConceptType::Keyword),
                    frequency: frequency as u64,
                    last_seen: Self::parse_timestamp(&last_seen)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn strengthen_association(
        &self,
        a: &ConceptId,
        b: &ConceptId,
        context: &str,
        delta: f32,
    ) -> Result<f32> {
        if a == b {
            return Err(AnamnesisError::InvalidInput(
                "self-associations are not stored".to_string(),
            ));
        }

        let (first, second) = canonical_pair(a.clone(), b.clone());
        let initial = (0.5 + delta as f64).min(1.0);

        // Single-statement upsert keeps concurrent learning events on the
        // same pair serialized in the store, with no read/modify/write race.
        let mut rows = self
            .conn
            .query(
                r#"
                INSERT INTO associations
                    (concept_a, concept_b, context, weight, cooccurrence, updated_at)
                VALUES (?, ?, ?, ?, 1, ?)
                ON CONFLICT(concept_a, concept_b, context) DO UPDATE SET
                    weight = MIN(1.0, weight + ?),
                    cooccurrence = cooccurrence + 1,
                    updated_at = excluded.updated_at
                RETURNING weight
                "#,
                params![
                    first.as_str(),
                    second.as_str(),
                    context,
                    initial,
                    Utc::now().to_rfc3339(),
                    delta as f64,
                ],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| AnamnesisError::Database("upsert returned no row".to_string()))?;
        let weight: f64 = row.get(0)?;
        Ok(weight as f32)
    }

    async fn get_association(
        &self,
        a: &ConceptId,
        b: &ConceptId,
        context: &str,
    ) -> Result<Option<Association>> {
        let (first, second) = canonical_pair(a.clone(), b.clone());

        let mut rows = self
            .conn
            .query(
                r#"
                SELECT concept_a, concept_b, context, weight, cooccurrence, updated_at
                FROM associations
                WHERE concept_a = ? AND concept_b = ? AND context = ?
                "#,
                params![first.as_str(), second.as_str(), context],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let concept_a: String = row.get(0)?;
                let concept_b: String = row.get(1)?;
                let context: String = row.get(2)?;
                let weight: f64 = row.get(3)?;
                let cooccurrence: i64 = row.get(4)?;
                let updated_at: String = row.get(5)?;

                Ok(Some(Association {
                    concept_a: ConceptId::from_raw(concept_a),
                    concept_b: ConceptId::from_raw(concept_b),
                    context,
                    weight: weight as f32,
                    cooccurrence: cooccurrence as u64,
                    updated_at: Self::parse_timestamp(&updated_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_neighbors(&self, concept: &ConceptId) -> Result<Vec<(ConceptId, f32)>> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT concept_a, concept_b, weight
                FROM associations
                WHERE concept_a = ? OR concept_b = ?
                ORDER BY weight DESC
                "#,
                params![concept.as_str(), concept.as_str()],
            )
            .await?;

        let mut neighbors = Vec::new();
        while let Some(row) = rows.next().await? {
            let concept_a: String = row.get(0)?;
            let concept_b: String = row.get(1)?;
            let weight: f64 = row.get(2)?;

            let other = if concept_a == concept.as_str() {
                concept_b
            } else {
                concept_a
            };
            neighbors.push((ConceptId::from_raw(other), weight as f32));
        }

        Ok(neighbors)
    }

    async fn count_associations(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM associations", ())
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| AnamnesisError::Database("COUNT returned no row".to_string()))?;
        let count: i64 = row.get(0)?;
        Ok(count as usize)
    }

    async fn decay_all(&self, factor: f32) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE associations SET weight = weight * ?",
                params![factor as f64],
            )
            .await?;

        debug!("Decayed {} associations by factor {}", changed, factor);
        Ok(())
    }

    async fn delete_below(&self, threshold: f32) -> Result<usize> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM associations WHERE weight < ?",
                params![threshold as f64],
            )
            .await?;

        if deleted > 0 {
            info!("Pruned {} associations below {}", deleted, threshold);
        }
        Ok(deleted as usize)
    }
}
