//! Core data types for the Anamnesis intelligence layer
//!
//! This module defines the fundamental data structures shared by the
//! retrieval and learning subsystems: concepts and their namespaced ids,
//! associations between concepts, stored review records, and the ephemeral
//! retrieval/prediction result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a concept label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    /// A detected topic category (e.g. `pattern:authentication`)
    Pattern,

    /// A source file mentioned in a diff or file list
    File,

    /// A recognizable error signature (e.g. `error:null-reference`)
    Error,

    /// A review outcome (e.g. `status:failed`)
    Status,

    /// A free-form keyword supplied by a caller
    Keyword,
}

impl ConceptType {
    /// Namespace prefix used in concept ids
    pub fn prefix(&self) -> &'static str {
        match self {
            ConceptType::Pattern => "pattern",
            ConceptType::File => "file",
            ConceptType::Error => "error",
            ConceptType::Status => "status",
            ConceptType::Keyword => "keyword",
        }
    }

    /// Parse a namespace prefix back into a type
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "pattern" => Some(ConceptType::Pattern),
            "file" => Some(ConceptType::File),
            "error" => Some(ConceptType::Error),
            "status" => Some(ConceptType::Status),
            "keyword" => Some(ConceptType::Keyword),
            _ => None,
        }
    }
}

/// Namespaced concept identifier of the form `type:name`
///
/// Concept ids are plain strings so they can be stored and compared without
/// lookups; the `Ord` impl gives the lexicographic order used to
/// canonicalize association pairs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    /// Build a concept id from a type and a name. Names are lowercased so
    /// identical labels always produce identical ids.
    pub fn new(concept_type: ConceptType, name: &str) -> Self {
        Self(format!("{}:{}", concept_type.prefix(), name.trim().to_lowercase()))
    }

    /// Wrap an already-formed `type:name` string without re-normalizing
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The type encoded in the prefix, if recognizable
    pub fn concept_type(&self) -> Option<ConceptType> {
        self.0
            .split_once(':')
            .and_then(|(prefix, _)| ConceptType::from_prefix(prefix))
    }

    /// The name portion after the namespace prefix
    pub fn name(&self) -> &str {
        self.0.split_once(':').map(|(_, name)| name).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order an unordered concept pair canonically (lexicographically smaller
/// id first) so `(a, b)` and `(b, a)` resolve to the same stored row.
pub fn canonical_pair(a: ConceptId, b: ConceptId) -> (ConceptId, ConceptId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A concept observed by the extractor, with occurrence bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Namespaced id (`type:name`)
    pub id: ConceptId,

    /// Category of the concept
    pub concept_type: ConceptType,

    /// How many times this concept has been observed
    pub frequency: u64,

    /// When this concept was last observed
    pub last_seen: DateTime<Utc>,
}

/// Weighted, symmetric edge between two concepts
///
/// Stored canonically: `concept_a < concept_b` lexicographically, so an
/// unordered pair appears at most once per context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    /// Lexicographically smaller endpoint
    pub concept_a: ConceptId,

    /// Lexicographically larger endpoint
    pub concept_b: ConceptId,

    /// Grouping namespace for the association (e.g. "review")
    pub context: String,

    /// Learned strength, always within [0.0, 1.0]
    pub weight: f32,

    /// Number of co-occurrence events that touched this pair
    pub cooccurrence: u64,

    /// Last time the learning rule or decay touched this row
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a stored review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Passed,
    Failed,
    Pending,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Passed => "PASSED",
            ReviewStatus::Failed => "FAILED",
            ReviewStatus::Pending => "PENDING",
        }
    }

    /// Parse a stored status string; anything unrecognized is treated as
    /// pending rather than failing the read.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "PASSED" => ReviewStatus::Passed,
            "FAILED" => ReviewStatus::Failed,
            _ => ReviewStatus::Pending,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted review record
///
/// The intelligence layer treats reviews as mostly opaque: it consumes the
/// timestamp for recency, the text fields for search and extraction, and
/// the optional embedding for semantic ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Opaque caller-supplied identifier
    pub id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Project the review belongs to
    pub project: String,

    /// Review outcome
    pub status: ReviewStatus,

    /// Changed file paths
    pub files: Vec<String>,

    /// Unified diff text
    pub diff: String,

    /// Review result text (findings, verdict)
    pub result: String,

    /// Embedding vector, interpreted only via dot product and norm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ReviewRecord {
    /// Create a new review record with a fresh id and current timestamp
    pub fn new(project: &str, status: ReviewStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            project: project.to_string(),
            status,
            files: Vec::new(),
            diff: String::new(),
            result: String::new(),
            embedding: None,
        }
    }

    /// Concatenated searchable text (files, diff, result)
    pub fn searchable_text(&self) -> String {
        let mut text = self.files.join(" ");
        if !self.diff.is_empty() {
            text.push(' ');
            text.push_str(&self.diff);
        }
        if !self.result.is_empty() {
            text.push(' ');
            text.push_str(&self.result);
        }
        text
    }
}

/// One lexical (full-text) hit as returned by the store
#[derive(Debug, Clone)]
pub struct TextHit {
    pub id: String,
    pub status: ReviewStatus,
    pub project: String,

    /// Zero-based relevance rank within the result list
    pub rank: usize,

    /// Short excerpt around the match
    pub snippet: String,
}

/// A scored candidate produced by hybrid search or the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Fused (and possibly recency-boosted) relevance score
    pub score: f32,

    /// Id of the underlying review
    pub id: String,

    /// Project of the underlying review
    pub project: String,

    /// Short excerpt for display
    pub snippet: String,
}

/// One predicted concept with its accumulated activation
///
/// Activation scores are relative strengths, not probabilities; they are
/// never renormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub concept: ConceptId,
    pub activation: f32,
}

/// Result of a prediction request
///
/// Insufficient memory (empty seed set, or fewer than three associations in
/// the graph) is an explicit informational outcome, not an error and not a
/// partial result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PredictionOutcome {
    /// Ranked predictions, strongest first, seed concepts excluded
    Predictions { predictions: Vec<Prediction> },

    /// The association graph is not yet large enough to predict from
    InsufficientMemory,
}

impl PredictionOutcome {
    /// The predictions, if the graph had enough signal
    pub fn predictions(&self) -> Option<&[Prediction]> {
        match self {
            PredictionOutcome::Predictions { predictions } => Some(predictions),
            PredictionOutcome::InsufficientMemory => None,
        }
    }
}
