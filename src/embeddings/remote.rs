//! Remote embedding provider over an OpenAI-compatible embeddings API
//!
//! Handles per-request timeouts, bounded retry with exponential backoff on
//! rate limiting, and response validation before vectors reach the
//! similarity code.

use crate::embeddings::EmbeddingProvider;
use crate::error::{AnamnesisError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Maximum retry attempts for rate limiting
const MAX_RETRIES: usize = 3;

/// Backoff base duration in milliseconds
const BACKOFF_BASE_MS: u64 = 1000;

/// Request timeout duration
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Remote embedding provider
pub struct RemoteProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl RemoteProvider {
    /// Create a new remote provider
    ///
    /// # Arguments
    /// * `api_key` - Bearer token for the embeddings API
    /// * `model` - Model name
    /// * `base_url` - API base URL (e.g. `https://api.example.com/v1`)
    /// * `dimensions` - Expected embedding dimensionality
    pub fn new(api_key: String, model: String, base_url: String, dimensions: usize) -> Result<Self> {
        if api_key.is_empty() {
            return Err(AnamnesisError::InvalidInput(
                "API key cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AnamnesisError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
            dimensions,
        })
    }

    /// Call the API with retry logic for rate limiting and timeouts
    async fn call_api_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let mut retries = 0;

        loop {
            match self.call_api(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        return Err(e);
                    }

                    let should_retry = match &e {
                        AnamnesisError::Network(msg) => {
                            msg.contains("rate limit") || msg.contains("timeout")
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(e);
                    }

                    let backoff_ms = BACKOFF_BASE_MS * 2_u64.pow(retries as u32);
                    warn!(
                        "Embedding API call failed, retrying after {}ms (attempt {}/{})",
                        backoff_ms,
                        retries + 1,
                        MAX_RETRIES
                    );

                    sleep(Duration::from_millis(backoff_ms)).await;
                    retries += 1;
                }
            }
        }
    }

    /// Call the API once (no retry)
    async fn call_api(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Calling embeddings API, model: {}", self.model);

        let request = EmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnamnesisError::Network("request timeout".to_string())
                } else {
                    AnamnesisError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let body = response
                    .json::<EmbeddingResponse>()
                    .await
                    .map_err(|e| AnamnesisError::Embedding(e.to_string()))?;

                let embedding = body
                    .data
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        AnamnesisError::Embedding("empty response from API".to_string())
                    })?
                    .embedding;

                self.validate_embedding(&embedding)?;
                Ok(embedding)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AnamnesisError::Network(
                "invalid or missing API key".to_string(),
            )),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(AnamnesisError::Network("rate limit exceeded".to_string()))
            }
            _ => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());

                Err(AnamnesisError::Embedding(format!(
                    "API error (status {}): {}",
                    status, error_text
                )))
            }
        }
    }

    /// Validate embedding dimensions and values
    fn validate_embedding(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(AnamnesisError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        if embedding.iter().any(|&x| !x.is_finite()) {
            return Err(AnamnesisError::Embedding(
                "Embedding contains invalid values (NaN or Inf)".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(AnamnesisError::InvalidInput(
                "text cannot be empty".to_string(),
            ));
        }

        self.call_api_with_retry(text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}
