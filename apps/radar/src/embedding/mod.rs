//! Embedding collaborator: `POST /api/embed {entity_type, sections, metadata}`.
//!
//! Producers treat embeddings as optional enrichment: any failure here is
//! logged and the event is published without vectors.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Embeddings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Job,
    Resume,
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding API returned no vectors")]
    Empty,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(
        &self,
        entity_type: EntityType,
        sections: &BTreeMap<String, String>,
        metadata: &Value,
    ) -> Result<Embeddings, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    entity_type: EntityType,
    sections: &'a BTreeMap<String, String>,
    metadata: &'a Value,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: BTreeMap<String, Option<Vec<f32>>>,
}

/// Client for the embedding service.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
}

impl HttpEmbedder {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, EmbeddingError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(
        &self,
        entity_type: EntityType,
        sections: &BTreeMap<String, String>,
        metadata: &Value,
    ) -> Result<Embeddings, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                entity_type,
                sections,
                metadata,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response.json().await?;
        collect_vectors(body.embeddings)
    }
}

/// Drops sections the service could not embed (`null`). No vectors at all
/// counts as a failure.
fn collect_vectors(
    raw: BTreeMap<String, Option<Vec<f32>>>,
) -> Result<Embeddings, EmbeddingError> {
    let vectors: Embeddings = raw
        .into_iter()
        .filter_map(|(section, vector)| vector.filter(|v| !v.is_empty()).map(|v| (section, v)))
        .collect();

    if vectors.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    Ok(vectors)
}

/// Embeds `sections`, logging and swallowing any failure.
pub async fn embed_best_effort(
    embedder: Option<&dyn Embedder>,
    entity_type: EntityType,
    sections: &BTreeMap<String, String>,
    metadata: &Value,
) -> Option<Embeddings> {
    let embedder = embedder?;
    if sections.is_empty() {
        debug!(?entity_type, "No sections to embed");
        return None;
    }

    match embedder.embed(entity_type, sections, metadata).await {
        Ok(vectors) => {
            debug!(?entity_type, sections = vectors.len(), "Embeddings computed");
            Some(vectors)
        }
        Err(e) => {
            warn!(?entity_type, "Embedding failed, publishing without vectors: {e}");
            None
        }
    }
}
