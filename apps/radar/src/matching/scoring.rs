//! Scoring collaborator: rates one (job, resume) pair.
//!
//! `MatchCoordinator` holds an `Arc<dyn MatchScorer>`; production uses
//! `LlmMatchScorer`, tests plug in deterministic scorers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::{LlmClient, LlmError};
use crate::matching::prompts::{match_score_prompt, MATCH_SCORE_SYSTEM};
use crate::models::{JobAvailable, ResumeAvailable};

/// The `{score, reasoning}` object the scorer must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub score: f64,
    pub reasoning: String,
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("LLM scoring failed: {0}")]
    Llm(#[from] LlmError),

    #[error("scoring timed out after {0}s")]
    TimedOut(u64),
}

/// Slow, fallible, possibly rate-limited.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(
        &self,
        job: &JobAvailable,
        resume: &ResumeAvailable,
    ) -> Result<MatchVerdict, ScoringError>;
}

pub struct LlmMatchScorer {
    llm: LlmClient,
}

impl LlmMatchScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(
        &self,
        job: &JobAvailable,
        resume: &ResumeAvailable,
    ) -> Result<MatchVerdict, ScoringError> {
        let prompt = build_prompt(job, resume);
        Ok(self
            .llm
            .call_json::<MatchVerdict>(&prompt, MATCH_SCORE_SYSTEM)
            .await?)
    }
}

fn build_prompt(job: &JobAvailable, resume: &ResumeAvailable) -> String {
    match_score_prompt(&prompt_json(job), &prompt_json(resume))
}

/// Pretty JSON of a record with its embedding vectors removed; vectors only
/// burn tokens.
fn prompt_json<T: Serialize>(record: &T) -> String {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("embeddings");
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
