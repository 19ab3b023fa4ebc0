use serde::{Deserialize, Serialize};

use crate::models::event::{Channel, ChannelEvent};

/// Outcome of scoring one (job, resume) pair, published on the match channel.
/// Ids are weak references; `score` is passed through unclamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub job_id: String,
    pub resume_id: String,
    pub score: f64,
    pub reasoning: String,
}

impl ChannelEvent for MatchResult {
    const CHANNEL: Channel = Channel::Match;

    fn validate(&self) -> Result<(), &'static str> {
        if self.job_id.trim().is_empty() || self.resume_id.trim().is_empty() {
            return Err("match result is missing a job or resume id");
        }
        Ok(())
    }
}
