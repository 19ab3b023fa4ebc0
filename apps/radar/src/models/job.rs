use serde::{Deserialize, Serialize};

use crate::models::event::{Channel, ChannelEvent};
use crate::models::Embeddings;

/// A job posting published once on the job channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAvailable {
    pub id: String,
    /// Identifier assigned by the job board. Not unique across fetches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_source_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub date_posted: String,
    /// Absent when the embedding service could not be reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Embeddings>,
}

impl ChannelEvent for JobAvailable {
    const CHANNEL: Channel = Channel::Job;

    fn validate(&self) -> Result<(), &'static str> {
        if self.id.trim().is_empty() {
            return Err("job id is empty");
        }
        Ok(())
    }
}
